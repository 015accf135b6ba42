//! ALFA Wallet Vault - Account Handles
//!
//! Maps a login passphrase to the name of its storage partition:
//! `bp_` + base64url(SHA-256(passphrase)), unpadded.
//!
//! The hash is fast and unsalted because it must be recomputable from the
//! passphrase alone. It is a lookup key only and never feeds the KDF.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{VaultError, VaultResult};

/// Namespace prefix of every partition name
pub const HANDLE_PREFIX: &str = "bp_";

/// Length of the encoded digest (32 bytes, base64url, no padding)
pub const HANDLE_DIGEST_LEN: usize = 43;

/// Storage-safe identifier of an account partition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountHandle(String);

impl AccountHandle {
    /// Validate a handle string coming from outside (CLI, backups, configs)
    pub fn parse(value: &str) -> VaultResult<Self> {
        let digest = value.strip_prefix(HANDLE_PREFIX).ok_or_else(|| {
            VaultError::InvalidInput(format!("account handle must start with {}", HANDLE_PREFIX))
        })?;
        if digest.len() != HANDLE_DIGEST_LEN || !digest.bytes().all(is_storage_safe) {
            return Err(VaultError::InvalidInput(format!(
                "malformed account handle: {}",
                value
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for AccountHandle {
    type Error = VaultError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AccountHandle> for String {
    fn from(handle: AccountHandle) -> Self {
        handle.0
    }
}

impl AsRef<str> for AccountHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the partition handle for `passphrase`
pub fn handle_for(passphrase: &str) -> AccountHandle {
    let digest = Sha256::digest(passphrase.as_bytes());
    AccountHandle(format!("{}{}", HANDLE_PREFIX, URL_SAFE_NO_PAD.encode(digest)))
}

fn is_storage_safe(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}
