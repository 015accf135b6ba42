//! ALFA Wallet Vault - Passphrase Key Derivation
//!
//! Argon2id is the default for both profiles. PBKDF2-HMAC-SHA256 stays
//! available for environments that cannot spare the memory Argon2 needs.
//!
//! Two cost profiles exist: `secret` protects a single private key or
//! mnemonic, `vault` protects a full account backup and is strictly heavier.

use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroizing;

use super::keys::{SymmetricKey, KEY_LEN, SALT_LEN};
use crate::error::{VaultError, VaultResult};

/// PBKDF2 iteration floor for per-secret keys
pub const PBKDF2_SECRET_MIN_ITERATIONS: u32 = 100_000;

/// PBKDF2 iteration floor for backup keys
pub const PBKDF2_VAULT_MIN_ITERATIONS: u32 = 600_000;

/// Argon2id memory floor (KiB) for per-secret keys
pub const ARGON2_SECRET_MIN_MEMORY_KIB: u32 = 19 * 1024;

/// Argon2id memory floor (KiB) for backup keys
pub const ARGON2_VAULT_MIN_MEMORY_KIB: u32 = 64 * 1024;

/// Argon2id memory ceiling (KiB) accepted from any source
pub const ARGON2_MAX_MEMORY_KIB: u32 = 1024 * 1024;

/// Argon2id pass ceiling
pub const ARGON2_MAX_TIME_COST: u32 = 16;

/// Argon2id lane ceiling
pub const ARGON2_MAX_PARALLELISM: u32 = 16;

/// PBKDF2 iteration ceiling
pub const PBKDF2_MAX_ITERATIONS: u32 = 10_000_000;

/// What a derived key is going to protect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KdfPurpose {
    /// One sealed private key or mnemonic
    Secret,
    /// A whole exported partition
    Vault,
}

/// KDF algorithm together with its cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "kebab-case")]
pub enum KdfParams {
    Argon2id {
        memory_kib: u32,
        time_cost: u32,
        parallelism: u32,
    },
    Pbkdf2Sha256 {
        iterations: u32,
    },
}

impl KdfParams {
    /// Argon2id with explicit costs
    pub fn argon2id(memory_kib: u32, time_cost: u32, parallelism: u32) -> Self {
        Self::Argon2id {
            memory_kib,
            time_cost,
            parallelism,
        }
    }

    /// PBKDF2-HMAC-SHA256 with an explicit iteration count
    pub fn pbkdf2(iterations: u32) -> Self {
        Self::Pbkdf2Sha256 { iterations }
    }

    /// Default profile for sealing one secret
    pub fn secret_default() -> Self {
        Self::argon2id(ARGON2_SECRET_MIN_MEMORY_KIB, 2, 1)
    }

    /// Default profile for sealing a backup
    pub fn vault_default() -> Self {
        Self::argon2id(ARGON2_VAULT_MIN_MEMORY_KIB, 3, 4)
    }

    /// Short algorithm name for logs and envelopes
    pub fn name(&self) -> &'static str {
        match self {
            Self::Argon2id { .. } => "argon2id",
            Self::Pbkdf2Sha256 { .. } => "pbkdf2-sha256",
        }
    }

    /// Reject parameters that are zero or above the supported ceilings.
    ///
    /// Envelopes carry their own parameters, so this runs before every
    /// derivation driven by stored data.
    pub fn check_bounds(&self) -> VaultResult<()> {
        match *self {
            Self::Argon2id {
                memory_kib,
                time_cost,
                parallelism,
            } => {
                if parallelism == 0 || parallelism > ARGON2_MAX_PARALLELISM {
                    return Err(VaultError::ConfigError(format!(
                        "argon2id parallelism {} outside 1..={}",
                        parallelism, ARGON2_MAX_PARALLELISM
                    )));
                }
                if time_cost == 0 || time_cost > ARGON2_MAX_TIME_COST {
                    return Err(VaultError::ConfigError(format!(
                        "argon2id time cost {} outside 1..={}",
                        time_cost, ARGON2_MAX_TIME_COST
                    )));
                }
                // argon2 needs 8 KiB per lane
                if memory_kib < 8 * parallelism || memory_kib > ARGON2_MAX_MEMORY_KIB {
                    return Err(VaultError::ConfigError(format!(
                        "argon2id memory {} KiB outside {}..={}",
                        memory_kib,
                        8 * parallelism,
                        ARGON2_MAX_MEMORY_KIB
                    )));
                }
                Ok(())
            }
            Self::Pbkdf2Sha256 { iterations } => {
                if iterations == 0 || iterations > PBKDF2_MAX_ITERATIONS {
                    return Err(VaultError::ConfigError(format!(
                        "pbkdf2 iterations {} outside 1..={}",
                        iterations, PBKDF2_MAX_ITERATIONS
                    )));
                }
                Ok(())
            }
        }
    }

    /// Reject parameters below the floor required for `purpose`, or above
    /// the ceilings of [`KdfParams::check_bounds`]
    pub fn validate(&self, purpose: KdfPurpose) -> VaultResult<()> {
        self.check_bounds()?;
        match (*self, purpose) {
            (Self::Pbkdf2Sha256 { iterations }, KdfPurpose::Secret)
                if iterations < PBKDF2_SECRET_MIN_ITERATIONS =>
            {
                Err(VaultError::ConfigError(format!(
                    "pbkdf2 needs at least {} iterations for secrets, got {}",
                    PBKDF2_SECRET_MIN_ITERATIONS, iterations
                )))
            }
            (Self::Pbkdf2Sha256 { iterations }, KdfPurpose::Vault)
                if iterations < PBKDF2_VAULT_MIN_ITERATIONS =>
            {
                Err(VaultError::ConfigError(format!(
                    "pbkdf2 needs at least {} iterations for backups, got {}",
                    PBKDF2_VAULT_MIN_ITERATIONS, iterations
                )))
            }
            (Self::Argon2id { memory_kib, time_cost, .. }, KdfPurpose::Secret)
                if memory_kib < ARGON2_SECRET_MIN_MEMORY_KIB || time_cost < 2 =>
            {
                Err(VaultError::ConfigError(format!(
                    "argon2id secret profile below floor ({} KiB, t={})",
                    memory_kib, time_cost
                )))
            }
            (Self::Argon2id { memory_kib, time_cost, .. }, KdfPurpose::Vault)
                if memory_kib < ARGON2_VAULT_MIN_MEMORY_KIB || time_cost < 3 =>
            {
                Err(VaultError::ConfigError(format!(
                    "argon2id vault profile below floor ({} KiB, t={})",
                    memory_kib, time_cost
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Derive a 256-bit key from `passphrase` and `salt`
///
/// The whole UTF-8 passphrase is used; nothing is truncated.
pub fn derive_key(
    passphrase: &str,
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> VaultResult<SymmetricKey> {
    if passphrase.is_empty() {
        return Err(VaultError::InvalidInput("passphrase must not be empty".into()));
    }

    let mut output = Zeroizing::new([0u8; KEY_LEN]);

    match *params {
        KdfParams::Argon2id {
            memory_kib,
            time_cost,
            parallelism,
        } => {
            let params = Params::new(memory_kib, time_cost, parallelism, Some(KEY_LEN))
                .map_err(|e| VaultError::KeyDerivationFailed(format!("argon2 params: {}", e)))?;
            let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
            argon2
                .hash_password_into(passphrase.as_bytes(), salt, &mut *output)
                .map_err(|e| VaultError::KeyDerivationFailed(format!("argon2 derive: {}", e)))?;
        }
        KdfParams::Pbkdf2Sha256 { iterations } => {
            if iterations == 0 {
                return Err(VaultError::KeyDerivationFailed(
                    "pbkdf2 iterations must be positive".into(),
                ));
            }
            pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, iterations, &mut *output);
        }
    }

    Ok(SymmetricKey::new(*output))
}
