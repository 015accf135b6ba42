//! ALFA Wallet Vault - Key Material
//!
//! Symmetric key wrapper plus the random salt and nonce generators used by
//! every sealing path.

use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, Secret};
use zeroize::ZeroizeOnDrop;

/// Key length for AES-256 / ChaCha20
pub const KEY_LEN: usize = 32;

/// Salt length fed to the KDF
pub const SALT_LEN: usize = 16;

/// Nonce length for AES-GCM and ChaCha20-Poly1305
pub const NONCE_LEN: usize = 12;

/// Authentication tag appended to every ciphertext
pub const TAG_LEN: usize = 16;

/// 256-bit symmetric key, zeroized on drop
#[derive(ZeroizeOnDrop)]
pub struct SymmetricKey {
    #[zeroize(skip)]
    inner: Secret<[u8; KEY_LEN]>,
}

impl SymmetricKey {
    /// Wrap raw key bytes
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self {
            inner: Secret::new(bytes),
        }
    }

    /// Expose the key bytes (use with caution)
    pub fn expose(&self) -> &[u8; KEY_LEN] {
        self.inner.expose_secret()
    }

    /// Generate a random key
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self::new(bytes)
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

/// Fresh random salt; never reuse across seals
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Fresh random nonce; never reuse under the same key
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}
