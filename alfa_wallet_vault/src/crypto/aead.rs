//! ALFA Wallet Vault - AEAD Encryption
//!
//! AES-256-GCM by default, ChaCha20-Poly1305 as the alternate suite. Both use
//! a 12-byte nonce and append a 16-byte tag to the ciphertext.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use chacha20poly1305::ChaCha20Poly1305;
use serde::{Deserialize, Serialize};

use super::erase::SecretBytes;
use super::keys::{SymmetricKey, NONCE_LEN, TAG_LEN};
use crate::error::{VaultError, VaultResult};

/// AEAD cipher suite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CipherSuite {
    #[default]
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
}

impl CipherSuite {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Aes256Gcm => "AES-256-GCM",
            Self::ChaCha20Poly1305 => "ChaCha20-Poly1305",
        }
    }
}

/// Encrypt `plaintext`, returning ciphertext with the tag appended
///
/// The caller owns nonce uniqueness: never pass the same nonce twice for one key.
pub fn seal(
    suite: CipherSuite,
    key: &SymmetricKey,
    nonce: &[u8; NONCE_LEN],
    plaintext: &[u8],
) -> VaultResult<Vec<u8>> {
    let nonce = Nonce::from_slice(nonce);

    let sealed = match suite {
        CipherSuite::Aes256Gcm => Aes256Gcm::new_from_slice(key.expose())
            .map_err(|e| VaultError::EncryptionFailed(e.to_string()))?
            .encrypt(nonce, plaintext),
        CipherSuite::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key.expose())
            .map_err(|e| VaultError::EncryptionFailed(e.to_string()))?
            .encrypt(nonce, plaintext),
    };

    sealed.map_err(|e| VaultError::EncryptionFailed(e.to_string()))
}

/// Decrypt and authenticate `ciphertext`
///
/// Fails closed: a bad tag, a truncated input or a wrong nonce length all
/// come back as [`VaultError::Decryption`] and no plaintext is released.
pub fn open(
    suite: CipherSuite,
    key: &SymmetricKey,
    nonce: &[u8],
    ciphertext: &[u8],
) -> VaultResult<SecretBytes> {
    if nonce.len() != NONCE_LEN || ciphertext.len() < TAG_LEN {
        return Err(VaultError::Decryption);
    }

    let nonce = Nonce::from_slice(nonce);

    let opened = match suite {
        CipherSuite::Aes256Gcm => Aes256Gcm::new_from_slice(key.expose())
            .map_err(|_| VaultError::Decryption)?
            .decrypt(nonce, ciphertext),
        CipherSuite::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key.expose())
            .map_err(|_| VaultError::Decryption)?
            .decrypt(nonce, ciphertext),
    };

    opened
        .map(SecretBytes::new)
        .map_err(|_| VaultError::Decryption)
}
