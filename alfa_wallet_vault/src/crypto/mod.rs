//! ALFA Wallet Vault - Cryptographic Core
//!
//! Passphrase KDF, AEAD sealing and best-effort memory scrubbing.

pub mod aead;
pub mod erase;
pub mod kdf;
pub mod keys;

pub use aead::{open, seal, CipherSuite};
pub use erase::{secure_erase, secure_erase_string, secure_erase_vec, SecretBytes};
pub use kdf::{derive_key, KdfParams, KdfPurpose};
pub use keys::{generate_nonce, generate_salt, SymmetricKey, KEY_LEN, NONCE_LEN, SALT_LEN, TAG_LEN};
