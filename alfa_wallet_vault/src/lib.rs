//! # ALFA Wallet Vault
//!
//! Passphrase-sealed wallet keys with encrypted, image-concealable backups.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    ALFA WALLET VAULT                     │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────┐  │
//! │  │  SESSION    │  │  ACCOUNTS   │  │  BACKUP          │  │
//! │  │  lock state │  │  + WALLETS  │  │  export / import │  │
//! │  └──────┬──────┘  └──────┬──────┘  └────────┬─────────┘  │
//! │         │                │                  │            │
//! │  ┌──────┴────────────────┴──────────────────┴─────────┐  │
//! │  │   SECRET WALLET  ·  ARGON2ID / PBKDF2  ·  AEAD     │  │
//! │  └────────────────────────────────────────────────────┘  │
//! │                                                          │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────┐  │
//! │  │  HANDLES    │  │  PARTITION  │  │  IMAGE CARRIER   │  │
//! │  │  bp_<sha256>│  │  STORE      │  │  PNG LSB         │  │
//! │  └─────────────┘  └─────────────┘  └──────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Model
//!
//! - Every private key and mnemonic sealed with AES-256-GCM (or
//!   ChaCha20-Poly1305) under an Argon2id key, fresh salt and nonce each time
//! - Backups sealed the same way with a heavier KDF profile
//! - A wrong passphrase and tampered data fail with the same error
//! - Restores never delete anything before the backup authenticates
//! - Decrypted secrets overwritten after use

pub mod account;
pub mod api;
pub mod backup;
pub mod carrier;
pub mod config;
pub mod crypto;
pub mod error;
pub mod identity;
pub mod secret;
pub mod session;
pub mod store;

mod encoding;

pub use account::{AccountStore, NewWallet, WalletRecord};
pub use api::WalletVaultApi;
pub use backup::{DatabaseVault, ImportPhase, VaultBlob, VaultSnapshot};
pub use config::WalletVaultConfig;
pub use crypto::{secure_erase, CipherSuite, KdfParams, SecretBytes};
pub use error::{VaultError, VaultResult};
pub use identity::{handle_for, AccountHandle};
pub use secret::{EncryptedSecret, RevealedSecret, SecretWallet};
pub use session::{SessionContext, SessionState};
pub use store::{PartitionManager, Partition};

/// ALFA Wallet Vault version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ALFA Wallet Vault signature
pub const SIGNATURE: &str = "ALFA_WALLET_VAULT_v1";
