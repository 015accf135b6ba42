//! ALFA Wallet Vault - Configuration

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::crypto::{CipherSuite, KdfParams, KdfPurpose};
use crate::error::{VaultError, VaultResult};
use crate::secret::SecretWallet;
use crate::store::RetryPolicy;

/// Environment variable overriding [`WalletVaultConfig::data_dir`]
pub const DATA_DIR_ENV: &str = "ALFA_WALLET_DATA_DIR";

/// Directory name used under `$HOME` by default
pub const DEFAULT_DIR_NAME: &str = ".alfa_wallet_vault";

/// Vault configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletVaultConfig {
    /// Directory holding one database per account
    pub data_dir: PathBuf,
    /// KDF for newly sealed private keys and mnemonics
    pub secret_kdf: KdfParams,
    /// KDF for backups; export and import must agree on it
    pub vault_kdf: KdfParams,
    /// Cipher for newly sealed secrets
    pub secret_cipher: CipherSuite,
    /// Shortest passphrase accepted for new accounts and backups
    pub min_passphrase_len: usize,
    pub storage_retry_attempts: u32,
    pub storage_retry_backoff_ms: u64,
}

impl Default for WalletVaultConfig {
    fn default() -> Self {
        let data_dir = std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(DEFAULT_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DIR_NAME));

        Self {
            data_dir,
            secret_kdf: KdfParams::secret_default(),
            vault_kdf: KdfParams::vault_default(),
            secret_cipher: CipherSuite::default(),
            min_passphrase_len: 8,
            storage_retry_attempts: 3,
            storage_retry_backoff_ms: 50,
        }
    }
}

impl WalletVaultConfig {
    /// Defaults rooted at `data_dir`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Read a JSON config file, apply environment overrides and validate
    pub fn load<P: AsRef<Path>>(path: P) -> VaultResult<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| {
            VaultError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config: Self = serde_json::from_slice(&data)
            .map_err(|e| VaultError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> VaultResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn apply_env_overrides(&mut self) {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            if !dir.is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
    }

    /// Reject costs below the KDF floors and unusable limits
    pub fn validate(&self) -> VaultResult<()> {
        self.secret_kdf.validate(KdfPurpose::Secret)?;
        self.vault_kdf.validate(KdfPurpose::Vault)?;

        if self.min_passphrase_len == 0 {
            return Err(VaultError::ConfigError(
                "min_passphrase_len must be at least 1".into(),
            ));
        }
        if self.storage_retry_attempts == 0 {
            return Err(VaultError::ConfigError(
                "storage_retry_attempts must be at least 1".into(),
            ));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(VaultError::ConfigError("data_dir is empty".into()));
        }
        Ok(())
    }

    /// Enforce the minimum length on a passphrase that is about to protect data
    pub fn check_passphrase(&self, passphrase: &str) -> VaultResult<()> {
        if passphrase.chars().count() < self.min_passphrase_len {
            return Err(VaultError::InvalidInput(format!(
                "passphrase must be at least {} characters",
                self.min_passphrase_len
            )));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.storage_retry_attempts.max(1),
            backoff: Duration::from_millis(self.storage_retry_backoff_ms),
        }
    }

    /// Sealer for new secrets
    pub fn secret_wallet(&self) -> SecretWallet {
        SecretWallet::new(self.secret_kdf, self.secret_cipher)
    }
}
