//! ALFA Wallet Vault - Unified Public API
//!
//! Single entry point for accounts, sealed wallet secrets and backups.
//! Every KDF-bound operation also has an `_async` variant that runs on the
//! blocking thread pool, so an async caller never stalls its executor.

use std::sync::Arc;

use zeroize::Zeroizing;

use crate::account::{AccountStore, NewWallet, WalletRecord};
use crate::backup::{DatabaseVault, VaultBlob, VaultSnapshot};
use crate::carrier;
use crate::config::WalletVaultConfig;
use crate::error::{VaultError, VaultResult};
use crate::identity::{handle_for, AccountHandle};
use crate::secret::{EncryptedSecret, RevealedSecret, SecretWallet};
use crate::session::{SessionContext, SessionState};
use crate::store::{PartitionLocks, PartitionManager};

// ═══════════════════════════════════════════════════════════════════════════════
// WALLET VAULT API - THE ONLY PUBLIC INTERFACE
// ═══════════════════════════════════════════════════════════════════════════════

/// ALFA Wallet Vault API
///
/// Cheap to clone; clones share storage, locks and the session.
///
/// # Example
///
/// ```rust,ignore
/// use alfa_wallet_vault::{NewWallet, WalletVaultApi, WalletVaultConfig};
///
/// let api = WalletVaultApi::new(WalletVaultConfig::from_env())?;
/// api.create_account("correct horse battery staple")?;
/// api.unlock("correct horse battery staple")?;
///
/// let wallet = api.add_wallet(&NewWallet::new("0xabc...", "ethereum", "0x4c08..."))?;
/// let backup = api.export_current("backup passphrase")?;
///
/// api.lock();
/// ```
#[derive(Clone)]
pub struct WalletVaultApi {
    inner: Arc<ApiInner>,
}

struct ApiInner {
    config: WalletVaultConfig,
    accounts: AccountStore,
    vault: DatabaseVault,
    sealer: SecretWallet,
    session: SessionContext,
}

impl WalletVaultApi {
    // ═══════════════════════════════════════════════════════════════════════
    // INITIALIZATION
    // ═══════════════════════════════════════════════════════════════════════

    /// Build the API over `config.data_dir`
    pub fn new(config: WalletVaultConfig) -> VaultResult<Self> {
        config.secret_kdf.check_bounds()?;
        config.vault_kdf.check_bounds()?;
        let partitions = PartitionManager::new(&config.data_dir)?;
        let locks = PartitionLocks::new();
        let sealer = config.secret_wallet();
        let retry = config.retry_policy();

        let accounts = AccountStore::new(partitions.clone(), locks.clone(), sealer.clone())
            .with_retry(retry)
            .with_min_passphrase_len(config.min_passphrase_len);
        let vault = DatabaseVault::new(partitions, locks, config.vault_kdf).with_retry(retry);

        log::info!("Wallet vault ready at {}", config.data_dir.display());

        Ok(Self {
            inner: Arc::new(ApiInner {
                config,
                accounts,
                vault,
                sealer,
                session: SessionContext::new(),
            }),
        })
    }

    pub fn config(&self) -> &WalletVaultConfig {
        &self.inner.config
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.inner.accounts
    }

    pub fn vault(&self) -> &DatabaseVault {
        &self.inner.vault
    }

    pub fn session(&self) -> &SessionContext {
        &self.inner.session
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ACCOUNTS & SESSION
    // ═══════════════════════════════════════════════════════════════════════

    /// Storage handle of a passphrase
    pub fn handle_for(&self, passphrase: &str) -> AccountHandle {
        handle_for(passphrase)
    }

    pub fn create_account(&self, passphrase: &str) -> VaultResult<AccountHandle> {
        self.inner.accounts.create_account(passphrase)
    }

    pub fn unlock(&self, passphrase: &str) -> VaultResult<AccountHandle> {
        self.inner.session.unlock(&self.inner.accounts, passphrase)
    }

    pub fn lock(&self) {
        self.inner.session.lock();
    }

    pub fn state(&self) -> SessionState {
        self.inner.session.state()
    }

    /// Delete the unlocked account and lock the session
    pub fn delete_current_account(&self) -> VaultResult<bool> {
        let handle = self.inner.session.require_unlocked()?;
        self.inner.session.lock();
        self.inner.accounts.delete_account(&handle)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // WALLETS (unlocked session)
    // ═══════════════════════════════════════════════════════════════════════

    /// Add a wallet, sealing its secrets under the session passphrase
    pub fn add_wallet(&self, wallet: &NewWallet) -> VaultResult<WalletRecord> {
        self.inner.session.with_passphrase(|handle, passphrase| {
            self.inner.accounts.add_wallet(handle, wallet, passphrase)
        })
    }

    pub fn list_wallets(&self) -> VaultResult<Vec<WalletRecord>> {
        let handle = self.inner.session.require_unlocked()?;
        self.inner.accounts.list_wallets(&handle)
    }

    pub fn wallets_by_network(&self, network: &str) -> VaultResult<Vec<WalletRecord>> {
        let handle = self.inner.session.require_unlocked()?;
        self.inner.accounts.wallets_by_network(&handle, network)
    }

    pub fn get_wallet(&self, id: &str) -> VaultResult<WalletRecord> {
        let handle = self.inner.session.require_unlocked()?;
        self.inner.accounts.get_wallet(&handle, id)
    }

    pub fn delete_wallet(&self, id: &str) -> VaultResult<bool> {
        let handle = self.inner.session.require_unlocked()?;
        self.inner.accounts.delete_wallet(&handle, id)
    }

    pub fn update_balance(&self, id: &str, balance: &str) -> VaultResult<WalletRecord> {
        let handle = self.inner.session.require_unlocked()?;
        self.inner.accounts.update_balance(&handle, id, balance)
    }

    pub fn reveal_private_key(&self, id: &str) -> VaultResult<RevealedSecret> {
        self.inner.session.with_passphrase(|handle, passphrase| {
            self.inner.accounts.reveal_private_key(handle, id, passphrase)
        })
    }

    pub fn reveal_mnemonic(&self, id: &str) -> VaultResult<Option<RevealedSecret>> {
        self.inner.session.with_passphrase(|handle, passphrase| {
            self.inner.accounts.reveal_mnemonic(handle, id, passphrase)
        })
    }

    /// Lend the raw private key to `f` (e.g. a signer); scrubbed afterwards
    pub fn with_private_key<T, F>(&self, id: &str, f: F) -> VaultResult<T>
    where
        F: FnOnce(&[u8]) -> T,
    {
        self.inner.session.with_passphrase(|handle, passphrase| {
            self.inner.accounts.with_private_key(handle, id, passphrase, f)
        })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // RAW SECRETS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn seal_secret(&self, secret_hex: &str, passphrase: &str) -> VaultResult<EncryptedSecret> {
        self.inner.sealer.seal_secret(secret_hex, passphrase)
    }

    pub fn unseal_secret(
        &self,
        blob: &EncryptedSecret,
        passphrase: &str,
    ) -> VaultResult<RevealedSecret> {
        self.inner.sealer.unseal_secret(blob, passphrase)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // BACKUPS
    // ═══════════════════════════════════════════════════════════════════════

    /// Export partition `handle` as a transport string sealed by `passphrase`
    pub fn export_vault(&self, handle: &str, passphrase: &str) -> VaultResult<String> {
        self.inner.config.check_passphrase(passphrase)?;
        let blob = self.inner.vault.export_vault(handle, passphrase)?;
        Ok(blob.to_transport_string())
    }

    /// Export the unlocked account
    pub fn export_current(&self, passphrase: &str) -> VaultResult<String> {
        let handle = self.inner.session.require_unlocked()?;
        self.export_vault(handle.as_str(), passphrase)
    }

    /// Restore a transport string, returning the restored partition name
    pub fn import_vault(&self, transport: &str, passphrase: &str) -> VaultResult<String> {
        self.inner.vault.import_transport(transport, passphrase)
    }

    /// Decrypt a backup without restoring it
    pub fn inspect_backup(&self, transport: &str, passphrase: &str) -> VaultResult<VaultSnapshot> {
        let blob = VaultBlob::from_transport_string(transport)?;
        self.inner.vault.open_snapshot(&blob, passphrase)
    }

    /// Export into a PNG. Without a carrier a plain one is generated.
    pub fn export_to_image(
        &self,
        handle: &str,
        passphrase: &str,
        carrier_png: Option<&[u8]>,
    ) -> VaultResult<Vec<u8>> {
        let transport = self.export_vault(handle, passphrase)?;
        let carrier = match carrier_png {
            Some(png) => png.to_vec(),
            None => carrier::generate_carrier(transport.len())?,
        };
        carrier::embed(&carrier, &transport)
    }

    /// Restore a backup hidden in a PNG
    pub fn import_from_image(&self, png: &[u8], passphrase: &str) -> VaultResult<String> {
        let transport = carrier::extract(png)?;
        self.import_vault(&transport, passphrase)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ASYNC VARIANTS
    // ═══════════════════════════════════════════════════════════════════════

    pub async fn seal_secret_async(
        &self,
        secret_hex: String,
        passphrase: String,
    ) -> VaultResult<EncryptedSecret> {
        let secret_hex = Zeroizing::new(secret_hex);
        let passphrase = Zeroizing::new(passphrase);
        self.blocking(move |api| api.seal_secret(&secret_hex, &passphrase))
            .await
    }

    pub async fn unseal_secret_async(
        &self,
        blob: EncryptedSecret,
        passphrase: String,
    ) -> VaultResult<RevealedSecret> {
        let passphrase = Zeroizing::new(passphrase);
        self.blocking(move |api| api.unseal_secret(&blob, &passphrase))
            .await
    }

    pub async fn export_vault_async(
        &self,
        handle: String,
        passphrase: String,
    ) -> VaultResult<String> {
        let passphrase = Zeroizing::new(passphrase);
        self.blocking(move |api| api.export_vault(&handle, &passphrase))
            .await
    }

    pub async fn import_vault_async(
        &self,
        transport: String,
        passphrase: String,
    ) -> VaultResult<String> {
        let passphrase = Zeroizing::new(passphrase);
        self.blocking(move |api| api.import_vault(&transport, &passphrase))
            .await
    }

    pub async fn export_to_image_async(
        &self,
        handle: String,
        passphrase: String,
        carrier_png: Option<Vec<u8>>,
    ) -> VaultResult<Vec<u8>> {
        let passphrase = Zeroizing::new(passphrase);
        self.blocking(move |api| api.export_to_image(&handle, &passphrase, carrier_png.as_deref()))
            .await
    }

    pub async fn import_from_image_async(
        &self,
        png: Vec<u8>,
        passphrase: String,
    ) -> VaultResult<String> {
        let passphrase = Zeroizing::new(passphrase);
        self.blocking(move |api| api.import_from_image(&png, &passphrase))
            .await
    }

    async fn blocking<T, F>(&self, f: F) -> VaultResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&WalletVaultApi) -> VaultResult<T> + Send + 'static,
    {
        let api = self.clone();
        tokio::task::spawn_blocking(move || f(&api))
            .await
            .map_err(VaultError::from)?
    }
}

impl std::fmt::Debug for WalletVaultApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletVaultApi")
            .field("data_dir", &self.inner.config.data_dir)
            .field("session", &self.inner.session)
            .finish()
    }
}
