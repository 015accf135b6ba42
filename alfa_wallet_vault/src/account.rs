//! ALFA Wallet Vault - Accounts & Wallet Records
//!
//! An account is one partition named by the handle of its login passphrase.
//! It holds a `meta` probe record and the `wallets` collection. Private keys
//! and mnemonics are sealed before they reach storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::crypto::{secure_erase_string, SecretBytes};
use crate::error::{VaultError, VaultResult};
use crate::identity::{handle_for, AccountHandle};
use crate::secret::{EncryptedSecret, RevealedSecret, SecretWallet};
use crate::store::{
    CollectionSchema, IndexSchema, Partition, PartitionLocks, PartitionManager, RetryPolicy,
};

/// Schema version of account partitions
pub const ACCOUNT_SCHEMA_VERSION: u32 = 1;

pub const META_COLLECTION: &str = "meta";
pub const WALLETS_COLLECTION: &str = "wallets";

/// Key of the single `meta` record
const META_ID: &str = "account";

/// Collections of a fresh account partition
pub fn account_schemas() -> Vec<CollectionSchema> {
    vec![
        CollectionSchema::keyed(META_COLLECTION, "id"),
        CollectionSchema::keyed(WALLETS_COLLECTION, "id")
            .with_index("network", IndexSchema::new("network"))
            .with_index("createdAt", IndexSchema::new("createdAt")),
    ]
}

/// Probe record proving the partition belongs to a readable account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMeta {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// Stored wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    pub id: String,
    pub address: String,
    pub network: String,
    pub encrypted_private_key: EncryptedSecret,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_mnemonic: Option<EncryptedSecret>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Last known balance, as reported by the caller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WalletRecord {
    pub fn has_mnemonic(&self) -> bool {
        self.encrypted_mnemonic.is_some()
    }
}

/// Input for [`AccountStore::add_wallet`]. Secret fields are scrubbed on drop.
#[derive(Default)]
pub struct NewWallet {
    pub address: String,
    pub network: String,
    /// Hex, optional `0x`
    pub private_key: String,
    pub mnemonic: Option<String>,
    pub label: Option<String>,
}

impl NewWallet {
    pub fn new(address: &str, network: &str, private_key: &str) -> Self {
        Self {
            address: address.to_string(),
            network: network.to_string(),
            private_key: private_key.to_string(),
            mnemonic: None,
            label: None,
        }
    }

    pub fn with_mnemonic(mut self, mnemonic: &str) -> Self {
        self.mnemonic = Some(mnemonic.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }
}

impl Drop for NewWallet {
    fn drop(&mut self) {
        secure_erase_string(&mut self.private_key);
        if let Some(mnemonic) = self.mnemonic.as_mut() {
            secure_erase_string(mnemonic);
        }
    }
}

impl std::fmt::Debug for NewWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewWallet")
            .field("address", &self.address)
            .field("network", &self.network)
            .field("private_key", &"[REDACTED]")
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "[REDACTED]"))
            .field("label", &self.label)
            .finish()
    }
}

/// Account lifecycle and wallet storage
#[derive(Debug, Clone)]
pub struct AccountStore {
    partitions: PartitionManager,
    locks: PartitionLocks,
    sealer: SecretWallet,
    retry: RetryPolicy,
    min_passphrase_len: usize,
}

impl AccountStore {
    pub fn new(partitions: PartitionManager, locks: PartitionLocks, sealer: SecretWallet) -> Self {
        Self {
            partitions,
            locks,
            sealer,
            retry: RetryPolicy::default(),
            min_passphrase_len: 8,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_min_passphrase_len(mut self, len: usize) -> Self {
        self.min_passphrase_len = len;
        self
    }

    pub fn sealer(&self) -> &SecretWallet {
        &self.sealer
    }

    // ═══════════════════════════════════════════════════════════════
    // ACCOUNTS
    // ═══════════════════════════════════════════════════════════════

    /// Create the partition for `passphrase` and write its probe record
    pub fn create_account(&self, passphrase: &str) -> VaultResult<AccountHandle> {
        if passphrase.chars().count() < self.min_passphrase_len {
            return Err(VaultError::InvalidInput(format!(
                "passphrase must be at least {} characters",
                self.min_passphrase_len
            )));
        }

        let handle = handle_for(passphrase);
        let meta = serde_json::to_value(&AccountMeta {
            id: META_ID.to_string(),
            created_at: Utc::now(),
        })?;
        self.partitions.create_seeded(
            handle.as_str(),
            ACCOUNT_SCHEMA_VERSION,
            &account_schemas(),
            |w| w.put(META_COLLECTION, meta).map(|_| ()),
        )?;

        log::info!("Created account {}", handle);
        Ok(handle)
    }

    /// Locate the account for `passphrase`.
    ///
    /// A missing or unreadable account fails exactly like a wrong
    /// passphrase; only contention is reported separately.
    pub fn open_account(&self, passphrase: &str) -> VaultResult<AccountHandle> {
        let handle = handle_for(passphrase);
        match self.read_meta(&handle) {
            Ok(Some(_)) => Ok(handle),
            Ok(None) => Err(VaultError::Decryption),
            Err(e) if e.is_retryable() => Err(e),
            Err(e) => {
                log::debug!("Account probe failed: {}", e);
                Err(VaultError::Decryption)
            }
        }
    }

    pub fn account_exists(&self, handle: &AccountHandle) -> bool {
        self.partitions.exists(handle.as_str())
    }

    pub fn account_meta(&self, handle: &AccountHandle) -> VaultResult<AccountMeta> {
        self.read_meta(handle)?
            .ok_or_else(|| VaultError::RecordNotFound(META_ID.to_string()))
    }

    /// Remove an account and everything in it
    pub fn delete_account(&self, handle: &AccountHandle) -> VaultResult<bool> {
        let _guard = self.retry.run(|| self.locks.try_acquire(handle.as_str()))?;
        self.partitions.delete(handle.as_str())
    }

    // ═══════════════════════════════════════════════════════════════
    // WALLETS
    // ═══════════════════════════════════════════════════════════════

    /// Seal the wallet's secrets under `passphrase` and store it
    pub fn add_wallet(
        &self,
        handle: &AccountHandle,
        wallet: &NewWallet,
        passphrase: &str,
    ) -> VaultResult<WalletRecord> {
        if wallet.address.trim().is_empty() || wallet.network.trim().is_empty() {
            return Err(VaultError::InvalidInput(
                "wallet address and network are required".into(),
            ));
        }

        let encrypted_private_key = self.sealer.seal_secret(&wallet.private_key, passphrase)?;
        let encrypted_mnemonic = match wallet.mnemonic.as_deref() {
            Some(phrase) => Some(self.sealer.seal_phrase(phrase, passphrase)?),
            None => None,
        };

        let record = WalletRecord {
            id: Uuid::new_v4().to_string(),
            address: wallet.address.trim().to_string(),
            network: wallet.network.trim().to_string(),
            encrypted_private_key,
            encrypted_mnemonic,
            label: wallet.label.clone(),
            balance: None,
            created_at: Utc::now(),
        };

        self.partition(handle)?
            .add(WALLETS_COLLECTION, serde_json::to_value(&record)?)?;
        log::info!("Added {} wallet {} to {}", record.network, record.id, handle);
        Ok(record)
    }

    /// All wallets, oldest first
    pub fn list_wallets(&self, handle: &AccountHandle) -> VaultResult<Vec<WalletRecord>> {
        let mut wallets = parse_wallets(self.partition(handle)?.get_all(WALLETS_COLLECTION)?)?;
        wallets.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(wallets)
    }

    pub fn wallets_by_network(
        &self,
        handle: &AccountHandle,
        network: &str,
    ) -> VaultResult<Vec<WalletRecord>> {
        let records =
            self.partition(handle)?
                .find_by_index(WALLETS_COLLECTION, "network", &json!(network))?;
        parse_wallets(records)
    }

    pub fn get_wallet(&self, handle: &AccountHandle, id: &str) -> VaultResult<WalletRecord> {
        let record = self
            .partition(handle)?
            .get(WALLETS_COLLECTION, &json!(id))?
            .ok_or_else(|| VaultError::RecordNotFound(id.to_string()))?;
        Ok(serde_json::from_value(record)?)
    }

    pub fn delete_wallet(&self, handle: &AccountHandle, id: &str) -> VaultResult<bool> {
        let removed = self.partition(handle)?.delete(WALLETS_COLLECTION, &json!(id))?;
        if removed {
            log::info!("Deleted wallet {} from {}", id, handle);
        }
        Ok(removed)
    }

    /// Record the latest balance reported for a wallet
    pub fn update_balance(
        &self,
        handle: &AccountHandle,
        id: &str,
        balance: &str,
    ) -> VaultResult<WalletRecord> {
        let partition = self.partition(handle)?;
        let mut wallet: WalletRecord = partition
            .get(WALLETS_COLLECTION, &json!(id))?
            .map(serde_json::from_value)
            .transpose()?
            .ok_or_else(|| VaultError::RecordNotFound(id.to_string()))?;
        wallet.balance = Some(balance.to_string());
        partition.put(WALLETS_COLLECTION, serde_json::to_value(&wallet)?)?;
        Ok(wallet)
    }

    // ═══════════════════════════════════════════════════════════════
    // SECRETS
    // ═══════════════════════════════════════════════════════════════

    /// Decrypt a wallet's private key as lowercase hex
    pub fn reveal_private_key(
        &self,
        handle: &AccountHandle,
        id: &str,
        passphrase: &str,
    ) -> VaultResult<RevealedSecret> {
        let wallet = self.get_wallet(handle, id)?;
        self.sealer.unseal_secret(&wallet.encrypted_private_key, passphrase)
    }

    /// Decrypt a wallet's mnemonic, if it has one
    pub fn reveal_mnemonic(
        &self,
        handle: &AccountHandle,
        id: &str,
        passphrase: &str,
    ) -> VaultResult<Option<RevealedSecret>> {
        let wallet = self.get_wallet(handle, id)?;
        wallet
            .encrypted_mnemonic
            .as_ref()
            .map(|blob| self.sealer.unseal_phrase(blob, passphrase))
            .transpose()
    }

    /// Hand the raw private key bytes to `f`, scrubbing them afterwards.
    ///
    /// This is the signing call-site pattern: the key never outlives the
    /// closure.
    pub fn with_private_key<T, F>(
        &self,
        handle: &AccountHandle,
        id: &str,
        passphrase: &str,
        f: F,
    ) -> VaultResult<T>
    where
        F: FnOnce(&[u8]) -> T,
    {
        let wallet = self.get_wallet(handle, id)?;
        let mut key: SecretBytes = self
            .sealer
            .unseal_bytes(&wallet.encrypted_private_key, passphrase)?;
        let result = f(key.as_slice());
        key.erase();
        Ok(result)
    }

    fn partition(&self, handle: &AccountHandle) -> VaultResult<Partition> {
        self.retry.run(|| self.partitions.open(handle.as_str()))
    }

    fn read_meta(&self, handle: &AccountHandle) -> VaultResult<Option<AccountMeta>> {
        if !self.partitions.exists(handle.as_str()) {
            return Ok(None);
        }
        let record = self.partition(handle)?.get(META_COLLECTION, &json!(META_ID))?;
        record
            .map(|value| serde_json::from_value(value).map_err(VaultError::from))
            .transpose()
    }
}

fn parse_wallets(records: Vec<Value>) -> VaultResult<Vec<WalletRecord>> {
    records
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(VaultError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CipherSuite, KdfParams};
    use tempfile::{tempdir, TempDir};

    const PASS: &str = "correct horse battery staple";
    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn store() -> (TempDir, AccountStore) {
        let dir = tempdir().unwrap();
        let store = AccountStore::new(
            PartitionManager::new(dir.path()).unwrap(),
            PartitionLocks::new(),
            SecretWallet::new(KdfParams::argon2id(1024, 1, 1), CipherSuite::Aes256Gcm),
        )
        .with_retry(RetryPolicy::none());
        (dir, store)
    }

    #[test]
    fn test_create_and_open_account() {
        let (_dir, store) = store();
        let handle = store.create_account(PASS).unwrap();
        assert_eq!(handle, handle_for(PASS));
        assert_eq!(store.open_account(PASS).unwrap(), handle);
        assert!(store.account_exists(&handle));
        assert_eq!(store.account_meta(&handle).unwrap().id, META_ID);

        assert!(matches!(
            store.create_account(PASS),
            Err(VaultError::PartitionExists(_))
        ));
    }

    #[test]
    fn test_unknown_account_looks_like_wrong_passphrase() {
        let (_dir, store) = store();
        store.create_account(PASS).unwrap();
        let err = store.open_account("some other passphrase").unwrap_err();
        assert!(matches!(err, VaultError::Decryption));
    }

    #[test]
    fn test_short_passphrase_rejected() {
        let (_dir, store) = store();
        assert!(matches!(
            store.create_account("short"),
            Err(VaultError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_wallet_lifecycle() {
        let (_dir, store) = store();
        let handle = store.create_account(PASS).unwrap();

        let eth = store
            .add_wallet(
                &handle,
                &NewWallet::new("0xabc", "ethereum", KEY).with_label("main"),
                PASS,
            )
            .unwrap();
        let btc = store
            .add_wallet(&handle, &NewWallet::new("bc1q", "bitcoin", "0x01"), PASS)
            .unwrap();

        let all = store.list_wallets(&handle).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|w| w.id == eth.id));

        let only_eth = store.wallets_by_network(&handle, "ethereum").unwrap();
        assert_eq!(only_eth, vec![eth.clone()]);

        let updated = store.update_balance(&handle, &btc.id, "0.5").unwrap();
        assert_eq!(updated.balance.as_deref(), Some("0.5"));
        assert_eq!(store.get_wallet(&handle, &btc.id).unwrap().balance.as_deref(), Some("0.5"));

        assert!(store.delete_wallet(&handle, &btc.id).unwrap());
        assert!(matches!(
            store.get_wallet(&handle, &btc.id),
            Err(VaultError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_stored_record_has_no_plaintext() {
        let (_dir, store) = store();
        let handle = store.create_account(PASS).unwrap();
        let wallet = store
            .add_wallet(&handle, &NewWallet::new("0xabc", "ethereum", KEY), PASS)
            .unwrap();
        let json = serde_json::to_string(&wallet).unwrap();
        assert!(!json.contains(&KEY[2..]));
        assert!(json.contains("encryptedPrivateKey"));
        assert!(!json.contains("encryptedMnemonic"));
    }

    #[test]
    fn test_reveal_secrets() {
        let (_dir, store) = store();
        let handle = store.create_account(PASS).unwrap();
        let phrase = "legal winner thank year wave sausage worth useful legal winner thank yellow";
        let wallet = store
            .add_wallet(
                &handle,
                &NewWallet::new("0xabc", "ethereum", KEY).with_mnemonic(phrase),
                PASS,
            )
            .unwrap();

        let key = store.reveal_private_key(&handle, &wallet.id, PASS).unwrap();
        assert_eq!(key.expose(), &KEY[2..]);
        let mnemonic = store.reveal_mnemonic(&handle, &wallet.id, PASS).unwrap().unwrap();
        assert_eq!(mnemonic.expose(), phrase);

        assert!(matches!(
            store.reveal_private_key(&handle, &wallet.id, "wrong"),
            Err(VaultError::Decryption)
        ));
    }

    #[test]
    fn test_with_private_key() {
        let (_dir, store) = store();
        let handle = store.create_account(PASS).unwrap();
        let wallet = store
            .add_wallet(&handle, &NewWallet::new("0xabc", "ethereum", "0x0a0b"), PASS)
            .unwrap();
        let len = store
            .with_private_key(&handle, &wallet.id, PASS, |key| {
                assert_eq!(key, &[0x0a, 0x0b]);
                key.len()
            })
            .unwrap();
        assert_eq!(len, 2);
    }

    #[test]
    fn test_invalid_wallet_input() {
        let (_dir, store) = store();
        let handle = store.create_account(PASS).unwrap();
        assert!(store
            .add_wallet(&handle, &NewWallet::new("", "ethereum", KEY), PASS)
            .is_err());
        assert!(matches!(
            store.add_wallet(&handle, &NewWallet::new("0x1", "eth", "zz"), PASS),
            Err(VaultError::InvalidInput(_))
        ));
        assert!(store.list_wallets(&handle).unwrap().is_empty());
    }

    #[test]
    fn test_delete_account() {
        let (_dir, store) = store();
        let handle = store.create_account(PASS).unwrap();
        assert!(store.delete_account(&handle).unwrap());
        assert!(!store.account_exists(&handle));
        assert!(matches!(store.open_account(PASS), Err(VaultError::Decryption)));
    }

    #[test]
    fn test_new_wallet_debug_is_redacted() {
        let wallet = NewWallet::new("0xabc", "eth", KEY).with_mnemonic("words here");
        let debug = format!("{:?}", wallet);
        assert!(!debug.contains(&KEY[2..]));
        assert!(!debug.contains("words"));
    }
}
