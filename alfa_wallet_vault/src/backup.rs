//! ALFA Wallet Vault - Encrypted Backups
//!
//! Exports a whole partition (schemas and records) as one passphrase-sealed
//! blob and restores it.
//!
//! Restore order is fixed: authenticate and parse first, delete the existing
//! partition second, rebuild last. A wrong passphrase or a damaged blob can
//! therefore never touch local data. A failure after the delete is reported
//! as `TransactionFailed` together with the transport string, so the caller
//! still holds everything needed to try again.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::{
    derive_key, generate_nonce, generate_salt, open, seal, CipherSuite, KdfParams, SecretBytes,
    NONCE_LEN, SALT_LEN, TAG_LEN,
};
use crate::error::{VaultError, VaultResult};
use crate::store::{
    validate_partition_name, CollectionSchema, Partition, PartitionLocks, PartitionManager,
    RetryPolicy,
};

/// Backups are always sealed with this suite
pub const VAULT_CIPHER: CipherSuite = CipherSuite::Aes256Gcm;

/// Leading byte of every transport payload
pub const VAULT_FORMAT_VERSION: u8 = 1;

/// Format byte, KDF tag and three big-endian u32 cost fields
pub const BLOB_HEADER_LEN: usize = 2 + 3 * 4;

/// Shortest possible transport payload: header, salt, nonce and a bare tag
pub const MIN_BLOB_LEN: usize = BLOB_HEADER_LEN + SALT_LEN + NONCE_LEN + TAG_LEN;

const KDF_TAG_ARGON2ID: u8 = 1;
const KDF_TAG_PBKDF2_SHA256: u8 = 2;

// ═══════════════════════════════════════════════════════════════
// SNAPSHOT
// ═══════════════════════════════════════════════════════════════

/// Plaintext content of a backup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultSnapshot {
    pub partition_name: String,
    pub collections: BTreeMap<String, CollectionSchema>,
    pub records: BTreeMap<String, Vec<Value>>,
    /// Keys for collections without a key path, aligned with `records`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub keys: BTreeMap<String, Vec<Value>>,
    pub schema_version: u32,
}

impl VaultSnapshot {
    /// Read every collection and record of `partition`
    pub fn capture(partition: &Partition) -> VaultResult<Self> {
        let collections = partition.schemas()?;
        let mut records = BTreeMap::new();
        let mut keys = BTreeMap::new();

        for (name, schema) in &collections {
            let entries = partition.get_all_entries(name)?;
            if schema.key_path.is_none() {
                keys.insert(name.clone(), entries.iter().map(|(k, _)| k.clone()).collect());
            }
            records.insert(name.clone(), entries.into_iter().map(|(_, r)| r).collect());
        }

        Ok(Self {
            partition_name: partition.name().to_string(),
            collections,
            records,
            keys,
            schema_version: partition.version()?,
        })
    }

    pub fn record_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    /// Structural checks run before anything is deleted
    pub fn validate(&self) -> VaultResult<()> {
        validate_partition_name(&self.partition_name)?;

        for (name, schema) in &self.collections {
            let mut named = schema.clone();
            named.name = name.clone();
            named.validate()?;
        }

        for (name, records) in &self.records {
            let schema = self.collections.get(name).ok_or_else(|| {
                VaultError::InvalidInput(format!("backup has records for unknown collection '{}'", name))
            })?;
            if schema.key_path.is_none() && !schema.auto_increment {
                let key_count = self.keys.get(name).map(Vec::len).unwrap_or(0);
                if key_count != records.len() {
                    return Err(VaultError::InvalidInput(format!(
                        "backup is missing keys for '{}'",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Collection schemas with their names filled in
    fn schemas(&self) -> Vec<CollectionSchema> {
        self.collections
            .iter()
            .map(|(name, schema)| {
                let mut schema = schema.clone();
                schema.name = name.clone();
                schema
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════
// BLOB
// ═══════════════════════════════════════════════════════════════

/// Sealed snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultBlob {
    /// KDF the key was derived with; import follows it
    pub kdf: KdfParams,
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext with the tag appended
    pub ciphertext: Vec<u8>,
}

impl VaultBlob {
    /// `header ‖ salt ‖ nonce ‖ ciphertext`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out =
            Vec::with_capacity(BLOB_HEADER_LEN + SALT_LEN + NONCE_LEN + self.ciphertext.len());
        out.push(VAULT_FORMAT_VERSION);
        let (tag, fields) = match self.kdf {
            KdfParams::Argon2id {
                memory_kib,
                time_cost,
                parallelism,
            } => (KDF_TAG_ARGON2ID, [memory_kib, time_cost, parallelism]),
            KdfParams::Pbkdf2Sha256 { iterations } => (KDF_TAG_PBKDF2_SHA256, [iterations, 0, 0]),
        };
        out.push(tag);
        for field in fields {
            out.extend_from_slice(&field.to_be_bytes());
        }
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse `header ‖ salt ‖ nonce ‖ ciphertext`. A short payload, an
    /// unknown format or KDF outside the supported bounds fails like any
    /// other damaged blob.
    pub fn from_bytes(bytes: &[u8]) -> VaultResult<Self> {
        if bytes.len() < MIN_BLOB_LEN || bytes[0] != VAULT_FORMAT_VERSION {
            return Err(VaultError::Decryption);
        }
        let field = |i: usize| {
            let start = 2 + i * 4;
            let mut raw = [0u8; 4];
            raw.copy_from_slice(&bytes[start..start + 4]);
            u32::from_be_bytes(raw)
        };
        let kdf = match bytes[1] {
            KDF_TAG_ARGON2ID => KdfParams::argon2id(field(0), field(1), field(2)),
            KDF_TAG_PBKDF2_SHA256 => KdfParams::pbkdf2(field(0)),
            _ => return Err(VaultError::Decryption),
        };
        if let Err(e) = kdf.check_bounds() {
            log::warn!("Rejected backup header: {}", e);
            return Err(VaultError::Decryption);
        }

        let (salt, rest) = bytes[BLOB_HEADER_LEN..].split_at(SALT_LEN);
        let (nonce, ciphertext) = rest.split_at(NONCE_LEN);

        let mut blob = Self {
            kdf,
            salt: [0u8; SALT_LEN],
            nonce: [0u8; NONCE_LEN],
            ciphertext: ciphertext.to_vec(),
        };
        blob.salt.copy_from_slice(salt);
        blob.nonce.copy_from_slice(nonce);
        Ok(blob)
    }

    /// Standard base64 of [`VaultBlob::to_bytes`], the form users keep
    pub fn to_transport_string(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    pub fn from_transport_string(transport: &str) -> VaultResult<Self> {
        let bytes = STANDARD.decode(transport.trim().as_bytes())?;
        Self::from_bytes(&bytes)
    }
}

// ═══════════════════════════════════════════════════════════════
// IMPORT PHASES
// ═══════════════════════════════════════════════════════════════

/// Progress of a restore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    Idle,
    Decrypting,
    /// Wrong passphrase or damaged blob; nothing was changed
    AuthFailed,
    SchemaRebuild,
    BulkInsert,
    Committed,
    /// Failure after the old partition was removed
    TransactionFailed,
}

impl std::fmt::Display for ImportPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Decrypting => "decrypting",
            Self::AuthFailed => "auth-failed",
            Self::SchemaRebuild => "schema-rebuild",
            Self::BulkInsert => "bulk-insert",
            Self::Committed => "committed",
            Self::TransactionFailed => "transaction-failed",
        };
        f.write_str(name)
    }
}

// ═══════════════════════════════════════════════════════════════
// DATABASE VAULT
// ═══════════════════════════════════════════════════════════════

/// Whole-partition export and import
#[derive(Debug, Clone)]
pub struct DatabaseVault {
    partitions: PartitionManager,
    locks: PartitionLocks,
    kdf: KdfParams,
    retry: RetryPolicy,
}

impl DatabaseVault {
    pub fn new(partitions: PartitionManager, locks: PartitionLocks, kdf: KdfParams) -> Self {
        Self {
            partitions,
            locks,
            kdf,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Seal the full content of partition `name` under `passphrase`
    pub fn export_vault(&self, name: &str, passphrase: &str) -> VaultResult<VaultBlob> {
        let _guard = self.retry.run(|| self.locks.try_acquire(name))?;
        let partition = self.retry.run(|| self.partitions.open(name))?;
        let snapshot = VaultSnapshot::capture(&partition)?;
        drop(partition);

        let plaintext = SecretBytes::new(serde_json::to_vec(&snapshot)?);
        let salt = generate_salt();
        let key = derive_key(passphrase, &salt, &self.kdf)?;
        let nonce = generate_nonce();
        let ciphertext = seal(VAULT_CIPHER, &key, &nonce, plaintext.as_slice())?;

        log::info!(
            "Exported partition {} ({} collections, {} records)",
            name,
            snapshot.collections.len(),
            snapshot.record_count()
        );

        Ok(VaultBlob {
            kdf: self.kdf,
            salt,
            nonce,
            ciphertext,
        })
    }

    /// Authenticate and parse a blob without touching storage
    pub fn open_snapshot(&self, blob: &VaultBlob, passphrase: &str) -> VaultResult<VaultSnapshot> {
        if blob.kdf.check_bounds().is_err() {
            return Err(VaultError::Decryption);
        }
        let key = derive_key(passphrase, &blob.salt, &blob.kdf).map_err(|e| match e {
            VaultError::InvalidInput(msg) => VaultError::InvalidInput(msg),
            _ => VaultError::Decryption,
        })?;
        let plaintext = open(VAULT_CIPHER, &key, &blob.nonce, &blob.ciphertext)?;
        let snapshot: VaultSnapshot = serde_json::from_slice(plaintext.as_slice())?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Restore a backup, replacing the partition it names
    pub fn import_vault(&self, blob: &VaultBlob, passphrase: &str) -> VaultResult<String> {
        self.import_vault_observed(blob, passphrase, |_| {})
    }

    /// Parse a transport string and restore it
    pub fn import_transport(&self, transport: &str, passphrase: &str) -> VaultResult<String> {
        let blob = VaultBlob::from_transport_string(transport)?;
        self.import_vault(&blob, passphrase)
    }

    /// [`DatabaseVault::import_vault`] reporting each phase to `observer`
    pub fn import_vault_observed<F>(
        &self,
        blob: &VaultBlob,
        passphrase: &str,
        mut observer: F,
    ) -> VaultResult<String>
    where
        F: FnMut(ImportPhase),
    {
        let mut phase = |p: ImportPhase| {
            log::debug!("Import phase: {}", p);
            observer(p);
        };

        phase(ImportPhase::Idle);
        phase(ImportPhase::Decrypting);
        let snapshot = match self.open_snapshot(blob, passphrase) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                if matches!(e, VaultError::Decryption) {
                    phase(ImportPhase::AuthFailed);
                }
                log::warn!("Import rejected before any change: {}", e);
                return Err(e);
            }
        };
        let name = snapshot.partition_name.clone();

        let _guard = self.retry.run(|| self.locks.try_acquire(&name))?;

        phase(ImportPhase::SchemaRebuild);
        let restored = self
            .partitions
            .delete(&name)
            .and_then(|_| self.partitions.create(&name, snapshot.schema_version, &snapshot.schemas()))
            .and_then(|partition| {
                phase(ImportPhase::BulkInsert);
                insert_snapshot(&partition, &snapshot)
            });

        match restored {
            Ok(count) => {
                phase(ImportPhase::Committed);
                log::info!("Imported partition {} ({} records)", name, count);
                Ok(name)
            }
            Err(e) => {
                phase(ImportPhase::TransactionFailed);
                log::error!("Import of {} failed after the old partition was removed: {}", name, e);
                if let Err(cleanup) = self.partitions.delete(&name) {
                    log::warn!("Could not remove partial partition {}: {}", name, cleanup);
                }
                Err(VaultError::TransactionFailed {
                    partition: name,
                    reason: e.to_string(),
                    transport: blob.to_transport_string(),
                })
            }
        }
    }
}

/// Insert every record of `snapshot` in one transaction
fn insert_snapshot(partition: &Partition, snapshot: &VaultSnapshot) -> VaultResult<usize> {
    partition.write(|w| {
        let mut count = 0;
        for (collection, records) in &snapshot.records {
            let keys = snapshot.keys.get(collection);
            for (i, record) in records.iter().enumerate() {
                match keys.and_then(|k| k.get(i)) {
                    Some(key) => w.add_with_key(collection, key.clone(), record.clone())?,
                    None => w.add(collection, record.clone())?,
                };
                count += 1;
            }
        }
        Ok(count)
    })
}
