//! ALFA Wallet Vault - Partition Store
//!
//! Local structured storage. Every account owns one partition, an SQLite
//! file named after its handle under the data directory.

pub mod locks;
pub mod partition;
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

pub use locks::{retry_busy, PartitionGuard, PartitionLocks, RetryPolicy};
pub use partition::{Partition, PartitionWriter};
pub use schema::{CollectionSchema, IndexSchema};

use crate::error::{VaultError, VaultResult};

/// File extension of partition databases
pub const PARTITION_EXT: &str = "db";

/// Longest accepted partition name
pub const MAX_PARTITION_NAME: usize = 128;

/// Files SQLite may leave next to a database
const SIDECAR_SUFFIXES: [&str; 3] = ["-journal", "-wal", "-shm"];

/// Creates, opens and deletes partitions under one root directory
#[derive(Debug, Clone)]
pub struct PartitionManager {
    root: PathBuf,
}

impl PartitionManager {
    /// Use `root` as the data directory, creating it if needed
    pub fn new(root: impl Into<PathBuf>) -> VaultResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Database path for a partition name
    pub fn path_for(&self, name: &str) -> VaultResult<PathBuf> {
        validate_partition_name(name)?;
        Ok(self.root.join(format!("{}.{}", name, PARTITION_EXT)))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.exists()).unwrap_or(false)
    }

    /// Create a new partition at `version` with `schemas`
    pub fn create(
        &self,
        name: &str,
        version: u32,
        schemas: &[CollectionSchema],
    ) -> VaultResult<Partition> {
        self.create_seeded(name, version, schemas, |_| Ok(()))
    }

    /// Create a partition and write its first records in the same transaction.
    /// If `seed` fails the partition does not exist afterwards.
    pub fn create_seeded<F>(
        &self,
        name: &str,
        version: u32,
        schemas: &[CollectionSchema],
        seed: F,
    ) -> VaultResult<Partition>
    where
        F: FnOnce(&PartitionWriter<'_>) -> VaultResult<()>,
    {
        let path = self.path_for(name)?;
        if path.exists() {
            return Err(VaultError::PartitionExists(name.to_string()));
        }

        match Partition::create(&path, name, version, schemas, seed) {
            Ok(partition) => {
                log::debug!("Created partition {} at version {}", name, version);
                Ok(partition)
            }
            Err(e) => {
                // Leave nothing behind for a half-initialized file
                remove_database_files(&path)?;
                Err(e)
            }
        }
    }

    /// Open an existing partition
    pub fn open(&self, name: &str) -> VaultResult<Partition> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(VaultError::PartitionNotFound(name.to_string()));
        }
        Partition::open(&path, name)
    }

    /// Delete a partition and its sidecar files. Returns whether it existed.
    pub fn delete(&self, name: &str) -> VaultResult<bool> {
        let path = self.path_for(name)?;
        let existed = path.exists();
        remove_database_files(&path)?;
        if existed {
            log::info!("Deleted partition {}", name);
        }
        Ok(existed)
    }

    /// Names of all partitions, sorted
    pub fn list(&self) -> VaultResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PARTITION_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_partition_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Partition names become file names: `[A-Za-z0-9_-]`, 1 to 128 chars
pub fn validate_partition_name(name: &str) -> VaultResult<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_PARTITION_NAME
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if !valid {
        return Err(VaultError::InvalidInput(format!(
            "invalid partition name '{}'",
            name
        )));
    }
    Ok(())
}

fn remove_database_files(path: &Path) -> VaultResult<()> {
    remove_if_exists(path)?;
    for suffix in SIDECAR_SUFFIXES {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(suffix);
        remove_if_exists(Path::new(&sidecar))?;
    }
    Ok(())
}

fn remove_if_exists(path: &Path) -> VaultResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
