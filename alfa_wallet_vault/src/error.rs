//! ALFA Wallet Vault - Error Types

use thiserror::Error;

/// Result type for vault operations
pub type VaultResult<T> = Result<T, VaultError>;

/// Message shown for every authentication failure.
///
/// Wrong passphrase and corrupted ciphertext both map to it.
pub const DECRYPTION_MESSAGE: &str = "Incorrect passphrase or corrupted data";

/// Vault error types
#[derive(Error, Debug)]
pub enum VaultError {
    // ═══════════════════════════════════════════════════════════════
    // INPUT ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ═══════════════════════════════════════════════════════════════
    // CRYPTO ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Incorrect passphrase or corrupted data")]
    Decryption,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // ═══════════════════════════════════════════════════════════════
    // STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Database busy, try again: {0}")]
    PartitionLoad(String),

    #[error("Partition not found: {0}")]
    PartitionNotFound(String),

    #[error("Partition already exists: {0}")]
    PartitionExists(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    // ═══════════════════════════════════════════════════════════════
    // BACKUP ERRORS
    // ═══════════════════════════════════════════════════════════════

    /// Raised after the old partition was already deleted. The transport
    /// string is handed back so the caller can retry the restore.
    #[error("Restore of '{partition}' failed after the old data was removed: {reason}")]
    TransactionFailed {
        partition: String,
        reason: String,
        transport: String,
    },

    // ═══════════════════════════════════════════════════════════════
    // IMAGE CARRIER ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Not a valid backup image")]
    NotFound,

    #[error("Image processing error: {0}")]
    ImageError(String),

    // ═══════════════════════════════════════════════════════════════
    // SESSION ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Session is locked")]
    SessionLocked,

    #[error("Session busy: {0}")]
    SessionBusy(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    // ═══════════════════════════════════════════════════════════════
    // CONFIG / SERIALIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl VaultError {
    /// Check if this is a security-critical error
    pub fn is_security_critical(&self) -> bool {
        matches!(
            self,
            VaultError::Decryption | VaultError::TransactionFailed { .. }
        )
    }

    /// Storage contention; the same call may succeed after a short wait
    pub fn is_retryable(&self) -> bool {
        matches!(self, VaultError::PartitionLoad(_))
    }

    /// Whether user data was irrecoverably removed from local storage
    pub fn is_data_loss(&self) -> bool {
        matches!(self, VaultError::TransactionFailed { .. })
    }

    /// The backup transport string, if the error carries it back
    pub fn recovered_transport(&self) -> Option<&str> {
        match self {
            VaultError::TransactionFailed { transport, .. } => Some(transport),
            _ => None,
        }
    }

    /// Short text suitable for showing to the end user
    pub fn user_message(&self) -> String {
        match self {
            VaultError::Decryption => DECRYPTION_MESSAGE.to_string(),
            VaultError::NotFound => "Not a valid backup image".to_string(),
            VaultError::PartitionLoad(_) => "Database busy, try again".to_string(),
            VaultError::TransactionFailed { partition, .. } => format!(
                "Restore failed and the previous data of '{}' was already removed. \
                 Keep your backup file and try the import again.",
                partition
            ),
            other => other.to_string(),
        }
    }
}

impl From<rusqlite::Error> for VaultError {
    fn from(e: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match e.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                VaultError::PartitionLoad(e.to_string())
            }
            Some(ErrorCode::ConstraintViolation) => VaultError::ConstraintViolation(e.to_string()),
            _ => VaultError::DatabaseError(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            VaultError::DeserializationError(e.to_string())
        } else {
            VaultError::SerializationError(e.to_string())
        }
    }
}

impl From<image::ImageError> for VaultError {
    fn from(e: image::ImageError) -> Self {
        VaultError::ImageError(e.to_string())
    }
}

impl From<tokio::task::JoinError> for VaultError {
    fn from(e: tokio::task::JoinError) -> Self {
        VaultError::TaskFailed(e.to_string())
    }
}

impl From<base64::DecodeError> for VaultError {
    fn from(e: base64::DecodeError) -> Self {
        VaultError::InvalidInput(format!("invalid base64: {}", e))
    }
}
