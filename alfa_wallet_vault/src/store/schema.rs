//! ALFA Wallet Vault - Collection Schemas
//!
//! Key paths, auto-increment and secondary index definitions for the
//! collections of a partition, plus the key helpers that act on JSON records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{VaultError, VaultResult};

/// Secondary index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSchema {
    /// Dot-separated path into the record
    pub key_path: String,
    #[serde(default)]
    pub unique: bool,
    /// Index every element of an array value separately
    #[serde(default)]
    pub multi_entry: bool,
}

impl IndexSchema {
    pub fn new(key_path: &str) -> Self {
        Self {
            key_path: key_path.to_string(),
            unique: false,
            multi_entry: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn multi_entry(mut self) -> Self {
        self.multi_entry = true;
        self
    }
}

/// Object collection definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSchema {
    #[serde(skip)]
    pub name: String,
    /// In-line key path; `None` means keys are supplied out of line
    pub key_path: Option<String>,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub indexes: BTreeMap<String, IndexSchema>,
}

impl CollectionSchema {
    /// Collection keyed by `key_path` inside each record
    pub fn keyed(name: &str, key_path: &str) -> Self {
        Self {
            name: name.to_string(),
            key_path: Some(key_path.to_string()),
            auto_increment: false,
            indexes: BTreeMap::new(),
        }
    }

    /// Collection with out-of-line keys
    pub fn out_of_line(name: &str) -> Self {
        Self {
            name: name.to_string(),
            key_path: None,
            auto_increment: false,
            indexes: BTreeMap::new(),
        }
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn with_index(mut self, name: &str, index: IndexSchema) -> Self {
        self.indexes.insert(name.to_string(), index);
        self
    }

    /// Check names and paths before the schema reaches storage
    pub fn validate(&self) -> VaultResult<()> {
        if self.name.is_empty() || self.name.starts_with("__") {
            return Err(VaultError::InvalidInput(format!(
                "invalid collection name '{}'",
                self.name
            )));
        }
        if let Some(path) = &self.key_path {
            validate_key_path(path)?;
        }
        for (name, index) in &self.indexes {
            if name.is_empty() {
                return Err(VaultError::InvalidInput("index name is empty".into()));
            }
            validate_key_path(&index.key_path)?;
        }
        Ok(())
    }
}

fn validate_key_path(path: &str) -> VaultResult<()> {
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(VaultError::InvalidInput(format!("invalid key path '{}'", path)));
    }
    Ok(())
}

/// Look up a dot-separated path inside a record
pub fn value_at_path<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |current, segment| current.get(segment))
}

/// Write `value` at a dot-separated path, creating intermediate objects
pub fn set_value_at_path(record: &mut Value, path: &str, value: Value) -> VaultResult<()> {
    let mut current = record;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let object = current.as_object_mut().ok_or_else(|| {
            VaultError::InvalidInput(format!("cannot set key path '{}' on a non-object", path))
        })?;
        if segments.peek().is_none() {
            object.insert(segment.to_string(), value);
            return Ok(());
        }
        current = object
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    Ok(())
}

/// Whether `value` can serve as a record or index key
pub fn is_valid_key(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Number(n) => n.as_f64().map(f64::is_finite).unwrap_or(false),
        _ => false,
    }
}

/// Canonical text form used as the storage key
pub fn encode_key(value: &Value) -> VaultResult<String> {
    if !is_valid_key(value) {
        return Err(VaultError::InvalidInput(format!(
            "unsupported key type: {}",
            value
        )));
    }
    Ok(value.to_string())
}

/// Numeric sort helper: numbers order before strings, like IndexedDB
pub fn numeric_key(value: &Value) -> Option<f64> {
    value.as_f64()
}
