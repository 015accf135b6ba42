//! ALFA Wallet Vault - Partition
//!
//! One SQLite file holding named collections of JSON records. Each
//! collection has an optional key path, an optional key generator and any
//! number of secondary indexes.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use serde_json::{json, Value};

use super::schema::{
    encode_key, is_valid_key, numeric_key, set_value_at_path, value_at_path, CollectionSchema,
    IndexSchema,
};
use crate::error::{VaultError, VaultResult};

/// How long a connection waits on a lock held by another connection
const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

const PARTITION_TABLES: &str = r#"
    CREATE TABLE IF NOT EXISTS __partition (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        name TEXT NOT NULL,
        version INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS __collections (
        name TEXT PRIMARY KEY,
        definition TEXT NOT NULL,
        next_key INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS __records (
        collection TEXT NOT NULL,
        record_key TEXT NOT NULL,
        sort_num REAL,
        data TEXT NOT NULL,
        PRIMARY KEY (collection, record_key)
    );

    CREATE TABLE IF NOT EXISTS __index_entries (
        collection TEXT NOT NULL,
        index_name TEXT NOT NULL,
        index_key TEXT NOT NULL,
        record_key TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_entries_lookup
        ON __index_entries(collection, index_name, index_key);
    CREATE INDEX IF NOT EXISTS idx_entries_record
        ON __index_entries(collection, record_key);
"#;

const ORDER_BY_KEY: &str = "ORDER BY r.sort_num IS NULL, r.sort_num, r.record_key";

#[derive(Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    /// Insert or replace
    Put,
    /// Insert only; an existing key is a constraint violation
    Add,
}

/// An open partition
#[derive(Debug)]
pub struct Partition {
    name: String,
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl Partition {
    /// Create a fresh partition file with its collections.
    ///
    /// `seed` writes initial records inside the transaction that creates the
    /// schema, so a failed seed leaves no committed partition.
    pub(crate) fn create<F>(
        path: &Path,
        name: &str,
        version: u32,
        schemas: &[CollectionSchema],
        seed: F,
    ) -> VaultResult<Self>
    where
        F: FnOnce(&PartitionWriter<'_>) -> VaultResult<()>,
    {
        let mut conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let tx = conn.transaction()?;
        tx.execute_batch(PARTITION_TABLES)?;
        tx.execute(
            "INSERT INTO __partition (id, name, version, created_at) VALUES (1, ?1, ?2, ?3)",
            params![name, version, Utc::now().to_rfc3339()],
        )?;
        for schema in schemas {
            insert_collection(&tx, schema)?;
        }
        seed(&PartitionWriter { conn: &tx })?;
        tx.commit()?;

        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    /// Open an existing partition file
    pub(crate) fn open(path: &Path, name: &str) -> VaultResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let stored: String =
            conn.query_row("SELECT name FROM __partition WHERE id = 1", [], |row| row.get(0))?;
        if stored != name {
            return Err(VaultError::DatabaseError(format!(
                "partition file {} belongs to '{}'",
                path.display(),
                stored
            )));
        }

        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Schema version the partition was created or last upgraded at
    pub fn version(&self) -> VaultResult<u32> {
        let conn = self.conn.lock();
        let version = conn.query_row("SELECT version FROM __partition WHERE id = 1", [], |row| {
            row.get(0)
        })?;
        Ok(version)
    }

    pub fn set_version(&self, version: u32) -> VaultResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "UPDATE __partition SET version = ?1 WHERE id = 1",
            params![version],
        )?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════
    // SCHEMA
    // ═══════════════════════════════════════════════════════════════

    /// Collection names in lexical order
    pub fn collection_names(&self) -> VaultResult<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT name FROM __collections ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn schema(&self, collection: &str) -> VaultResult<CollectionSchema> {
        let conn = self.conn.lock();
        load_schema(&conn, collection).map(|(schema, _)| schema)
    }

    /// Every collection schema, keyed by name
    pub fn schemas(&self) -> VaultResult<BTreeMap<String, CollectionSchema>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT name, definition FROM __collections ORDER BY name")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut schemas = BTreeMap::new();
        for (name, definition) in rows {
            let mut schema: CollectionSchema = serde_json::from_str(&definition)?;
            schema.name = name.clone();
            schemas.insert(name, schema);
        }
        Ok(schemas)
    }

    pub fn create_collection(&self, schema: &CollectionSchema) -> VaultResult<()> {
        let conn = self.conn.lock();
        insert_collection(&conn, schema)
    }

    // ═══════════════════════════════════════════════════════════════
    // WRITES
    // ═══════════════════════════════════════════════════════════════

    /// Insert or replace a record with an in-line or generated key
    pub fn put(&self, collection: &str, record: Value) -> VaultResult<Value> {
        self.write(|w| w.put(collection, record))
    }

    /// Insert or replace a record under an out-of-line key
    pub fn put_with_key(&self, collection: &str, key: Value, record: Value) -> VaultResult<Value> {
        self.write(|w| w.put_with_key(collection, key, record))
    }

    /// Insert a record; fails if its key already exists
    pub fn add(&self, collection: &str, record: Value) -> VaultResult<Value> {
        self.write(|w| w.add(collection, record))
    }

    /// Remove one record. Returns whether it existed.
    pub fn delete(&self, collection: &str, key: &Value) -> VaultResult<bool> {
        self.write(|w| w.delete(collection, key))
    }

    /// Remove every record of a collection
    pub fn clear(&self, collection: &str) -> VaultResult<()> {
        self.write(|w| w.clear(collection))
    }

    /// Insert many records into one collection in a single transaction
    pub fn bulk_insert(&self, collection: &str, records: Vec<Value>) -> VaultResult<usize> {
        self.write(|w| {
            let count = records.len();
            for record in records {
                w.add(collection, record)?;
            }
            Ok(count)
        })
    }

    /// Run several writes as one transaction; any error rolls all of them back
    pub fn write<T, F>(&self, f: F) -> VaultResult<T>
    where
        F: FnOnce(&PartitionWriter<'_>) -> VaultResult<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&PartitionWriter { conn: &tx })?;
        tx.commit()?;
        Ok(result)
    }

    // ═══════════════════════════════════════════════════════════════
    // READS
    // ═══════════════════════════════════════════════════════════════

    pub fn get(&self, collection: &str, key: &Value) -> VaultResult<Option<Value>> {
        let conn = self.conn.lock();
        load_schema(&conn, collection)?;
        let encoded = encode_key(key)?;

        let data: Option<String> = conn
            .query_row(
                "SELECT data FROM __records WHERE collection = ?1 AND record_key = ?2",
                params![collection, encoded],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|text| serde_json::from_str(&text).map_err(VaultError::from))
            .transpose()
    }

    /// All records in key order
    pub fn get_all(&self, collection: &str) -> VaultResult<Vec<Value>> {
        Ok(self
            .get_all_entries(collection)?
            .into_iter()
            .map(|(_, record)| record)
            .collect())
    }

    /// All `(key, record)` pairs in key order
    pub fn get_all_entries(&self, collection: &str) -> VaultResult<Vec<(Value, Value)>> {
        let conn = self.conn.lock();
        load_schema(&conn, collection)?;

        let sql = format!(
            "SELECT r.record_key, r.data FROM __records r WHERE r.collection = ?1 {}",
            ORDER_BY_KEY
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(key, data)| -> VaultResult<(Value, Value)> {
                Ok((serde_json::from_str(&key)?, serde_json::from_str(&data)?))
            })
            .collect()
    }

    /// Records whose index value equals `value`
    pub fn find_by_index(
        &self,
        collection: &str,
        index: &str,
        value: &Value,
    ) -> VaultResult<Vec<Value>> {
        let conn = self.conn.lock();
        let (schema, _) = load_schema(&conn, collection)?;
        if !schema.indexes.contains_key(index) {
            return Err(VaultError::InvalidInput(format!(
                "index '{}' not found on '{}'",
                index, collection
            )));
        }
        let encoded = encode_key(value)?;

        let sql = format!(
            "SELECT r.data FROM __index_entries e
             INNER JOIN __records r
                ON r.collection = e.collection AND r.record_key = e.record_key
             WHERE e.collection = ?1 AND e.index_name = ?2 AND e.index_key = ?3 {}",
            ORDER_BY_KEY
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![collection, index, encoded], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|data| serde_json::from_str(data).map_err(VaultError::from))
            .collect()
    }

    pub fn count(&self, collection: &str) -> VaultResult<usize> {
        let conn = self.conn.lock();
        load_schema(&conn, collection)?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM __records WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Write access inside a [`Partition::write`] or creation transaction
pub struct PartitionWriter<'a> {
    conn: &'a Connection,
}

impl PartitionWriter<'_> {
    pub fn put(&self, collection: &str, record: Value) -> VaultResult<Value> {
        write_record(self.conn, collection, None, record, WriteMode::Put)
    }

    pub fn put_with_key(&self, collection: &str, key: Value, record: Value) -> VaultResult<Value> {
        write_record(self.conn, collection, Some(key), record, WriteMode::Put)
    }

    pub fn add(&self, collection: &str, record: Value) -> VaultResult<Value> {
        write_record(self.conn, collection, None, record, WriteMode::Add)
    }

    pub fn add_with_key(&self, collection: &str, key: Value, record: Value) -> VaultResult<Value> {
        write_record(self.conn, collection, Some(key), record, WriteMode::Add)
    }

    pub fn delete(&self, collection: &str, key: &Value) -> VaultResult<bool> {
        load_schema(self.conn, collection)?;
        let encoded = encode_key(key)?;
        self.conn.execute(
            "DELETE FROM __index_entries WHERE collection = ?1 AND record_key = ?2",
            params![collection, encoded],
        )?;
        let removed = self.conn.execute(
            "DELETE FROM __records WHERE collection = ?1 AND record_key = ?2",
            params![collection, encoded],
        )?;
        Ok(removed > 0)
    }

    pub fn clear(&self, collection: &str) -> VaultResult<()> {
        load_schema(self.conn, collection)?;
        self.conn.execute(
            "DELETE FROM __index_entries WHERE collection = ?1",
            params![collection],
        )?;
        self.conn
            .execute("DELETE FROM __records WHERE collection = ?1", params![collection])?;
        Ok(())
    }
}

fn insert_collection(conn: &Connection, schema: &CollectionSchema) -> VaultResult<()> {
    schema.validate()?;
    let definition = serde_json::to_string(schema)?;
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO __collections (name, definition, next_key) VALUES (?1, ?2, 1)",
        params![schema.name, definition],
    )?;
    if inserted == 0 {
        return Err(VaultError::ConstraintViolation(format!(
            "collection '{}' already exists",
            schema.name
        )));
    }
    Ok(())
}

fn load_schema(conn: &Connection, collection: &str) -> VaultResult<(CollectionSchema, i64)> {
    let row: Option<(String, i64)> = conn
        .query_row(
            "SELECT definition, next_key FROM __collections WHERE name = ?1",
            params![collection],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    let (definition, next_key) =
        row.ok_or_else(|| VaultError::CollectionNotFound(collection.to_string()))?;
    let mut schema: CollectionSchema = serde_json::from_str(&definition)?;
    schema.name = collection.to_string();
    Ok((schema, next_key))
}

fn write_record(
    conn: &Connection,
    collection: &str,
    explicit_key: Option<Value>,
    mut record: Value,
    mode: WriteMode,
) -> VaultResult<Value> {
    let (schema, next_key) = load_schema(conn, collection)?;

    let key = match (&schema.key_path, explicit_key) {
        (Some(_), Some(_)) => {
            return Err(VaultError::InvalidInput(format!(
                "'{}' uses in-line keys; an explicit key is not allowed",
                collection
            )))
        }
        (Some(path), None) => match value_at_path(&record, path).cloned() {
            Some(value) if is_valid_key(&value) => value,
            Some(value) => {
                return Err(VaultError::InvalidInput(format!(
                    "record key at '{}' is not a valid key: {}",
                    path, value
                )))
            }
            None if schema.auto_increment => {
                let generated = json!(next_key);
                set_value_at_path(&mut record, path, generated.clone())?;
                generated
            }
            None => {
                return Err(VaultError::InvalidInput(format!(
                    "record has no key at '{}'",
                    path
                )))
            }
        },
        (None, Some(key)) => key,
        (None, None) if schema.auto_increment => json!(next_key),
        (None, None) => {
            return Err(VaultError::InvalidInput(format!(
                "'{}' uses out-of-line keys; a key is required",
                collection
            )))
        }
    };

    let encoded = encode_key(&key)?;

    if schema.auto_increment {
        if let Some(n) = key.as_f64() {
            let candidate = n.floor() as i64 + 1;
            if candidate > next_key {
                conn.execute(
                    "UPDATE __collections SET next_key = ?1 WHERE name = ?2",
                    params![candidate, collection],
                )?;
            }
        }
    }

    if mode == WriteMode::Add {
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM __records WHERE collection = ?1 AND record_key = ?2",
                params![collection, encoded],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(VaultError::ConstraintViolation(format!(
                "key {} already exists in '{}'",
                encoded, collection
            )));
        }
    }

    let mut entries = Vec::new();
    for (index_name, index) in &schema.indexes {
        for index_key in index_keys(&record, index) {
            if index.unique {
                let taken: Option<String> = conn
                    .query_row(
                        "SELECT record_key FROM __index_entries
                         WHERE collection = ?1 AND index_name = ?2 AND index_key = ?3
                           AND record_key != ?4
                         LIMIT 1",
                        params![collection, index_name, index_key, encoded],
                        |row| row.get(0),
                    )
                    .optional()?;
                if taken.is_some() {
                    return Err(VaultError::ConstraintViolation(format!(
                        "unique index '{}' on '{}' already has {}",
                        index_name, collection, index_key
                    )));
                }
            }
            entries.push((index_name.as_str(), index_key));
        }
    }

    conn.execute(
        "DELETE FROM __index_entries WHERE collection = ?1 AND record_key = ?2",
        params![collection, encoded],
    )?;
    conn.execute(
        "INSERT OR REPLACE INTO __records (collection, record_key, sort_num, data)
         VALUES (?1, ?2, ?3, ?4)",
        params![collection, encoded, numeric_key(&key), serde_json::to_string(&record)?],
    )?;
    for (index_name, index_key) in entries {
        conn.execute(
            "INSERT INTO __index_entries (collection, index_name, index_key, record_key)
             VALUES (?1, ?2, ?3, ?4)",
            params![collection, index_name, index_key, encoded],
        )?;
    }

    Ok(key)
}

/// Encoded index keys a record contributes to `index`
fn index_keys(record: &Value, index: &IndexSchema) -> Vec<String> {
    let mut keys: Vec<String> = match value_at_path(record, &index.key_path) {
        Some(Value::Array(items)) if index.multi_entry => items
            .iter()
            .filter(|item| is_valid_key(item))
            .map(Value::to_string)
            .collect(),
        Some(value) if is_valid_key(value) => vec![value.to_string()],
        _ => Vec::new(),
    };
    keys.sort();
    keys.dedup();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn wallets_schema() -> CollectionSchema {
        CollectionSchema::keyed("wallets", "id")
            .with_index("network", IndexSchema::new("network"))
            .with_index("address", IndexSchema::new("address").unique())
            .with_index("tags", IndexSchema::new("tags").multi_entry())
    }

    fn create(dir: &Path) -> Partition {
        Partition::create(
            &dir.join("p.db"),
            "p",
            3,
            &[
                wallets_schema(),
                CollectionSchema::keyed("events", "seq").auto_increment(),
                CollectionSchema::out_of_line("settings"),
            ],
            |_| Ok(()),
        )
        .unwrap()
    }

    #[test]
    fn test_create_and_reopen() {
        let dir = tempdir().unwrap();
        let partition = create(dir.path());
        partition
            .put("wallets", json!({"id": "w1", "network": "eth", "address": "0x1"}))
            .unwrap();
        drop(partition);

        let reopened = Partition::open(&dir.path().join("p.db"), "p").unwrap();
        assert_eq!(reopened.version().unwrap(), 3);
        assert_eq!(
            reopened.collection_names().unwrap(),
            vec!["events", "settings", "wallets"]
        );
        assert_eq!(reopened.schema("wallets").unwrap(), wallets_schema());
        assert_eq!(reopened.count("wallets").unwrap(), 1);
        assert!(Partition::open(&dir.path().join("p.db"), "other").is_err());
    }

    #[test]
    fn test_put_get_delete() {
        let dir = tempdir().unwrap();
        let partition = create(dir.path());
        let key = partition
            .put("wallets", json!({"id": "w1", "network": "eth", "address": "0x1"}))
            .unwrap();
        assert_eq!(key, json!("w1"));

        let record = partition.get("wallets", &json!("w1")).unwrap().unwrap();
        assert_eq!(record["network"], "eth");

        assert!(partition.delete("wallets", &json!("w1")).unwrap());
        assert!(!partition.delete("wallets", &json!("w1")).unwrap());
        assert!(partition.get("wallets", &json!("w1")).unwrap().is_none());
    }

    #[test]
    fn test_add_rejects_existing_key() {
        let dir = tempdir().unwrap();
        let partition = create(dir.path());
        partition.add("wallets", json!({"id": "w1", "address": "a"})).unwrap();
        let err = partition
            .add("wallets", json!({"id": "w1", "address": "b"}))
            .unwrap_err();
        assert!(matches!(err, VaultError::ConstraintViolation(_)));
        // put replaces
        partition.put("wallets", json!({"id": "w1", "address": "b"})).unwrap();
        assert_eq!(partition.count("wallets").unwrap(), 1);
    }

    #[test]
    fn test_unique_index() {
        let dir = tempdir().unwrap();
        let partition = create(dir.path());
        partition.put("wallets", json!({"id": "w1", "address": "0xaa"})).unwrap();
        let err = partition
            .put("wallets", json!({"id": "w2", "address": "0xaa"}))
            .unwrap_err();
        assert!(matches!(err, VaultError::ConstraintViolation(_)));
        // the same record may keep its own value
        partition
            .put("wallets", json!({"id": "w1", "address": "0xaa", "label": "x"}))
            .unwrap();
    }

    #[test]
    fn test_find_by_index_and_multi_entry() {
        let dir = tempdir().unwrap();
        let partition = create(dir.path());
        partition
            .put("wallets", json!({"id": "a", "network": "eth", "tags": ["hot", "main"]}))
            .unwrap();
        partition
            .put("wallets", json!({"id": "b", "network": "btc", "tags": ["cold"]}))
            .unwrap();
        partition
            .put("wallets", json!({"id": "c", "network": "eth", "tags": ["hot", "hot"]}))
            .unwrap();

        let eth = partition.find_by_index("wallets", "network", &json!("eth")).unwrap();
        assert_eq!(eth.len(), 2);
        assert_eq!(eth[0]["id"], "a");
        assert_eq!(eth[1]["id"], "c");

        let hot = partition.find_by_index("wallets", "tags", &json!("hot")).unwrap();
        assert_eq!(hot.len(), 2);

        // replacing a record drops its stale index entries
        partition
            .put("wallets", json!({"id": "a", "network": "sol", "tags": []}))
            .unwrap();
        assert_eq!(
            partition.find_by_index("wallets", "network", &json!("eth")).unwrap().len(),
            1
        );
        assert!(partition.find_by_index("wallets", "missing", &json!(1)).is_err());
    }

    #[test]
    fn test_auto_increment() {
        let dir = tempdir().unwrap();
        let partition = create(dir.path());
        assert_eq!(partition.add("events", json!({"kind": "a"})).unwrap(), json!(1));
        assert_eq!(partition.add("events", json!({"kind": "b"})).unwrap(), json!(2));
        partition.add("events", json!({"seq": 10, "kind": "c"})).unwrap();
        assert_eq!(partition.add("events", json!({"kind": "d"})).unwrap(), json!(11));

        let all = partition.get_all("events").unwrap();
        let seqs: Vec<_> = all.iter().map(|r| r["seq"].as_i64().unwrap()).collect();
        assert_eq!(seqs, vec![1, 2, 10, 11]);
    }

    #[test]
    fn test_out_of_line_keys() {
        let dir = tempdir().unwrap();
        let partition = create(dir.path());
        partition
            .put_with_key("settings", json!("theme"), json!("dark"))
            .unwrap();
        assert!(partition.put("settings", json!("x")).is_err());
        assert!(partition
            .put_with_key("wallets", json!("k"), json!({"id": "k"}))
            .is_err());

        let entries = partition.get_all_entries("settings").unwrap();
        assert_eq!(entries, vec![(json!("theme"), json!("dark"))]);
    }

    #[test]
    fn test_write_rolls_back_on_error() {
        let dir = tempdir().unwrap();
        let partition = create(dir.path());
        let result = partition.write(|w| {
            w.add("wallets", json!({"id": "a", "address": "1"}))?;
            w.add("wallets", json!({"id": "b", "address": "1"}))?;
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(partition.count("wallets").unwrap(), 0);

        assert_eq!(
            partition
                .bulk_insert("wallets", vec![json!({"id": "a"}), json!({"id": "b"})])
                .unwrap(),
            2
        );
        assert_eq!(partition.count("wallets").unwrap(), 2);
    }

    #[test]
    fn test_unknown_collection() {
        let dir = tempdir().unwrap();
        let partition = create(dir.path());
        assert!(matches!(
            partition.get_all("nope"),
            Err(VaultError::CollectionNotFound(_))
        ));
        assert!(matches!(
            partition.create_collection(&wallets_schema()),
            Err(VaultError::ConstraintViolation(_))
        ));
    }
}
