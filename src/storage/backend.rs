//! Storage backend implementations.
//!
//! - InMemoryStore: ephemeral storage for tests and simulations
//! - FileStore: JSON file of hex keys to hex values, flushed on demand
//!
//! [`TypedStore`] layers `bincode` values over either backend.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// STORAGE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Key type for storage operations
pub type StorageKey = Vec<u8>;

/// Value type for storage operations
pub type StorageValue = Vec<u8>;

type Table = HashMap<StorageKey, StorageValue>;

/// Trait for storage backends
pub trait StorageBackend: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>>;

    /// Set a value for a key
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Delete a key, reporting whether it existed
    fn delete(&self, key: &[u8]) -> Result<bool>;

    /// Check if a key exists
    fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// List all keys with a given prefix
    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>>;

    /// Flush any pending writes
    fn flush(&self) -> Result<()>;
}

fn read(table: &RwLock<Table>) -> Result<RwLockReadGuard<'_, Table>> {
    table
        .read()
        .map_err(|e| Error::Storage(format!("Lock error: {}", e)))
}

fn write(table: &RwLock<Table>) -> Result<RwLockWriteGuard<'_, Table>> {
    table
        .write()
        .map_err(|e| Error::Storage(format!("Lock error: {}", e)))
}

fn keys_with_prefix(table: &Table, prefix: &[u8]) -> Vec<StorageKey> {
    let mut keys: Vec<StorageKey> = table
        .keys()
        .filter(|k| k.starts_with(prefix))
        .cloned()
        .collect();
    keys.sort();
    keys
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<Table>,
}

impl InMemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> Result<usize> {
        Ok(read(&self.data)?.len())
    }

    /// Check if empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(read(&self.data)?.is_empty())
    }
}

impl StorageBackend for InMemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>> {
        Ok(read(&self.data)?.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        write(&self.data)?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        Ok(write(&self.data)?.remove(key).is_some())
    }

    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>> {
        Ok(keys_with_prefix(&*read(&self.data)?, prefix))
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE-BASED STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// File-based storage backend using JSON
#[derive(Debug)]
pub struct FileStore {
    /// Data file location
    path: PathBuf,
    /// Working copy of the file
    cache: RwLock<Table>,
    /// Whether the cache holds unflushed writes
    dirty: RwLock<bool>,
}

impl FileStore {
    /// Data file name inside the store directory
    pub const DATA_FILE: &'static str = "vault.json";

    /// Open (or create) a store in `dir`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .map_err(|e| Error::Storage(format!("Failed to create {}: {}", dir.display(), e)))?;

        let path = dir.join(Self::DATA_FILE);
        let cache = if path.exists() {
            Self::load(&path)?
        } else {
            Table::new()
        };

        Ok(Self {
            path,
            cache: RwLock::new(cache),
            dirty: RwLock::new(false),
        })
    }

    /// Path of the data file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<Table> {
        let file = File::open(path)
            .map_err(|e| Error::Storage(format!("Failed to open data file: {}", e)))?;
        let encoded: HashMap<String, String> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Storage(format!("Failed to parse data file: {}", e)))?;

        encoded
            .into_iter()
            .map(|(k, v)| {
                let key = hex::decode(&k)
                    .map_err(|e| Error::Storage(format!("Invalid key {}: {}", k, e)))?;
                let value = hex::decode(&v)
                    .map_err(|e| Error::Storage(format!("Invalid value for {}: {}", k, e)))?;
                Ok((key, value))
            })
            .collect()
    }

    fn mark_dirty(&self) -> Result<()> {
        let mut dirty = self
            .dirty
            .write()
            .map_err(|e| Error::Storage(format!("Lock error: {}", e)))?;
        *dirty = true;
        Ok(())
    }

    fn is_dirty(&self) -> Result<bool> {
        self.dirty
            .read()
            .map(|d| *d)
            .map_err(|e| Error::Storage(format!("Lock error: {}", e)))
    }

    fn save(&self) -> Result<()> {
        let encoded: HashMap<String, String> = read(&self.cache)?
            .iter()
            .map(|(k, v)| (hex::encode(k), hex::encode(v)))
            .collect();

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| Error::Storage(format!("Failed to open data file for writing: {}", e)))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &encoded)
            .map_err(|e| Error::Storage(format!("Failed to write data file: {}", e)))?;

        let mut dirty = self
            .dirty
            .write()
            .map_err(|e| Error::Storage(format!("Lock error: {}", e)))?;
        *dirty = false;
        Ok(())
    }
}

impl StorageBackend for FileStore {
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>> {
        Ok(read(&self.cache)?.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        write(&self.cache)?.insert(key.to_vec(), value.to_vec());
        self.mark_dirty()
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        let existed = write(&self.cache)?.remove(key).is_some();
        if existed {
            self.mark_dirty()?;
        }
        Ok(existed)
    }

    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>> {
        Ok(keys_with_prefix(&*read(&self.cache)?, prefix))
    }

    fn flush(&self) -> Result<()> {
        if self.is_dirty()? {
            self.save()?;
        }
        Ok(())
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to flush {}: {}", self.path.display(), e);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPED STORE WRAPPER
// ═══════════════════════════════════════════════════════════════════════════════

/// Type-safe wrapper around a storage backend
#[derive(Debug)]
pub struct TypedStore<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> TypedStore<B> {
    /// Create a new typed store
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get a typed value
    pub fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        self.backend
            .get(key)?
            .map(|data| {
                bincode::deserialize(&data)
                    .map_err(|e| Error::Deserialization(format!("Failed to deserialize value: {}", e)))
            })
            .transpose()
    }

    /// Set a typed value
    pub fn set<T: Serialize>(&self, key: &[u8], value: &T) -> Result<()> {
        let data = bincode::serialize(value)
            .map_err(|e| Error::Serialization(format!("Failed to serialize value: {}", e)))?;
        self.backend.set(key, &data)
    }

    /// Delete a value
    pub fn delete(&self, key: &[u8]) -> Result<bool> {
        self.backend.delete(key)
    }

    /// Check if a key exists
    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        self.backend.exists(key)
    }

    /// List keys with prefix
    pub fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>> {
        self.backend.list_prefix(prefix)
    }

    /// Flush pending writes
    pub fn flush(&self) -> Result<()> {
        self.backend.flush()
    }

    /// Get the underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY PREFIXES
// ═══════════════════════════════════════════════════════════════════════════════

/// Key prefixes for different data types
pub mod prefixes {
    /// Vault snapshot
    pub const VAULT: &[u8] = b"vault:";
    /// Call receipts, keyed by sequence number
    pub const RECEIPT: &[u8] = b"rcpt:";
    /// Bookkeeping (receipt counter)
    pub const META: &[u8] = b"meta:";
}

/// Create a key with a prefix
pub fn make_key(prefix: &[u8], key: &[u8]) -> StorageKey {
    [prefix, key].concat()
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
