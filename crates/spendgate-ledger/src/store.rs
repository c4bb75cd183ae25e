//! Key/value persistence backends
//!
//! The ledger only needs opaque get/put on keys it derives itself. Hosts
//! plug their own backend; `MemoryStore` covers tests and simulation,
//! `SledStore` gives durable embedded persistence.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use spendgate_types::{Result, SpendgateError};
use tokio::sync::RwLock;

/// Opaque key/value access for spend state
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;
    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()>;
}

/// In-memory store for tests and in-process simulation
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<HashMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let inner = self.inner.read().await;
        Ok(inner.get(key).cloned())
    }

    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.insert(key.to_vec(), value);
        Ok(())
    }
}

/// Durable store backed by an embedded sled database
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open (or create) a database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path).map_err(|e| SpendgateError::store(e.to_string()))?;
        Ok(Self { db })
    }

    /// Wrap an already-open database.
    pub fn from_db(db: sled::Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StateStore for SledStore {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self
            .db
            .get(key)
            .map_err(|e| SpendgateError::store(e.to_string()))?;
        Ok(value.map(|ivec| ivec.to_vec()))
    }

    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.db
            .insert(key, value)
            .map_err(|e| SpendgateError::store(e.to_string()))?;
        Ok(())
    }
}
