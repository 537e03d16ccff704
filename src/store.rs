//! Record storage for the user and tweet collections.
//!
//! Each collection sits behind [`RecordStore`]. The production backend is
//! [`JsonFileStore`], a single file holding a JSON array; [`MemoryStore`]
//! keeps the same ordering semantics in memory for tests.

use async_trait::async_trait;
use log::{debug, info};
use serde::{de::DeserializeOwned, Serialize};
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::StoreError;

pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
}

/// In-place edit applied by [`RecordStore::update`].
pub type Edit<R> = Box<dyn FnOnce(&mut R) + Send>;

/// Narrow interface over one homogeneous, insertion-ordered collection.
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Adds `record` at the end of the collection and returns it.
    async fn append(&self, record: R) -> Result<R, StoreError>;

    /// Every record, in insertion order.
    async fn list(&self) -> Result<Vec<R>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<R>, StoreError>;

    /// Applies `edit` to the record with `id` in place and returns the
    /// edited record, or `None` if the id is unknown. Lookup, edit and write
    /// happen as one step.
    async fn update(&self, id: Uuid, edit: Edit<R>) -> Result<Option<R>, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<Option<R>, StoreError>;
}

/// A collection persisted as one JSON array file.
///
/// All operations on a store hold its mutex, so concurrent appends and
/// updates cannot interleave their read-modify-write cycles. Every write
/// rewrites the whole array into a sibling temp file, flushes it to disk and
/// renames it over the original.
pub struct JsonFileStore<R> {
    path: PathBuf,
    lock: Mutex<()>,
    _records: PhantomData<fn() -> R>,
}

impl<R: Record> JsonFileStore<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file holding an empty array if it does not exist yet.
    pub async fn ensure_exists(&self) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        if fs::try_exists(&self.path).await? {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        self.write_all(&[]).await?;
        info!("Created empty collection at {}", self.path.display());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<R>, StoreError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Format {
            path: self.path.clone(),
            source,
        })
    }

    async fn write_all(&self, records: &[R]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records).map_err(StoreError::Serialize)?;
        let tmp = self.path.with_extension("json.tmp");
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp, &self.path).await?;
        debug!(
            "Wrote {} records to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for JsonFileStore<R> {
    async fn append(&self, record: R) -> Result<R, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        records.push(record.clone());
        self.write_all(&records).await?;
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<R>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_all().await
    }

    async fn get(&self, id: Uuid) -> Result<Option<R>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.into_iter().find(|r| r.id() == id))
    }

    async fn update(&self, id: Uuid, edit: Edit<R>) -> Result<Option<R>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        let Some(slot) = records.iter_mut().find(|r| r.id() == id) else {
            return Ok(None);
        };
        edit(&mut *slot);
        let updated = slot.clone();
        self.write_all(&records).await?;
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<R>, StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_all().await?;
        let Some(index) = records.iter().position(|r| r.id() == id) else {
            return Ok(None);
        };
        let removed = records.remove(index);
        self.write_all(&records).await?;
        Ok(Some(removed))
    }
}

pub struct MemoryStore<R> {
    records: RwLock<Vec<R>>,
}

impl<R: Record> MemoryStore<R> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<R>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

impl<R: Record> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryStore<R> {
    async fn append(&self, record: R) -> Result<R, StoreError> {
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<R>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<R>, StoreError> {
        Ok(self.records.read().await.iter().find(|r| r.id() == id).cloned())
    }

    async fn update(&self, id: Uuid, edit: Edit<R>) -> Result<Option<R>, StoreError> {
        let mut records = self.records.write().await;
        Ok(records.iter_mut().find(|r| r.id() == id).map(|slot| {
            edit(&mut *slot);
            slot.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<R>, StoreError> {
        let mut records = self.records.write().await;
        Ok(records
            .iter()
            .position(|r| r.id() == id)
            .map(|index| records.remove(index)))
    }
}
