//! Backing stores for the CSV record.

use crate::error::RecordError;
use blob_store_client::{BlobClient, BlobError, WriteCondition};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Current record content and the entity tag it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub content: String,
    pub etag: Option<String>,
}

/// Record kept in a single blob.
pub struct BlobRecordStore {
    client: BlobClient,
    container: String,
    blob: String,
}

impl BlobRecordStore {
    pub fn new(client: BlobClient, container: impl Into<String>, blob: impl Into<String>) -> Self {
        Self {
            client,
            container: container.into(),
            blob: blob.into(),
        }
    }

    async fn ensure_container(&self) -> Result<(), RecordError> {
        if self
            .client
            .create_container_if_not_exists(&self.container)
            .await?
        {
            info!(container = %self.container, "Created storage container");
        }
        Ok(())
    }

    async fn fetch(&self) -> Result<Option<Snapshot>, RecordError> {
        match self.client.download_text(&self.container, &self.blob).await {
            Ok(blob) => Ok(Some(Snapshot {
                content: blob.content,
                etag: blob.etag,
            })),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn replace(&self, content: &str, condition: WriteCondition) -> Result<(), RecordError> {
        self.client
            .upload_text(&self.container, &self.blob, content, condition)
            .await?;
        Ok(())
    }
}

/// In-process record with the same entity-tag semantics as the blob store.
#[derive(Default)]
pub struct MemoryRecordStore {
    record: RwLock<Option<(String, u64)>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record content, if any.
    pub async fn content(&self) -> Option<String> {
        self.record.read().await.as_ref().map(|(c, _)| c.clone())
    }

    async fn fetch(&self) -> Result<Option<Snapshot>, RecordError> {
        let record = self.record.read().await;
        Ok(record.as_ref().map(|(content, version)| Snapshot {
            content: content.clone(),
            etag: Some(etag_for(*version)),
        }))
    }

    async fn replace(&self, content: &str, condition: WriteCondition) -> Result<(), RecordError> {
        let mut record = self.record.write().await;

        let allowed = match (&condition, record.as_ref()) {
            (WriteCondition::Unconditional, _) => true,
            (WriteCondition::IfNotExists, existing) => existing.is_none(),
            (WriteCondition::IfMatch(etag), Some((_, version))) => *etag == etag_for(*version),
            (WriteCondition::IfMatch(_), None) => false,
        };
        if !allowed {
            return Err(BlobError::PreconditionFailed.into());
        }

        let version = record.as_ref().map_or(1, |(_, v)| v + 1);
        *record = Some((content.to_string(), version));
        debug!(version, bytes = content.len(), "Memory record replaced");
        Ok(())
    }
}

fn etag_for(version: u64) -> String {
    format!("\"{}\"", version)
}

/// Storage backend for the CSV record.
pub enum RecordStore {
    /// Azure Blob Storage
    Blob(BlobRecordStore),
    /// In-memory only (no persistence)
    Memory(MemoryRecordStore),
}

impl RecordStore {
    /// Blob-backed record.
    pub fn blob(client: BlobClient, container: impl Into<String>, blob: impl Into<String>) -> Self {
        RecordStore::Blob(BlobRecordStore::new(client, container, blob))
    }

    /// Force memory store.
    pub fn memory() -> Self {
        RecordStore::Memory(MemoryRecordStore::new())
    }

    /// Create the backing container if it does not exist.
    pub async fn ensure_container(&self) -> Result<(), RecordError> {
        match self {
            RecordStore::Blob(s) => s.ensure_container().await,
            RecordStore::Memory(_) => Ok(()),
        }
    }

    /// Read the record. `None` means it does not exist yet.
    pub async fn fetch(&self) -> Result<Option<Snapshot>, RecordError> {
        match self {
            RecordStore::Blob(s) => s.fetch().await,
            RecordStore::Memory(s) => s.fetch().await,
        }
    }

    /// Overwrite the whole record, subject to `condition`.
    pub async fn replace(
        &self,
        content: &str,
        condition: WriteCondition,
    ) -> Result<(), RecordError> {
        match self {
            RecordStore::Blob(s) => s.replace(content, condition).await,
            RecordStore::Memory(s) => s.replace(content, condition).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_starts_empty() {
        let store = RecordStore::memory();
        assert!(store.ensure_container().await.is_ok());
        assert_eq!(store.fetch().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_create_then_conditional_replace() {
        let store = RecordStore::memory();

        store.replace("v1", WriteCondition::IfNotExists).await.unwrap();
        let snapshot = store.fetch().await.unwrap().unwrap();
        assert_eq!(snapshot.content, "v1");

        let etag = snapshot.etag.unwrap();
        store
            .replace("v2", WriteCondition::IfMatch(etag.clone()))
            .await
            .unwrap();

        // The old tag no longer matches
        let stale = store.replace("v3", WriteCondition::IfMatch(etag)).await;
        assert!(matches!(
            stale,
            Err(RecordError::Blob(BlobError::PreconditionFailed))
        ));

        assert_eq!(store.fetch().await.unwrap().unwrap().content, "v2");
    }

    #[tokio::test]
    async fn test_memory_store_if_not_exists_rejects_existing() {
        let store = RecordStore::memory();
        store.replace("v1", WriteCondition::Unconditional).await.unwrap();

        let result = store.replace("v2", WriteCondition::IfNotExists).await;
        assert!(matches!(
            result,
            Err(RecordError::Blob(BlobError::PreconditionFailed))
        ));
    }
}
