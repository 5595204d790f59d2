//! Appends registrations to the shared CSV record.
//!
//! The record is a single object that is downloaded, extended by one row and
//! uploaded again in full. Uploads carry an entity-tag precondition so a
//! concurrent writer is detected instead of silently overwritten; on a lost
//! race the record is re-read and the row appended to the newer content.

pub mod csv;
mod store;

pub use store::{BlobRecordStore, MemoryRecordStore, RecordStore, Snapshot};

use crate::config::StorageConfig;
use crate::error::RecordError;
use crate::registration::Registration;
use blob_store_client::{BlobClient, BlobError, WriteCondition};
use chrono::Utc;
use secrecy::ExposeSecret;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Writes registrations to the CSV record.
pub struct Recorder {
    store: RecordStore,
    max_attempts: u32,
    /// Serializes appends from this process
    append_lock: Mutex<()>,
}

impl Recorder {
    /// Create a recorder over `store`, giving up after `max_attempts` lost races.
    pub fn new(store: RecordStore, max_attempts: u32) -> Self {
        Self {
            store,
            max_attempts: max_attempts.max(1),
            append_lock: Mutex::new(()),
        }
    }

    /// Build a recorder from configuration.
    ///
    /// Returns `Ok(None)` when persistence is enabled but no connection string
    /// is configured; writes then fail per request.
    pub fn from_config(config: &StorageConfig) -> Result<Option<Self>, RecordError> {
        if !config.persist {
            info!("Persistence disabled, using in-memory CSV record");
            return Ok(Some(Self::new(
                RecordStore::memory(),
                config.max_append_attempts,
            )));
        }

        let Some(connection_string) = &config.connection_string else {
            warn!("Storage connection string not configured; submissions will fail");
            return Ok(None);
        };

        let client = BlobClient::from_connection_string(
            connection_string.expose_secret(),
            config.timeout,
        )?;
        info!(
            endpoint = client.endpoint(),
            container = %config.container,
            blob = %config.blob,
            "Using blob storage for CSV record"
        );

        Ok(Some(Self::new(
            RecordStore::blob(client, &config.container, &config.blob),
            config.max_append_attempts,
        )))
    }

    /// Backing store.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Append one row for `registration` to the end of the record.
    ///
    /// Creates the record with its header if it does not exist. Storage
    /// failures other than a lost race are returned immediately.
    #[instrument(skip_all)]
    pub async fn append(&self, registration: &Registration) -> Result<(), RecordError> {
        let _guard = self.append_lock.lock().await;

        self.store.ensure_container().await?;

        let row = csv::format_row(&Utc::now(), registration);

        for attempt in 1..=self.max_attempts {
            let (current, condition) = match self.store.fetch().await? {
                Some(snapshot) => {
                    let condition = snapshot
                        .etag
                        .map(WriteCondition::IfMatch)
                        .unwrap_or_default();
                    // A zero-length record still starts with the header
                    let content = if snapshot.content.is_empty() {
                        info!("CSV record is empty, writing header");
                        csv::HEADER.to_string()
                    } else {
                        snapshot.content
                    };
                    (content, condition)
                }
                None => {
                    info!("CSV record not found, creating it");
                    (csv::HEADER.to_string(), WriteCondition::IfNotExists)
                }
            };

            let updated = csv::append_row(&current, &row);

            match self.store.replace(&updated, condition).await {
                Ok(()) => {
                    info!(attempt, bytes = updated.len(), "Appended registration to CSV record");
                    return Ok(());
                }
                Err(RecordError::Blob(BlobError::PreconditionFailed)) => {
                    warn!(attempt, "CSV record changed while appending, re-reading");
                }
                Err(e) => return Err(e),
            }
        }

        Err(RecordError::Contended {
            attempts: self.max_attempts,
        })
    }
}
