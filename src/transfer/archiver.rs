//! Relocation of processed objects from the live container to the archive container.
//!
//! An object moves through three phases. The source is deleted only once the
//! archive copy has been observed with the expected size, unless confirmation
//! has been switched off.

use super::enumerator::ObjectRef;
use super::error::ArchiveError;
use crate::storage::StorageProvider;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where an object is in its relocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchivePhase {
    /// Copy issued, archive object not yet observed.
    CopyPending,
    /// Archive object observed with the source's size.
    CopyConfirmed,
    /// Source removed from the live container.
    SourceDeleted,
}

/// How long to wait for the archive copy to become visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfirmation {
    /// Number of archive checks before giving up; zero disables confirmation.
    pub attempts: u32,
    /// Pause between checks.
    #[serde(with = "duration_ms")]
    pub interval: Duration,
}

impl Default for CopyConfirmation {
    fn default() -> Self {
        Self {
            attempts: 5,
            interval: Duration::from_millis(500),
        }
    }
}

impl CopyConfirmation {
    pub fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Delete the source straight after issuing the copy.
    pub fn disabled() -> Self {
        Self {
            attempts: 0,
            interval: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.attempts > 0
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

/// Result of a completed relocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReceipt {
    pub archive_uri: String,
    /// False when confirmation was disabled and the delete was issued blind.
    pub confirmed: bool,
    pub phase: ArchivePhase,
}

/// Moves objects between two containers of the same storage account.
pub struct Archiver {
    live: Arc<dyn StorageProvider>,
    archive: Arc<dyn StorageProvider>,
    confirmation: CopyConfirmation,
}

impl Archiver {
    pub fn new(
        live: Arc<dyn StorageProvider>,
        archive: Arc<dyn StorageProvider>,
        confirmation: CopyConfirmation,
    ) -> Self {
        Self {
            live,
            archive,
            confirmation,
        }
    }

    /// Copy `object` into the archive container under the same name, then
    /// delete it from the live container.
    ///
    /// # Errors
    ///
    /// * `ArchiveError::Copy` if the copy cannot be issued
    /// * `ArchiveError::CopyNotConfirmed` if the archive object never appears;
    ///   the source is left in place
    /// * `ArchiveError::Delete` if the source delete fails after a good copy
    pub async fn archive(&self, object: &ObjectRef) -> Result<ArchiveReceipt, ArchiveError> {
        let source_uri = self.live.uri_from_path(&object.name);
        let copied_bytes = self.start_copy(object).await?;
        debug!(
            "Archive copy issued from={} phase={:?}",
            source_uri,
            ArchivePhase::CopyPending
        );

        let confirmed = if self.confirmation.is_enabled() {
            self.confirm_copy(object, copied_bytes).await?;
            debug!(
                "Archive copy of {} phase={:?}",
                object.name,
                ArchivePhase::CopyConfirmed
            );
            true
        } else {
            warn!(
                "Deleting {} without archive copy confirmation",
                object.name
            );
            false
        };

        self.live
            .delete_file(&object.name)
            .await
            .map_err(|source| ArchiveError::Delete {
                object: object.name.clone(),
                source,
            })?;

        let archive_uri = self.archive.uri_from_path(&object.name);
        info!(
            "Archived object={} from={} to={} confirmed={}",
            object.name, source_uri, archive_uri, confirmed
        );

        Ok(ArchiveReceipt {
            archive_uri,
            confirmed,
            phase: ArchivePhase::SourceDeleted,
        })
    }

    async fn start_copy(&self, object: &ObjectRef) -> Result<u64, ArchiveError> {
        let copy_err = |source| ArchiveError::Copy {
            object: object.name.clone(),
            source,
        };
        let data = self.live.read_file(&object.name).await.map_err(copy_err)?;
        let len = data.len() as u64;
        self.archive
            .write_file(&object.name, data)
            .await
            .map_err(copy_err)?;
        Ok(len)
    }

    /// Poll the archive container until the copy shows up with `expected_size` bytes.
    async fn confirm_copy(&self, object: &ObjectRef, expected_size: u64) -> Result<(), ArchiveError> {
        for attempt in 1..=self.confirmation.attempts {
            match self.archive.get_metadata(&object.name).await {
                Ok(meta) if meta.size == expected_size => {
                    debug!(
                        "Archive copy of {} confirmed on check {}",
                        object.name, attempt
                    );
                    return Ok(());
                }
                Ok(meta) => debug!(
                    "Archive copy of {} has size={} expected={} (check {}/{})",
                    object.name, meta.size, expected_size, attempt, self.confirmation.attempts
                ),
                Err(e) if e.is_not_found() => debug!(
                    "Archive copy of {} not visible yet (check {}/{})",
                    object.name, attempt, self.confirmation.attempts
                ),
                Err(e) => warn!(
                    "Archive check for {} failed (check {}/{}): {}",
                    object.name, attempt, self.confirmation.attempts, e
                ),
            }

            if attempt < self.confirmation.attempts {
                tokio::time::sleep(self.confirmation.interval).await;
            }
        }

        Err(ArchiveError::CopyNotConfirmed {
            object: object.name.clone(),
            attempts: self.confirmation.attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{
        FileMetadata, StorageConfig, StorageError, StorageProviderFactory, StorageResult,
    };
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream::BoxStream;
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn memory(name: &str) -> Arc<dyn StorageProvider> {
        StorageProviderFactory::from_config(StorageConfig::memory().with_option("name", name))
            .await
            .unwrap()
    }

    fn fast_confirmation() -> CopyConfirmation {
        CopyConfirmation::new(3, Duration::from_millis(1))
    }

    /// Archive container whose copies only become visible after a number of checks.
    struct LaggingArchive {
        inner: Arc<dyn StorageProvider>,
        visible_after: u32,
        checks: AtomicU32,
    }

    #[async_trait]
    impl StorageProvider for LaggingArchive {
        fn base_path(&self) -> &str {
            self.inner.base_path()
        }

        fn list_stream<'a>(&'a self, prefix: &str) -> BoxStream<'a, StorageResult<FileMetadata>> {
            self.inner.list_stream(prefix)
        }

        async fn read_file(&self, path: &str) -> StorageResult<Bytes> {
            self.inner.read_file(path).await
        }

        async fn write_file(&self, path: &str, data: Bytes) -> StorageResult<()> {
            self.inner.write_file(path, data).await
        }

        async fn delete_file(&self, path: &str) -> StorageResult<()> {
            self.inner.delete_file(path).await
        }

        async fn exists(&self, path: &str) -> StorageResult<bool> {
            self.inner.exists(path).await
        }

        async fn get_metadata(&self, path: &str) -> StorageResult<FileMetadata> {
            let check = self.checks.fetch_add(1, Ordering::SeqCst) + 1;
            if check < self.visible_after {
                return Err(StorageError::NotFound(path.to_string()));
            }
            self.inner.get_metadata(path).await
        }

        fn uri_from_path(&self, path: &str) -> String {
            self.inner.uri_from_path(path)
        }
    }

    #[tokio::test]
    async fn test_archive_moves_object() {
        let live = memory("outbound").await;
        let archive = memory("archive").await;
        live.write_file("marketing/report.csv", Bytes::from_static(b"abc"))
            .await
            .unwrap();

        let archiver = Archiver::new(live.clone(), archive.clone(), fast_confirmation());
        let receipt = archiver
            .archive(&ObjectRef::new("marketing/report.csv", 3))
            .await
            .unwrap();

        assert_eq!(receipt.phase, ArchivePhase::SourceDeleted);
        assert!(receipt.confirmed);
        assert_eq!(receipt.archive_uri, "memory://archive/marketing/report.csv");
        assert!(!live.exists("marketing/report.csv").await.unwrap());
        let archived = archive.read_file("marketing/report.csv").await.unwrap();
        assert_eq!(archived.as_ref(), b"abc");
    }

    #[tokio::test]
    async fn test_archive_waits_for_lagging_copy() {
        let live = memory("outbound").await;
        let lagging = Arc::new(LaggingArchive {
            inner: memory("archive").await,
            visible_after: 3,
            checks: AtomicU32::new(0),
        });
        live.write_file("finance/q1.csv", Bytes::from_static(b"12345"))
            .await
            .unwrap();

        let archiver = Archiver::new(live.clone(), lagging.clone(), fast_confirmation());
        let receipt = archiver
            .archive(&ObjectRef::new("finance/q1.csv", 5))
            .await
            .unwrap();

        assert!(receipt.confirmed);
        assert_eq!(lagging.checks.load(Ordering::SeqCst), 3);
        assert!(!live.exists("finance/q1.csv").await.unwrap());
    }

    #[tokio::test]
    async fn test_unconfirmed_copy_keeps_source() {
        let live = memory("outbound").await;
        let lagging = Arc::new(LaggingArchive {
            inner: memory("archive").await,
            visible_after: 10,
            checks: AtomicU32::new(0),
        });
        live.write_file("shipping/label.pdf", Bytes::from_static(b"%PDF"))
            .await
            .unwrap();

        let archiver = Archiver::new(live.clone(), lagging.clone(), fast_confirmation());
        match archiver.archive(&ObjectRef::new("shipping/label.pdf", 4)).await {
            Err(ArchiveError::CopyNotConfirmed { object, attempts }) => {
                assert_eq!(object, "shipping/label.pdf");
                assert_eq!(attempts, 3);
            }
            other => panic!("Expected CopyNotConfirmed, got {:?}", other),
        }
        assert!(live.exists("shipping/label.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_disabled_confirmation_deletes_immediately() {
        let live = memory("outbound").await;
        let lagging = Arc::new(LaggingArchive {
            inner: memory("archive").await,
            visible_after: 10,
            checks: AtomicU32::new(0),
        });
        live.write_file("engineering/design.md", Bytes::from_static(b"# design"))
            .await
            .unwrap();

        let archiver = Archiver::new(live.clone(), lagging.clone(), CopyConfirmation::disabled());
        let receipt = archiver
            .archive(&ObjectRef::new("engineering/design.md", 8))
            .await
            .unwrap();

        assert!(!receipt.confirmed);
        assert_eq!(lagging.checks.load(Ordering::SeqCst), 0);
        assert!(!live.exists("engineering/design.md").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_source_is_copy_error() {
        let archiver = Archiver::new(
            memory("outbound").await,
            memory("archive").await,
            fast_confirmation(),
        );
        let result = archiver.archive(&ObjectRef::new("finance/gone.csv", 1)).await;
        assert!(matches!(result, Err(ArchiveError::Copy { .. })));
    }

    #[test]
    fn test_copy_confirmation_serde_in_millis() {
        let confirmation = CopyConfirmation::new(4, Duration::from_millis(250));
        let json = serde_json::to_string(&confirmation).unwrap();
        assert_eq!(json, r#"{"attempts":4,"interval":250}"#);

        let parsed: CopyConfirmation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, confirmation);
        assert!(!CopyConfirmation::disabled().is_enabled());
    }
}
