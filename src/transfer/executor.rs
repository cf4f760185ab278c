//! Cross-provider byte transfer for a single object.

use super::enumerator::ObjectRef;
use super::error::TransferError;
use crate::storage::StorageProvider;
use std::sync::Arc;
use tracing::info;

/// Default prefix prepended to every object name in the destination bucket.
pub const DEFAULT_DESTINATION_BASE: &str = "upload/";

/// Outcome of a successful transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub destination: String,
    pub bytes: u64,
}

/// Join the destination base path and an object name.
///
/// Exactly one separator sits between the two; an empty base leaves the name unchanged.
pub fn destination_path(base_path: &str, name: &str) -> String {
    let base = base_path.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

/// Downloads an object from the source store and uploads it to the destination store.
pub struct TransferExecutor {
    source: Arc<dyn StorageProvider>,
    destination: Arc<dyn StorageProvider>,
    base_path: String,
}

impl TransferExecutor {
    pub fn new(
        source: Arc<dyn StorageProvider>,
        destination: Arc<dyn StorageProvider>,
        base_path: impl Into<String>,
    ) -> Self {
        Self {
            source,
            destination,
            base_path: base_path.into(),
        }
    }

    pub fn destination_path(&self, object: &ObjectRef) -> String {
        destination_path(&self.base_path, &object.name)
    }

    /// Buffer the whole object in memory and write it to the destination, overwriting.
    ///
    /// # Errors
    ///
    /// * `TransferError::Download` if the source read fails
    /// * `TransferError::Upload` if the destination write fails
    pub async fn transfer(&self, object: &ObjectRef) -> Result<TransferReceipt, TransferError> {
        let data = self
            .source
            .read_file(&object.name)
            .await
            .map_err(|source| TransferError::Download {
                object: object.name.clone(),
                source,
            })?;

        let destination = self.destination_path(object);
        let bytes = data.len() as u64;

        self.destination
            .write_file(&destination, data)
            .await
            .map_err(|source| TransferError::Upload {
                object: object.name.clone(),
                destination: destination.clone(),
                source,
            })?;

        info!(
            "Uploaded object={} to destination={} bytes={}",
            object.name,
            self.destination.uri_from_path(&destination),
            bytes
        );

        Ok(TransferReceipt { destination, bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageConfig, StorageProviderFactory};
    use bytes::Bytes;

    async fn memory(name: &str) -> Arc<dyn StorageProvider> {
        StorageProviderFactory::from_config(StorageConfig::memory().with_option("name", name))
            .await
            .unwrap()
    }

    #[test]
    fn test_destination_path_joins_once() {
        assert_eq!(
            destination_path("upload/", "marketing/report.csv"),
            "upload/marketing/report.csv"
        );
        assert_eq!(
            destination_path("upload", "/marketing/report.csv"),
            "upload/marketing/report.csv"
        );
        assert_eq!(destination_path("", "finance/q1.csv"), "finance/q1.csv");
        assert_eq!(
            destination_path("partners/acme//", "x.bin"),
            "partners/acme/x.bin"
        );
    }

    #[tokio::test]
    async fn test_transfer_copies_bytes() {
        let source = memory("outbound").await;
        let destination = memory("gcs").await;
        source
            .write_file("marketing/report.csv", Bytes::from_static(b"id,total\n1,9\n"))
            .await
            .unwrap();

        let executor = TransferExecutor::new(source.clone(), destination.clone(), "upload/");
        let receipt = executor
            .transfer(&ObjectRef::new("marketing/report.csv", 13))
            .await
            .unwrap();

        assert_eq!(receipt.destination, "upload/marketing/report.csv");
        assert_eq!(receipt.bytes, 13);
        let uploaded = destination
            .read_file("upload/marketing/report.csv")
            .await
            .unwrap();
        assert_eq!(uploaded.as_ref(), b"id,total\n1,9\n");
        // Transfer alone leaves the source in place
        assert!(source.exists("marketing/report.csv").await.unwrap());
    }

    #[tokio::test]
    async fn test_transfer_overwrites_existing_destination() {
        let source = memory("outbound").await;
        let destination = memory("gcs").await;
        source
            .write_file("finance/q1.csv", Bytes::from_static(b"new"))
            .await
            .unwrap();
        destination
            .write_file("upload/finance/q1.csv", Bytes::from_static(b"stale contents"))
            .await
            .unwrap();

        let executor = TransferExecutor::new(source, destination.clone(), "upload/");
        executor
            .transfer(&ObjectRef::new("finance/q1.csv", 3))
            .await
            .unwrap();

        let uploaded = destination.read_file("upload/finance/q1.csv").await.unwrap();
        assert_eq!(uploaded.as_ref(), b"new");
    }

    #[tokio::test]
    async fn test_transfer_missing_source_is_download_error() {
        let executor = TransferExecutor::new(memory("outbound").await, memory("gcs").await, "upload/");

        match executor.transfer(&ObjectRef::new("finance/gone.csv", 0)).await {
            Err(TransferError::Download { object, source }) => {
                assert_eq!(object, "finance/gone.csv");
                assert!(source.is_not_found());
            }
            other => panic!("Expected Download error, got {:?}", other),
        }
    }
}
