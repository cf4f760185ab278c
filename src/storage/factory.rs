use std::sync::Arc;

use super::config::StorageConfig;
use super::error::StorageResult;
use super::object_store::ObjectStoreProvider;
use super::provider::StorageProvider;

/// Factory for creating storage providers
pub struct StorageProviderFactory;

impl StorageProviderFactory {
    /// Create a storage provider from a configuration.
    ///
    /// Every backend (Azure, GCS, S3, local, in-memory) is served by the same
    /// object_store based provider. The returned handle is meant to be built
    /// once at startup and shared for the lifetime of the process.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * Required configuration options are missing
    /// * Credentials are malformed
    /// * The storage backend cannot be initialized
    pub async fn from_config(config: StorageConfig) -> StorageResult<Arc<dyn StorageProvider>> {
        let storage_type = config.storage_type_str().to_string();
        let provider = ObjectStoreProvider::new(config).await?;
        tracing::debug!(
            "Created storage provider type={} base_path={}",
            storage_type,
            provider.base_path
        );
        Ok(Arc::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_from_config_memory() {
        let provider = StorageProviderFactory::from_config(
            StorageConfig::memory().with_option("name", "archive"),
        )
        .await
        .unwrap();

        provider
            .write_file("finance/q1.csv", Bytes::from_static(b"1"))
            .await
            .unwrap();
        assert!(provider.exists("finance/q1.csv").await.unwrap());
        assert_eq!(provider.base_path(), "memory://archive");
    }

    #[tokio::test]
    async fn test_from_config_propagates_errors() {
        let result = StorageProviderFactory::from_config(StorageConfig::gcs()).await;
        assert!(result.is_err());
    }
}
