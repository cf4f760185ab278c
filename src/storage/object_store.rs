// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use super::azure::AzureConnectionString;
use super::config::{StorageConfig, StorageType, TUNING_OPTIONS};
use super::error::{StorageError, StorageResult};
use super::provider::{string_to_path, FileMetadata, StorageProvider};
use crate::util::retry::RetryPolicy;
use async_trait::async_trait;
use bytes::Bytes;
use futures::future;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use object_store::{
    aws::AmazonS3Builder, azure::MicrosoftAzureBuilder, gcp::GoogleCloudStorageBuilder,
    local::LocalFileSystem, memory::InMemory, ClientOptions, ObjectMeta, ObjectStore,
    ObjectStoreExt, PutPayload, RetryConfig,
};
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::form_urlencoded;

/// Generic storage provider that works with any object_store backend
pub struct ObjectStoreProvider {
    pub config: StorageConfig,
    pub store: Arc<dyn ObjectStore>,
    pub base_path: String,
    retry: RetryPolicy,
}

impl ObjectStoreProvider {
    /// Create a new storage provider from configuration.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * Required configuration options are missing
    /// * The storage backend cannot be created (e.g., malformed credentials)
    pub async fn new(config: StorageConfig) -> StorageResult<Self> {
        let (store, base_path) = Self::build_store(&config)?;
        let retry = RetryPolicy::new(Self::get_max_retries(&config));

        Ok(Self {
            config,
            store: Arc::from(store),
            base_path,
            retry,
        })
    }

    /// Wrap an already-built object store, e.g. one shared between providers.
    pub fn from_store(
        config: StorageConfig,
        store: Arc<dyn ObjectStore>,
        base_path: impl Into<String>,
    ) -> Self {
        let retry = RetryPolicy::new(Self::get_max_retries(&config));
        Self {
            config,
            store,
            base_path: base_path.into(),
            retry,
        }
    }

    /// Override the transient-error retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn build_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        match config.storage_type {
            StorageType::Local => Self::build_local_store(config),
            StorageType::Aws => Self::build_aws_store(config),
            StorageType::Azure => Self::build_azure_store(config),
            StorageType::Gcs => Self::build_gcs_store(config),
            StorageType::Memory => Self::build_memory_store(config),
        }
    }

    /// Build a local filesystem store rooted at the 'path' option.
    ///
    /// # Errors
    ///
    /// Fails if 'path' is missing, does not exist, or is not a directory.
    fn build_local_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        let path = config.require_option("path")?;
        let base_path = PathBuf::from(path);

        let canonical_path = base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to resolve path '{}': {} (path must exist)",
                path, e
            ))
        })?;

        if !canonical_path.is_dir() {
            return Err(StorageError::ConfigError(format!(
                "Base path is not a directory: {}",
                canonical_path.display()
            )));
        }

        let store = LocalFileSystem::new_with_prefix(&canonical_path).map_err(|e| {
            StorageError::ConfigError(format!("Failed to create local store: {}", e))
        })?;

        let base_path_str = format!(
            "file:///{}",
            canonical_path
                .to_string_lossy()
                .replace('\\', "/")
                .trim_start_matches('/')
        );
        Ok((Box::new(store), base_path_str))
    }

    fn build_memory_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        let name = config
            .get_option("name")
            .map(String::as_str)
            .unwrap_or("default");
        Ok((Box::new(InMemory::new()), format!("memory://{}", name)))
    }

    fn build_connection_options(config: &StorageConfig) -> ClientOptions {
        let mut client_options = ClientOptions::default();
        if let Some(timeout_str) = config.options.get("timeout") {
            if timeout_str == "0" || timeout_str == "disabled" {
                client_options = client_options.with_timeout_disabled();
            } else if let Ok(sec) = timeout_str.parse::<u64>() {
                client_options = client_options.with_timeout(Duration::from_secs(sec))
            }
        };
        if let Some(connect_timeout_str) = config.options.get("connect_timeout") {
            if connect_timeout_str == "0" || connect_timeout_str == "disabled" {
                client_options = client_options.with_connect_timeout_disabled();
            } else if let Ok(sec) = connect_timeout_str.parse::<u64>() {
                client_options = client_options.with_connect_timeout(Duration::from_secs(sec))
            }
        }
        if let Some(Ok(sec)) = config
            .options
            .get("pool_idle_timeout")
            .map(|s| s.parse::<u64>())
        {
            client_options = client_options.with_pool_idle_timeout(Duration::from_secs(sec))
        }
        if let Some(Ok(max_idle)) = config
            .options
            .get("pool_max_idle_per_host")
            .map(|s| s.parse::<usize>())
        {
            client_options = client_options.with_pool_max_idle_per_host(max_idle)
        }
        if config
            .get_option("allow_http")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            client_options = client_options.with_allow_http(true);
        }
        client_options
    }

    fn build_retry_options(config: &StorageConfig) -> RetryConfig {
        let default_retry_config = RetryConfig::default();
        let max_retries = config
            .options
            .get("max_retries")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(default_retry_config.max_retries);
        let retry_timeout = config
            .options
            .get("retry_timeout")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(default_retry_config.retry_timeout);
        RetryConfig {
            backoff: Default::default(),
            max_retries,
            retry_timeout,
        }
    }

    /// Retry budget for the transient-error wrapper (defaults to 3).
    fn get_max_retries(config: &StorageConfig) -> usize {
        config
            .options
            .get("max_retries")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(3)
    }

    async fn retry_operation<F, Fut, T>(&self, operation_name: &str, operation: F) -> StorageResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StorageResult<T>>,
    {
        self.retry.run(operation_name, operation).await
    }

    fn build_aws_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        let mut builder = AmazonS3Builder::new()
            .with_client_options(Self::build_connection_options(config))
            .with_retry(Self::build_retry_options(config));
        let bucket = config.require_option("bucket")?;
        let mut endpoint: Option<&String> = None;

        for (key, value) in &config.options {
            match key.as_str() {
                "bucket" => builder = builder.with_bucket_name(value),
                "region" => builder = builder.with_region(value),
                "access_key_id" => builder = builder.with_access_key_id(value),
                "secret_access_key" => builder = builder.with_secret_access_key(value),
                "session_token" | "token" => builder = builder.with_token(value),
                "endpoint" => {
                    endpoint = Some(value);
                    builder = builder.with_endpoint(value);
                }
                "allow_http" => (),
                k if TUNING_OPTIONS.contains(&k) => (),
                _ => tracing::warn!("Unknown AWS S3 option: {}", key),
            }
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create S3 store: {}", e)))?;

        let base_url = match endpoint {
            Some(endpoint_url) => format!("{}/{}", endpoint_url.trim_end_matches('/'), bucket),
            None => format!("s3://{}", bucket),
        };

        Ok((Box::new(store), base_url))
    }

    /// Build an Azure Blob store for a single container.
    ///
    /// Credentials come either from a `connection_string` option or from the
    /// explicit account/key, SAS, or service principal options. Explicit
    /// options override values taken from the connection string.
    fn build_azure_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        let container = config.require_option("container")?;
        let mut builder = MicrosoftAzureBuilder::new()
            .with_client_options(Self::build_connection_options(config))
            .with_retry(Self::build_retry_options(config))
            .with_container_name(container);

        let mut account_name: Option<String> = None;
        let mut endpoint: Option<String> = None;

        if let Some(raw) = config.get_option("connection_string") {
            let parsed = AzureConnectionString::parse(raw)?;
            if parsed.use_development_storage {
                builder = builder.with_use_emulator(true);
                account_name = Some("devstoreaccount1".to_string());
                endpoint = Some("http://127.0.0.1:10000/devstoreaccount1".to_string());
            }
            if let Some(account) = &parsed.account_name {
                builder = builder.with_account(account);
                account_name = Some(account.clone());
            }
            if let Some(key) = &parsed.account_key {
                builder = builder.with_access_key(key);
            }
            if let Some(sas) = &parsed.sas_token {
                builder = builder.with_sas_authorization(parse_sas_pairs(sas));
            }
            if parsed.has_custom_endpoint() {
                if let Some(url) = parsed.blob_endpoint() {
                    builder = builder
                        .with_endpoint(url.clone())
                        .with_allow_http(url.starts_with("http://"));
                    endpoint = Some(url);
                }
            }
        }

        for (key, value) in &config.options {
            match key.as_str() {
                "account_name" => {
                    account_name = Some(value.clone());
                    builder = builder.with_account(value)
                }
                "access_key" | "account_key" => builder = builder.with_access_key(value),
                "sas_token" => builder = builder.with_sas_authorization(parse_sas_pairs(value)),
                "tenant_id" => builder = builder.with_tenant_id(value),
                "client_id" => builder = builder.with_client_id(value),
                "client_secret" => builder = builder.with_client_secret(value),
                "endpoint" => {
                    endpoint = Some(value.trim_end_matches('/').to_string());
                    builder = builder.with_endpoint(value.clone());
                }
                "container" | "connection_string" | "allow_http" => (),
                k if TUNING_OPTIONS.contains(&k) => (),
                _ => tracing::info!("Unknown Azure option: {}", key),
            }
        }

        let account_name = account_name.ok_or_else(|| {
            StorageError::ConfigError(
                "Azure requires 'account_name' or a 'connection_string' option".to_string(),
            )
        })?;

        let store = builder.build().map_err(|e| {
            StorageError::ConfigError(format!("Failed to create Azure store: {}", e))
        })?;

        let base_url = match endpoint {
            Some(endpoint) => format!("{}/{}", endpoint, container),
            None => format!("https://{}.blob.core.windows.net/{}", account_name, container),
        };

        Ok((Box::new(store), base_url))
    }

    fn build_gcs_store(config: &StorageConfig) -> StorageResult<(Box<dyn ObjectStore>, String)> {
        let bucket = config.require_option("bucket")?;
        let mut builder = GoogleCloudStorageBuilder::new()
            .with_client_options(Self::build_connection_options(config))
            .with_retry(Self::build_retry_options(config))
            .with_bucket_name(bucket);

        for (key, value) in &config.options {
            match key.as_str() {
                "service_account_key_path" => builder = builder.with_service_account_path(value),
                "service_account_key" => {
                    serde_json::from_str::<serde_json::Value>(value).map_err(|e| {
                        StorageError::ConfigError(format!(
                            "GCS service_account_key is not valid JSON: {}",
                            e
                        ))
                    })?;
                    builder = builder.with_service_account_key(value)
                }
                "bucket" | "allow_http" => (),
                k if TUNING_OPTIONS.contains(&k) => (),
                _ => tracing::warn!("Unknown GCS option: {}", key),
            }
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create GCS store: {}", e)))?;

        Ok((Box::new(store), format!("gs://{}", bucket)))
    }
}

/// Split a SAS token (with or without the leading '?') into decoded query pairs.
///
/// The Azure credential re-encodes the pairs when signing requests, so values
/// such as `sig` must be handed over percent-decoded.
fn parse_sas_pairs(token: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(token.trim_start_matches('?').as_bytes())
        .filter(|(k, v)| !k.is_empty() && !v.is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn to_file_metadata(meta: ObjectMeta) -> FileMetadata {
    FileMetadata {
        path: meta.location.to_string(),
        size: meta.size,
        last_modified: Some(meta.last_modified),
    }
}

#[async_trait]
impl StorageProvider for ObjectStoreProvider {
    fn base_path(&self) -> &str {
        &self.base_path
    }

    fn list_stream<'a>(&'a self, prefix: &str) -> BoxStream<'a, StorageResult<FileMetadata>> {
        // object_store lists whole path segments; a partial last segment is
        // listed from its parent and filtered by name.
        let (list_root, name_filter) = match prefix.rfind('/') {
            _ if prefix.is_empty() => (None, None),
            Some(idx) if idx + 1 == prefix.len() => (Some(string_to_path(prefix)), None),
            Some(idx) => (
                Some(string_to_path(&prefix[..idx])),
                Some(prefix.to_string()),
            ),
            None => (None, Some(prefix.to_string())),
        };

        self.store
            .list(list_root.as_ref())
            .map(|item| item.map(to_file_metadata).map_err(StorageError::from))
            .try_filter(move |meta| {
                let keep = name_filter
                    .as_deref()
                    .is_none_or(|p| meta.path.starts_with(p));
                future::ready(keep)
            })
            .boxed()
    }

    async fn read_file(&self, path: &str) -> StorageResult<Bytes> {
        let object_path = string_to_path(path);
        let store = Arc::clone(&self.store);

        self.retry_operation(&format!("read_file({})", path), || async {
            let result = store.get(&object_path).await?;
            Ok(result.bytes().await?)
        })
        .await
    }

    async fn write_file(&self, path: &str, data: Bytes) -> StorageResult<()> {
        let object_path = string_to_path(path);
        let store = Arc::clone(&self.store);

        self.retry_operation(&format!("write_file({})", path), || async {
            store
                .put(&object_path, PutPayload::from(data.clone()))
                .await?;
            Ok(())
        })
        .await
    }

    async fn delete_file(&self, path: &str) -> StorageResult<()> {
        let object_path = string_to_path(path);
        let store = Arc::clone(&self.store);

        self.retry_operation(&format!("delete_file({})", path), || async {
            store.delete(&object_path).await?;
            Ok(())
        })
        .await
    }

    async fn exists(&self, path: &str) -> StorageResult<bool> {
        match self.get_metadata(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn get_metadata(&self, path: &str) -> StorageResult<FileMetadata> {
        let object_path = string_to_path(path);
        let store = Arc::clone(&self.store);

        self.retry_operation(&format!("get_metadata({})", path), || async {
            Ok(to_file_metadata(store.head(&object_path).await?))
        })
        .await
    }

    fn uri_from_path(&self, path: &str) -> String {
        if path.starts_with(&self.base_path) {
            path.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_path.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        }
    }
}

impl Debug for ObjectStoreProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "StorageProvider(type=object_store, cloud_provider={}, base_path={})",
            self.config.storage_type_str(),
            self.base_path
        )
    }
}
