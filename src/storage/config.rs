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

use super::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Storage provider type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Local filesystem storage
    #[serde(alias = "file")]
    Local,
    /// AWS S3 storage
    #[serde(alias = "s3")]
    Aws,
    /// Azure Blob Storage
    #[serde(alias = "blob")]
    Azure,
    /// Google Cloud Storage
    #[serde(alias = "gcp")]
    Gcs,
    /// Process-local in-memory store, used for dry runs and tests
    Memory,
}

impl StorageType {
    /// Parse a storage type name, accepting the common aliases.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConfigError` for an unknown name.
    pub fn parse(name: &str) -> StorageResult<Self> {
        match name.to_lowercase().as_str() {
            "local" | "file" => Ok(StorageType::Local),
            "aws" | "s3" => Ok(StorageType::Aws),
            "azure" | "blob" => Ok(StorageType::Azure),
            "gcs" | "gcp" => Ok(StorageType::Gcs),
            "memory" => Ok(StorageType::Memory),
            _ => Err(StorageError::ConfigError(format!(
                "Unknown storage type: {}",
                name
            ))),
        }
    }
}

/// Generic configuration for storage providers using object_store
///
/// Provider-specific options are kept in a flat map and applied to the
/// matching object_store builder when the provider is created.
///
/// # Examples
///
/// ## Azure source container from a connection string
/// ```
/// use blob_relay::storage::StorageConfig;
///
/// let config = StorageConfig::azure()
///     .with_option("container", "outbound")
///     .with_option(
///         "connection_string",
///         "DefaultEndpointsProtocol=https;AccountName=acme;AccountKey=a2V5;EndpointSuffix=core.windows.net",
///     );
/// ```
///
/// ## GCS destination bucket
/// ```
/// use blob_relay::storage::StorageConfig;
///
/// let config = StorageConfig::gcs()
///     .with_option("bucket", "partner-drop")
///     .with_option("service_account_key", "{\"type\":\"service_account\"}");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage provider type
    #[serde(rename = "type")]
    pub storage_type: StorageType,

    /// Provider-specific configuration options
    ///
    /// Azure:
    /// - container: Container name
    /// - connection_string: Storage account connection string
    /// - account_name / access_key: Explicit account credentials
    /// - sas_token: SAS token
    /// - tenant_id / client_id / client_secret: Service principal
    /// - endpoint: Custom blob endpoint
    ///
    /// GCS:
    /// - bucket: Bucket name
    /// - service_account_key: Service account key as JSON string
    /// - service_account_key_path: Path to service account JSON key file
    ///
    /// AWS S3:
    /// - bucket, region, access_key_id, secret_access_key, session_token, endpoint
    ///
    /// Local:
    /// - path: Base directory
    ///
    /// Memory:
    /// - name: Label used in URIs and logs
    #[serde(default)]
    pub options: HashMap<String, String>,
}

/// Option keys consumed by connection and retry tuning rather than by a provider builder.
pub(crate) const TUNING_OPTIONS: [&str; 6] = [
    "timeout",
    "connect_timeout",
    "max_retries",
    "retry_timeout",
    "pool_idle_timeout",
    "pool_max_idle_per_host",
];

impl StorageConfig {
    /// Create a storage configuration from a type name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConfigError` if the type name is not recognised.
    pub fn try_new(storage_type: &str) -> StorageResult<Self> {
        let storage_type = StorageType::parse(storage_type)?;
        Ok(Self::new(storage_type))
    }

    /// Create a storage configuration with the defaults for `storage_type`.
    pub fn new(storage_type: StorageType) -> Self {
        let options = match storage_type {
            StorageType::Memory => HashMap::new(),
            _ => Self::default_options(),
        };
        Self {
            storage_type,
            options,
        }
    }

    /// Create a local filesystem storage configuration.
    pub fn local() -> Self {
        Self::new(StorageType::Local)
    }

    /// Create an AWS S3 storage configuration.
    pub fn aws() -> Self {
        Self::new(StorageType::Aws)
    }

    /// Create an Azure Blob Storage configuration.
    pub fn azure() -> Self {
        Self::new(StorageType::Azure)
    }

    /// Create a GCS storage configuration.
    pub fn gcs() -> Self {
        Self::new(StorageType::Gcs)
    }

    /// Create an in-memory storage configuration.
    pub fn memory() -> Self {
        Self::new(StorageType::Memory)
    }

    /// Default timeout, retry, and connection pool settings.
    pub fn default_options() -> HashMap<String, String> {
        [
            ("timeout", "300"),
            ("connect_timeout", "30"),
            ("max_retries", "5"),
            ("retry_timeout", "300"),
            ("pool_idle_timeout", "15"),
            ("pool_max_idle_per_host", "5"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// Add a configuration option (for method chaining).
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Add multiple configuration options (for method chaining).
    pub fn with_options(mut self, options: HashMap<String, String>) -> Self {
        self.options.extend(options);
        self
    }

    /// Get a configuration option.
    pub fn get_option(&self, key: &str) -> Option<&String> {
        self.options.get(key)
    }

    /// Get a configuration option, failing with a `ConfigError` naming the provider if absent.
    pub fn require_option(&self, key: &str) -> StorageResult<&String> {
        self.get_option(key).ok_or_else(|| {
            StorageError::ConfigError(format!(
                "{} storage requires '{}' option",
                self.storage_type_str(),
                key
            ))
        })
    }

    /// Get the storage type as a string.
    pub fn storage_type_str(&self) -> &str {
        match self.storage_type {
            StorageType::Local => "local",
            StorageType::Aws => "aws",
            StorageType::Azure => "azure",
            StorageType::Gcs => "gcs",
            StorageType::Memory => "memory",
        }
    }
}
