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

//! Relay configuration
//!
//! Settings come from flags and environment variables (see [`crate::cli`])
//! or from a JSON file with the same structure as [`RelayConfig`]. The `ENV_*`
//! constants name the environment variables and are used in error messages.

use crate::notify::graph::{DEFAULT_AUTHORITY_HOST, DEFAULT_GRAPH_BASE_URL};
use crate::storage::azure::AzureConnectionString;
use crate::storage::{StorageConfig, StorageError, StorageType};
use crate::transfer::{
    CopyConfirmation, FailurePolicy, DEFAULT_DESTINATION_BASE, DEFAULT_SOURCE_PREFIXES,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_AZURE_CONNECTION: &str = "AzureWebJobsStorage";
pub const ENV_SOURCE_CONTAINER: &str = "SOURCE_CONTAINER";
pub const ENV_ARCHIVE_CONTAINER: &str = "ARCHIVE_CONTAINER";
pub const ENV_SOURCE_PREFIXES: &str = "SOURCE_PREFIXES";
pub const ENV_GCS_BUCKET: &str = "GCS_BUCKET_NAME";
pub const ENV_GCS_BASE_PATH: &str = "GCS_BASE_PATH";
pub const ENV_GCS_CREDENTIALS: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ENV_GRAPH_TENANT_ID: &str = "GRAPH_TENANT_ID";
pub const ENV_GRAPH_CLIENT_ID: &str = "GRAPH_CLIENT_ID";
pub const ENV_GRAPH_CLIENT_SECRET: &str = "GRAPH_CLIENT_SECRET";
pub const ENV_MAIL_FROM: &str = "MAIL_FROM";
pub const ENV_MAIL_TO: &str = "MAIL_TO";
pub const ENV_FAILURE_POLICY: &str = "FAILURE_POLICY";
pub const ENV_COPY_CONFIRM_ATTEMPTS: &str = "COPY_CONFIRM_ATTEMPTS";
pub const ENV_COPY_CONFIRM_INTERVAL_MS: &str = "COPY_CONFIRM_INTERVAL_MS";

/// Errors that make the relay refuse to start
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },

    #[error("GCS service account credentials are not valid JSON: {0}")]
    InvalidServiceAccount(#[source] serde_json::Error),

    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ConfigError {
    fn invalid(key: &str, reason: impl fmt::Display) -> Self {
        ConfigError::Invalid {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A credential that never shows up in logs
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Secret(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Secret(value.to_string())
    }
}

/// Graph mail settings; every field but the URLs is needed to send a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<Secret>,
    pub mail_from: Option<String>,
    pub mail_to: Option<String>,
    pub authority_host: String,
    pub graph_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            tenant_id: None,
            client_id: None,
            client_secret: None,
            mail_from: None,
            mail_to: None,
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            graph_base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl NotificationConfig {
    /// Names of the settings that are absent or blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
        let mut missing = Vec::new();
        if blank(&self.tenant_id) {
            missing.push(ENV_GRAPH_TENANT_ID);
        }
        if blank(&self.client_id) {
            missing.push(ENV_GRAPH_CLIENT_ID);
        }
        if self.client_secret.as_ref().is_none_or(Secret::is_blank) {
            missing.push(ENV_GRAPH_CLIENT_SECRET);
        }
        if blank(&self.mail_from) {
            missing.push(ENV_MAIL_FROM);
        }
        if blank(&self.mail_to) {
            missing.push(ENV_MAIL_TO);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// Everything the relay needs for one sweep
///
/// The source and archive containers live in the same Azure storage account
/// and share its connection string. Storage types can be overridden (for
/// example to `memory` or `local`) for dry runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub source_storage_type: StorageType,
    pub source_container: String,
    pub archive_container: String,
    pub source_prefixes: Vec<String>,
    pub azure_connection_string: Option<Secret>,
    /// Extra `StorageConfig` options for the source and archive stores.
    pub source_options: HashMap<String, String>,

    pub destination_storage_type: StorageType,
    pub destination_bucket: Option<String>,
    pub destination_base_path: String,
    /// Inline service-account key JSON.
    pub gcs_service_account: Option<Secret>,
    /// Extra `StorageConfig` options for the destination store.
    pub destination_options: HashMap<String, String>,

    pub notification: NotificationConfig,
    pub failure_policy: FailurePolicy,
    pub copy_confirmation: CopyConfirmation,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            source_storage_type: StorageType::Azure,
            source_container: "outbound".to_string(),
            archive_container: "archive".to_string(),
            source_prefixes: DEFAULT_SOURCE_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            azure_connection_string: None,
            source_options: HashMap::new(),
            destination_storage_type: StorageType::Gcs,
            destination_bucket: None,
            destination_base_path: DEFAULT_DESTINATION_BASE.to_string(),
            gcs_service_account: None,
            destination_options: HashMap::new(),
            notification: NotificationConfig::default(),
            failure_policy: FailurePolicy::default(),
            copy_confirmation: CopyConfirmation::default(),
        }
    }
}

impl RelayConfig {
    /// Load from a JSON file shaped like this struct; absent fields take defaults.
    ///
    /// # Errors
    ///
    /// * `ConfigError::Io` if the file cannot be read
    /// * `ConfigError::Parse` if it is not valid JSON for this struct
    /// * Any error from [`RelayConfig::validate`]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RelayConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the settings the stores need. Notification settings are not
    /// checked; an incomplete channel only disables the report.
    ///
    /// # Errors
    ///
    /// * `ConfigError::Missing` for an absent connection string or bucket
    /// * `ConfigError::Invalid` for empty containers or prefixes
    /// * `ConfigError::InvalidServiceAccount` for a key that is not JSON
    /// * `ConfigError::Storage` for a malformed connection string
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_container.trim().is_empty() {
            return Err(ConfigError::invalid(ENV_SOURCE_CONTAINER, "must not be empty"));
        }
        if self.archive_container.trim().is_empty() {
            return Err(ConfigError::invalid(ENV_ARCHIVE_CONTAINER, "must not be empty"));
        }
        if self.source_container == self.archive_container {
            return Err(ConfigError::invalid(
                ENV_ARCHIVE_CONTAINER,
                "must differ from the source container",
            ));
        }
        if self.source_prefixes.is_empty() {
            return Err(ConfigError::invalid(
                ENV_SOURCE_PREFIXES,
                "at least one prefix is required",
            ));
        }

        if self.source_storage_type == StorageType::Azure {
            let raw = self
                .azure_connection_string
                .as_ref()
                .filter(|s| !s.is_blank())
                .ok_or(ConfigError::Missing(ENV_AZURE_CONNECTION))?;
            AzureConnectionString::parse(raw.expose())?;
        }

        if matches!(
            self.destination_storage_type,
            StorageType::Gcs | StorageType::Aws
        ) && self.bucket().is_none()
        {
            return Err(ConfigError::Missing(ENV_GCS_BUCKET));
        }

        if let Some(key) = self.gcs_service_account.as_ref().filter(|s| !s.is_blank()) {
            serde_json::from_str::<serde_json::Value>(key.expose())
                .map_err(ConfigError::InvalidServiceAccount)?;
        }

        Ok(())
    }

    fn bucket(&self) -> Option<&str> {
        self.destination_bucket
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }

    /// Storage configuration for the live container.
    pub fn source_storage_config(&self) -> StorageConfig {
        self.container_config(&self.source_container)
    }

    /// Storage configuration for the archive container.
    pub fn archive_storage_config(&self) -> StorageConfig {
        self.container_config(&self.archive_container)
    }

    fn container_config(&self, container: &str) -> StorageConfig {
        let mut config = StorageConfig::new(self.source_storage_type.clone());
        config = match self.source_storage_type {
            StorageType::Azure => {
                let mut config = config.with_option("container", container);
                if let Some(raw) = &self.azure_connection_string {
                    config = config.with_option("connection_string", raw.expose());
                }
                config
            }
            StorageType::Memory => config.with_option("name", container),
            StorageType::Local => config.with_option("path", container),
            StorageType::Aws | StorageType::Gcs => config.with_option("bucket", container),
        };
        config.with_options(self.source_options.clone())
    }

    /// Storage configuration for the destination bucket.
    pub fn destination_storage_config(&self) -> StorageConfig {
        let bucket = self.bucket().unwrap_or_default();
        let mut config = StorageConfig::new(self.destination_storage_type.clone());
        config = match self.destination_storage_type {
            StorageType::Gcs => {
                let mut config = config.with_option("bucket", bucket);
                if let Some(key) = self.gcs_service_account.as_ref().filter(|s| !s.is_blank()) {
                    config = config.with_option("service_account_key", key.expose());
                }
                config
            }
            StorageType::Aws => config.with_option("bucket", bucket),
            StorageType::Memory => config.with_option("name", bucket),
            StorageType::Local => config.with_option("path", bucket),
            StorageType::Azure => config.with_option("container", bucket),
        };
        config.with_options(self.destination_options.clone())
    }
}
