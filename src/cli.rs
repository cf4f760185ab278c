//! Command-line and environment settings for the `blob-relay` binary.
//!
//! Every setting can be passed as a flag or through the environment variable
//! a Functions host exposes. A JSON file given as the only positional argument
//! replaces all of them.

use crate::config::{
    ConfigError, NotificationConfig, RelayConfig, Secret, ENV_ARCHIVE_CONTAINER,
    ENV_AZURE_CONNECTION, ENV_COPY_CONFIRM_ATTEMPTS, ENV_COPY_CONFIRM_INTERVAL_MS,
    ENV_FAILURE_POLICY, ENV_GCS_BASE_PATH, ENV_GCS_BUCKET, ENV_GCS_CREDENTIALS,
    ENV_GRAPH_CLIENT_ID, ENV_GRAPH_CLIENT_SECRET, ENV_GRAPH_TENANT_ID, ENV_MAIL_FROM,
    ENV_MAIL_TO, ENV_SOURCE_CONTAINER, ENV_SOURCE_PREFIXES,
};
use crate::transfer::{
    CopyConfirmation, FailurePolicy, DEFAULT_DESTINATION_BASE, DEFAULT_SOURCE_PREFIXES,
};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "blob-relay",
    version,
    about = "Move department drops from Azure Blob Storage to GCS, archive them and mail a report"
)]
pub struct RelayArgs {
    /// JSON configuration file; when given, every other setting is ignored.
    #[arg(value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = ENV_AZURE_CONNECTION, hide_env_values = true)]
    pub azure_connection_string: Option<String>,

    #[arg(long, env = ENV_SOURCE_CONTAINER, default_value = "outbound")]
    pub source_container: String,

    #[arg(long, env = ENV_ARCHIVE_CONTAINER, default_value = "archive")]
    pub archive_container: String,

    /// Prefixes swept in order, comma separated.
    #[arg(
        long,
        env = ENV_SOURCE_PREFIXES,
        value_delimiter = ',',
        default_values_t = DEFAULT_SOURCE_PREFIXES.map(String::from)
    )]
    pub source_prefixes: Vec<String>,

    #[arg(long = "gcs-bucket", env = ENV_GCS_BUCKET)]
    pub destination_bucket: Option<String>,

    #[arg(long = "gcs-base-path", env = ENV_GCS_BASE_PATH, default_value = DEFAULT_DESTINATION_BASE)]
    pub destination_base_path: String,

    /// Inline service-account key JSON.
    #[arg(long = "gcs-credentials", env = ENV_GCS_CREDENTIALS, hide_env_values = true)]
    pub gcs_service_account: Option<String>,

    #[arg(long, env = ENV_GRAPH_TENANT_ID)]
    pub graph_tenant_id: Option<String>,

    #[arg(long, env = ENV_GRAPH_CLIENT_ID)]
    pub graph_client_id: Option<String>,

    #[arg(long, env = ENV_GRAPH_CLIENT_SECRET, hide_env_values = true)]
    pub graph_client_secret: Option<String>,

    #[arg(long, env = ENV_MAIL_FROM)]
    pub mail_from: Option<String>,

    /// Report recipients, separated by `,` or `;`.
    #[arg(long, env = ENV_MAIL_TO)]
    pub mail_to: Option<String>,

    /// `continue` records failures and keeps sweeping, `abort` stops at the first one.
    #[arg(long, env = ENV_FAILURE_POLICY, default_value = "continue")]
    pub failure_policy: FailurePolicy,

    /// Archive checks before giving up; 0 deletes without checking.
    #[arg(long, env = ENV_COPY_CONFIRM_ATTEMPTS, default_value_t = 5)]
    pub copy_confirm_attempts: u32,

    #[arg(long, env = ENV_COPY_CONFIRM_INTERVAL_MS, default_value_t = 500)]
    pub copy_confirm_interval_ms: u64,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RelayArgs {
    /// Resolve the settings into a validated [`RelayConfig`].
    ///
    /// # Errors
    ///
    /// Any error from [`RelayConfig::from_json_file`] or [`RelayConfig::validate`].
    pub fn into_config(self) -> Result<RelayConfig, ConfigError> {
        if let Some(path) = &self.config {
            info!("Loading configuration from {}", path.display());
            return RelayConfig::from_json_file(path);
        }

        let config = RelayConfig {
            source_container: self.source_container,
            archive_container: self.archive_container,
            source_prefixes: self
                .source_prefixes
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect(),
            azure_connection_string: non_blank(self.azure_connection_string).map(Secret::from),
            destination_bucket: non_blank(self.destination_bucket),
            destination_base_path: self.destination_base_path,
            gcs_service_account: non_blank(self.gcs_service_account).map(Secret::from),
            notification: NotificationConfig {
                tenant_id: non_blank(self.graph_tenant_id),
                client_id: non_blank(self.graph_client_id),
                client_secret: non_blank(self.graph_client_secret).map(Secret::from),
                mail_from: non_blank(self.mail_from),
                mail_to: non_blank(self.mail_to),
                ..Default::default()
            },
            failure_policy: self.failure_policy,
            copy_confirmation: CopyConfirmation::new(
                self.copy_confirm_attempts,
                Duration::from_millis(self.copy_confirm_interval_ms),
            ),
            ..Default::default()
        };

        config.validate()?;
        Ok(config)
    }
}
