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

//! Azure storage connection string parsing
//!
//! Function hosts hand out storage credentials as a single
//! `Key=Value;Key=Value` string. Only the keys relevant to blob access are kept.

use super::error::{StorageError, StorageResult};
use url::Url;

const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// The blob-relevant parts of an Azure storage connection string
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AzureConnectionString {
    pub account_name: Option<String>,
    pub account_key: Option<String>,
    pub blob_endpoint: Option<String>,
    pub endpoint_suffix: Option<String>,
    pub protocol: Option<String>,
    pub sas_token: Option<String>,
    pub use_development_storage: bool,
}

impl AzureConnectionString {
    /// Parse a connection string.
    ///
    /// Keys are matched case-insensitively. Values may themselves contain `=`
    /// (account keys are base64), so only the first `=` splits a pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConfigError` if a segment has no `=`, if no
    /// account can be determined, or if `BlobEndpoint` is not a valid URL.
    pub fn parse(raw: &str) -> StorageResult<Self> {
        let mut parsed = AzureConnectionString::default();

        for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                StorageError::ConfigError(format!(
                    "Malformed connection string segment: '{}'",
                    segment
                ))
            })?;
            let value = value.trim().to_string();

            match key.trim().to_ascii_lowercase().as_str() {
                "accountname" => parsed.account_name = Some(value),
                "accountkey" => parsed.account_key = Some(value),
                "blobendpoint" => {
                    Url::parse(&value)?;
                    parsed.blob_endpoint = Some(value.trim_end_matches('/').to_string());
                }
                "endpointsuffix" => parsed.endpoint_suffix = Some(value),
                "defaultendpointsprotocol" => parsed.protocol = Some(value),
                "sharedaccesssignature" => parsed.sas_token = Some(value),
                "usedevelopmentstorage" => {
                    parsed.use_development_storage = value.eq_ignore_ascii_case("true")
                }
                _ => {
                    tracing::debug!("Ignoring connection string key: {}", key);
                }
            }
        }

        if parsed.account_name.is_none() && !parsed.use_development_storage {
            return Err(StorageError::ConfigError(
                "Connection string has no AccountName".to_string(),
            ));
        }

        Ok(parsed)
    }

    /// The blob service endpoint implied by the connection string.
    pub fn blob_endpoint(&self) -> Option<String> {
        if let Some(endpoint) = &self.blob_endpoint {
            return Some(endpoint.clone());
        }
        let account = self.account_name.as_ref()?;
        let protocol = self.protocol.as_deref().unwrap_or("https");
        let suffix = self
            .endpoint_suffix
            .as_deref()
            .unwrap_or(DEFAULT_ENDPOINT_SUFFIX);
        Some(format!("{}://{}.blob.{}", protocol, account, suffix))
    }

    /// Whether the endpoint differs from the public-cloud default and must be set explicitly.
    pub fn has_custom_endpoint(&self) -> bool {
        self.blob_endpoint.is_some()
            || self
                .endpoint_suffix
                .as_deref()
                .is_some_and(|s| s != DEFAULT_ENDPOINT_SUFFIX)
            || self.protocol.as_deref().is_some_and(|p| p != "https")
    }
}
