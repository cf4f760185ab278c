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

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Object store error: {0}")]
    ObjectStoreError(object_store::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),
}

impl From<object_store::Error> for StorageError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => StorageError::NotFound(path),
            other => StorageError::ObjectStoreError(other),
        }
    }
}

impl StorageError {
    /// Whether the error reports a missing object rather than a failed call.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_error() {
        let error = StorageError::ConfigError("Invalid configuration".to_string());
        assert_eq!(
            error.to_string(),
            "Configuration error: Invalid configuration"
        );
    }

    #[test]
    fn test_object_store_not_found_is_mapped() {
        let source: Box<dyn std::error::Error + Send + Sync> =
            Box::new(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = object_store::Error::NotFound {
            path: "finance/q1.csv".to_string(),
            source,
        };
        let storage_error: StorageError = err.into();

        assert!(storage_error.is_not_found());
        assert_eq!(storage_error.to_string(), "Object not found: finance/q1.csv");
    }

    #[test]
    fn test_other_object_store_errors_are_wrapped() {
        let err = object_store::Error::Generic {
            store: "MicrosoftAzure",
            source: Box::new(io::Error::other("connection reset")),
        };
        let storage_error: StorageError = err.into();

        assert!(!storage_error.is_not_found());
        assert!(storage_error.to_string().starts_with("Object store error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let storage_error: StorageError = io_error.into();
        assert!(storage_error.to_string().contains("IO error"));
    }

    #[test]
    fn test_url_parse_error_conversion() {
        let storage_error: StorageError = url::ParseError::EmptyHost.into();
        assert!(matches!(storage_error, StorageError::UrlParseError(_)));
    }
}
