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

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{BoxStream, TryStreamExt};
use object_store::path::Path as ObjectPath;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use super::error::StorageResult;

/// Metadata about a file in storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Full path to the file, relative to the container or bucket
    pub path: String,

    /// File size in bytes
    pub size: u64,

    /// Last modified timestamp (if available)
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

/// Generic trait for cloud storage providers
///
/// One provider addresses exactly one container or bucket. Paths passed to
/// every method are relative to that container.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Get the base URL for this storage provider, e.g. `gs://bucket`.
    fn base_path(&self) -> &str;

    /// Lazily list every object whose path starts with `prefix`.
    ///
    /// The stream is one-shot; server-side pagination is followed internally.
    /// An empty prefix lists the whole container.
    fn list_stream<'a>(&'a self, prefix: &str) -> BoxStream<'a, StorageResult<FileMetadata>>;

    /// List every object under `prefix` into memory.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by the underlying listing.
    async fn list_files(&self, prefix: &str) -> StorageResult<Vec<FileMetadata>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Read the full contents of a file.
    ///
    /// # Errors
    ///
    /// * `StorageError::NotFound` if the object does not exist
    /// * Any network or permission error raised by the backend
    async fn read_file(&self, path: &str) -> StorageResult<Bytes>;

    /// Write `data` to `path`, replacing any existing object.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the upload.
    async fn write_file(&self, path: &str, data: Bytes) -> StorageResult<()>;

    /// Delete the object at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete.
    async fn delete_file(&self, path: &str) -> StorageResult<()>;

    /// Check if a file exists.
    ///
    /// # Errors
    ///
    /// Returns an error for any failure other than NotFound.
    async fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Get metadata for a specific file.
    ///
    /// # Errors
    ///
    /// * `StorageError::NotFound` if the object does not exist
    /// * Any network or permission error raised by the backend
    async fn get_metadata(&self, path: &str) -> StorageResult<FileMetadata>;

    /// Get a full provider-specific URL for a path (e.g. "gs://bucket/path").
    fn uri_from_path(&self, path: &str) -> String;
}

impl Debug for dyn StorageProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "StorageProvider(base_path={})", self.base_path())
    }
}

/// Helper function to create an ObjectPath from a string
pub(crate) fn string_to_path(s: &str) -> ObjectPath {
    ObjectPath::from(s)
}
