//! Source enumeration: turns a prefix into the stream of objects to move.

use super::error::TransferError;
use crate::storage::{FileMetadata, StorageProvider};
use futures::stream::{BoxStream, StreamExt};
use std::fmt;
use std::sync::Arc;

/// A discovered blob in the live container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    /// Full path inside the container, prefix included (e.g. `finance/q1.csv`).
    pub name: String,
    /// Size reported by the listing.
    pub size: u64,
}

impl ObjectRef {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

impl From<FileMetadata> for ObjectRef {
    fn from(meta: FileMetadata) -> Self {
        Self {
            name: meta.path,
            size: meta.size,
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Directory markers carry no content and end in the path separator.
pub fn is_directory_marker(name: &str) -> bool {
    name.ends_with('/')
}

/// Lists the live container one prefix at a time.
pub struct SourceEnumerator {
    source: Arc<dyn StorageProvider>,
}

impl SourceEnumerator {
    pub fn new(source: Arc<dyn StorageProvider>) -> Self {
        Self { source }
    }

    /// Lazily yield every object under `prefix`, skipping directory markers.
    ///
    /// The stream is one-shot. A listing failure is yielded as a
    /// [`TransferError::List`] item.
    pub fn objects<'a>(&'a self, prefix: &str) -> BoxStream<'a, Result<ObjectRef, TransferError>> {
        let owned_prefix = prefix.to_string();
        self.source
            .list_stream(prefix)
            .filter_map(move |item| {
                let item = match item {
                    Ok(meta) if is_directory_marker(&meta.path) => {
                        tracing::debug!("Skipping directory marker {}", meta.path);
                        None
                    }
                    Ok(meta) => Some(Ok(ObjectRef::from(meta))),
                    Err(source) => Some(Err(TransferError::List {
                        prefix: owned_prefix.clone(),
                        source,
                    })),
                };
                futures::future::ready(item)
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageError, StorageResult};
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures::stream;
    use futures::TryStreamExt;

    /// Listing that replays fixed entries, optionally ending in an error.
    struct ScriptedListing {
        entries: Vec<&'static str>,
        fail_at_end: bool,
    }

    #[async_trait]
    impl StorageProvider for ScriptedListing {
        fn base_path(&self) -> &str {
            "scripted://live"
        }

        fn list_stream<'a>(&'a self, prefix: &str) -> BoxStream<'a, StorageResult<FileMetadata>> {
            let prefix = prefix.to_string();
            let mut items: Vec<StorageResult<FileMetadata>> = self
                .entries
                .iter()
                .filter(|p| p.starts_with(&prefix))
                .map(|p| {
                    Ok(FileMetadata {
                        path: p.to_string(),
                        size: p.len() as u64,
                        last_modified: None,
                    })
                })
                .collect();
            if self.fail_at_end {
                items.push(Err(StorageError::ConfigError("listing denied".to_string())));
            }
            stream::iter(items).boxed()
        }

        async fn read_file(&self, _path: &str) -> StorageResult<Bytes> {
            unreachable!()
        }

        async fn write_file(&self, _path: &str, _data: Bytes) -> StorageResult<()> {
            unreachable!()
        }

        async fn delete_file(&self, _path: &str) -> StorageResult<()> {
            unreachable!()
        }

        async fn exists(&self, _path: &str) -> StorageResult<bool> {
            unreachable!()
        }

        async fn get_metadata(&self, _path: &str) -> StorageResult<FileMetadata> {
            unreachable!()
        }

        fn uri_from_path(&self, path: &str) -> String {
            path.to_string()
        }
    }

    #[tokio::test]
    async fn test_objects_skips_directory_markers() {
        let enumerator = SourceEnumerator::new(Arc::new(ScriptedListing {
            entries: vec![
                "marketing/",
                "marketing/brief.docx",
                "marketing/2024/",
                "marketing/2024/plan.xlsx",
                "finance/q1.csv",
            ],
            fail_at_end: false,
        }));

        let objects: Vec<ObjectRef> = enumerator.objects("marketing/").try_collect().await.unwrap();
        let names: Vec<&str> = objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["marketing/brief.docx", "marketing/2024/plan.xlsx"]);
    }

    #[tokio::test]
    async fn test_objects_keeps_listing_order() {
        let enumerator = SourceEnumerator::new(Arc::new(ScriptedListing {
            entries: vec!["shipping/z.pdf", "shipping/a.pdf", "shipping/m.pdf"],
            fail_at_end: false,
        }));

        let objects: Vec<ObjectRef> = enumerator.objects("shipping/").try_collect().await.unwrap();
        assert_eq!(
            objects,
            vec![
                ObjectRef::new("shipping/z.pdf", 14),
                ObjectRef::new("shipping/a.pdf", 14),
                ObjectRef::new("shipping/m.pdf", 14),
            ]
        );
    }

    #[tokio::test]
    async fn test_listing_error_is_tagged_with_prefix() {
        let enumerator = SourceEnumerator::new(Arc::new(ScriptedListing {
            entries: vec!["finance/q1.csv"],
            fail_at_end: true,
        }));

        let items: Vec<Result<ObjectRef, TransferError>> =
            enumerator.objects("finance/").collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        match &items[1] {
            Err(TransferError::List { prefix, .. }) => assert_eq!(prefix, "finance/"),
            other => panic!("Expected List error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_objects_matches_name_prefix_not_just_folders() {
        let live = crate::storage::StorageProviderFactory::from_config(
            crate::storage::StorageConfig::memory().with_option("name", "outbound"),
        )
        .await
        .unwrap();
        live.write_file("finance/q1.csv", Bytes::from_static(b"q1"))
            .await
            .unwrap();
        live.write_file("finance-old/q0.csv", Bytes::from_static(b"q0"))
            .await
            .unwrap();
        live.write_file("shipping/label.pdf", Bytes::from_static(b"l"))
            .await
            .unwrap();

        let enumerator = SourceEnumerator::new(live);
        let mut names: Vec<String> = enumerator
            .objects("fin")
            .map_ok(|o| o.name)
            .try_collect()
            .await
            .unwrap();
        names.sort();
        assert_eq!(names, vec!["finance-old/q0.csv", "finance/q1.csv"]);
    }

    #[test]
    fn test_is_directory_marker() {
        assert!(is_directory_marker("engineering/"));
        assert!(!is_directory_marker("engineering/design.md"));
    }
}
