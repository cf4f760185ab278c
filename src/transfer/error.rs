use crate::storage::StorageError;
use thiserror::Error;

/// Failure moving one object (or listing one prefix) from the source store to the destination.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Failed to list prefix '{prefix}': {source}")]
    List {
        prefix: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to download '{object}': {source}")]
    Download {
        object: String,
        #[source]
        source: StorageError,
    },

    #[error("Failed to upload '{object}' to '{destination}': {source}")]
    Upload {
        object: String,
        destination: String,
        #[source]
        source: StorageError,
    },
}

impl TransferError {
    /// The object or prefix the failure refers to.
    pub fn subject(&self) -> &str {
        match self {
            TransferError::List { prefix, .. } => prefix,
            TransferError::Download { object, .. } | TransferError::Upload { object, .. } => {
                object
            }
        }
    }
}

/// Failure relocating an object from the live container to the archive container.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to copy '{object}' into the archive container: {source}")]
    Copy {
        object: String,
        #[source]
        source: StorageError,
    },

    #[error("Archive copy of '{object}' not confirmed after {attempts} checks")]
    CopyNotConfirmed { object: String, attempts: u32 },

    #[error("Failed to delete '{object}' from the live container: {source}")]
    Delete {
        object: String,
        #[source]
        source: StorageError,
    },
}

impl ArchiveError {
    pub fn object(&self) -> &str {
        match self {
            ArchiveError::Copy { object, .. }
            | ArchiveError::CopyNotConfirmed { object, .. }
            | ArchiveError::Delete { object, .. } => object,
        }
    }
}

/// Error that ends a sweep early under [`FailurePolicy::AbortOnError`](super::FailurePolicy).
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("Archive failed: {0}")]
    Archive(#[from] ArchiveError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_messages() {
        let err = TransferError::Upload {
            object: "finance/q1.csv".to_string(),
            destination: "upload/finance/q1.csv".to_string(),
            source: StorageError::ConfigError("denied".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Failed to upload 'finance/q1.csv' to 'upload/finance/q1.csv': Configuration error: denied"
        );
        assert_eq!(err.subject(), "finance/q1.csv");

        let list = TransferError::List {
            prefix: "marketing/".to_string(),
            source: StorageError::NotFound("container".to_string()),
        };
        assert_eq!(list.subject(), "marketing/");
    }

    #[test]
    fn test_archive_error_object() {
        let err = ArchiveError::CopyNotConfirmed {
            object: "shipping/label.pdf".to_string(),
            attempts: 4,
        };
        assert_eq!(err.object(), "shipping/label.pdf");
        assert!(err.to_string().contains("after 4 checks"));
    }

    #[test]
    fn test_sweep_error_from() {
        let err: SweepError = ArchiveError::Delete {
            object: "a".to_string(),
            source: StorageError::NotFound("a".to_string()),
        }
        .into();
        assert!(matches!(err, SweepError::Archive(_)));
        assert!(err.to_string().starts_with("Archive failed"));
    }
}
