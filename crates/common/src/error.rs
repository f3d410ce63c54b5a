//! Common error types for ssrsmigrate.

use thiserror::Error;

/// Coarse classification of an [`Error`], used by callers that decide
/// per item whether to continue a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidPath,
    NotFound,
    DuplicateEntry,
    Corrupt,
    ChecksumMismatch,
    AlreadyExists,
    Io,
    Config,
    Other,
}

/// Common error type for ssrsmigrate operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required argument was missing or empty. Displays the argument name.
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    InvalidPath(String),

    #[error("{0}")]
    FileNotFound(String),

    #[error("{0}")]
    DirectoryNotFound(String),

    #[error("Archive not found: {0}")]
    ArchiveNotFound(String),

    #[error("Duplicate entry in {category}: {path}\\{file_name}")]
    DuplicateEntry {
        category: String,
        path: String,
        file_name: String,
    },

    #[error("Corrupt bundle: {0}")]
    Corrupt(String),

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("{0}")]
    AlreadyExists(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias using common Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_argument(name: impl Into<String>) -> Self {
        Error::InvalidArgument(name.into())
    }

    /// Logical item path that does not line up with its staged file.
    pub fn invalid_item_path(path: &str) -> Self {
        Error::InvalidPath(format!("Item path '{}' is invalid.", path))
    }

    /// Logical path rejected by the path validator.
    pub fn invalid_path(path: &str) -> Self {
        Error::InvalidPath(format!("Invalid path '{}'.", path))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::Json(_) => ErrorKind::Other,
            Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Error::InvalidPath(_) => ErrorKind::InvalidPath,
            Error::FileNotFound(_) | Error::DirectoryNotFound(_) | Error::ArchiveNotFound(_) => {
                ErrorKind::NotFound
            }
            Error::DuplicateEntry { .. } => ErrorKind::DuplicateEntry,
            Error::Corrupt(_) => ErrorKind::Corrupt,
            Error::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            Error::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Error::Config(_) => ErrorKind::Config,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind() == ErrorKind::AlreadyExists
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Error::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_argument_and_path() {
        assert_eq!(Error::invalid_argument("itemPath").to_string(), "itemPath");
        assert_eq!(
            Error::invalid_item_path("/Root/Reports").to_string(),
            "Item path '/Root/Reports' is invalid."
        );
        assert_eq!(
            Error::invalid_path("/Root/a.b").to_string(),
            "Invalid path '/Root/a.b'."
        );
        assert_eq!(
            Error::FileNotFound("C:\\temp\\a.rdl".to_string()).to_string(),
            "C:\\temp\\a.rdl"
        );
    }

    #[test]
    fn test_not_found_variants_share_kind() {
        assert_eq!(Error::FileNotFound("a".into()).kind(), ErrorKind::NotFound);
        assert_eq!(Error::DirectoryNotFound("a".into()).kind(), ErrorKind::NotFound);
        assert_eq!(Error::ArchiveNotFound("a".into()).kind(), ErrorKind::NotFound);
        assert!(Error::AlreadyExists("x".into()).is_already_exists());
        assert!(!Error::Corrupt("x".into()).is_already_exists());
    }
}
