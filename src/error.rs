//! Error types for vault operations

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure classification shared by every vault operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotConfigured,
    NotFound,
    NotADirectory,
    InvalidVault,
    PathTraversal,
    InvalidFilename,
    AlreadyExists,
    InvalidOperation,
    InvalidSearchType,
    InvalidPath,
    InvalidTagName,
    NoOp,
    IoFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Vault error type
#[derive(Debug, Error)]
pub enum VaultError {
    /// No vault path in configuration
    #[error("No vault configured (set VAULT_NOTE_PATH or pass --vault)")]
    NotConfigured,

    #[error("Vault path does not exist: {}", .0.display())]
    VaultNotFound(PathBuf),

    #[error("Vault path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Vault directory lacks the marker subdirectory
    #[error("Not a valid vault (missing {marker}): {}", path.display())]
    InvalidVault { path: PathBuf, marker: &'static str },

    #[error("Path outside vault: {}", .0.display())]
    PathTraversal(PathBuf),

    #[error("Invalid filename '{name}': {reason}")]
    InvalidFilename { name: String, reason: &'static str },

    #[error("Note already exists: {0}")]
    AlreadyExists(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Invalid operation: {0}. Use 'replace', 'append', or 'prepend'")]
    InvalidOperation(String),

    #[error("Invalid search type: {0}. Use 'content', 'filename', or 'tag'")]
    InvalidSearchType(String),

    #[error("Search path does not exist: {0}")]
    InvalidPath(String),

    /// Tag is empty after normalization
    #[error("Invalid {which} tag name: '{raw}'")]
    InvalidTagName { which: &'static str, raw: String },

    #[error("{0}")]
    NoOp(String),

    /// Underlying filesystem failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Specialized Result type for vault operations
pub type Result<T> = std::result::Result<T, VaultError>;

impl VaultError {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            VaultError::NotConfigured => ErrorKind::NotConfigured,
            VaultError::VaultNotFound(_) | VaultError::NoteNotFound(_) => ErrorKind::NotFound,
            VaultError::NotADirectory(_) => ErrorKind::NotADirectory,
            VaultError::InvalidVault { .. } => ErrorKind::InvalidVault,
            VaultError::PathTraversal(_) => ErrorKind::PathTraversal,
            VaultError::InvalidFilename { .. } => ErrorKind::InvalidFilename,
            VaultError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            VaultError::InvalidOperation(_) => ErrorKind::InvalidOperation,
            VaultError::InvalidSearchType(_) => ErrorKind::InvalidSearchType,
            VaultError::InvalidPath(_) => ErrorKind::InvalidPath,
            VaultError::InvalidTagName { .. } => ErrorKind::InvalidTagName,
            VaultError::NoOp(_) => ErrorKind::NoOp,
            VaultError::Io { .. } => ErrorKind::IoFailure,
        }
    }
}

/// Attach a path to `io::Result`s
pub(crate) trait IoResultExt<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| VaultError::io(path, e))
    }
}
