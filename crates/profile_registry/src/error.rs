//! Error types for the profile registry

use std::{io::Error as IoError, path::PathBuf};
use thiserror::Error;

use crate::profile::ProfileId;

/// Coarse classification of every failure the registry can report.
///
/// Callers that translate failures into a transport response (HTTP status,
/// exit code, ...) should match on this rather than on the concrete enums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    MissingSlot,
    EmptyUpload,
    ReadError,
    WriteError,
    ParseError,
    ConflictingId,
}

/// Document store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read directory {0}: {1}")]
    DirectoryRead(PathBuf, IoError),

    #[error("Failed to read file {0}: {1}")]
    Read(PathBuf, IoError),

    #[error("Failed to write file {0}: {1}")]
    Write(PathBuf, IoError),

    #[error("Failed to parse file {0}: {1}")]
    Parse(PathBuf, serde_json::Error),

    #[error("Failed to serialize document for {0}: {1}")]
    Serialize(PathBuf, serde_json::Error),

    #[error("Profile directory name is not a numeric id: {0}")]
    InvalidProfileDir(String),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::DirectoryRead(..) | StoreError::Read(..) => ErrorKind::ReadError,
            StoreError::Write(..) | StoreError::Serialize(..) => ErrorKind::WriteError,
            StoreError::Parse(..) | StoreError::InvalidProfileDir(_) => ErrorKind::ParseError,
        }
    }
}

/// Registry operation errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Profile {0} not found")]
    NotFound(ProfileId),

    #[error("Profile id {0} is already in use")]
    ConflictingId(ProfileId),

    #[error("Profile {0} is missing required document {1}")]
    MissingSlot(ProfileId, &'static str),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::NotFound(_) => ErrorKind::NotFound,
            RegistryError::ConflictingId(_) => ErrorKind::ConflictingId,
            RegistryError::MissingSlot(..) => ErrorKind::MissingSlot,
            RegistryError::Store(e) => e.kind(),
        }
    }
}

/// Archive import/export errors
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Profile {0} not found")]
    NotFound(ProfileId),

    #[error("Required upload {0} is missing")]
    MissingSlot(&'static str),

    #[error("Required upload {0} is empty")]
    EmptyUpload(&'static str),

    #[error("Upload {0} is not a valid document: {1}")]
    Parse(&'static str, serde_json::Error),

    #[error("Failed to write file {0}: {1}")]
    Write(PathBuf, IoError),

    #[error("Archive I/O error: {0}")]
    Io(#[from] IoError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl ArchiveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArchiveError::NotFound(_) => ErrorKind::NotFound,
            ArchiveError::MissingSlot(_) => ErrorKind::MissingSlot,
            ArchiveError::EmptyUpload(_) => ErrorKind::EmptyUpload,
            ArchiveError::Parse(..) => ErrorKind::ParseError,
            ArchiveError::Write(..) => ErrorKind::WriteError,
            ArchiveError::Io(_) => ErrorKind::ReadError,
            ArchiveError::Registry(e) => e.kind(),
            ArchiveError::Store(e) => e.kind(),
        }
    }
}

// Result type aliases for convenience
pub type StoreResult<T> = Result<T, StoreError>;
pub type RegistryResult<T> = Result<T, RegistryError>;
pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_kind_delegates_to_store() {
        let err = RegistryError::from(StoreError::Read(
            PathBuf::from("1/event.json"),
            IoError::new(std::io::ErrorKind::NotFound, "gone"),
        ));
        assert_eq!(err.kind(), ErrorKind::ReadError);
        assert_eq!(RegistryError::NotFound(7).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_archive_kinds() {
        assert_eq!(ArchiveError::MissingSlot("bop").kind(), ErrorKind::MissingSlot);
        assert_eq!(ArchiveError::EmptyUpload("event").kind(), ErrorKind::EmptyUpload);
        assert_eq!(
            ArchiveError::from(RegistryError::NotFound(3)).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ArchiveError::MissingSlot("settings");
        assert_eq!(err.to_string(), "Required upload settings is missing");

        let err = StoreError::InvalidProfileDir("backup".to_string());
        assert!(err.to_string().contains("backup"));
    }
}
