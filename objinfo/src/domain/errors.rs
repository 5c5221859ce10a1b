//! Structured error types for objinfo
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::types::{Backend, ObjectKind};

/// Failure while scanning a `key:\tvalue` record.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("missing field {0}")]
    MissingField(String),

    #[error("can't parse field {field}: {value:?}")]
    Decode { field: String, value: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure while parsing a textual program tag.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TagError {
    #[error("tag must be {expected} hex characters, got {actual}")]
    Length { expected: usize, actual: usize },

    #[error("invalid hex in tag {0:?}")]
    InvalidHex(String),
}

/// Failure while resolving map or program metadata.
#[derive(Error, Debug)]
pub enum InfoError {
    /// The running kernel lacks the requested facility. Only surfaced when
    /// a backend is forced; the automatic path falls back instead.
    #[error("{operation} not supported by the running kernel")]
    NotSupported { operation: &'static str },

    /// The descriptor no longer refers to a live object.
    #[error("descriptor {fd} cannot be resolved via {backend}: {source}")]
    Unresolvable {
        fd: i32,
        backend: Backend,
        #[source]
        source: io::Error,
    },

    /// The descriptor is a BPF object, but not of the requested category.
    #[error("descriptor {fd} is a {actual}, not a {expected}")]
    WrongKind { fd: i32, expected: ObjectKind, actual: ObjectKind },

    #[error("malformed info record {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: ScanError,
    },

    #[error("BPF_OBJ_GET_INFO_BY_FD failed: {0}")]
    Query(#[source] io::Error),
}

impl InfoError {
    /// Whether the error only means the kernel is too old for the query.
    #[must_use]
    pub fn is_not_supported(&self) -> bool {
        matches!(self, Self::NotSupported { .. })
    }
}
