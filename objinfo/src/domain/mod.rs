//! Domain model for objinfo
//!
//! This module contains core domain types and errors that provide:
//! - Lossless kernel enumerations with forward-compatible `Unknown` values
//! - A backend-independent program tag
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{Backend, MapType, ObjectKind, ProgramTag, ProgramType};

pub use errors::{InfoError, ScanError, TagError};
