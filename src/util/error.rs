//! Error types for scene document operations.

use thiserror::Error;

use crate::scene::EntityKind;

/// Main error type for export and import runs.
///
/// Only structural problems are fatal. Everything the import builder can
/// degrade around (bad values, unknown properties, dangling names) is
/// reported through [`AssignError`] or the import report instead.
#[derive(Error, Debug)]
pub enum Error {
    /// A required top-level section is absent from the document
    #[error("Document is missing required section: {0}")]
    MissingSection(&'static str),

    /// Document root element has an unexpected tag
    #[error("Unexpected document root <{0}>")]
    UnexpectedRoot(String),

    /// Document text could not be tokenized
    #[error("Malformed document: {0}")]
    Xml(String),

    /// Invalid data structure in document or scene
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// Handle does not point at a live entity
    #[error("Dangling {kind:?} handle #{index}")]
    DanglingHandle { kind: EntityKind, index: usize },

    /// Side-car asset could not be written
    #[error("Asset export failed for '{name}': {reason}")]
    AssetExport { name: String, reason: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Options file could not be (de)serialized
    #[error("Options error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a document tokenizer error.
    pub fn xml(err: impl std::fmt::Display) -> Self {
        Self::Xml(err.to_string())
    }
}

/// Result type alias for scene document operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a single property assignment was refused by an entity.
///
/// Returned by [`Introspect::assign`](crate::scene::Introspect::assign) and
/// [`Introspect::link`](crate::scene::Introspect::link). Import drivers drop
/// these after logging; they never abort a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignError {
    /// Entity kind has no property with this name
    #[error("no property '{0}'")]
    UnknownProperty(String),

    /// Property exists but cannot be written
    #[error("property '{0}' is read-only")]
    ReadOnly(String),

    /// Value has the wrong shape for the property
    #[error("property '{name}' expects {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    /// Enum property received an unknown identifier
    #[error("property '{name}' has no item '{item}'")]
    BadEnum { name: String, item: String },

    /// Pointer property cannot hold an entity of this kind
    #[error("property '{name}' cannot reference a {kind:?}")]
    KindMismatch { name: String, kind: EntityKind },

    /// Owner entity disappeared or never existed
    #[error("owner entity not found")]
    MissingOwner,
}

impl AssignError {
    /// Shorthand for a type mismatch.
    pub fn mismatch(name: &str, expected: &'static str) -> Self {
        Self::TypeMismatch { name: name.to_string(), expected }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::MissingSection("Libraries");
        assert!(e.to_string().contains("Libraries"));

        let e = Error::DanglingHandle { kind: EntityKind::Mesh, index: 7 };
        assert!(e.to_string().contains("Mesh"));
        assert!(e.to_string().contains('7'));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_assign_error_display() {
        let e = AssignError::KindMismatch { name: "data".into(), kind: EntityKind::Object };
        assert_eq!(e.to_string(), "property 'data' cannot reference a Object");
        let e = AssignError::mismatch("lens", "a float");
        assert!(e.to_string().contains("lens"));
    }
}
