//! Error types for document lifecycle operations.

use indexmap::IndexMap;
use thiserror::Error;

use crate::backend::Namespace;

/// Errors raised by [`Document`](super::Document) and its state.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The path is not declared by the schema, nor a prefix of a declared path.
    #[error("Unknown field: {path}")]
    UnknownField {
        /// The rejected path
        path: String,
    },

    /// An array index in the path is larger than the mapper supports.
    #[error("Array index out of range in {path} (limit {limit})")]
    IndexOutOfRange {
        /// The rejected path
        path: String,
        /// Largest accepted index
        limit: usize,
    },

    /// Validation failed before any write was attempted.
    #[error("Validation failed: {}", summarize(.errors))]
    ValidationFailed {
        /// Failure message per literal path
        errors: IndexMap<String, String>,
    },

    /// A document with the same identity already exists.
    #[error("Document {id} already exists in {namespace}")]
    DuplicateIdentity {
        /// Where the conflict was found
        namespace: Namespace,
        /// The conflicting identity
        id: String,
    },

    /// The operation needs a document that has been persisted or loaded.
    #[error("Document has not been loaded")]
    NotLoaded,

    /// `load` has neither an identity nor pending data to query with.
    #[error("Not enough data to build a query")]
    InsufficientQueryData,
}

fn summarize(errors: &IndexMap<String, String>) -> String {
    errors.values().cloned().collect::<Vec<_>>().join("; ")
}

impl DocumentError {
    /// Check if a path was rejected by the schema
    pub fn is_unknown_field(&self) -> bool {
        matches!(self, DocumentError::UnknownField { .. })
    }

    /// Check if a path carried an oversized array index
    pub fn is_index_out_of_range(&self) -> bool {
        matches!(self, DocumentError::IndexOutOfRange { .. })
    }

    /// Check if validation blocked the operation
    pub fn is_validation_error(&self) -> bool {
        matches!(self, DocumentError::ValidationFailed { .. })
    }

    /// Check if this is an identity conflict
    pub fn is_duplicate_identity(&self) -> bool {
        matches!(self, DocumentError::DuplicateIdentity { .. })
    }

    /// Check if the document was required to be loaded
    pub fn is_not_loaded(&self) -> bool {
        matches!(self, DocumentError::NotLoaded)
    }

    /// Check if `load` had nothing to query with
    pub fn is_insufficient_query_data(&self) -> bool {
        matches!(self, DocumentError::InsufficientQueryData)
    }

    /// Per-path validation messages, if this is a validation failure
    pub fn validation_errors(&self) -> Option<&IndexMap<String, String>> {
        match self {
            DocumentError::ValidationFailed { errors } => Some(errors),
            _ => None,
        }
    }
}

impl From<DocumentError> for crate::Error {
    fn from(err: DocumentError) -> Self {
        crate::Error::Document(err)
    }
}
