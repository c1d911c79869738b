//!
//! docmapper: map nested documents onto a document store.
//!
//! The library tracks each document as a durable snapshot plus a sparse
//! overlay of pending edits, checks every edit against a declared schema, and
//! turns the overlay into the smallest set of field-level writes when the
//! document is persisted.
//!
//! ## Core Concepts
//!
//! * **Documents (`doc::Doc`)**: Ordered trees of named values, addressed by dot-paths such as `comments.0.author`.
//! * **Path Codec (`doc::path`)**: Path normalization and the exact flatten/unflatten pair between trees and `path -> leaf` maps.
//! * **Document State (`state::DocumentState`)**: The `original`/`changed` pair behind every document, and the merge that produces the visible view.
//! * **Schemas (`schema::Schema`)**: Declared fields plus a nested rule tree whose `$` wildcards expand once per existing array element.
//! * **Diffs (`diff::Update`)**: Ordered assign/remove operations bringing a stored document in line with its local edits.
//! * **Backends (`backend::Backend`)**: A pluggable store the lifecycle talks to. `backend::InMemory` is bundled.
//! * **Documents with a lifecycle (`document::Document`)**: `create`, `save`, `update`, `load` and `validate`, handed out by a `document::Mapper`.

pub mod backend;
pub mod config;
pub mod constants;
pub mod diff;
pub mod doc;
pub mod document;
pub mod schema;
pub mod state;

pub use config::MapperConfig;
pub use doc::{Doc, ObjectId, Value};
pub use document::{Document, Mapper};
pub use schema::Schema;

/// Result type used throughout the docmapper library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the docmapper library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured document errors from the document module
    #[error(transparent)]
    Document(document::DocumentError),

    /// Backend failures, passed through unchanged
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Structured configuration errors from the config module
    #[error(transparent)]
    Config(config::ConfigError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Document(_) => "document",
            Error::Backend(_) => "backend",
            Error::Config(_) => "config",
        }
    }

    /// Check if a path was rejected by the schema.
    pub fn is_unknown_field(&self) -> bool {
        match self {
            Error::Document(err) => err.is_unknown_field(),
            _ => false,
        }
    }

    /// Check if validation blocked a write.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Document(err) => err.is_validation_error(),
            _ => false,
        }
    }

    /// Check if `create` found an existing document with the same identity.
    pub fn is_duplicate_identity(&self) -> bool {
        match self {
            Error::Document(err) => err.is_duplicate_identity(),
            _ => false,
        }
    }

    /// Check if a path addressed an array index past the supported range.
    pub fn is_index_out_of_range(&self) -> bool {
        match self {
            Error::Document(err) => err.is_index_out_of_range(),
            _ => false,
        }
    }

    /// Check if the operation required a loaded document.
    pub fn is_not_loaded(&self) -> bool {
        match self {
            Error::Document(err) => err.is_not_loaded(),
            _ => false,
        }
    }

    /// Check if `load` had nothing to query with.
    pub fn is_insufficient_query_data(&self) -> bool {
        match self {
            Error::Document(err) => err.is_insufficient_query_data(),
            _ => false,
        }
    }

    /// Check if this error came from the backend.
    pub fn is_persistence_error(&self) -> bool {
        matches!(self, Error::Backend(_))
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Backend(err) => err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is I/O related.
    pub fn is_io_error(&self) -> bool {
        match self {
            Error::Backend(err) => err.is_io_error(),
            Error::Config(err) => err.is_io_error(),
            _ => false,
        }
    }

    /// Per-path validation messages, if validation blocked a write.
    pub fn validation_errors(&self) -> Option<&indexmap::IndexMap<String, String>> {
        match self {
            Error::Document(err) => err.validation_errors(),
            _ => None,
        }
    }
}
