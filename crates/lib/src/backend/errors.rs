//! Backend error types.
//!
//! Failures raised by a [`Backend`](super::Backend) are passed through the
//! document lifecycle unchanged; callers classify them with the `is_*`
//! helpers rather than matching on variants.

use thiserror::Error;

use super::Namespace;

/// Errors that can occur while talking to a backing store.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// A document with the same identity is already stored.
    #[error("Duplicate key {id} in {namespace}")]
    DuplicateKey {
        /// Where the insert was attempted
        namespace: Namespace,
        /// The conflicting identity
        id: String,
    },

    /// No document with the given identity exists.
    #[error("Document {id} not found in {namespace}")]
    DocumentNotFound {
        /// Where the lookup happened
        namespace: Namespace,
        /// The identity that was not found
        id: String,
    },

    /// A write was attempted with a document that carries no identity.
    #[error("Document written to {namespace} has no identity")]
    MissingIdentity {
        /// Where the write was attempted
        namespace: Namespace,
    },

    /// The store could not be reached or refused the request.
    #[error("Backend unavailable: {reason}")]
    Unavailable {
        /// Description of the failure
        reason: String,
    },

    /// File I/O failed during persistence.
    #[error("File I/O error")]
    FileIo {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Stored state could not be encoded or decoded.
    #[error("Serialization failed")]
    SerializationFailed {
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },
}

impl BackendError {
    /// Check if this error indicates a document was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, BackendError::DocumentNotFound { .. })
    }

    /// Check if this error indicates an identity collision
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, BackendError::DuplicateKey { .. })
    }

    /// Check if this error is an I/O or encoding failure
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            BackendError::FileIo { .. } | BackendError::SerializationFailed { .. }
        )
    }
}

impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
