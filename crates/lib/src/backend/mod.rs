//! Persistence backends for docmapper
//!
//! This module provides the `Backend` trait the document lifecycle talks to,
//! and an [`InMemory`] implementation for tests and development.
//!
//! A backend receives copies of document snapshots, never references into a
//! live [`Document`](crate::document::Document). Every failure it reports is
//! surfaced to the caller unchanged as [`BackendError`].

use std::fmt;

use async_trait::async_trait;

use crate::Result;
use crate::config::Durability;
use crate::diff::Update;
use crate::doc::{Doc, Value};

pub mod errors;
pub mod in_memory;

pub use errors::BackendError;
pub use in_memory::InMemory;

/// A database and collection pair addressing a set of documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Namespace {
    /// Database name
    pub database: String,
    /// Collection name
    pub collection: String,
}

impl Namespace {
    /// Creates a namespace
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Backend trait abstracting the store documents are persisted to.
///
/// Implementations must be `Send` and `Sync`; one handle is shared by every
/// document a [`Mapper`](crate::document::Mapper) hands out. The lifecycle
/// never has more than one request outstanding per call and never retries.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Finds the first document in `namespace` matching `query`.
    ///
    /// Every leaf of `query` must equal the stored document's value at the
    /// same path. An empty query matches nothing.
    async fn find_one(&self, namespace: &Namespace, query: &Doc) -> Result<Option<Doc>>;

    /// Inserts a new document, which must carry an identity.
    async fn insert(&self, namespace: &Namespace, doc: &Doc, durability: Durability) -> Result<()>;

    /// Replaces the document with the same identity, or inserts it.
    async fn replace_or_upsert(
        &self,
        namespace: &Namespace,
        doc: &Doc,
        durability: Durability,
    ) -> Result<()>;

    /// Applies `update` to the stored document identified by `id`.
    ///
    /// Operations are applied in order.
    async fn atomic_update(
        &self,
        namespace: &Namespace,
        id: &Value,
        update: &Update,
        durability: Durability,
    ) -> Result<()>;
}
