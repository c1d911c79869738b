//! Document lifecycle.
//!
//! A [`Mapper`] is the bootstrap step: it owns the injected [`Backend`] handle,
//! the [`RuleEngine`] and the resolved [`MapperConfig`], and hands out
//! [`Document`]s bound to a [`Schema`]. A `Document` stages mutations in its
//! [`DocumentState`] and turns them into backend calls through
//! [`create`](Document::create), [`save`](Document::save),
//! [`update`](Document::update) and [`load`](Document::load).
//!
//! ```
//! # use std::sync::Arc;
//! # use docmapper::backend::InMemory;
//! # use docmapper::config::MapperConfig;
//! # use docmapper::document::Mapper;
//! # use docmapper::schema::Schema;
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> docmapper::Result<()> {
//! let mapper = Mapper::new(Arc::new(InMemory::new()), MapperConfig::new("blog", "posts"));
//! let schema = Arc::new(Schema::builder().rule("title", ["required"]).build());
//!
//! let mut post = mapper.document(schema.clone());
//! post.set("title", "Hello")?;
//! post.create().await?;
//! assert!(post.loaded());
//!
//! post.set("title", "Hello again")?;
//! post.update().await?;
//! assert_eq!(post.last_update().map(|u| u.len()), Some(1));
//!
//! let mut copy = mapper.document(schema);
//! copy.load(post.id()).await?;
//! assert_eq!(copy.get("title"), post.get("title"));
//! # Ok(())
//! # }
//! ```
//!
//! A document is not meant to be shared between tasks; give each unit of work
//! its own instance.

use std::fmt;
use std::sync::Arc;

use crate::Result;
use crate::backend::{Backend, Namespace};
use crate::config::MapperConfig;
use crate::constants::ID_FIELD;
use crate::diff::Update;
use crate::doc::{Doc, ObjectId, Value, path};
use crate::schema::{RuleEngine, Schema, StandardRules, ValidationResult};
use crate::state::DocumentState;

pub mod errors;

pub use errors::DocumentError;

/// Shared handles every document needs.
#[derive(Clone)]
pub struct Mapper {
    backend: Arc<dyn Backend>,
    engine: Arc<dyn RuleEngine>,
    config: MapperConfig,
}

impl Mapper {
    /// Creates a mapper validating with [`StandardRules`]
    pub fn new(backend: Arc<dyn Backend>, config: MapperConfig) -> Self {
        Self {
            backend,
            engine: Arc::new(StandardRules),
            config,
        }
    }

    /// Replaces the rule engine
    pub fn with_rule_engine(mut self, engine: Arc<dyn RuleEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// The resolved configuration
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// The backend handle
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Creates a new, never persisted document of the given schema
    pub fn document(&self, schema: Arc<Schema>) -> Document {
        Document::new(self.clone(), self.config.namespace(), schema)
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("backend", &"<Backend>")
            .field("engine", &"<RuleEngine>")
            .field("config", &self.config)
            .finish()
    }
}

/// One document and its pending changes.
#[derive(Debug)]
pub struct Document {
    mapper: Mapper,
    namespace: Namespace,
    state: DocumentState,
    loaded: bool,
    last_update: Option<Update>,
}

impl Document {
    fn new(mapper: Mapper, namespace: Namespace, schema: Arc<Schema>) -> Self {
        Self {
            mapper,
            namespace,
            state: DocumentState::new(schema),
            loaded: false,
            last_update: None,
        }
    }

    /// Stages `value` at `path`. See [`DocumentState::set`].
    pub fn set(&mut self, path: impl AsRef<str>, value: impl Into<Value>) -> Result<()> {
        self.state.set(path, value)
    }

    /// Stages every leaf of `values`. See [`DocumentState::set_many`].
    pub fn set_many(&mut self, values: &Doc) -> Result<()> {
        self.state.set_many(values)
    }

    /// Removes `path`. See [`DocumentState::unset`].
    pub fn unset(&mut self, path: impl AsRef<str>) -> Result<()> {
        self.state.unset(path)
    }

    /// Reads `path` from the merged view
    pub fn get(&self, path: impl AsRef<str>) -> Option<Value> {
        self.state.get(path)
    }

    /// The merged view of the whole document
    pub fn data(&self) -> Doc {
        self.state.merged()
    }

    /// Pending changes only
    pub fn changed(&self) -> &Doc {
        self.state.changed()
    }

    /// The last durable snapshot
    pub fn original(&self) -> &Doc {
        self.state.original()
    }

    /// The document identity, if it has one
    pub fn id(&self) -> Option<Value> {
        self.state.get(ID_FIELD)
    }

    /// Returns true once the document has been persisted or loaded
    pub fn loaded(&self) -> bool {
        self.loaded
    }

    /// The operations sent by the most recent [`update`](Document::update)
    pub fn last_update(&self) -> Option<&Update> {
        self.last_update.as_ref()
    }

    /// Returns true if there are changes that have not been persisted
    pub fn has_changes(&self) -> bool {
        self.state.has_changes()
    }

    /// Drops pending changes
    pub fn discard_changes(&mut self) {
        self.state.discard_changes();
    }

    /// The merged view as JSON
    pub fn to_json(&self) -> serde_json::Value {
        self.state.merged().to_json()
    }

    /// Where the document is stored
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// The document's schema
    pub fn schema(&self) -> &Arc<Schema> {
        self.state.schema()
    }

    /// Runs the schema's rules against `data`, or against the merged view.
    ///
    /// Never fails; the caller inspects the result.
    pub fn validate(&self, data: Option<&Doc>) -> ValidationResult {
        let merged;
        let data = match data {
            Some(data) => data,
            None => {
                merged = self.state.merged();
                &merged
            }
        };
        let rules = self.state.schema().rules().expand(data);
        self.mapper.engine.check(&path::flatten(data), &rules)
    }

    fn ensure_valid(&self, data: &Doc) -> Result<()> {
        let result = self.validate(Some(data));
        if result.passed {
            return Ok(());
        }
        tracing::warn!(
            namespace = %self.namespace,
            failures = result.errors.len(),
            "Validation blocked write"
        );
        Err(DocumentError::ValidationFailed {
            errors: result.errors,
        }
        .into())
    }

    /// Inserts the document as new.
    ///
    /// An identity is generated when none was set. A caller-supplied identity
    /// is first looked up, and an existing document with it fails the call
    /// with [`DocumentError::DuplicateIdentity`] without inserting.
    pub async fn create(&mut self) -> Result<()> {
        let mut snapshot = self.state.merged();
        let supplied = snapshot.get(ID_FIELD).cloned();
        if supplied.is_none() {
            snapshot.set(ID_FIELD, ObjectId::new());
        }
        self.ensure_valid(&snapshot)?;

        if let Some(id) = supplied {
            let mut existing = self.scratch();
            existing.load(Some(id.clone())).await?;
            if existing.loaded() {
                return Err(DocumentError::DuplicateIdentity {
                    namespace: self.namespace.clone(),
                    id: id.to_string(),
                }
                .into());
            }
        }

        self.mapper
            .backend
            .insert(&self.namespace, &snapshot, self.mapper.config.durability)
            .await?;
        tracing::info!(
            namespace = %self.namespace,
            id = %display_id(&snapshot),
            "Created document"
        );
        self.state.absorb(snapshot);
        self.loaded = true;
        Ok(())
    }

    /// Writes the whole merged document, replacing any stored copy.
    ///
    /// Does nothing when there are no pending changes.
    pub async fn save(&mut self) -> Result<()> {
        let mut snapshot = self.state.merged();
        if snapshot.get(ID_FIELD).is_none() {
            snapshot.set(ID_FIELD, ObjectId::new());
        }
        self.ensure_valid(&snapshot)?;
        if !self.state.has_changes() {
            return Ok(());
        }

        self.mapper
            .backend
            .replace_or_upsert(&self.namespace, &snapshot, self.mapper.config.durability)
            .await?;
        tracing::info!(
            namespace = %self.namespace,
            id = %display_id(&snapshot),
            "Saved document"
        );
        self.state.absorb(snapshot);
        self.loaded = true;
        Ok(())
    }

    /// Sends only the fields that changed since the last durable snapshot.
    ///
    /// Fails with [`DocumentError::NotLoaded`] on a document that was never
    /// persisted or loaded. Does nothing when there are no pending changes.
    pub async fn update(&mut self) -> Result<()> {
        let id = match self.state.original().get(ID_FIELD) {
            Some(id) if self.loaded => id.clone(),
            _ => return Err(DocumentError::NotLoaded.into()),
        };
        if !self.state.has_changes() {
            return Ok(());
        }
        self.ensure_valid(&self.state.merged())?;

        let update = self.state.pending_update();
        if !update.is_empty() {
            self.mapper
                .backend
                .atomic_update(&self.namespace, &id, &update, self.mapper.config.durability)
                .await?;
            tracing::info!(
                namespace = %self.namespace,
                id = %id,
                ops = update.len(),
                "Updated document"
            );
            self.last_update = Some(update);
        }
        self.state.commit();
        Ok(())
    }

    /// Looks the document up and replaces local state with what is stored.
    ///
    /// The query is, in order of preference: `id`; the document's own
    /// identity once loaded; the pending changes as a query by example. With
    /// none of those available the call fails with
    /// [`DocumentError::InsufficientQueryData`]. When nothing matches, local
    /// state is left untouched and [`loaded`](Document::loaded) tells the
    /// caller.
    pub async fn load(&mut self, id: Option<Value>) -> Result<()> {
        let query = match (id, self.state.original().get(ID_FIELD)) {
            (Some(id), _) => Doc::new().with(ID_FIELD, id),
            (None, Some(own)) if self.loaded => Doc::new().with(ID_FIELD, own.clone()),
            _ => {
                let mut wanted = path::flatten(self.state.changed());
                wanted.retain(|_, value| !value.is_deleted());
                if wanted.is_empty() {
                    return Err(DocumentError::InsufficientQueryData.into());
                }
                path::unflatten(&wanted)
            }
        };
        tracing::debug!(namespace = %self.namespace, query = %query, "Loading document");

        if let Some(found) = self.mapper.backend.find_one(&self.namespace, &query).await? {
            self.state.absorb(found);
            self.loaded = true;
        }
        Ok(())
    }

    /// A fresh document sharing nothing mutable with `self`.
    fn scratch(&self) -> Document {
        Document::new(
            self.mapper.clone(),
            self.namespace.clone(),
            Arc::clone(self.state.schema()),
        )
    }
}

fn display_id(doc: &Doc) -> String {
    doc.get(ID_FIELD).map(ToString::to_string).unwrap_or_default()
}
