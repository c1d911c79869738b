//! In-memory backend.
//!
//! Documents are kept per namespace in insertion order, keyed by their
//! identity. The whole state can be written to and read back from a JSON file,
//! which is enough for tests and local development.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;

use super::{Backend, BackendError, Namespace};
use crate::config::Durability;
use crate::constants::ID_FIELD;
use crate::diff::{Update, UpdateOp};
use crate::doc::path;
use crate::doc::{Doc, Value};
use crate::{Error, Result};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

/// Helper to check if version is default (0) for serde skip_serializing_if
fn is_v0(v: &u8) -> bool {
    *v == 0
}

fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// On-disk layout: namespace name to stored documents, in insertion order.
#[derive(Serialize, Deserialize)]
struct SerializableStore {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    collections: IndexMap<String, Vec<Doc>>,
}

type Collection = IndexMap<String, Doc>;

/// A simple in-memory [`Backend`].
///
/// Durability modes are accepted and ignored; every write is visible as soon
/// as the call returns.
#[derive(Debug, Default)]
pub struct InMemory {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemory {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents stored in `namespace`
    pub async fn len(&self, namespace: &Namespace) -> usize {
        self.collections
            .read()
            .await
            .get(&namespace.to_string())
            .map_or(0, IndexMap::len)
    }

    /// Returns true if `namespace` holds no documents
    pub async fn is_empty(&self, namespace: &Namespace) -> bool {
        self.len(namespace).await == 0
    }

    /// Returns a copy of the document stored under `id`
    pub async fn get(&self, namespace: &Namespace, id: &Value) -> Option<Doc> {
        self.collections
            .read()
            .await
            .get(&namespace.to_string())
            .and_then(|docs| docs.get(&identity_key(id)))
            .cloned()
    }

    /// Saves every namespace to `path` as JSON.
    pub async fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let collections = self
            .collections
            .read()
            .await
            .iter()
            .map(|(name, docs)| (name.clone(), docs.values().cloned().collect()))
            .collect();
        let store = SerializableStore {
            version: PERSISTENCE_VERSION,
            collections,
        };

        let json = serde_json::to_string_pretty(&store)
            .map_err(|e| -> Error { BackendError::SerializationFailed { source: e }.into() })?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| -> Error { BackendError::FileIo { source: e }.into() })
    }

    /// Loads a store previously written by [`InMemory::save_to_file`].
    ///
    /// If the file does not exist, a new empty store is returned.
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(BackendError::FileIo { source: e }.into()),
        };
        let store: SerializableStore = serde_json::from_str(&json)
            .map_err(|e| -> Error { BackendError::SerializationFailed { source: e }.into() })?;

        let mut collections = HashMap::new();
        for (name, docs) in store.collections {
            let mut collection = Collection::new();
            for doc in docs {
                if let Some(key) = doc.get(ID_FIELD).map(identity_key) {
                    collection.insert(key, doc);
                }
            }
            collections.insert(name, collection);
        }
        Ok(Self {
            collections: RwLock::new(collections),
        })
    }
}

#[async_trait]
impl Backend for InMemory {
    async fn find_one(&self, namespace: &Namespace, query: &Doc) -> Result<Option<Doc>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(&namespace.to_string()) else {
            return Ok(None);
        };

        if query.len() == 1
            && let Some(id) = query.get_key(ID_FIELD)
        {
            return Ok(docs.get(&identity_key(id)).cloned());
        }

        let wanted = path::flatten(query);
        if wanted.is_empty() {
            return Ok(None);
        }
        let found = docs.values().find(|doc| {
            wanted
                .iter()
                .all(|(at, value)| doc.get(at).is_some_and(|stored| stored == value))
        });
        tracing::trace!(
            namespace = %namespace,
            fields = wanted.len(),
            found = found.is_some(),
            "Query by example"
        );
        Ok(found.cloned())
    }

    async fn insert(&self, namespace: &Namespace, doc: &Doc, durability: Durability) -> Result<()> {
        let key = required_identity(namespace, doc)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(namespace.to_string()).or_default();
        if docs.contains_key(&key) {
            return Err(BackendError::DuplicateKey {
                namespace: namespace.clone(),
                id: key,
            }
            .into());
        }
        tracing::trace!(namespace = %namespace, id = %key, %durability, "Insert");
        docs.insert(key, doc.clone());
        Ok(())
    }

    async fn replace_or_upsert(
        &self,
        namespace: &Namespace,
        doc: &Doc,
        durability: Durability,
    ) -> Result<()> {
        let key = required_identity(namespace, doc)?;
        tracing::trace!(namespace = %namespace, id = %key, %durability, "Replace or upsert");
        self.collections
            .write()
            .await
            .entry(namespace.to_string())
            .or_default()
            .insert(key, doc.clone());
        Ok(())
    }

    async fn atomic_update(
        &self,
        namespace: &Namespace,
        id: &Value,
        update: &Update,
        durability: Durability,
    ) -> Result<()> {
        let key = identity_key(id);
        let mut collections = self.collections.write().await;
        let Some(doc) = collections
            .get_mut(&namespace.to_string())
            .and_then(|docs| docs.get_mut(&key))
        else {
            return Err(BackendError::DocumentNotFound {
                namespace: namespace.clone(),
                id: key,
            }
            .into());
        };

        for op in update.iter() {
            match op {
                UpdateOp::Assign { path, value } => {
                    doc.set(path, value.clone());
                }
                UpdateOp::Remove { path } => {
                    doc.remove(path);
                }
            }
        }
        tracing::trace!(
            namespace = %namespace,
            id = %key,
            ops = update.len(),
            %durability,
            "Atomic update"
        );
        Ok(())
    }
}

/// Stable storage key for an identity value; the type is part of the key so
/// `"1"` and `1` stay distinct.
fn identity_key(id: &Value) -> String {
    format!("{}:{}", id.type_name(), id)
}

fn required_identity(namespace: &Namespace, doc: &Doc) -> Result<String> {
    doc.get(ID_FIELD)
        .filter(|id| !id.is_deleted())
        .map(identity_key)
        .ok_or_else(|| {
            BackendError::MissingIdentity {
                namespace: namespace.clone(),
            }
            .into()
        })
}
