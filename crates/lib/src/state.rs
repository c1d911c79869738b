//! Original/changed document state.
//!
//! A [`DocumentState`] keeps the last durable snapshot of a document
//! (`original`) apart from the sparse overlay of pending mutations
//! (`changed`). Reads go through [`merge`]; writes only ever touch the
//! overlay, and only at paths the [`Schema`] allows.
//!
//! Assigning a whole document or list stages a replacement: the original
//! subtree at that path is hidden from the merged view, and the pending update
//! writes the new subtree in one piece.
//!
//! ```
//! use std::sync::Arc;
//! use docmapper::doc::{Doc, Value};
//! use docmapper::schema::Schema;
//! use docmapper::state::DocumentState;
//!
//! let schema = Arc::new(Schema::builder().fields(["title", "tags.$"]).build());
//! let mut state = DocumentState::new(schema);
//! state.absorb(Doc::new().with("title", "Draft").with("tags", vec!["a", "b"]));
//!
//! state.set("tags.1", "z").unwrap();
//! assert_eq!(state.get("tags.1"), Some(Value::from("z")));
//! assert_eq!(state.original().get("tags.1"), Some(&Value::from("b")));
//! assert!(state.set("nope", 1).is_err());
//! ```

use std::sync::Arc;

use indexmap::IndexSet;

use crate::Result;
use crate::constants::MAX_ARRAY_INDEX;
use crate::diff::{self, Update};
use crate::doc::path::{self, FlatMap, Segment};
use crate::doc::{Doc, List, Value};
use crate::document::DocumentError;
use crate::schema::Schema;

/// Overlays `changed` onto `original`, one flattened path at a time.
///
/// Every leaf path present in `changed` wins; a leaf replaces whatever subtree
/// `original` holds at the same path, and a removal marker deletes the path
/// and everything below it. Paths absent from `changed` keep their original
/// values.
pub fn merge(original: &Doc, changed: &Doc) -> Doc {
    let mut flat = path::flatten(original);
    for (at, value) in path::flatten(changed) {
        flat.retain(|existing, _| {
            !path::is_ancestor(&at, existing) && !path::is_ancestor(existing, &at)
        });
        if value.is_deleted() {
            flat.shift_remove(&at);
        } else {
            flat.insert(at, value);
        }
    }
    path::unflatten(&flat)
}

/// The durable snapshot and pending overlay of one document.
#[derive(Debug, Clone)]
pub struct DocumentState {
    schema: Arc<Schema>,
    original: Doc,
    changed: Doc,
    /// Paths whose whole subtree is being replaced
    replaced: IndexSet<String>,
}

impl DocumentState {
    /// Creates an empty state for a never-persisted document
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            original: Doc::new(),
            changed: Doc::new(),
            replaced: IndexSet::new(),
        }
    }

    /// The schema paths are checked against
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Stages a value at `path`.
    ///
    /// Fails with [`DocumentError::UnknownField`] when the schema neither
    /// declares the path nor one of its descendants. A document or list value
    /// is checked at every path it contains before anything is written, and
    /// replaces the original subtree at `path` instead of being merged into it.
    pub fn set(&mut self, at: impl AsRef<str>, value: impl Into<Value>) -> Result<()> {
        let at = path::canonical(at.as_ref());
        let value = value.into();
        self.check_value(&at, &value)?;
        self.stage(&at, value);
        Ok(())
    }

    /// Stages every leaf of `values`, addressed by its flattened path.
    ///
    /// All paths are checked before anything is written, so a rejected call
    /// leaves the overlay untouched.
    pub fn set_many(&mut self, values: &Doc) -> Result<()> {
        let flat = path::flatten(values);
        for at in flat.keys() {
            self.check_field(at)?;
        }
        for (at, value) in flat {
            self.stage(&at, value);
        }
        Ok(())
    }

    /// Removes the value at `path`.
    ///
    /// A path with an original value is staged as a removal. A path that only
    /// exists in the overlay is dropped from it outright. Anything else is a
    /// no-op.
    pub fn unset(&mut self, at: impl AsRef<str>) -> Result<()> {
        let at = path::canonical(at.as_ref());
        self.check_field(&at)?;
        if self.inside_replacement(&at) {
            self.changed.remove(&at);
            return Ok(());
        }
        self.replaced
            .retain(|root| *root != at && !path::is_ancestor(&at, root));
        if self.original.contains_key(&at) {
            self.changed.set(&at, Value::Deleted);
        } else if self.changed.contains_key(&at) {
            self.changed.remove(&at);
            self.prune_changed(&at);
        }
        Ok(())
    }

    /// Reads `path` from the merged view
    pub fn get(&self, at: impl AsRef<str>) -> Option<Value> {
        self.merged().get(at).cloned()
    }

    /// The merged view of the whole document.
    ///
    /// Replaced subtrees come from the overlay alone, and keep their shape
    /// even when they are empty.
    pub fn merged(&self) -> Doc {
        if self.replaced.is_empty() {
            return merge(&self.original, &self.changed);
        }
        let mut base = self.original.clone();
        for root in &self.replaced {
            base.remove(root);
        }
        let mut merged = merge(&base, &self.changed);
        for root in &self.replaced {
            if merged.get(root).is_none()
                && let Some(value) = self.changed.get(root)
            {
                merged.set(root, value.clone());
            }
        }
        merged
    }

    /// The operations that bring a store holding `original` in line with the
    /// merged view.
    ///
    /// Replaced subtrees that differ from the original are written whole;
    /// everything else goes through [`diff::diff`].
    pub fn pending_update(&self) -> Update {
        let merged = self.merged();
        let replaced: FlatMap = self
            .replaced
            .iter()
            .filter_map(|root| {
                let value = merged.get(root)?;
                (self.original.get(root) != Some(value)).then(|| (root.clone(), value.clone()))
            })
            .collect();
        diff::diff_replacing(
            &path::flatten(&self.original),
            &path::flatten(&self.changed),
            &replaced,
        )
    }

    /// The pending overlay only
    pub fn changed(&self) -> &Doc {
        &self.changed
    }

    /// The durable snapshot only
    pub fn original(&self) -> &Doc {
        &self.original
    }

    /// Returns true if the overlay holds a pending leaf or subtree replacement
    pub fn has_changes(&self) -> bool {
        !self.replaced.is_empty() || !path::flatten(&self.changed).is_empty()
    }

    /// Folds the overlay into the durable snapshot
    pub fn commit(&mut self) {
        self.original = self.merged();
        self.discard_changes();
    }

    /// Replaces the durable snapshot and drops the overlay
    pub fn absorb(&mut self, snapshot: Doc) {
        self.original = snapshot;
        self.discard_changes();
    }

    /// Drops the overlay
    pub fn discard_changes(&mut self) {
        self.changed.clear();
        self.replaced.clear();
    }

    fn check_field(&self, at: &str) -> Result<()> {
        if path::index_beyond(at, MAX_ARRAY_INDEX).is_some() {
            tracing::debug!(path = at, "Rejected path with oversized array index");
            return Err(DocumentError::IndexOutOfRange {
                path: at.to_string(),
                limit: MAX_ARRAY_INDEX,
            }
            .into());
        }
        if self.schema.allows(at) {
            Ok(())
        } else {
            tracing::debug!(path = at, "Rejected path not declared by schema");
            Err(DocumentError::UnknownField {
                path: at.to_string(),
            }
            .into())
        }
    }

    /// Checks `at` and every path inside `value`, empty containers included.
    fn check_value(&self, at: &str, value: &Value) -> Result<()> {
        self.check_field(at)?;
        match value {
            Value::Doc(doc) => {
                for (key, child) in doc.iter().filter(|(_, child)| !child.is_hole()) {
                    self.check_value(&path::join(at, key), child)?;
                }
            }
            Value::List(list) => {
                for (index, child) in list.iter_slots().enumerate() {
                    if !child.is_hole() {
                        self.check_value(&path::join(at, index), child)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Writes an already checked value into the overlay.
    fn stage(&mut self, at: &str, value: Value) {
        self.revive_removed_ancestor(at);
        if !self.inside_replacement(at) {
            self.replaced
                .retain(|root| root != at && !path::is_ancestor(at, root));
            if value.is_branch() {
                self.replaced.insert(at.to_string());
            }
        }
        self.changed.set(at, value);
    }

    fn inside_replacement(&self, at: &str) -> bool {
        self.replaced.iter().any(|root| path::is_ancestor(root, at))
    }

    /// Turns a staged removal above `at` into an empty replacement, so the
    /// write below it starts from nothing instead of resurrecting the
    /// original siblings.
    fn revive_removed_ancestor(&mut self, at: &str) {
        let components: Vec<&str> = at.split('.').collect();
        for depth in 1..components.len() {
            let ancestor = components[..depth].join(".");
            if !matches!(self.changed.get(&ancestor), Some(Value::Deleted)) {
                continue;
            }
            let container = match Segment::parse(components[depth]) {
                Segment::Index(_) => Value::List(List::new()),
                Segment::Field(_) => Value::Doc(Doc::new()),
            };
            self.changed.set(&ancestor, container);
            self.replaced
                .retain(|root| !path::is_ancestor(&ancestor, root));
            self.replaced.insert(ancestor);
            return;
        }
    }

    /// Removes containers left empty above `at` in the overlay.
    fn prune_changed(&mut self, at: &str) {
        let mut ancestor = at;
        while let Some((parent, _)) = ancestor.rsplit_once('.') {
            let empty = match self.changed.get(parent) {
                Some(Value::Doc(doc)) => doc.is_empty(),
                Some(Value::List(list)) => list.is_empty(),
                _ => false,
            };
            if !empty {
                break;
            }
            self.changed.remove(parent);
            ancestor = parent;
        }
    }
}
