//! Atomic update construction.
//!
//! [`diff`] compares the flattened durable snapshot of a document with its
//! flattened change overlay and produces the field-level operations a store
//! needs to catch up, so a partial update can be sent instead of replacing the
//! whole document.
//!
//! Both inputs are flattened, so a change to a single array element is
//! addressed positionally (`tags.1`) and never widens into a write of the
//! whole array; untouched elements are left alone in the store.
//!
//! ```
//! use docmapper::diff::{diff, UpdateOp};
//! use docmapper::doc::{Doc, path};
//!
//! let original = Doc::new().with("a", 1).with("tags", vec!["x", "y"]);
//! let changed = Doc::new().with("a", 1).with("tags.1", "z");
//!
//! let update = diff(&path::flatten(&original), &path::flatten(&changed));
//! assert_eq!(update.ops(), &[UpdateOp::assign("tags.1", "z")]);
//! ```

use indexmap::IndexMap;

use crate::doc::Value;
use crate::doc::path::{self, FlatMap};

/// A single field-level write.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum UpdateOp {
    /// Store `value` at `path`
    Assign { path: String, value: Value },
    /// Remove whatever is stored at `path`
    Remove { path: String },
}

impl UpdateOp {
    /// Shorthand for [`UpdateOp::Assign`]
    pub fn assign(path: impl Into<String>, value: impl Into<Value>) -> Self {
        UpdateOp::Assign {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Shorthand for [`UpdateOp::Remove`]
    pub fn remove(path: impl Into<String>) -> Self {
        UpdateOp::Remove { path: path.into() }
    }

    /// The path this operation targets
    pub fn path(&self) -> &str {
        match self {
            UpdateOp::Assign { path, .. } | UpdateOp::Remove { path } => path,
        }
    }
}

/// An ordered set of operations for one document.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Update {
    ops: Vec<UpdateOp>,
}

impl Update {
    /// Wraps a list of operations
    pub fn new(ops: Vec<UpdateOp>) -> Self {
        Self { ops }
    }

    /// Operations in issue order
    pub fn ops(&self) -> &[UpdateOp] {
        &self.ops
    }

    /// Iterates over operations in issue order
    pub fn iter(&self) -> impl Iterator<Item = &UpdateOp> {
        self.ops.iter()
    }

    /// Number of operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if there is nothing to send
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Consumes the update, returning its operations
    pub fn into_ops(self) -> Vec<UpdateOp> {
        self.ops
    }

    /// Renders the update in the familiar `$set` / `$unset` shape.
    ///
    /// Empty sections are omitted.
    ///
    /// ```
    /// # use docmapper::diff::{Update, UpdateOp};
    /// let update = Update::new(vec![UpdateOp::assign("b", 3), UpdateOp::remove("c")]);
    /// assert_eq!(
    ///     update.to_json(),
    ///     serde_json::json!({"$set": {"b": 3}, "$unset": {"c": ""}})
    /// );
    /// ```
    pub fn to_json(&self) -> serde_json::Value {
        let mut set = serde_json::Map::new();
        let mut unset = serde_json::Map::new();
        for op in &self.ops {
            match op {
                UpdateOp::Assign { path, value } => {
                    set.insert(path.clone(), value.to_json());
                }
                UpdateOp::Remove { path } => {
                    unset.insert(path.clone(), serde_json::Value::String(String::new()));
                }
            }
        }

        let mut out = serde_json::Map::new();
        if !set.is_empty() {
            out.insert("$set".to_string(), serde_json::Value::Object(set));
        }
        if !unset.is_empty() {
            out.insert("$unset".to_string(), serde_json::Value::Object(unset));
        }
        serde_json::Value::Object(out)
    }
}

impl IntoIterator for Update {
    type Item = UpdateOp;
    type IntoIter = std::vec::IntoIter<UpdateOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

/// Computes the operations that bring `original` in line with `changed`.
///
/// - a removal marker in `changed` becomes [`UpdateOp::Remove`]
/// - a leaf that is new or differs from `original` becomes [`UpdateOp::Assign`]
/// - a leaf equal to the original value produces nothing
///
/// Operations follow the order of `changed`. When one emitted path is an
/// ancestor of another, only the deeper one is kept.
pub fn diff(original: &FlatMap, changed: &FlatMap) -> Update {
    let mut by_path: IndexMap<&str, UpdateOp> = IndexMap::new();
    for (at, value) in changed {
        let op = if value.is_deleted() {
            UpdateOp::remove(at.as_str())
        } else if original.get(at) != Some(value) {
            UpdateOp::assign(at.as_str(), value.clone())
        } else {
            continue;
        };
        by_path.insert(at.as_str(), op);
    }

    let emitted: Vec<&str> = by_path.keys().copied().collect();
    let ops: Vec<UpdateOp> = by_path
        .into_iter()
        .filter(|(at, _)| !emitted.iter().any(|other| path::is_ancestor(at, other)))
        .map(|(_, op)| op)
        .collect();

    tracing::trace!(
        changed = changed.len(),
        ops = ops.len(),
        "Computed atomic update"
    );
    Update::new(ops)
}

/// Like [`diff`], but writes each entry of `replaced` as one whole subtree.
///
/// Whole-subtree assigns come first, in the order given. Operations that
/// [`diff`] would emit at or below a replaced path are dropped, since the
/// subtree write already covers them.
pub fn diff_replacing(original: &FlatMap, changed: &FlatMap, replaced: &FlatMap) -> Update {
    let covered = |at: &str| {
        replaced
            .keys()
            .any(|root| root == at || path::is_ancestor(root, at))
    };
    let mut ops: Vec<UpdateOp> = replaced
        .iter()
        .map(|(at, value)| UpdateOp::assign(at.as_str(), value.clone()))
        .collect();
    ops.extend(
        diff(original, changed)
            .into_iter()
            .filter(|op| !covered(op.path())),
    );
    Update::new(ops)
}
