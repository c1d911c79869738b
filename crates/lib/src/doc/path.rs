//! Dot-path addressing over nested documents.
//!
//! A path is a dot-separated sequence of segments; a segment is either a field
//! name or a non-negative array index (`comments.0.author`). Empty segments are
//! ignored, so `".a..b."` addresses the same value as `"a.b"`.
//!
//! This module converts between trees and their flattened form (literal path
//! → leaf value) and produces the normalized form of a path, in which every
//! index is replaced by [`WILDCARD`] for matching against schema declarations.
//!
//! ```
//! use docmapper::doc::{Doc, path};
//!
//! let mut doc = Doc::new();
//! doc.set("comments.1.author", "bob");
//!
//! let flat = path::flatten(&doc);
//! assert_eq!(flat.keys().collect::<Vec<_>>(), vec!["comments.1.author"]);
//! assert_eq!(path::normalize("comments.1.author"), "comments.$.author");
//! assert_eq!(path::unflatten(&flat), doc);
//! ```

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;

use super::{Doc, List, Value};

/// Segment marker standing for "every element of this array".
pub const WILDCARD: &str = "$";

/// Literal path → leaf value, in document order.
pub type FlatMap = IndexMap<String, Value>;

/// One component of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// A field name inside a document
    Field(&'a str),
    /// A position inside a list
    Index(usize),
}

impl<'a> Segment<'a> {
    /// Classifies a raw path component. All-digit components are indices.
    pub fn parse(component: &'a str) -> Self {
        if is_index(component)
            && let Ok(index) = component.parse()
        {
            return Segment::Index(index);
        }
        Segment::Field(component)
    }

    /// The key this segment selects inside a document.
    pub fn key(&self) -> Cow<'a, str> {
        match self {
            Segment::Field(name) => Cow::Borrowed(*name),
            Segment::Index(index) => Cow::Owned(index.to_string()),
        }
    }
}

impl fmt::Display for Segment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => write!(f, "{name}"),
            Segment::Index(index) => write!(f, "{index}"),
        }
    }
}

fn is_index(component: &str) -> bool {
    !component.is_empty() && component.bytes().all(|b| b.is_ascii_digit())
}

/// Splits a path into segments, skipping empty components.
pub fn segments(path: &str) -> impl Iterator<Item = Segment<'_>> {
    path.split('.')
        .filter(|component| !component.is_empty())
        .map(Segment::parse)
}

/// Replaces every index segment with [`WILDCARD`].
///
/// ```
/// # use docmapper::doc::path::normalize;
/// assert_eq!(normalize("comments.12.author"), "comments.$.author");
/// assert_eq!(normalize("title"), "title");
/// assert_eq!(normalize(".tags..0."), "tags.$");
/// ```
pub fn normalize(path: &str) -> String {
    path.split('.')
        .filter(|component| !component.is_empty())
        .map(|component| {
            if is_index(component) {
                WILDCARD
            } else {
                component
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Drops empty components, so `".a..b."` becomes `"a.b"`.
pub fn canonical(path: &str) -> String {
    path.split('.')
        .filter(|component| !component.is_empty())
        .collect::<Vec<_>>()
        .join(".")
}

/// Returns the first index component of `path` that is larger than `limit`,
/// including indices too large to represent at all.
pub fn index_beyond(path: &str, limit: usize) -> Option<&str> {
    path.split('.').filter(|component| is_index(component)).find(|component| {
        component
            .parse::<usize>()
            .ok()
            .is_none_or(|index| index > limit)
    })
}

/// Appends one component to a path prefix.
pub fn join(prefix: &str, component: impl fmt::Display) -> String {
    if prefix.is_empty() {
        component.to_string()
    } else {
        format!("{prefix}.{component}")
    }
}

/// Returns true if `ancestor` addresses a strict ancestor of `path`.
pub fn is_ancestor(ancestor: &str, path: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'.'
}

/// Flattens a document into literal path → leaf pairs.
///
/// Traversal follows insertion order, so flattening the same tree always
/// yields the same sequence. Empty documents and lists produce no entries.
pub fn flatten(doc: &Doc) -> FlatMap {
    let mut out = FlatMap::new();
    for (key, value) in doc.iter() {
        flatten_into(key, value, &mut out);
    }
    out
}

/// Flattens a single value rooted at `prefix`.
pub fn flatten_value(prefix: &str, value: &Value) -> FlatMap {
    let mut out = FlatMap::new();
    flatten_into(prefix, value, &mut out);
    out
}

fn flatten_into(prefix: &str, value: &Value, out: &mut FlatMap) {
    match value {
        Value::Doc(doc) => {
            for (key, child) in doc.iter() {
                flatten_into(&join(prefix, key), child, out);
            }
        }
        Value::List(list) => {
            for (index, child) in list.iter_slots().enumerate() {
                flatten_into(&join(prefix, index), child, out);
            }
        }
        Value::Hole => {}
        leaf => {
            out.insert(prefix.to_string(), leaf.clone());
        }
    }
}

/// Rebuilds a document from its flattened form.
///
/// Index segments create (or extend) lists; gaps are filled with holes.
pub fn unflatten(flat: &FlatMap) -> Doc {
    let mut doc = Doc::new();
    for (path, value) in flat {
        doc.set(path, value.clone());
    }
    doc
}

/// Descends one segment from `container`, creating whatever is missing.
///
/// A container of the wrong shape for `segment` is replaced: index segments
/// need a list (documents also accept them as keys), field segments need a
/// document.
pub(crate) fn slot_mut<'v>(container: &'v mut Value, segment: Segment<'_>) -> &'v mut Value {
    match (container, segment) {
        (Value::List(list), Segment::Index(index)) => list.slot_mut(index),
        (Value::Doc(doc), segment) => doc.entry(segment.key().into_owned()),
        (other, segment) => {
            *other = match segment {
                Segment::Index(_) => Value::List(List::new()),
                Segment::Field(_) => Value::Doc(Doc::new()),
            };
            slot_mut(other, segment)
        }
    }
}

/// Descends one segment from `value` without creating anything.
pub(crate) fn child<'v>(value: &'v Value, segment: Segment<'_>) -> Option<&'v Value> {
    match (value, segment) {
        (Value::Doc(doc), segment) => doc.get_key(&segment.key()),
        (Value::List(list), Segment::Index(index)) => list.get(index),
        _ => None,
    }
}

/// Mutable counterpart of [`child`].
pub(crate) fn child_mut<'v>(value: &'v mut Value, segment: Segment<'_>) -> Option<&'v mut Value> {
    match (value, segment) {
        (Value::Doc(doc), segment) => doc.get_key_mut(&segment.key()),
        (Value::List(list), Segment::Index(index)) => list.get_mut(index),
        _ => None,
    }
}
