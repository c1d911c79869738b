//! Document tree for the mapper.
//!
//! A [`Doc`] is an insertion-ordered map from field name to [`Value`]; values
//! nest further documents and [`List`]s. Every accessor that takes a key also
//! accepts a dot-path (`"comments.0.author"`), see [`path`] for the addressing
//! rules and the flatten/unflatten codec.
//!
//! # Examples
//!
//! ```
//! use docmapper::doc::{Doc, Value};
//!
//! let mut doc = Doc::new();
//! doc.set("title", "Hello");
//! doc.set("tags.0", "rust");
//! doc.set("author.name", "Alice");
//!
//! assert_eq!(doc.get("tags.0"), Some(&Value::from("rust")));
//! assert_eq!(doc.get_as::<&str>("author.name"), Some("Alice"));
//! assert!(doc.get("author.email").is_none());
//! ```

use std::fmt;

use indexmap::IndexMap;

pub mod list;
pub mod path;
pub mod value;

pub use list::List;
pub use path::{FlatMap, Segment, WILDCARD};
pub use value::{ObjectId, Value};

/// An insertion-ordered tree of named values.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Doc {
    children: IndexMap<String, Value>,
}

impl Doc {
    /// Creates a new empty document
    pub fn new() -> Self {
        Self {
            children: IndexMap::new(),
        }
    }

    /// Returns true if the document has no direct keys
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the number of direct keys
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Returns true if a value exists at the given key or path
    pub fn contains_key(&self, path: impl AsRef<str>) -> bool {
        self.get(path).is_some()
    }

    /// Gets a value by key or path.
    ///
    /// Unassigned list slots read as absent. The removal marker is returned
    /// as-is so change overlays can be inspected.
    pub fn get(&self, path: impl AsRef<str>) -> Option<&Value> {
        let mut segments = path::segments(path.as_ref());
        let first = segments.next()?;
        let mut current = self.get_key(&first.key())?;
        for segment in segments {
            current = path::child(current, segment)?;
        }
        Some(current)
    }

    /// Gets a mutable value by key or path
    pub fn get_mut(&mut self, path: impl AsRef<str>) -> Option<&mut Value> {
        let mut segments = path::segments(path.as_ref());
        let first = segments.next()?;
        let mut current = self.get_key_mut(&first.key())?;
        for segment in segments {
            current = path::child_mut(current, segment)?;
        }
        Some(current)
    }

    /// Gets a value by key or path with conversion via `TryFrom`.
    ///
    /// Returns `None` when the path is absent or the value has another type.
    pub fn get_as<'a, T>(&'a self, path: impl AsRef<str>) -> Option<T>
    where
        T: TryFrom<&'a Value>,
    {
        T::try_from(self.get(path)?).ok()
    }

    /// Sets a value at the given key or path, returning the previous value.
    ///
    /// Missing intermediate documents and lists are created on the way down;
    /// an index past the end of a list extends it with unassigned slots.
    /// An empty path is ignored.
    pub fn set(&mut self, path: impl AsRef<str>, value: impl Into<Value>) -> Option<Value> {
        let segments: Vec<_> = path::segments(path.as_ref()).collect();
        let (first, rest) = segments.split_first()?;
        let mut slot = self.entry(first.key().into_owned());
        for segment in rest {
            slot = path::slot_mut(slot, *segment);
        }
        let old = std::mem::replace(slot, value.into());
        (!old.is_hole()).then_some(old)
    }

    /// Removes the value at the given key or path, returning it.
    ///
    /// Removing from a list clears the slot (see [`List`]); sibling elements
    /// keep their indices.
    pub fn remove(&mut self, path: impl AsRef<str>) -> Option<Value> {
        let segments: Vec<_> = path::segments(path.as_ref()).collect();
        let (last, parents) = segments.split_last()?;
        let Some((first, rest)) = parents.split_first() else {
            return self.children.shift_remove(last.key().as_ref());
        };
        let mut parent = self.get_key_mut(&first.key())?;
        for segment in rest {
            parent = path::child_mut(parent, *segment)?;
        }
        match (parent, *last) {
            (Value::Doc(doc), segment) => doc.children.shift_remove(segment.key().as_ref()),
            (Value::List(list), Segment::Index(index)) => list.clear_slot(index),
            _ => None,
        }
    }

    /// Gets a direct child by key
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.children.get(key).filter(|v| !v.is_hole())
    }

    /// Gets a mutable direct child by key
    pub fn get_key_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.children.get_mut(key).filter(|v| !v.is_hole())
    }

    /// Inserts a direct child without path interpretation
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.children.insert(key.into(), value.into())
    }

    /// Returns the slot for a direct child, creating an unassigned one.
    pub(crate) fn entry(&mut self, key: String) -> &mut Value {
        self.children.entry(key).or_insert(Value::Hole)
    }

    /// Returns an iterator over direct key-value pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.children.iter()
    }

    /// Returns an iterator over direct keys
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.children.keys()
    }

    /// Removes all data
    pub fn clear(&mut self) {
        self.children.clear();
    }

    /// Builder-style [`Doc::set`]
    pub fn with(mut self, path: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.set(path, value);
        self
    }

    /// Converts the document to plain JSON (see [`Value::to_json`])
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.children
                .iter()
                .map(|(key, value)| (key.clone(), value.to_json()))
                .collect(),
        )
    }

    /// Builds a document from a JSON value.
    ///
    /// Non-object JSON yields `None`.
    pub fn from_json(json: serde_json::Value) -> Option<Self> {
        match Value::from(json) {
            Value::Doc(doc) => Some(doc),
            _ => None,
        }
    }
}

impl fmt::Display for Doc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl FromIterator<(String, Value)> for Doc {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            children: iter.into_iter().collect(),
        }
    }
}

impl<'a> TryFrom<&'a Value> for &'a str {
    type Error = ();

    fn try_from(value: &'a Value) -> Result<Self, Self::Error> {
        value.as_text().ok_or(())
    }
}

impl TryFrom<&Value> for String {
    type Error = ();

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        value.as_text().map(String::from).ok_or(())
    }
}

impl TryFrom<&Value> for i64 {
    type Error = ();

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        value.as_int().ok_or(())
    }
}

impl TryFrom<&Value> for bool {
    type Error = ();

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        value.as_bool().ok_or(())
    }
}

impl TryFrom<&Value> for ObjectId {
    type Error = ();

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        value.as_id().copied().ok_or(())
    }
}
