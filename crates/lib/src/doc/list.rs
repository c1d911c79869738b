//! Ordered list type for array fields.
//!
//! A `List` addresses its elements by position, the same way paths address
//! them (`tags.0`, `tags.1`, ...). Slots that were never assigned hold
//! [`Value::Hole`] and read back as absent.

use super::value::Value;

/// An ordered collection of values.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct List {
    items: Vec<Value>,
}

impl List {
    /// Creates a new empty list
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Number of slots, including unassigned ones
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the list has no slots
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Gets the element at `index`, hiding unassigned slots
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index).filter(|v| !v.is_hole())
    }

    /// Gets a mutable element at `index`, hiding unassigned slots
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.items.get_mut(index).filter(|v| !v.is_hole())
    }

    /// Appends a value
    pub fn push(&mut self, value: impl Into<Value>) {
        self.items.push(value.into());
    }

    /// Iterates over assigned elements
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter().filter(|v| !v.is_hole())
    }

    /// Iterates over every slot, unassigned ones included
    pub fn iter_slots(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }

    /// Positions of assigned elements, in order
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_hole())
            .map(|(index, _)| index)
    }

    /// Returns the slot at `index`, growing the list with holes to reach it.
    pub(crate) fn slot_mut(&mut self, index: usize) -> &mut Value {
        if index >= self.items.len() {
            self.items.resize(index + 1, Value::Hole);
        }
        &mut self.items[index]
    }

    /// Clears the slot at `index` and returns what it held.
    ///
    /// Interior slots become holes so later elements keep their positions;
    /// clearing the tail shrinks the list past any trailing holes.
    pub(crate) fn clear_slot(&mut self, index: usize) -> Option<Value> {
        let slot = self.items.get_mut(index)?;
        let old = std::mem::replace(slot, Value::Hole);
        while self.items.last().is_some_and(Value::is_hole) {
            self.items.pop();
        }
        (!old.is_hole()).then_some(old)
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for List {
    fn from(values: Vec<T>) -> Self {
        values.into_iter().map(Into::into).collect()
    }
}
