//! Document schemas.
//!
//! A [`Schema`] is the list of paths a document may contain, in wildcard form
//! (`comments.$.author`), plus a nested [`RuleTree`] of validation rules. The
//! field list is compiled into lookup sets once, when the schema is built, so
//! checking a path on every `set` is a pair of hash lookups.

use std::collections::HashSet;

use crate::constants::ID_FIELD;
use crate::doc::path;

pub mod engine;
pub mod rules;

pub use engine::{RuleEngine, StandardRules, ValidationResult};
pub use rules::{Rule, RuleMap, RuleNode, RuleTree};

/// Declared fields and validation rules for one kind of document.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<String>,
    exact: HashSet<String>,
    prefixes: HashSet<String>,
    rules: RuleTree,
}

impl Schema {
    /// Starts building a schema
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Declared fields in wildcard form, in declaration order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// The validation rule tree
    pub fn rules(&self) -> &RuleTree {
        &self.rules
    }

    /// Returns true if `path` may be set on a document of this schema.
    ///
    /// The normalized path must either be a declared field or a strict prefix
    /// of one, which allows assigning a whole embedded object or array at once.
    pub fn allows(&self, path: &str) -> bool {
        let normalized = path::normalize(path);
        self.exact.contains(&normalized) || self.prefixes.contains(&normalized)
    }

    /// Returns true if `path` normalizes to exactly a declared field
    pub fn declares(&self, path: &str) -> bool {
        self.exact.contains(&path::normalize(path))
    }

    fn declare(&mut self, field: &str) {
        let normalized = path::normalize(field);
        if normalized.is_empty() || !self.exact.insert(normalized.clone()) {
            return;
        }
        let mut prefix = String::new();
        for component in normalized.split('.') {
            if !prefix.is_empty() {
                self.prefixes.insert(prefix.clone());
                prefix.push('.');
            }
            prefix.push_str(component);
        }
        self.fields.push(normalized);
    }
}

/// Builder for [`Schema`].
///
/// ```
/// use docmapper::schema::Schema;
///
/// let schema = Schema::builder()
///     .field("title")
///     .rule("comments.$.author", ["required", "string"])
///     .build();
///
/// assert!(schema.allows("comments.3.author"));
/// assert!(schema.allows("comments.3"));
/// assert!(schema.allows("_id"));
/// assert!(!schema.allows("comments.3.likes"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    /// Declares a field
    pub fn field(mut self, path: &str) -> Self {
        self.schema.declare(path);
        self
    }

    /// Declares several fields
    pub fn fields<'a>(mut self, paths: impl IntoIterator<Item = &'a str>) -> Self {
        for path in paths {
            self.schema.declare(path);
        }
        self
    }

    /// Declares a field and attaches rules to it
    pub fn rule(mut self, path: &str, rules: impl IntoIterator<Item = impl Into<Rule>>) -> Self {
        self.schema.declare(path);
        self.schema.rules.insert(path, rules);
        self
    }

    /// Replaces the rule tree wholesale; does not declare fields
    pub fn rules(mut self, rules: RuleTree) -> Self {
        self.schema.rules = rules;
        self
    }

    /// Finishes the schema. The identity field is always declared.
    pub fn build(mut self) -> Schema {
        self.schema.declare(ID_FIELD);
        self.schema
    }
}
