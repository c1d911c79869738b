//! Nested validation rules and their expansion against a document.
//!
//! A [`RuleTree`] mirrors the document's shape. Its leaves are rule sets; a
//! [`WILDCARD`] key means "apply to every element of the array at this
//! point". The rule engine only understands literal paths, so before every
//! validation the tree is expanded against the document's current data:
//!
//! ```
//! use docmapper::doc::Doc;
//! use docmapper::schema::rules::{Rule, RuleTree};
//!
//! let rules: RuleTree = serde_json::from_str(
//!     r#"{"comments": {"$": {"author": ["required"]}}}"#,
//! ).unwrap();
//!
//! let data = Doc::from_json(serde_json::json!({"comments": [{}, {}]})).unwrap();
//! let expanded = rules.expand(&data);
//!
//! assert_eq!(expanded.keys().collect::<Vec<_>>(), vec!["comments.0.author", "comments.1.author"]);
//! assert_eq!(expanded["comments.0.author"], vec![Rule::from("required")]);
//! ```

use std::fmt;

use indexmap::IndexMap;

use crate::doc::path::{self, WILDCARD};
use crate::doc::{Doc, Value};

/// A single named constraint, optionally parameterised: `required`, `min:3`,
/// `in:draft,published`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Rule(String);

impl Rule {
    /// Creates a rule from its textual form
    pub fn new(rule: impl Into<String>) -> Self {
        Self(rule.into())
    }

    /// The constraint name (text before the first `:`)
    pub fn name(&self) -> &str {
        self.0.split_once(':').map_or(self.0.as_str(), |(name, _)| name)
    }

    /// The constraint argument (text after the first `:`), if any
    pub fn argument(&self) -> Option<&str> {
        self.0.split_once(':').map(|(_, arg)| arg)
    }

    /// The full textual form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Rule {
    fn from(rule: &str) -> Self {
        Self::new(rule)
    }
}

impl From<String> for Rule {
    fn from(rule: String) -> Self {
        Self(rule)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Literal path → rules to check there.
pub type RuleMap = IndexMap<String, Vec<Rule>>;

/// One node of a [`RuleTree`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum RuleNode {
    /// Rules for the value at this path
    Rules(Vec<Rule>),
    /// Rules for fields below this path
    Nested(IndexMap<String, RuleNode>),
}

/// Validation rules shaped like the documents they apply to.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RuleTree {
    root: IndexMap<String, RuleNode>,
}

impl RuleTree {
    /// Creates an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no rules are defined
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Top-level nodes
    pub fn nodes(&self) -> &IndexMap<String, RuleNode> {
        &self.root
    }

    /// Adds rules at a wildcard-form path (`comments.$.author`).
    ///
    /// Index segments are treated as wildcards. A rule set placed where
    /// nested rules already exist replaces them, and vice versa.
    pub fn insert(&mut self, path: &str, rules: impl IntoIterator<Item = impl Into<Rule>>) {
        let normalized = path::normalize(path);
        let keys: Vec<&str> = normalized.split('.').filter(|k| !k.is_empty()).collect();
        let Some((last, parents)) = keys.split_last() else {
            return;
        };

        let mut level = &mut self.root;
        for key in parents {
            let node = level
                .entry(key.to_string())
                .or_insert_with(|| RuleNode::Nested(IndexMap::new()));
            if let RuleNode::Rules(_) = node {
                *node = RuleNode::Nested(IndexMap::new());
            }
            level = match node {
                RuleNode::Nested(children) => children,
                RuleNode::Rules(_) => return,
            };
        }
        level.insert(
            last.to_string(),
            RuleNode::Rules(rules.into_iter().map(Into::into).collect()),
        );
    }

    /// Expands the tree into literal paths for the given document.
    ///
    /// Each wildcard is repeated once per element currently present in the
    /// array at that point; a missing or empty array contributes nothing, and
    /// neither does a slot whose element was removed.
    pub fn expand(&self, data: &Doc) -> RuleMap {
        expand_nodes(&self.root, "", data)
    }
}

fn expand_nodes(nodes: &IndexMap<String, RuleNode>, prefix: &str, data: &Doc) -> RuleMap {
    let mut out = RuleMap::new();
    for (key, node) in nodes {
        if key == WILDCARD {
            for index in element_indices(data, prefix) {
                out.extend(expand_node(node, &path::join(prefix, index), data));
            }
        } else {
            out.extend(expand_node(node, &path::join(prefix, key), data));
        }
    }
    out
}

fn expand_node(node: &RuleNode, at: &str, data: &Doc) -> RuleMap {
    match node {
        RuleNode::Rules(rules) => RuleMap::from([(at.to_string(), rules.clone())]),
        RuleNode::Nested(children) => expand_nodes(children, at, data),
    }
}

/// Assigned positions of the array at `at`; unassigned slots are skipped.
fn element_indices(data: &Doc, at: &str) -> Vec<usize> {
    data.get(at)
        .and_then(Value::as_list)
        .map(|list| list.indices().collect())
        .unwrap_or_default()
}
