//! Rule engine seam and the bundled standard rules.
//!
//! The mapper never evaluates constraints itself; it hands the flattened
//! document and the expanded [`RuleMap`] to a [`RuleEngine`] and acts on the
//! [`ValidationResult`].

use indexmap::IndexMap;

use crate::doc::path::{self, FlatMap};
use crate::doc::Value;
use crate::schema::rules::{Rule, RuleMap};

/// Outcome of a validation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    /// Whether every rule passed
    pub passed: bool,
    /// Failure message per literal path
    pub errors: IndexMap<String, String>,
}

impl ValidationResult {
    /// A passing result
    pub fn pass() -> Self {
        Self {
            passed: true,
            errors: IndexMap::new(),
        }
    }

    /// A result built from collected failures; passes when there are none
    pub fn from_errors(errors: IndexMap<String, String>) -> Self {
        Self {
            passed: errors.is_empty(),
            errors,
        }
    }
}

/// Evaluates expanded rules against flattened data.
pub trait RuleEngine: Send + Sync {
    /// Checks `data` against `rules`. Never fails; problems are reported in
    /// the result.
    fn check(&self, data: &FlatMap, rules: &RuleMap) -> ValidationResult;
}

/// A small engine covering the common constraints.
///
/// | rule        | passes when                                             |
/// |-------------|---------------------------------------------------------|
/// | `required`  | the path holds a non-null, non-empty value or a subtree |
/// | `string`    | text                                                    |
/// | `integer`   | integer                                                 |
/// | `numeric`   | integer, float, or text that parses as a number         |
/// | `boolean`   | boolean                                                 |
/// | `id`        | document identity                                       |
/// | `min:N`     | number `>= N`, or text with at least `N` characters     |
/// | `max:N`     | number `<= N`, or text with at most `N` characters      |
/// | `in:a,b,..` | textual form is one of the listed options               |
///
/// Everything except `required` is skipped for absent or null values. Only
/// the first failing rule per path is reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

enum Field<'a> {
    Missing,
    Leaf(&'a Value),
    Branch,
}

fn lookup<'a>(data: &'a FlatMap, at: &str) -> Field<'a> {
    if let Some(value) = data.get(at) {
        return Field::Leaf(value);
    }
    if data.keys().any(|key| path::is_ancestor(at, key)) {
        Field::Branch
    } else {
        Field::Missing
    }
}

impl StandardRules {
    fn check_rule(rule: &Rule, at: &str, field: &Field<'_>) -> Result<(), String> {
        if rule.name() == "required" {
            return match field {
                Field::Missing | Field::Leaf(Value::Null | Value::Deleted) => {
                    Err(format!("{at} is required"))
                }
                Field::Leaf(Value::Text(s)) if s.is_empty() => Err(format!("{at} is required")),
                _ => Ok(()),
            };
        }

        let value = match field {
            Field::Leaf(Value::Null | Value::Deleted) | Field::Missing => return Ok(()),
            Field::Leaf(value) => Some(*value),
            Field::Branch => None,
        };

        match (rule.name(), value) {
            ("string", Some(Value::Text(_)))
            | ("integer", Some(Value::Int(_)))
            | ("numeric", Some(Value::Int(_) | Value::Float(_)))
            | ("boolean", Some(Value::Bool(_)))
            | ("id", Some(Value::Id(_))) => Ok(()),
            ("numeric", Some(Value::Text(s))) if s.trim().parse::<f64>().is_ok() => Ok(()),
            ("string" | "integer" | "numeric" | "boolean" | "id", _) => {
                Err(format!("{at} must be {}", describe(rule.name())))
            }
            ("min" | "max", value) => bound(rule, at, value),
            ("in", value) => {
                let options = rule.argument().unwrap_or_default();
                let actual = value.map(Value::to_string).unwrap_or_default();
                if options.split(',').any(|option| option == actual) {
                    Ok(())
                } else {
                    Err(format!("{at} must be one of {options}"))
                }
            }
            (other, _) => Err(format!("{at}: unknown rule '{other}'")),
        }
    }
}

fn describe(name: &str) -> &'static str {
    match name {
        "string" => "a string",
        "integer" => "an integer",
        "numeric" => "numeric",
        "boolean" => "a boolean",
        _ => "a document id",
    }
}

fn bound(rule: &Rule, at: &str, value: Option<&Value>) -> Result<(), String> {
    let Some(limit) = rule.argument().and_then(|arg| arg.trim().parse::<f64>().ok()) else {
        return Err(format!("{at}: invalid argument for rule '{rule}'"));
    };
    let (measured, unit) = match value {
        Some(Value::Text(s)) => (s.chars().count() as f64, " characters"),
        Some(other) => match other.as_f64() {
            Some(n) => (n, ""),
            None => return Err(format!("{at} cannot be measured for rule '{rule}'")),
        },
        None => return Err(format!("{at} cannot be measured for rule '{rule}'")),
    };
    match rule.name() {
        "min" if measured < limit => Err(format!("{at} must be at least {limit}{unit}")),
        "max" if measured > limit => Err(format!("{at} must be at most {limit}{unit}")),
        _ => Ok(()),
    }
}

impl RuleEngine for StandardRules {
    fn check(&self, data: &FlatMap, rules: &RuleMap) -> ValidationResult {
        let mut errors = IndexMap::new();
        for (at, path_rules) in rules {
            let field = lookup(data, at);
            if let Some(message) = path_rules
                .iter()
                .find_map(|rule| Self::check_rule(rule, at, &field).err())
            {
                errors.insert(at.clone(), message);
            }
        }
        ValidationResult::from_errors(errors)
    }
}
