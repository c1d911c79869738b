use std::sync::Arc;

use docmapper::doc::path::FlatMap;
use docmapper::doc::{Doc, Value};
use docmapper::schema::{RuleEngine, RuleMap, ValidationResult};

use crate::helpers::{post_schema, setup_mapper};

#[test]
fn test_validate_reports_without_failing() {
    let (mapper, _backend) = setup_mapper();
    let mut post = mapper.document(post_schema());
    post.set("comments", vec![Doc::new(), Doc::new().with("author", "bob")])
        .unwrap();

    let result = post.validate(None);
    assert!(!result.passed);
    let failed: Vec<&str> = result.errors.keys().map(String::as_str).collect();
    assert_eq!(failed, vec!["title", "comments.0.author"]);
}

#[test]
fn test_validate_supplied_data() {
    let (mapper, _backend) = setup_mapper();
    let post = mapper.document(post_schema());

    assert!(post.validate(Some(&Doc::new().with("title", "ok"))).passed);
    assert!(!post.validate(Some(&Doc::new())).passed);
}

/// Records what it was asked to check and rejects everything
#[derive(Default)]
struct RejectAll {
    seen: std::sync::Mutex<Vec<(FlatMap, RuleMap)>>,
}

impl RuleEngine for RejectAll {
    fn check(&self, data: &FlatMap, rules: &RuleMap) -> ValidationResult {
        self.seen.lock().unwrap().push((data.clone(), rules.clone()));
        ValidationResult::from_errors(
            rules
                .keys()
                .map(|at| (at.clone(), format!("{at} rejected")))
                .collect(),
        )
    }
}

#[tokio::test]
async fn test_custom_rule_engine_receives_flat_data() {
    let (mapper, backend) = setup_mapper();
    let engine = Arc::new(RejectAll::default());
    let mapper = mapper.with_rule_engine(engine.clone());

    let mut post = mapper.document(post_schema());
    post.set("title", "Hello").unwrap();
    post.set("tags", vec!["a"]).unwrap();

    let err = post.save().await.unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(backend.calls.total(), 0);

    let seen = engine.seen.lock().unwrap();
    let (data, rules) = &seen[0];
    assert_eq!(data["title"], Value::from("Hello"));
    assert_eq!(data["tags.0"], Value::from("a"));
    assert!(data.contains_key("_id"));
    assert!(rules.contains_key("title"));
}
