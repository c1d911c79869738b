use docmapper::diff::{Update, UpdateOp, diff};
use docmapper::doc::path::flatten;
use docmapper::doc::{Doc, Value};

#[test]
fn test_diff_is_minimal() {
    let original = Doc::new().with("a", 1).with("b", 2);
    let changed = Doc::new().with("a", 1).with("b", 3);

    let update = diff(&flatten(&original), &flatten(&changed));
    assert_eq!(update.ops(), &[UpdateOp::assign("b", 3)]);
}

#[test]
fn test_array_element_change_is_positional() {
    let original = Doc::new().with("tags", vec!["x", "y"]);
    let mut changed = Doc::new();
    changed.set("tags.1", "z");

    let update = diff(&flatten(&original), &flatten(&changed));
    assert_eq!(update.ops(), &[UpdateOp::assign("tags.1", "z")]);
}

#[test]
fn test_whole_array_assignment_only_sends_differences() {
    let original = Doc::new().with("tags", vec!["x", "y", "z"]);
    let changed = Doc::new().with("tags", vec!["x", "q", "z", "w"]);

    let update = diff(&flatten(&original), &flatten(&changed));
    assert_eq!(
        update.ops(),
        &[UpdateOp::assign("tags.1", "q"), UpdateOp::assign("tags.3", "w")]
    );
}

#[test]
fn test_removals_and_assignments_keep_changed_order() {
    let original = Doc::new().with("a", 1).with("meta.views", 2);
    let changed = Doc::new()
        .with("meta.views", Value::Deleted)
        .with("title", "new")
        .with("a", Value::Deleted);

    let update = diff(&flatten(&original), &flatten(&changed));
    assert_eq!(
        update.ops(),
        &[
            UpdateOp::remove("meta.views"),
            UpdateOp::assign("title", "new"),
            UpdateOp::remove("a"),
        ]
    );
}

#[test]
fn test_nothing_changed_is_empty() {
    let original = Doc::new().with("a", 1);
    assert!(diff(&flatten(&original), &flatten(&Doc::new())).is_empty());
    assert!(diff(&flatten(&original), &flatten(&original)).is_empty());
}

#[test]
fn test_to_json_groups_operations() {
    let update = Update::new(vec![
        UpdateOp::assign("title", "x"),
        UpdateOp::assign("tags.1", "z"),
        UpdateOp::remove("meta"),
    ]);
    assert_eq!(
        update.to_json(),
        serde_json::json!({
            "$set": {"title": "x", "tags.1": "z"},
            "$unset": {"meta": ""}
        })
    );
    assert_eq!(Update::default().to_json(), serde_json::json!({}));
}
