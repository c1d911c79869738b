use docmapper::diff::UpdateOp;
use docmapper::doc::{Doc, List, Value};
use docmapper::state::DocumentState;

use crate::helpers::post_schema;

fn persisted_state() -> DocumentState {
    let mut state = DocumentState::new(post_schema());
    state.absorb(
        Doc::new()
            .with("title", "Hello")
            .with("tags", vec!["x", "y"])
            .with("meta.views", 1),
    );
    state
}

#[test]
fn test_set_unknown_field_is_rejected_without_mutation() {
    let mut state = DocumentState::new(post_schema());
    state.set("title", "Draft").unwrap();

    let err = state.set("not.a.field", 1).unwrap_err();
    assert!(err.is_unknown_field());
    assert_eq!(state.changed(), &Doc::new().with("title", "Draft"));
}

#[test]
fn test_set_accepts_prefix_of_declared_field() {
    let mut state = DocumentState::new(post_schema());
    state
        .set("meta", Doc::new().with("views", 3))
        .expect("prefix of a declared field");
    state
        .set("comments.0", Doc::new().with("author", "alice"))
        .expect("array element of a declared field");
    assert_eq!(state.get("comments.0.author"), Some(Value::from("alice")));
}

#[test]
fn test_set_many_checks_every_path_first() {
    let mut state = DocumentState::new(post_schema());
    let values = Doc::new().with("title", "ok").with("nope", 1);

    let err = state.set_many(&values).unwrap_err();
    assert!(err.is_unknown_field());
    assert!(state.changed().is_empty());

    state
        .set_many(&Doc::new().with("title", "ok").with("tags", vec!["a"]))
        .unwrap();
    assert_eq!(state.get("tags.0"), Some(Value::from("a")));
}

#[test]
fn test_get_reads_merged_view() {
    let mut state = persisted_state();
    state.set("tags.1", "z").unwrap();

    assert_eq!(state.get("tags.0"), Some(Value::from("x")));
    assert_eq!(state.get("tags.1"), Some(Value::from("z")));
    assert_eq!(state.original().get("tags.1"), Some(&Value::from("y")));
    assert!(state.changed().get("tags.0").is_none());
}

#[test]
fn test_unset_changed_only_path_removes_it() {
    let mut state = DocumentState::new(post_schema());
    state.set("tags.0", "x").unwrap();
    state.unset("tags.0").unwrap();

    assert!(state.changed().get("tags.0").is_none());
    assert!(!state.has_changes());
}

#[test]
fn test_unset_original_path_stages_removal() {
    let mut state = persisted_state();
    state.unset("meta.views").unwrap();

    assert_eq!(state.changed().get("meta.views"), Some(&Value::Deleted));
    assert!(state.get("meta.views").is_none());
    assert!(state.has_changes());
}

#[test]
fn test_unset_absent_path_is_noop() {
    let mut state = persisted_state();
    state.unset("body").unwrap();
    assert!(!state.has_changes());
}

#[test]
fn test_unset_unknown_field_is_rejected() {
    let mut state = persisted_state();
    assert!(state.unset("nope").unwrap_err().is_unknown_field());
}

#[test]
fn test_commit_folds_overlay_into_original() {
    let mut state = persisted_state();
    state.set("title", "Changed").unwrap();
    state.unset("meta.views").unwrap();
    state.commit();

    assert!(!state.has_changes());
    assert_eq!(state.original().get("title"), Some(&Value::from("Changed")));
    assert!(state.original().get("meta.views").is_none());
}

#[test]
fn test_discard_changes_restores_original_view() {
    let mut state = persisted_state();
    state.set("title", "Changed").unwrap();
    state.discard_changes();
    assert_eq!(state.get("title"), Some(Value::from("Hello")));
}

#[test]
fn test_set_subtree_checks_every_contained_path() {
    let mut state = persisted_state();

    let err = state
        .set("meta", Doc::new().with("views", 2).with("bogus", 1))
        .unwrap_err();
    assert!(err.is_unknown_field());

    let err = state
        .set("meta", Doc::new().with("bogus", List::new()))
        .unwrap_err();
    assert!(err.is_unknown_field());

    assert!(state.changed().is_empty());
    assert!(!state.has_changes());
}

#[test]
fn test_set_subtree_replaces_original_subtree() {
    let mut state = persisted_state();
    state.set("tags", vec!["only"]).unwrap();

    assert_eq!(state.get("tags"), Some(Value::List(List::from(vec!["only"]))));
    assert_eq!(
        state.pending_update().ops(),
        &[UpdateOp::assign("tags", Value::List(List::from(vec!["only"])))]
    );
}

#[test]
fn test_set_empty_container_is_a_pending_change() {
    let mut state = persisted_state();
    state.set("tags", List::new()).unwrap();
    state.set("meta", Doc::new()).unwrap();

    assert!(state.has_changes());
    assert_eq!(state.get("tags"), Some(Value::List(List::new())));
    assert_eq!(state.get("meta"), Some(Value::Doc(Doc::new())));

    state.commit();
    assert_eq!(state.original().get("tags"), Some(&Value::List(List::new())));
    assert!(state.original().get("meta.views").is_none());
}

#[test]
fn test_set_equal_subtree_produces_no_update() {
    let mut state = persisted_state();
    state.set("tags", vec!["x", "y"]).unwrap();

    assert!(state.has_changes());
    assert!(state.pending_update().is_empty());
}

#[test]
fn test_edits_inside_replaced_subtree() {
    let mut state = persisted_state();
    state.set("tags", vec!["a", "b"]).unwrap();
    state.set("tags.2", "c").unwrap();
    state.unset("tags.0").unwrap();

    assert!(state.get("tags.0").is_none());
    assert_eq!(state.get("tags.2"), Some(Value::from("c")));
    assert_eq!(state.pending_update().len(), 1);
    assert_eq!(state.pending_update().ops()[0].path(), "tags");
}

#[test]
fn test_set_below_staged_removal_starts_empty() {
    let mut state = persisted_state();
    let snapshot = state.original().clone().with("meta.flags", vec!["f"]);
    state.absorb(snapshot);
    state.unset("meta").unwrap();
    state.set("meta.views", 5).unwrap();

    assert_eq!(state.get("meta"), Some(Value::Doc(Doc::new().with("views", 5))));
}

#[test]
fn test_oversized_index_is_rejected() {
    let mut state = persisted_state();

    let err = state.set("tags.4000000000", "x").unwrap_err();
    assert!(err.is_index_out_of_range());
    let err = state.set("tags.99999999999999999999999", "x").unwrap_err();
    assert!(err.is_index_out_of_range());

    assert!(state.changed().is_empty());
    assert_eq!(state.get("tags.1"), Some(Value::from("y")));
}
