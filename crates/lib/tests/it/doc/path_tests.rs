use docmapper::doc::path::{self, FlatMap};
use docmapper::doc::{Doc, List, Value};

fn sample_tree() -> Doc {
    Doc::new()
        .with("title", "Hello")
        .with("tags", vec!["x", "y"])
        .with("meta.views", 10)
        .with("comments.0.author", "alice")
        .with("comments.0.likes", vec![1, 2])
        .with("comments.1.author", "bob")
}

#[test]
fn test_flatten_unflatten_round_trip() {
    let tree = sample_tree();
    let flat = path::flatten(&tree);
    assert_eq!(path::unflatten(&flat), tree);
}

#[test]
fn test_flatten_uses_literal_paths_in_insertion_order() {
    let flat = path::flatten(&sample_tree());
    let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "title",
            "tags.0",
            "tags.1",
            "meta.views",
            "comments.0.author",
            "comments.0.likes.0",
            "comments.0.likes.1",
            "comments.1.author",
        ]
    );
}

#[test]
fn test_flatten_skips_empty_containers() {
    let doc = Doc::new()
        .with("a", 1)
        .with("empty_list", List::new())
        .with("empty_doc", Doc::new());
    let flat = path::flatten(&doc);
    assert_eq!(flat.len(), 1);
    assert_eq!(flat["a"], Value::from(1));
}

#[test]
fn test_unflatten_builds_lists_for_index_segments() {
    let mut flat = FlatMap::new();
    flat.insert("tags.0".to_string(), "a".into());
    flat.insert("tags.1".to_string(), "b".into());

    let doc = path::unflatten(&flat);
    let tags = doc.get("tags").and_then(Value::as_list).unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags.get(1), Some(&Value::from("b")));
}

#[test]
fn test_set_past_end_pads_list() {
    let mut doc = Doc::new();
    doc.set("tags.2", "c");

    let tags = doc.get("tags").and_then(Value::as_list).unwrap();
    assert_eq!(tags.len(), 3);
    assert!(doc.get("tags.0").is_none());
    assert!(doc.get("tags.1").is_none());
    assert_eq!(doc.get("tags.2"), Some(&Value::from("c")));

    // Unassigned slots never show up as leaves
    assert_eq!(path::flatten(&doc).len(), 1);
}

#[test]
fn test_remove_interior_element_keeps_positions() {
    let mut doc = Doc::new().with("tags", vec!["a", "b", "c"]);
    assert_eq!(doc.remove("tags.1"), Some(Value::from("b")));
    assert!(doc.get("tags.1").is_none());
    assert_eq!(doc.get("tags.2"), Some(&Value::from("c")));

    assert_eq!(doc.remove("tags.2"), Some(Value::from("c")));
    let tags = doc.get("tags").and_then(Value::as_list).unwrap();
    assert_eq!(tags.len(), 1);
}

#[test]
fn test_set_replaces_mismatched_container() {
    let mut doc = Doc::new().with("meta", "flat");
    doc.set("meta.views", 3);
    assert_eq!(doc.get("meta.views"), Some(&Value::from(3)));
}

#[test]
fn test_normalize_and_ancestry() {
    assert_eq!(path::normalize("comments.3.likes.0"), "comments.$.likes.$");
    assert!(path::is_ancestor("comments", "comments.0"));
    assert!(path::is_ancestor("comments.0", "comments.0.author"));
    assert!(!path::is_ancestor("comments", "comments"));
    assert!(!path::is_ancestor("comment", "comments.0"));
}
