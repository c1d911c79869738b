use docmapper::doc::{Doc, ObjectId, Value};
use serde_json::json;

#[test]
fn test_json_conversion_keeps_structure() {
    let json = json!({
        "title": "Hello",
        "views": 3,
        "ratio": 0.5,
        "draft": false,
        "tags": ["a", "b"],
        "meta": {"editor": null}
    });

    let doc = Doc::from_json(json.clone()).unwrap();
    assert_eq!(doc.get("views"), Some(&Value::Int(3)));
    assert_eq!(doc.get("ratio"), Some(&Value::Float(0.5)));
    assert_eq!(doc.get("meta.editor"), Some(&Value::Null));
    assert_eq!(doc.to_json(), json);
}

#[test]
fn test_object_id_renders_as_oid() {
    let id = ObjectId::new();
    let doc = Doc::new().with("_id", id);
    let json = doc.to_json();
    assert_eq!(json["_id"]["$oid"], json!(id.to_string()));

    let back = Doc::from_json(json).unwrap();
    assert_eq!(back.get("_id"), Some(&Value::Id(id)));
}

#[test]
fn test_object_ids_are_unique() {
    assert_ne!(ObjectId::new(), ObjectId::new());
}

#[test]
fn test_get_as_converts() {
    let doc = Doc::new().with("title", "Hello").with("views", 3);
    assert_eq!(doc.get_as::<&str>("title"), Some("Hello"));
    assert_eq!(doc.get_as::<i64>("views"), Some(3));
    assert_eq!(doc.get_as::<i64>("title"), None);
}

#[test]
fn test_non_object_json_is_not_a_document() {
    assert!(Doc::from_json(json!([1, 2])).is_none());
}
