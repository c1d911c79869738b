use docmapper::Value;

use crate::helpers::{CallCounts, post_schema, setup_mapper, test_namespace};

#[tokio::test]
async fn test_save_twice_calls_backend_once() {
    let (mapper, backend) = setup_mapper();
    let mut post = mapper.document(post_schema());
    post.set("title", "Hello").unwrap();

    post.save().await.unwrap();
    assert_eq!(backend.calls.total(), 1);
    assert_eq!(CallCounts::get(&backend.calls.replace_or_upsert), 1);

    post.save().await.unwrap();
    assert_eq!(backend.calls.total(), 1);
}

#[tokio::test]
async fn test_save_replaces_stored_document() {
    let (mapper, backend) = setup_mapper();
    let mut post = mapper.document(post_schema());
    post.set("title", "Hello").unwrap();
    post.set("tags", vec!["x", "y"]).unwrap();
    post.save().await.unwrap();
    assert!(post.loaded());

    post.unset("tags").unwrap();
    post.set("body", "text").unwrap();
    post.save().await.unwrap();

    let id = post.id().unwrap();
    let stored = backend.store.get(&test_namespace(), &id).await.unwrap();
    assert!(stored.get("tags").is_none());
    assert_eq!(stored.get("body"), Some(&Value::from("text")));
    assert_eq!(stored, post.original().clone());
    assert_eq!(backend.store.len(&test_namespace()).await, 1);
}

#[tokio::test]
async fn test_save_validates_before_writing() {
    let (mapper, backend) = setup_mapper();
    let mut post = mapper.document(post_schema());
    post.set("title", 42).unwrap();

    let err = post.save().await.unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(
        err.validation_errors().unwrap()["title"],
        "title must be a string"
    );
    assert_eq!(backend.calls.total(), 0);
    assert!(post.has_changes());
}
