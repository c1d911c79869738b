use docmapper::diff::UpdateOp;
use docmapper::doc::{Doc, List};
use docmapper::{Document, Mapper, Value};

use crate::helpers::{CallCounts, post_schema, setup_mapper, test_namespace};

async fn created_post(mapper: &Mapper) -> Document {
    let mut post = mapper.document(post_schema());
    post.set_many(
        &Doc::new()
            .with("title", "Hello")
            .with("tags", vec!["x", "y"])
            .with("meta.views", 1),
    )
    .unwrap();
    post.create().await.unwrap();
    post
}

#[tokio::test]
async fn test_update_on_new_document_is_not_loaded() {
    let (mapper, backend) = setup_mapper();
    let mut post = mapper.document(post_schema());
    post.set("title", "Hello").unwrap();

    let err = post.update().await.unwrap_err();
    assert!(err.is_not_loaded());
    assert_eq!(backend.calls.total(), 0);
}

#[tokio::test]
async fn test_update_sends_only_changed_fields() {
    let (mapper, backend) = setup_mapper();
    let mut post = created_post(&mapper).await;

    post.set("title", "Hello").unwrap();
    post.set("tags.1", "z").unwrap();
    post.unset("meta.views").unwrap();
    post.update().await.unwrap();

    assert_eq!(
        post.last_update().unwrap().ops(),
        &[UpdateOp::assign("tags.1", "z"), UpdateOp::remove("meta.views")]
    );
    assert_eq!(CallCounts::get(&backend.calls.atomic_update), 1);
    assert!(!post.has_changes());
    assert_eq!(post.original().get("tags.1"), Some(&Value::from("z")));
    assert!(post.original().get("meta.views").is_none());

    let stored = backend
        .store
        .get(&test_namespace(), &post.id().unwrap())
        .await
        .unwrap();
    assert_eq!(stored.get("tags.0"), Some(&Value::from("x")));
    assert_eq!(stored.get("tags.1"), Some(&Value::from("z")));
    assert!(stored.get("meta.views").is_none());
}

#[tokio::test]
async fn test_update_without_changes_is_noop() {
    let (mapper, backend) = setup_mapper();
    let mut post = created_post(&mapper).await;
    let before = backend.calls.total();

    post.update().await.unwrap();
    assert_eq!(backend.calls.total(), before);
    assert!(post.last_update().is_none());
}

#[tokio::test]
async fn test_update_with_equal_values_skips_backend() {
    let (mapper, backend) = setup_mapper();
    let mut post = created_post(&mapper).await;
    post.set("title", "Hello").unwrap();

    post.update().await.unwrap();
    assert_eq!(CallCounts::get(&backend.calls.atomic_update), 0);
    assert!(!post.has_changes());
}

#[tokio::test]
async fn test_update_validates_merged_document() {
    let (mapper, backend) = setup_mapper();
    let mut post = created_post(&mapper).await;
    post.unset("title").unwrap();

    let err = post.update().await.unwrap_err();
    assert!(err.is_validation_error());
    assert_eq!(CallCounts::get(&backend.calls.atomic_update), 0);
    assert!(post.has_changes());
}

#[tokio::test]
async fn test_update_expands_rules_over_new_array_elements() {
    let (mapper, backend) = setup_mapper();
    let mut post = created_post(&mapper).await;
    post.set("comments.0.text", "no author").unwrap();

    let err = post.update().await.unwrap_err();
    assert_eq!(
        err.validation_errors().unwrap()["comments.0.author"],
        "comments.0.author is required"
    );

    post.set("comments.0.author", "alice").unwrap();
    post.update().await.unwrap();
    assert_eq!(CallCounts::get(&backend.calls.atomic_update), 1);
    assert_eq!(
        post.last_update().unwrap().to_json(),
        serde_json::json!({
            "$set": {"comments.0.text": "no author", "comments.0.author": "alice"}
        })
    );
}

#[tokio::test]
async fn test_update_after_unsetting_embedded_element() {
    let (mapper, backend) = setup_mapper();
    let mut post = mapper.document(post_schema());
    post.set("title", "Hello").unwrap();
    post.set(
        "comments",
        vec![
            Doc::new().with("author", "a"),
            Doc::new().with("author", "b"),
        ],
    )
    .unwrap();
    post.create().await.unwrap();

    post.unset("comments.0").unwrap();
    post.update().await.unwrap();
    assert_eq!(
        post.last_update().unwrap().ops(),
        &[UpdateOp::remove("comments.0")]
    );
    assert!(post.get("comments.0").is_none());
    assert_eq!(post.get("comments.1.author"), Some(Value::from("b")));

    post.set("comments.1.text", "hi").unwrap();
    post.update().await.unwrap();
    assert_eq!(CallCounts::get(&backend.calls.atomic_update), 2);
}

#[tokio::test]
async fn test_stored_document_matches_original_after_element_unset() {
    let (mapper, backend) = setup_mapper();
    let mut post = created_post(&mapper).await;
    post.unset("tags.0").unwrap();
    post.update().await.unwrap();

    let id = post.id().unwrap();
    let stored = backend.store.get(&test_namespace(), &id).await.unwrap();
    assert_eq!(&stored, post.original());

    let mut copy = mapper.document(post_schema());
    copy.load(Some(id)).await.unwrap();
    assert_eq!(copy.data(), post.data());
    assert!(copy.get("tags.0").is_none());
    assert_eq!(copy.get("tags.1"), Some(Value::from("y")));
}

#[tokio::test]
async fn test_update_replaces_whole_array() {
    let (mapper, backend) = setup_mapper();
    let mut post = created_post(&mapper).await;
    post.set("tags", vec!["only"]).unwrap();
    post.set("meta.views", 2).unwrap();
    post.update().await.unwrap();

    assert_eq!(
        post.last_update().unwrap().ops(),
        &[
            UpdateOp::assign("tags", vec!["only"]),
            UpdateOp::assign("meta.views", 2),
        ]
    );
    let id = post.id().unwrap();
    let stored = backend.store.get(&test_namespace(), &id).await.unwrap();
    assert_eq!(stored.get("tags.0"), Some(&Value::from("only")));
    assert!(stored.get("tags.1").is_none());
    assert_eq!(&stored, post.original());

    post.set("tags", List::new()).unwrap();
    assert!(post.has_changes());
    post.update().await.unwrap();
    assert_eq!(
        post.last_update().unwrap().ops(),
        &[UpdateOp::assign("tags", List::new())]
    );
    let stored = backend.store.get(&test_namespace(), &id).await.unwrap();
    assert_eq!(stored.get("tags"), Some(&Value::List(List::new())));
    assert_eq!(&stored, post.original());
}
