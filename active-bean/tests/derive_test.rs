use std::str::FromStr;

use active_bean::{BeanEnum, Database, Entity, Json, MemoryStore, Store, ToValue, Value};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, BeanEnum)]
enum Status {
    Draft,
    Published,
}

#[derive(Debug, Clone, Serialize)]
struct Meta {
    words: u32,
}

#[derive(Entity)]
struct BlogPost {
    title: String,
    #[bean(rename = "body_text")]
    body: String,
    #[bean(skip)]
    #[allow(dead_code)]
    scratch: Vec<u8>,
    r#type: String,
    status: Status,
    meta: Json<Meta>,
    published_at: Option<String>,
}

fn post() -> BlogPost {
    BlogPost {
        title: "Hello".to_string(),
        body: "First post".to_string(),
        scratch: vec![1, 2, 3],
        r#type: "article".to_string(),
        status: Status::Draft,
        meta: Json(Meta { words: 2 }),
        published_at: None,
    }
}

#[test]
fn test_entity_names_and_properties() {
    assert_eq!(BlogPost::entity_name(), "BlogPost");
    assert_eq!(BlogPost::table_name(), "blogpost");

    let names: Vec<&str> = BlogPost::properties().iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["title", "body_text", "type", "status", "meta", "publishedAt"]);

    let fields: Vec<&str> = BlogPost::properties().iter().map(|p| p.field).collect();
    assert_eq!(fields, vec!["title", "body", "type", "status", "meta", "published_at"]);

    assert!(BlogPost::has_property("publishedAt"));
    assert!(!BlogPost::has_property("scratch"));
}

#[test]
fn test_entity_property_values() -> Result<(), Box<dyn std::error::Error>> {
    let post = post();

    assert_eq!(post.property_value("body_text").transpose()?, Some(Value::from("First post")));
    assert_eq!(post.property_value("status").transpose()?, Some(Value::from("Draft")));
    assert_eq!(post.property_value("meta").transpose()?, Some(Value::from(r#"{"words":2}"#)));
    assert_eq!(post.property_value("publishedAt").transpose()?, Some(Value::Null));
    assert!(post.property_value("scratch").is_none());
    Ok(())
}

#[test]
fn test_bean_enum_round_trip() {
    assert_eq!(Status::Published.to_string(), "Published");
    assert_eq!(Status::from_str("Draft"), Ok(Status::Draft));
    assert!(Status::from_str("Archived").is_err());
    assert_eq!(Status::Published.to_value().ok(), Some(Value::from("Published")));
}

#[tokio::test]
async fn test_derived_entity_is_stored() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let db = Database::with_store(store.clone());

    let mut active = db.active(post());
    active.upsert_by("Title", &[]).await?.save().await?;

    let rows = store.rows("blogpost");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("type"), Some(&Value::from("article")));
    assert_eq!(rows[0].get("status"), Some(&Value::from("Draft")));
    assert!(rows[0].get("scratch").is_none());
    assert!(store.inspect_table_fields("blogpost").await?.contains(&"body_text".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_renamed_property_is_readable_and_searchable() -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());
    let db = Database::with_store(store.clone());

    let mut active = db.active(post());
    active.upsert_by("Title", &[]).await?.save().await?;
    assert_eq!(active.get("body_text"), Some(&Value::from("First post")));

    active.set("body_text", "Edited")?;
    assert_eq!(active.record().unwrap().get("body_text"), Some(&Value::from("Edited")));
    assert!(active.record().unwrap().get("bodyText").is_none());

    let mut found = db.active(post());
    found.load_by("body_text", &[]).await?;
    assert_eq!(found.get("title"), Some(&Value::from("Hello")));
    Ok(())
}
