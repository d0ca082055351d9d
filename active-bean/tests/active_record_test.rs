use std::{collections::HashMap, sync::Arc};

use active_bean::{
    cache::cache_key, Argument, Combinator, Database, Entity, Error, Lifecycle, MemoryStore, Outcome, Record, Selector,
    Store, Value,
};

#[derive(Entity, Debug, Clone, PartialEq)]
struct Test {
    int_value: i32,
    string_value: String,
    random: i32,
    random2: i32,
}

fn test_entity() -> Test {
    Test { int_value: 666, string_value: "test".to_string(), random: 42, random2: 420 }
}

fn memory_db() -> (Arc<MemoryStore>, Database) {
    let store = Arc::new(MemoryStore::new());
    let db = Database::with_store(store.clone());
    (store, db)
}

#[tokio::test]
async fn test_upsert_prepare_save_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();
    let mut test = db.active(test_entity());

    test.upsert_by("IntValue_and_StringValue", &[]).await?;
    assert_eq!(test.state(), Lifecycle::Bound);
    assert!(test.is_new());
    assert_eq!(test.record().unwrap().table(), "test");
    assert_eq!(test.get("IntValue"), Some(&Value::Int(666)));

    test.prepare()?;
    assert_eq!(test.state(), Lifecycle::Prepared);

    let id = test.save().await?;
    assert_eq!(id, 1);
    assert_eq!(store.store_calls(), 1);
    assert_eq!(test.state(), Lifecycle::Persisted);
    assert!(!test.is_new());

    let rows = store.rows("test");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("intValue"), Some(&Value::Int(666)));
    assert_eq!(rows[0].get("stringValue"), Some(&Value::from("test")));
    assert_eq!(rows[0].get("random"), Some(&Value::Int(42)));
    assert_eq!(rows[0].get("random2"), Some(&Value::Int(420)));
    assert_eq!(rows[0].id(), Some(1));

    Ok(())
}

#[tokio::test]
async fn test_upsert_on_fresh_table_uses_supplied_value() -> Result<(), Box<dyn std::error::Error>> {
    let (_store, db) = memory_db();
    let mut test = db.active(test_entity());

    test.upsert_by("IntValue", &[Value::Int(7)]).await?;

    assert!(test.is_new());
    assert_eq!(test.state(), Lifecycle::Bound);
    assert_eq!(test.record().unwrap().get("intValue"), Some(&Value::Int(7)));
    assert_eq!(test.get("intValue"), Some(&Value::Int(7)));
    Ok(())
}

#[tokio::test]
async fn test_upsert_binds_existing_record() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();
    let mut existing = Record::new("test").with("intValue", 666).with("stringValue", "old");
    store.store(&mut existing).await?;

    let mut test = db.active(test_entity());
    test.upsert_by("IntValue", &[]).await?;
    assert!(!test.is_new());
    assert_eq!(test.get("StringValue"), Some(&Value::from("old")));

    test.save().await?;
    let rows = store.rows("test");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("stringValue"), Some(&Value::from("test")));
    Ok(())
}

#[tokio::test]
async fn test_load_by_missing_row_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let (_store, db) = memory_db();
    let mut test = db.active(test_entity());

    let err = test.load_by("IntValue_and_StringValue", &[]).await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_store());
    match err {
        Error::NotFound { table, predicate } => {
            assert_eq!(table, "test");
            assert_eq!(predicate, "intValue = ? AND stringValue = ?");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(test.state(), Lifecycle::Unbound);
    assert!(test.record().is_none());
    Ok(())
}

#[tokio::test]
async fn test_second_lookup_is_served_from_cache() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();
    let mut seeded = Record::new("test").with("intValue", 666);
    store.store(&mut seeded).await?;

    let mut first = db.active(test_entity());
    first.load_by("IntValue", &[Value::Int(666)]).await?;
    assert_eq!(store.find_calls(), 1);

    let mut second = db.active(test_entity());
    second.load_by("IntValue", &[Value::Int(666)]).await?;
    assert_eq!(store.find_calls(), 1);
    assert_eq!(second.record(), first.record());

    let selector = Selector::new(vec!["intValue".into()], Combinator::And, vec![Value::Int(666)]);
    assert!(db.cache().get(&cache_key("test", &selector))?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_cached_miss_is_refreshed_after_save() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();

    let mut created = db.active(test_entity());
    created.upsert_by("IntValue_and_StringValue", &[]).await?;
    created.save().await?;
    assert_eq!(store.find_calls(), 1);

    // Without the refresh the cached miss from the upsert would win here
    let mut loaded = db.active(test_entity());
    loaded.load_by("IntValue_and_StringValue", &[]).await?;
    assert_eq!(store.find_calls(), 1);
    assert_eq!(loaded.record().and_then(Record::id), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_save_evicts_lookup_the_record_no_longer_matches() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();

    let mut test = db.active(test_entity());
    test.upsert_by("IntValue", &[]).await?;
    test.entity_mut().int_value = 1;
    test.save().await?;

    let mut other = db.active(test_entity());
    assert!(other.load_by("IntValue", &[]).await.unwrap_err().is_not_found());
    assert_eq!(store.find_calls(), 2);
    Ok(())
}

#[tokio::test]
async fn test_set_then_get_returns_value() -> Result<(), Box<dyn std::error::Error>> {
    let (_store, db) = memory_db();
    let mut test = db.active(test_entity());
    test.upsert_by("IntValue", &[]).await?;

    test.set("Note", "hello")?;
    assert_eq!(test.get("Note"), Some(&Value::from("hello")));
    assert_eq!(test.get("note"), Some(&Value::from("hello")));
    assert_eq!(test.record().unwrap().get("note"), Some(&Value::from("hello")));
    assert_eq!(test.get("Unknown"), None);
    Ok(())
}

#[tokio::test]
async fn test_unbound_operations() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();
    let mut test = db.active(test_entity());

    assert!(matches!(test.set("Note", 1), Err(Error::Unbound("set"))));
    assert!(matches!(test.list("Book", Record::new("book")), Err(Error::Unbound("list"))));
    assert!(matches!(test.save().await, Err(Error::Unbound("save"))));
    assert_eq!(test.get("IntValue"), None);

    test.prepare()?;
    assert_eq!(test.state(), Lifecycle::Unbound);
    assert_eq!(store.store_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_prepare_twice_then_save_writes_once() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();
    let mut test = db.active(test_entity());
    test.upsert_by("IntValue", &[]).await?;

    test.prepare()?.prepare()?;
    let snapshot = test.record().cloned();
    test.prepare()?;
    assert_eq!(test.record().cloned(), snapshot);

    test.save().await?;
    assert_eq!(store.store_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_entity_changes_after_prepare_are_saved() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();
    let mut test = db.active(test_entity());
    test.upsert_by("IntValue", &[]).await?.prepare()?;

    test.entity_mut().random = 7;
    assert_eq!(test.state(), Lifecycle::Bound);
    test.save().await?;

    assert_eq!(store.rows("test")[0].get("random"), Some(&Value::Int(7)));
    Ok(())
}

#[tokio::test]
async fn test_store_failure_surfaces_as_store_error() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();
    store.fail_writes(true);

    let mut test = db.active(test_entity());
    test.upsert_by("IntValue", &[]).await?;
    let err = test.save().await.unwrap_err();

    assert!(err.is_store());
    assert_eq!(store.store_calls(), 1);
    assert_eq!(test.state(), Lifecycle::Prepared);
    assert!(test.record().unwrap().id().is_none());
    assert!(store.rows("test").is_empty());
    Ok(())
}

#[derive(Entity)]
struct Grid {
    name: String,
    cells: HashMap<(i32, i32), String>,
}

#[tokio::test]
async fn test_unencodable_property_fails_save() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();
    let mut cells = HashMap::new();
    cells.insert((0, 0), "x".to_string());

    let mut grid = db.active(Grid { name: "board".to_string(), cells });
    grid.upsert_by("Name", &[]).await?;

    let err = grid.save().await.unwrap_err();
    assert!(matches!(err, Error::Serialization { ref property, .. } if property == "cells"));
    assert_eq!(store.store_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_relation_lists_are_written_with_parent() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();
    let mut test = db.active(test_entity());

    test.upsert_by("IntValue", &[]).await?;
    test.list("Book", Record::new("book").with("title", "Dune"))?;
    test.xlist("tag", Record::new("tag").with("name", "scifi"))?;
    assert!(test.record().unwrap().list("ownBookList").is_some());
    assert!(test.record().unwrap().list("xownTagList").is_some());

    let id = test.save().await?;
    assert!(test.record().unwrap().lists().is_empty());

    let books = store.rows("book");
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].get("test_id"), Some(&Value::Int(id)));

    let tags = store.rows("tag");
    assert_eq!(tags.len(), 1);

    let links = store.rows("tag_test");
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].get("test_id"), Some(&Value::Int(id)));
    assert_eq!(links[0].get("tag_id"), Some(&Value::Int(tags[0].id().unwrap())));
    Ok(())
}

#[tokio::test]
async fn test_order_by_picks_first_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();
    for random in [5, 50, 20] {
        let mut row = Record::new("test").with("stringValue", "test").with("random", random);
        store.store(&mut row).await?;
    }

    let mut test = db.active(test_entity());
    test.load_by("StringValue_order_by_Random_desc", &[]).await?;
    assert_eq!(test.get("random"), Some(&Value::Int(50)));

    let mut test = db.active(test_entity());
    test.load_by("StringValue_order_by_Random", &[]).await?;
    assert_eq!(test.get("random"), Some(&Value::Int(5)));
    Ok(())
}

#[tokio::test]
async fn test_or_expression_matches_either_field() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();
    let mut row = Record::new("test").with("intValue", 1).with("stringValue", "test");
    store.store(&mut row).await?;

    let mut test = db.active(test_entity());
    test.load_by("IntValue_or_StringValue", &[]).await?;
    assert_eq!(test.get("IntValue"), Some(&Value::Int(1)));
    Ok(())
}

#[tokio::test]
async fn test_schema_is_cached_per_table() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();
    let mut row = Record::new("test").with("intValue", 666);
    store.store(&mut row).await?;

    assert!(!db.schema().contains("test").await);
    let mut test = db.active(test_entity());
    test.load_by("IntValue", &[]).await?;
    assert!(db.schema().contains("test").await);

    assert_eq!(test.get("Id"), Some(&Value::Int(1)));
    assert_eq!(db.schema().fields(store.as_ref(), "missing").await?, Vec::<String>::new());
    Ok(())
}

#[tokio::test]
async fn test_schema_introspects_each_table_once() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();
    let mut row = Record::new("test").with("intValue", 666);
    store.store(&mut row).await?;

    let mut first = db.active(test_entity());
    first.load_by("IntValue", &[]).await?;
    let mut second = db.active(test_entity());
    second.upsert_by("StringValue", &[]).await?;

    assert_eq!(store.table_inspections(), 1);
    assert_eq!(store.field_inspections(), 1);

    assert!(db.schema().fields(store.as_ref(), "missing").await?.is_empty());
    assert_eq!(store.table_inspections(), 2);
    assert_eq!(store.field_inspections(), 1);

    assert!(db.schema().fields(store.as_ref(), "missing").await?.is_empty());
    assert_eq!(store.table_inspections(), 2);
    Ok(())
}

#[tokio::test]
async fn test_failed_relation_items_stay_pending() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();
    store.reject_table("tag");

    let mut test = db.active(test_entity());
    test.upsert_by("IntValue", &[]).await?;
    test.list("Book", Record::new("book").with("title", "Dune"))?;
    test.xlist("Tag", Record::new("tag").with("name", "scifi"))?;

    assert!(test.save().await.unwrap_err().is_store());
    assert_eq!(store.rows("book").len(), 1);
    assert!(test.record().unwrap().list("ownBookList").is_none());
    assert_eq!(test.record().unwrap().list("xownTagList").map(|l| l.items.len()), Some(1));

    // The retry neither reports success nor writes the book twice
    assert!(test.save().await.unwrap_err().is_store());
    assert_eq!(store.rows("book").len(), 1);
    assert_eq!(store.rows("test").len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_upsert_argument_gives_way_to_entity_value_on_save() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();

    let mut test = db.active(test_entity());
    test.upsert_by("IntValue", &[Value::Int(7)]).await?;
    assert_eq!(test.get("IntValue"), Some(&Value::Int(7)));
    test.save().await?;

    assert_eq!(store.rows("test")[0].get("intValue"), Some(&Value::Int(666)));

    // The lookup for 7 was evicted, so this goes back to the store
    let mut other = db.active(test_entity());
    assert!(other.load_by("IntValue", &[Value::Int(7)]).await.unwrap_err().is_not_found());
    assert_eq!(store.find_calls(), 2);
    Ok(())
}

#[tokio::test]
async fn test_convention_calls_route_through_registry() -> Result<(), Box<dyn std::error::Error>> {
    let (store, db) = memory_db();
    let mut test = db.active(test_entity());

    assert_eq!(test.call("upsertByIntValue_and_StringValue", vec![]).await?, Outcome::Fluent);
    test.call("setNote", vec!["hi".into()]).await?;
    assert_eq!(test.call("getNote", vec![]).await?.into_value(), Some(Value::from("hi")));
    test.call("listBook", vec![Argument::from(Record::new("book"))]).await?;
    test.call("xlistTag", vec![Record::new("tag").into()]).await?;
    test.save().await?;

    assert_eq!(store.rows("book").len(), 1);
    assert_eq!(store.rows("tag_test").len(), 1);

    let mut loaded = db.active(test_entity());
    loaded.call("loadByIntValue", vec![666.into()]).await?;
    assert_eq!(loaded.get("note"), Some(&Value::from("hi")));
    Ok(())
}

#[tokio::test]
async fn test_convention_call_errors() -> Result<(), Box<dyn std::error::Error>> {
    let (_store, db) = memory_db();
    let mut test = db.active(test_entity());

    let err = test.call("deleteByIntValue", vec![]).await.unwrap_err();
    assert!(matches!(err, Error::UnrecognizedOperation(_)));

    let err = test.call("loadByIntValue_and_StringValue_or_Random", vec![]).await.unwrap_err();
    assert!(matches!(err, Error::MixedCombinatorExpression(_)));

    let err = test.call("loadByColour", vec![]).await.unwrap_err();
    assert!(matches!(err, Error::UnknownProperty { .. }));

    test.call("upsertByIntValue", vec![]).await?;
    let err = test.call("setNote", vec![]).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));

    let err = test.call("listBook", vec!["not a record".into()]).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));
    Ok(())
}
