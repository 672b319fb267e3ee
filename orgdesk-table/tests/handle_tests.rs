mod common;

use common::*;
use orgdesk_client::transport::mock::MockTransport;
use orgdesk_client::{EntityClient, EntityClientConfig, Method};
use orgdesk_table::{DataTable, FetchOutcome, ItemChange, TableConfig, TableError};
use orgdesk_types::RowId;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

// ── add_item ─────────────────────────────────────────────────────

#[tokio::test]
async fn add_item_prepends_and_counts() {
    let transport = transport();
    let table = loaded_table(&transport).await;
    let handle = table.handle();

    let change = handle.add_item(task("t9", "New", 0)).await.unwrap();

    assert_eq!(change, ItemChange::Added);
    let rows = table.rows().await;
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].id, "t9");
    assert_eq!(table.totals().await, (4, 2));
    assert_eq!(list_requests(&transport), 1);
}

#[tokio::test]
async fn add_item_twice_keeps_one_row() {
    let transport = transport();
    let table = loaded_table(&transport).await;
    let handle = table.handle();

    handle.add_item(task("t9", "New", 0)).await.unwrap();
    let second = handle.add_item(task("t9", "Renamed", 0)).await.unwrap();

    assert_eq!(second, ItemChange::Replaced);
    let rows = table.rows().await;
    let copies: Vec<_> = rows.iter().filter(|t| t.id == "t9").collect();
    assert_eq!(copies.len(), 1);
    assert_eq!(copies[0].title, "Renamed");
    assert_eq!(table.totals().await.0, 4);
}

#[tokio::test]
async fn add_item_with_loaded_id_updates_in_place() {
    let transport = transport();
    let table = loaded_table(&transport).await;

    let change = table.handle().add_item(task("t2", "B2", 2)).await.unwrap();

    assert_eq!(change, ItemChange::Replaced);
    let rows = table.rows().await;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].title, "B2");
}

#[tokio::test]
async fn add_item_appends_when_configured() {
    let transport = transport();
    transport.reply(Method::Get, TASKS, 200, three_tasks());
    let table = builder(&transport)
        .config(TableConfig {
            page_size: 3,
            prepend_new_items: false,
            ..Default::default()
        })
        .build()
        .unwrap();
    table.mount().await.unwrap();

    table.handle().add_item(task("t9", "New", 9)).await.unwrap();

    assert_eq!(table.rows().await[3].id, "t9");
}

#[tokio::test]
async fn add_item_without_id_is_rejected() {
    let transport = Arc::new(MockTransport::new());
    transport.reply(Method::Get, "/notes", 200, json!([{"id": "n1", "body": "hi"}]));
    let client: EntityClient<Value> =
        EntityClient::new(EntityClientConfig::new("/notes"), transport.clone());
    let table = DataTable::builder(client, acme()).build().unwrap();
    table.mount().await.unwrap();

    let result = table.handle().add_item(json!({"body": "anonymous"})).await;

    assert!(matches!(result, Err(TableError::MissingRowId(field)) if field == "_id"));
    assert_eq!(table.rows().await.len(), 1);
}

// ── update_item / remove_item ────────────────────────────────────

#[tokio::test]
async fn server_confirmed_update_replaces_row() {
    let transport = transport();
    transport.reply(
        Method::Get,
        TASKS,
        200,
        envelope(vec![json!({"_id": "t1", "title": "A", "order": 1})], 1, 1),
    );
    transport.reply(
        Method::Put,
        &item_path("t1"),
        200,
        json!({"_id": "t1", "title": "B", "order": 1}),
    );
    let client = client(&transport);
    let table = DataTable::builder(client.clone(), acme()).build().unwrap();
    table.mount().await.unwrap();

    let result = client.update(&json!({"id": "t1", "title": "B"}), &acme()).await;
    assert_eq!(result.status, 200);
    let confirmed = result.data.unwrap();
    assert!(table.handle().update_item(confirmed).await.unwrap());

    let rows = table.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "B");
    assert_eq!(list_requests(&transport), 1);
}

#[tokio::test]
async fn update_item_ignores_rows_not_loaded() {
    let transport = transport();
    let table = loaded_table(&transport).await;

    assert!(!table.handle().update_item(task("t9", "X", 9)).await.unwrap());
    assert_eq!(table.rows().await.len(), 3);
}

#[tokio::test]
async fn remove_item_drops_row_and_selection() {
    let transport = transport();
    let table = loaded_table(&transport).await;
    table.toggle_select(&RowId::new("t2")).await.unwrap();
    let handle = table.handle();

    assert!(handle.remove_item(&RowId::new("t2")).await.unwrap());
    assert!(!handle.remove_item(&RowId::new("t2")).await.unwrap());

    let ids: Vec<String> = table.rows().await.into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["t1", "t3"]);
    assert_eq!(table.totals().await, (2, 1));
    assert!(table.selected_ids().await.is_empty());
}

// ── refresh & lifecycle ──────────────────────────────────────────

#[tokio::test]
async fn handle_refresh_refetches() {
    let transport = transport();
    let table = loaded_table(&transport).await;
    let handle = table.handle();

    assert_eq!(handle.clone().refresh().await.unwrap(), FetchOutcome::Committed);
    assert_eq!(list_requests(&transport), 2);
}

#[tokio::test]
async fn handle_stops_after_unmount() {
    let transport = transport();
    let table = loaded_table(&transport).await;
    let handle = table.handle();

    table.unmount().await;

    assert!(matches!(
        handle.add_item(task("t9", "New", 0)).await,
        Err(TableError::Unmounted)
    ));
    assert!(matches!(
        handle.update_item(task("t1", "X", 1)).await,
        Err(TableError::Unmounted)
    ));
    assert!(matches!(handle.refresh().await, Err(TableError::Unmounted)));
    assert_eq!(table.rows().await[0].title, "A");
}
