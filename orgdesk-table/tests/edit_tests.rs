mod common;

use common::*;
use orgdesk_client::Method;
use orgdesk_table::{CellEditState, TableError};
use orgdesk_types::RowId;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn t1() -> RowId {
    RowId::new("t1")
}

// ── Confirmed edits ──────────────────────────────────────────────

#[tokio::test]
async fn confirmed_edit_patches_row_without_refetch() {
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
    let table = table(&transport);
    table.mount().await.unwrap();

    let confirmed = table.edit_cell(&t1(), "title", json!("B")).await.unwrap();

    assert_eq!(confirmed.map(|t| t.title), Some("B".to_string()));
    let rows = table.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "B");
    assert_eq!(list_requests(&transport), 1);

    let put = &transport.requests_to(Method::Put, &item_path("t1"))[0];
    assert_eq!(put.body, Some(json!({"title": "B"})));
    assert_eq!(put.query_param("organizationId"), Some("acme"));
}

#[tokio::test]
async fn row_shows_server_value_not_local_input() {
    let transport = transport();
    let table = loaded_table(&transport).await;
    transport.reply(
        Method::Put,
        &item_path("t1"),
        200,
        json!({"_id": "t1", "title": "Quarterly report", "order": 1, "status": "open"}),
    );

    table
        .edit_cell(&t1(), "title", json!("  quarterly report "))
        .await
        .unwrap();

    let rows = table.rows().await;
    let matching: Vec<_> = rows.iter().filter(|t| t.id == "t1").collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].title, "Quarterly report");
    assert_eq!(
        table.cell_state(&t1(), "title").await,
        CellEditState::Confirmed {
            value: json!("Quarterly report")
        }
    );
}

#[tokio::test]
async fn number_input_is_coerced() {
    let transport = transport();
    let table = loaded_table(&transport).await;
    transport.reply(
        Method::Put,
        &item_path("t2"),
        200,
        json!({"_id": "t2", "title": "B", "order": 5, "status": "open"}),
    );

    table
        .edit_cell(&RowId::new("t2"), "order", json!("5"))
        .await
        .unwrap();

    let put = &transport.requests_to(Method::Put, &item_path("t2"))[0];
    assert_eq!(put.body, Some(json!({"order": 5})));
    assert_eq!(table.rows().await[1].order, 5);
}

#[tokio::test]
async fn empty_success_refetches_page() {
    let transport = transport();
    let table = mount_with(
        &transport,
        vec![
            three_tasks(),
            envelope(
                vec![
                    task_json("t1", "A", 1),
                    json!({"_id": "t2", "title": "B", "order": 2, "status": "done"}),
                    task_json("t3", "C", 3),
                ],
                3,
                1,
            ),
        ],
    )
    .await;
    transport.reply(Method::Put, &item_path("t2"), 204, Value::Null);

    let confirmed = table
        .edit_cell(&RowId::new("t2"), "status", json!("done"))
        .await
        .unwrap();

    assert!(confirmed.is_none());
    assert_eq!(list_requests(&transport), 2);
    assert_eq!(table.rows().await[1].status, "done");
}

// ── Rejected edits ───────────────────────────────────────────────

#[tokio::test]
async fn failed_edit_rolls_back_and_reports() {
    let transport = transport();
    transport.reply(Method::Get, TASKS, 200, three_tasks());
    transport.reply(
        Method::Put,
        &item_path("t1"),
        422,
        json!({"message": "title too long"}),
    );
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = errors.clone();
    let table = builder(&transport)
        .on_error(move |failure| sink.lock().unwrap().push(failure.message.clone()))
        .build()
        .unwrap();
    table.mount().await.unwrap();

    let result = table.edit_cell(&t1(), "title", json!("B")).await;

    match result {
        Err(TableError::Mutation(failure)) => {
            assert_eq!(failure.status, 422);
            assert_eq!(failure.message, "title too long");
        }
        other => panic!("expected a mutation failure, got {other:?}"),
    }
    assert_eq!(table.rows().await[0].title, "A");
    assert_eq!(
        table.cell_state(&t1(), "title").await,
        CellEditState::RolledBack {
            previous: json!("A"),
            error: "title too long".to_string()
        }
    );
    assert_eq!(*errors.lock().unwrap(), vec!["title too long".to_string()]);
    assert_eq!(list_requests(&transport), 1);
}

#[tokio::test]
async fn invalid_edits_send_nothing() {
    let transport = transport();
    let table = loaded_table(&transport).await;

    assert!(matches!(
        table.edit_cell(&t1(), "createdAt", json!("2024-01-01")).await,
        Err(TableError::NotEditable(_))
    ));
    assert!(matches!(
        table.edit_cell(&t1(), "missing", json!("x")).await,
        Err(TableError::NotEditable(_))
    ));
    assert!(matches!(
        table.edit_cell(&RowId::new("t9"), "title", json!("x")).await,
        Err(TableError::UnknownRow(_))
    ));
    assert!(matches!(
        table.edit_cell(&t1(), "order", json!("many")).await,
        Err(TableError::InvalidValue { field, .. }) if field == "order"
    ));
    assert!(matches!(
        table.edit_cell(&t1(), "status", json!("archived")).await,
        Err(TableError::InvalidValue { .. })
    ));

    assert!(transport.requests_to(Method::Put, &item_path("t1")).is_empty());
    assert_eq!(table.cell_state(&t1(), "order").await, CellEditState::Clean);
}

#[tokio::test(start_paused = true)]
async fn pending_cell_blocks_second_edit() {
    let transport = transport();
    let table = loaded_table(&transport).await;
    transport.reply_after(
        Method::Put,
        &item_path("t1"),
        Duration::from_millis(50),
        200,
        json!({"_id": "t1", "title": "B", "order": 1, "status": "open"}),
    );

    let first_id = t1();
    let (first, (pending, row_title, second)) = tokio::join!(
        table.edit_cell(&first_id, "title", json!("B")),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let pending = table.cell_state(&t1(), "title").await;
            let row_title = table.rows().await[0].title.clone();
            let second = table.edit_cell(&t1(), "title", json!("C")).await;
            (pending, row_title, second)
        }
    );

    assert_eq!(
        pending,
        CellEditState::Pending {
            previous: json!("A"),
            proposed: json!("B")
        }
    );
    assert_eq!(row_title, "A");
    assert!(matches!(second, Err(TableError::EditPending { .. })));
    assert!(first.is_ok());
    assert_eq!(table.rows().await[0].title, "B");
}
