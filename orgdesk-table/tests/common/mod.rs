//! Shared fixtures for table tests.

#![allow(dead_code)]

use orgdesk_client::transport::mock::MockTransport;
use orgdesk_client::{EntityClient, EntityClientConfig, Method};
use orgdesk_table::{ColumnDef, DataTable, DataTableBuilder, FieldKind, SearchField, TableConfig};
use orgdesk_types::{OrgScope, OrganizationId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub const TASKS: &str = "/tasks";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub order: i64,
    #[serde(default)]
    pub status: String,
}

pub fn task(id: &str, title: &str, order: i64) -> Task {
    Task {
        id: id.to_string(),
        title: title.to_string(),
        order,
        status: "open".to_string(),
    }
}

pub fn task_json(id: &str, title: &str, order: i64) -> Value {
    json!({"_id": id, "title": title, "order": order, "status": "open"})
}

pub fn envelope(rows: Vec<Value>, total_count: u64, total_pages: u64) -> Value {
    json!({"data": rows, "totalCount": total_count, "totalPages": total_pages})
}

/// Three tasks on one page.
pub fn three_tasks() -> Value {
    envelope(
        vec![
            task_json("t1", "A", 1),
            task_json("t2", "B", 2),
            task_json("t3", "C", 3),
        ],
        3,
        1,
    )
}

pub fn acme() -> OrgScope {
    OrgScope::Tenant(OrganizationId::parse("acme").unwrap())
}

pub fn item_path(id: &str) -> String {
    format!("{TASKS}/{id}")
}

pub fn columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("title", "Title").editable().sortable(),
        ColumnDef::new("order", "Order")
            .kind(FieldKind::Number)
            .editable()
            .sortable(),
        ColumnDef::new("status", "Status")
            .kind(FieldKind::Select(vec!["open".into(), "done".into()]))
            .editable(),
        ColumnDef::new("createdAt", "Created").kind(FieldKind::Date),
    ]
}

pub fn search_fields() -> Vec<SearchField> {
    vec![
        SearchField::new("status", "Status", FieldKind::Select(vec!["open".into(), "done".into()])),
        SearchField::new("order", "Order", FieldKind::Number),
        SearchField::new("dueDate", "Due", FieldKind::Date),
        SearchField::new("title", "Title", FieldKind::Text),
    ]
}

/// Routes engine logs to the test harness; `RUST_LOG` overrides the level.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("orgdesk_table=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

pub fn transport() -> Arc<MockTransport> {
    init_tracing();
    Arc::new(MockTransport::new())
}

pub fn client(transport: &Arc<MockTransport>) -> EntityClient<Task> {
    EntityClient::new(EntityClientConfig::new(TASKS).org_scoped(), transport.clone())
}

pub fn builder(transport: &Arc<MockTransport>) -> DataTableBuilder<Task> {
    DataTable::builder(client(transport), acme())
        .config(TableConfig {
            page_size: 3,
            ..Default::default()
        })
        .columns(columns())
        .search_fields(search_fields())
}

pub fn table(transport: &Arc<MockTransport>) -> DataTable<Task> {
    builder(transport).build().unwrap()
}

/// A table already loaded with [`three_tasks`]. Later list fetches keep
/// receiving the same page.
pub async fn loaded_table(transport: &Arc<MockTransport>) -> DataTable<Task> {
    mount_with(transport, vec![three_tasks()]).await
}

/// Queues list replies in order, then mounts. The first reply answers the
/// mount; the last one keeps answering once the others are used.
pub async fn mount_with(transport: &Arc<MockTransport>, replies: Vec<Value>) -> DataTable<Task> {
    for body in replies {
        transport.reply(Method::Get, TASKS, 200, body);
    }
    let table = table(transport);
    table.mount().await.unwrap();
    table
}

pub fn list_requests(transport: &MockTransport) -> usize {
    transport.requests_to(Method::Get, TASKS).len()
}
