//! Column and field definitions supplied by entity screens.

use crate::error::{TableError, TableResult};
use serde::{Deserialize, Serialize};

/// Value kind of a column or search field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "options", rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    /// ISO-8601 date (`YYYY-MM-DD`) or RFC 3339 timestamp.
    Date,
    Bool,
    /// One of a fixed set of values.
    Select(Vec<String>),
}

impl FieldKind {
    /// Whether range filters make sense for this kind.
    pub fn is_ordered(&self) -> bool {
        matches!(self, FieldKind::Number | FieldKind::Date)
    }
}

/// A table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Row field rendered in this column.
    pub field: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub sortable: bool,
}

impl ColumnDef {
    /// A read-only, unsortable text column.
    pub fn new(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            kind: FieldKind::Text,
            editable: false,
            sortable: false,
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn editable(mut self) -> Self {
        self.editable = true;
        self
    }

    #[must_use]
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }
}

/// Moves the column at `from` to position `to`.
pub(crate) fn move_column(order: &mut Vec<String>, from: usize, to: usize) -> TableResult<()> {
    if from >= order.len() || to >= order.len() {
        return Err(TableError::InvalidColumnOrder(format!(
            "cannot move column {from} to {to} with {} columns",
            order.len()
        )));
    }
    let column = order.remove(from);
    order.insert(to, column);
    Ok(())
}

/// Checks that `order` is a permutation of the defined columns.
pub(crate) fn check_order(columns: &[ColumnDef], order: &[String]) -> TableResult<()> {
    if order.len() != columns.len() {
        return Err(TableError::InvalidColumnOrder(format!(
            "expected {} columns, got {}",
            columns.len(),
            order.len()
        )));
    }
    for column in columns {
        if !order.contains(&column.field) {
            return Err(TableError::InvalidColumnOrder(format!(
                "missing column `{}`",
                column.field
            )));
        }
    }
    Ok(())
}

/// Parses a date cell or filter value into a Unix timestamp (seconds).
pub(crate) fn parse_date(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(date) = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp());
    }
    chrono::DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.timestamp())
}
