//! Error types for the table engine.

use orgdesk_types::{MutationFailure, RowId};
use thiserror::Error;

/// Result type for table operations.
pub type TableResult<T> = Result<T, TableError>;

/// Errors that can occur while driving a data table.
#[derive(Debug, Error)]
pub enum TableError {
    /// The table was unmounted; no further state changes are accepted.
    #[error("table is unmounted")]
    Unmounted,

    /// Page number or page size below 1.
    #[error("invalid pagination: {0}")]
    InvalidPage(String),

    /// The row is not part of the loaded page.
    #[error("row {0} is not loaded")]
    UnknownRow(RowId),

    /// A row without an id cannot be cached or edited.
    #[error("row has no `{0}` id")]
    MissingRowId(String),

    #[error("column `{0}` is not editable")]
    NotEditable(String),

    #[error("column `{0}` is not sortable")]
    NotSortable(String),

    #[error("unknown search field `{0}`")]
    UnknownField(String),

    #[error("invalid filter for `{field}`: {reason}")]
    InvalidFilter { field: String, reason: String },

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },

    /// An edit of the same cell is still waiting for the server.
    #[error("an edit of `{field}` on row {row} is already pending")]
    EditPending { row: RowId, field: String },

    #[error("no rows selected")]
    EmptySelection,

    /// The table's query descriptor is malformed.
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] orgdesk_types::Error),

    #[error("invalid column order: {0}")]
    InvalidColumnOrder(String),

    /// The server rejected a mutation.
    #[error(transparent)]
    Mutation(#[from] MutationFailure),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
