//! Server-driven data table engine for OrgDesk entity screens.
//!
//! A [`DataTable`] wraps one [`orgdesk_client::EntityClient`] and keeps the
//! screen's list state consistent with the server:
//!
//! - **Fetching**: descriptor changes (page, size, sort, search, advanced
//!   filters) trigger fetches; stale responses and responses arriving after
//!   [`DataTable::unmount`] are discarded.
//! - **Selection**: per-row selection cleared on navigation unless
//!   [`TableConfig::carry_selection`] is set.
//! - **Inline edit**: optimistic-confirm cell edits with an explicit
//!   [`CellEditState`] per cell.
//! - **Bulk actions**: delete, update and export of the selected rows, each
//!   mutation followed by a refetch.
//! - **Handle**: [`TableHandle`] lets sibling components refresh or patch the
//!   loaded page.

mod bulk;
mod columns;
mod config;
mod engine;
mod error;
mod handle;
mod inline_edit;
mod search;
mod selection;

pub use bulk::BulkOutcome;
pub use columns::{ColumnDef, FieldKind};
pub use config::TableConfig;
pub use engine::{
    AdvancedSearchCallback, ColumnOrderCallback, DataTable, DataTableBuilder, ErrorCallback,
    FetchOutcome, TableSnapshot, TableStatus,
};
pub use error::{TableError, TableResult};
pub use handle::{ItemChange, TableHandle};
pub use inline_edit::{coerce_input, edit_payload, CellEditState, CellKey};
pub use search::{AdvancedSearch, FieldFilter, SearchField};
pub use selection::Selection;
