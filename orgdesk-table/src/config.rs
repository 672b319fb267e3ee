//! Table configuration.

use orgdesk_types::SortDirection;
use serde::{Deserialize, Serialize};

/// Configuration for one mounted data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Rows requested per page.
    pub page_size: u32,
    /// Row id field; falls back to the entity client's id field.
    #[serde(default)]
    pub id_field: Option<String>,
    /// Whether `add_item` inserts new rows at the top.
    pub prepend_new_items: bool,
    /// Keep the selection across page and query changes.
    pub carry_selection: bool,
    #[serde(default)]
    pub default_sort_field: Option<String>,
    #[serde(default)]
    pub default_sort_direction: SortDirection,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            id_field: None,
            prepend_new_items: true,
            carry_selection: false,
            default_sort_field: None,
            default_sort_direction: SortDirection::Asc,
        }
    }
}
