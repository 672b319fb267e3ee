//! Imperative handle onto a mounted table.
//!
//! Sibling components (create dialogs, detail drawers) use a [`TableHandle`]
//! to patch the table's loaded page after their own mutations, without a
//! full refetch.

use crate::engine::{DataTable, FetchOutcome};
use crate::error::TableResult;
use orgdesk_types::{EntityRecord, RowId};
use tracing::debug;

/// What `add_item` did with the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemChange {
    Added,
    /// A row with the same id was already loaded and got replaced.
    Replaced,
}

/// Cloneable handle sharing the table's state.
pub struct TableHandle<T> {
    table: DataTable<T>,
}

impl<T> Clone for TableHandle<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
        }
    }
}

impl<T: EntityRecord> TableHandle<T> {
    pub(crate) fn new(table: DataTable<T>) -> Self {
        Self { table }
    }

    /// Refetches the current descriptor.
    pub async fn refresh(&self) -> TableResult<FetchOutcome> {
        self.table.refresh().await
    }

    /// Adds a row to the loaded page. A row whose id is already loaded
    /// replaces it instead, so the page never holds duplicates.
    pub async fn add_item(&self, row: T) -> TableResult<ItemChange> {
        let inner = &self.table.inner;
        let mut state = inner.state.write().await;
        state.ensure_mounted()?;
        let change = state.upsert(&inner.config, &inner.id_field, row)?;
        debug!("{}: add_item -> {:?}", inner.client.entity_name(), change);
        Ok(change)
    }

    /// Replaces the loaded row with the same id. Returns `false` when no
    /// such row is loaded.
    pub async fn update_item(&self, row: T) -> TableResult<bool> {
        let inner = &self.table.inner;
        let mut state = inner.state.write().await;
        state.ensure_mounted()?;
        state.replace(&inner.id_field, row)
    }

    /// Drops a loaded row. Returns `false` when no such row is loaded.
    pub async fn remove_item(&self, id: &RowId) -> TableResult<bool> {
        let inner = &self.table.inner;
        let mut state = inner.state.write().await;
        state.ensure_mounted()?;
        Ok(state.remove(&inner.config, &inner.id_field, id))
    }
}
