//! Data table engine.
//!
//! A [`DataTable`] owns the query descriptor, the loaded page and all client
//! state layered on top of it (selection, advanced filters, per-cell edit
//! state, column order). Every descriptor change triggers a fetch through the
//! injected [`EntityClient`].
//!
//! Fetches never hold the state lock across the network call. Each fetch
//! takes a generation ticket; only the response carrying the latest ticket
//! may commit, so a slow response to an old query can never overwrite a
//! newer one. [`DataTable::unmount`] invalidates every outstanding ticket.

use crate::columns::{check_order, move_column, ColumnDef, FieldKind};
use crate::config::TableConfig;
use crate::error::{TableError, TableResult};
use crate::handle::{ItemChange, TableHandle};
use crate::inline_edit::{coerce_input, edit_payload, CellEditState, CellKey};
use crate::search::{AdvancedSearch, FieldFilter, SearchField};
use crate::selection::Selection;
use orgdesk_client::EntityClient;
use orgdesk_types::{
    total_pages_for, EntityRecord, FilterValue, IdField, MutationFailure, MutationResult,
    OrgScope, PaginatedResult, QueryDescriptor, RowId, SortDirection,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Called with every failed mutation.
pub type ErrorCallback = Arc<dyn Fn(&MutationFailure) + Send + Sync>;
/// Called with the full column order after it changes.
pub type ColumnOrderCallback = Arc<dyn Fn(&[String]) + Send + Sync>;
/// Called with the active advanced filters after they change.
pub type AdvancedSearchCallback = Arc<dyn Fn(&BTreeMap<String, FieldFilter>) + Send + Sync>;

/// Lifecycle of the loaded page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "camelCase")]
pub enum TableStatus {
    /// Mounted but never fetched.
    #[default]
    Idle,
    Fetching,
    Loaded,
    /// The last fetch failed. Rows from the previous load are kept.
    Error(String),
}

/// What happened to a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response replaced the loaded page.
    Committed,
    /// The request failed; the table is in [`TableStatus::Error`].
    Failed(MutationFailure),
    /// A newer fetch (or unmount) superseded this one.
    Discarded,
    /// The descriptor did not change, so nothing was fetched.
    Unchanged,
}

/// Read model for rendering.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot<T> {
    pub status: TableStatus,
    pub descriptor: QueryDescriptor,
    pub rows: Vec<T>,
    pub total_count: u64,
    pub total_pages: u64,
    pub selected: Vec<RowId>,
    pub filters: BTreeMap<String, FieldFilter>,
    pub column_order: Vec<String>,
}

#[derive(Default, Clone)]
pub(crate) struct Callbacks {
    on_error: Option<ErrorCallback>,
    on_column_order_change: Option<ColumnOrderCallback>,
    on_advanced_search_change: Option<AdvancedSearchCallback>,
}

pub(crate) struct TableState<T> {
    pub(crate) status: TableStatus,
    pub(crate) descriptor: QueryDescriptor,
    pub(crate) advanced: AdvancedSearch,
    pub(crate) page: PaginatedResult<T>,
    pub(crate) selection: Selection,
    pub(crate) cells: HashMap<CellKey, CellEditState>,
    pub(crate) columns: Vec<ColumnDef>,
    pub(crate) column_order: Vec<String>,
    /// Ticket of the most recent fetch.
    pub(crate) generation: u64,
    pub(crate) unmounted: bool,
}

impl<T: EntityRecord> TableState<T> {
    pub(crate) fn ensure_mounted(&self) -> TableResult<()> {
        if self.unmounted {
            Err(TableError::Unmounted)
        } else {
            Ok(())
        }
    }

    fn page_size(&self, config: &TableConfig) -> u32 {
        self.descriptor.page_size.unwrap_or(config.page_size)
    }

    pub(crate) fn position(&self, id_field: &IdField, id: &RowId) -> Option<usize> {
        self.page
            .data
            .iter()
            .position(|row| row.row_id(id_field).as_ref() == Some(id))
    }

    pub(crate) fn row(&self, id_field: &IdField, id: &RowId) -> Option<&T> {
        self.position(id_field, id).map(|i| &self.page.data[i])
    }

    /// Inserts a row, or replaces the loaded row with the same id.
    pub(crate) fn upsert(
        &mut self,
        config: &TableConfig,
        id_field: &IdField,
        row: T,
    ) -> TableResult<ItemChange> {
        let id = row
            .row_id(id_field)
            .ok_or_else(|| TableError::MissingRowId(id_field.primary_name().to_string()))?;
        if let Some(index) = self.position(id_field, &id) {
            self.page.data[index] = row;
            return Ok(ItemChange::Replaced);
        }
        if config.prepend_new_items {
            self.page.data.insert(0, row);
        } else {
            self.page.data.push(row);
        }
        self.page.total_count += 1;
        self.page.total_pages = total_pages_for(self.page.total_count, self.page_size(config));
        Ok(ItemChange::Added)
    }

    /// Replaces the loaded row with the same id. Returns whether one existed.
    pub(crate) fn replace(&mut self, id_field: &IdField, row: T) -> TableResult<bool> {
        let id = row
            .row_id(id_field)
            .ok_or_else(|| TableError::MissingRowId(id_field.primary_name().to_string()))?;
        Ok(self.replace_at(id_field, &id, row))
    }

    fn replace_at(&mut self, id_field: &IdField, id: &RowId, row: T) -> bool {
        match self.position(id_field, id) {
            Some(index) => {
                self.page.data[index] = row;
                true
            }
            None => false,
        }
    }

    /// Drops a loaded row. Returns whether one existed.
    pub(crate) fn remove(&mut self, config: &TableConfig, id_field: &IdField, id: &RowId) -> bool {
        let Some(index) = self.position(id_field, id) else {
            return false;
        };
        self.page.data.remove(index);
        self.page.total_count = self.page.total_count.saturating_sub(1);
        self.page.total_pages = total_pages_for(self.page.total_count, self.page_size(config));
        self.selection.deselect(id);
        self.cells.retain(|key, _| &key.row != id);
        true
    }

    pub(crate) fn loaded_ids(&self, id_field: &IdField) -> Vec<RowId> {
        self.page
            .data
            .iter()
            .filter_map(|row| row.row_id(id_field))
            .collect()
    }

    pub(crate) fn selected_rows(&self, id_field: &IdField) -> Vec<T> {
        self.page
            .data
            .iter()
            .filter(|row| {
                row.row_id(id_field)
                    .is_some_and(|id| self.selection.contains(&id))
            })
            .cloned()
            .collect()
    }

    /// Rewrites the descriptor's advanced-search keys. Returns the filters
    /// to report.
    fn apply_advanced(&mut self) -> BTreeMap<String, FieldFilter> {
        self.descriptor = self.advanced.apply(&self.descriptor);
        self.advanced.filters().clone()
    }

    fn editable_column(&self, field: &str) -> TableResult<&ColumnDef> {
        self.columns
            .iter()
            .find(|c| c.field == field && c.editable)
            .ok_or_else(|| TableError::NotEditable(field.to_string()))
    }
}

pub(crate) struct Inner<T> {
    pub(crate) client: EntityClient<T>,
    pub(crate) scope: OrgScope,
    pub(crate) config: TableConfig,
    pub(crate) id_field: IdField,
    pub(crate) state: RwLock<TableState<T>>,
    callbacks: Callbacks,
}

/// A server-driven table over one entity.
pub struct DataTable<T> {
    pub(crate) inner: Arc<Inner<T>>,
}

impl<T> Clone for DataTable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: EntityRecord> DataTable<T> {
    /// Starts building a table over `client`, scoped to `scope`.
    pub fn builder(client: EntityClient<T>, scope: OrgScope) -> DataTableBuilder<T> {
        DataTableBuilder::new(client, scope)
    }

    pub fn config(&self) -> &TableConfig {
        &self.inner.config
    }

    pub fn scope(&self) -> &OrgScope {
        &self.inner.scope
    }

    pub fn id_field(&self) -> &IdField {
        &self.inner.id_field
    }

    /// Imperative handle for sibling components.
    pub fn handle(&self) -> TableHandle<T> {
        TableHandle::new(self.clone())
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Performs the initial fetch.
    pub async fn mount(&self) -> TableResult<FetchOutcome> {
        info!("{}: mounting table", self.inner.client.entity_name());
        self.fetch().await
    }

    /// Refetches the current descriptor.
    pub async fn refresh(&self) -> TableResult<FetchOutcome> {
        self.fetch().await
    }

    /// Stops the table. In-flight responses are discarded and every later
    /// state change fails with [`TableError::Unmounted`].
    pub async fn unmount(&self) {
        let mut state = self.inner.state.write().await;
        state.unmounted = true;
        state.generation += 1;
        debug!("{}: table unmounted", self.inner.client.entity_name());
    }

    pub async fn is_mounted(&self) -> bool {
        !self.inner.state.read().await.unmounted
    }

    // ── Reads ────────────────────────────────────────────────────

    pub async fn status(&self) -> TableStatus {
        self.inner.state.read().await.status.clone()
    }

    pub async fn descriptor(&self) -> QueryDescriptor {
        self.inner.state.read().await.descriptor.clone()
    }

    pub async fn rows(&self) -> Vec<T> {
        self.inner.state.read().await.page.data.clone()
    }

    /// `(total_count, total_pages)` of the current query.
    pub async fn totals(&self) -> (u64, u64) {
        let state = self.inner.state.read().await;
        (state.page.total_count, state.page.total_pages)
    }

    pub async fn snapshot(&self) -> TableSnapshot<T> {
        let state = self.inner.state.read().await;
        TableSnapshot {
            status: state.status.clone(),
            descriptor: state.descriptor.clone(),
            rows: state.page.data.clone(),
            total_count: state.page.total_count,
            total_pages: state.page.total_pages,
            selected: state.selection.ids(),
            filters: state.advanced.filters().clone(),
            column_order: state.column_order.clone(),
        }
    }

    /// Column definitions in display order.
    pub async fn columns(&self) -> Vec<ColumnDef> {
        let state = self.inner.state.read().await;
        state
            .column_order
            .iter()
            .filter_map(|field| state.columns.iter().find(|c| &c.field == field))
            .cloned()
            .collect()
    }

    pub async fn search_fields(&self) -> Vec<SearchField> {
        self.inner.state.read().await.advanced.fields().to_vec()
    }

    // ── Navigation ───────────────────────────────────────────────
    //
    // Navigation that leaves the descriptor unchanged is `Unchanged` on a
    // loaded table and a retry on a table in `Error`.

    pub async fn set_page(&self, page: u32) -> TableResult<FetchOutcome> {
        if page == 0 {
            return Err(TableError::InvalidPage("page starts at 1".to_string()));
        }
        self.navigate(|state| {
            state.descriptor.page = Some(page);
            Ok(())
        })
        .await
    }

    /// Changes the page size and goes back to page 1.
    pub async fn set_page_size(&self, page_size: u32) -> TableResult<FetchOutcome> {
        if page_size == 0 {
            return Err(TableError::InvalidPage("page size must be at least 1".to_string()));
        }
        self.navigate(|state| {
            if state.descriptor.page_size != Some(page_size) {
                state.descriptor.page_size = Some(page_size);
                state.descriptor.page = Some(1);
            }
            Ok(())
        })
        .await
    }

    pub async fn set_sort(&self, field: &str, direction: SortDirection) -> TableResult<FetchOutcome> {
        self.navigate(|state| {
            check_sortable(&state.columns, field)?;
            state.descriptor.sort_field = Some(field.to_string());
            state.descriptor.sort_direction = Some(direction);
            Ok(())
        })
        .await
    }

    /// Sorts ascending by `field`, or flips the direction if the table is
    /// already sorted by it.
    pub async fn toggle_sort(&self, field: &str) -> TableResult<FetchOutcome> {
        self.navigate(|state| {
            check_sortable(&state.columns, field)?;
            let direction = match (&state.descriptor.sort_field, state.descriptor.sort_direction) {
                (Some(current), direction) if current == field => {
                    direction.unwrap_or_default().reversed()
                }
                _ => SortDirection::Asc,
            };
            state.descriptor.sort_field = Some(field.to_string());
            state.descriptor.sort_direction = Some(direction);
            Ok(())
        })
        .await
    }

    pub async fn clear_sort(&self) -> TableResult<FetchOutcome> {
        self.navigate(|state| {
            state.descriptor.sort_field = None;
            state.descriptor.sort_direction = None;
            Ok(())
        })
        .await
    }

    /// Sets the free-text search term. A new term goes back to page 1.
    pub async fn set_search(&self, term: &str) -> TableResult<FetchOutcome> {
        self.navigate(|state| {
            let next = state.descriptor.clone().with_search(term);
            if next.search != state.descriptor.search {
                state.descriptor = next.with_page(1);
            }
            Ok(())
        })
        .await
    }

    // ── Advanced search ──────────────────────────────────────────

    pub async fn set_filter(&self, field: &str, filter: FieldFilter) -> TableResult<FetchOutcome> {
        let (stale, filters) = self
            .change_descriptor(|state| {
                let changed = state.advanced.set(field, filter)?;
                Ok(changed.then(|| state.apply_advanced()))
            })
            .await?;
        self.after_filter_change(stale, filters).await
    }

    pub async fn remove_filter(&self, field: &str) -> TableResult<FetchOutcome> {
        let (stale, filters) = self
            .change_descriptor(|state| {
                let changed = state.advanced.remove(field);
                Ok(changed.then(|| state.apply_advanced()))
            })
            .await?;
        self.after_filter_change(stale, filters).await
    }

    pub async fn clear_filters(&self) -> TableResult<FetchOutcome> {
        let (stale, filters) = self
            .change_descriptor(|state| {
                let changed = state.advanced.clear();
                Ok(changed.then(|| state.apply_advanced()))
            })
            .await?;
        self.after_filter_change(stale, filters).await
    }

    async fn after_filter_change(
        &self,
        stale: bool,
        filters: Option<BTreeMap<String, FieldFilter>>,
    ) -> TableResult<FetchOutcome> {
        if let (Some(filters), Some(callback)) =
            (filters, &self.inner.callbacks.on_advanced_search_change)
        {
            callback(&filters);
        }
        if stale {
            self.fetch().await
        } else {
            Ok(FetchOutcome::Unchanged)
        }
    }

    // ── Selection ────────────────────────────────────────────────

    /// Flips the selection of a loaded row. Returns whether it is now selected.
    pub async fn toggle_select(&self, id: &RowId) -> TableResult<bool> {
        let mut state = self.inner.state.write().await;
        state.ensure_mounted()?;
        if state.position(&self.inner.id_field, id).is_none() {
            return Err(TableError::UnknownRow(id.clone()));
        }
        Ok(state.selection.toggle(id.clone()))
    }

    /// Selects every row of the loaded page. Returns the selection size.
    pub async fn select_all_on_page(&self) -> TableResult<usize> {
        let mut state = self.inner.state.write().await;
        state.ensure_mounted()?;
        let ids = state.loaded_ids(&self.inner.id_field);
        state.selection.select_all(ids);
        Ok(state.selection.len())
    }

    pub async fn clear_selection(&self) -> TableResult<()> {
        let mut state = self.inner.state.write().await;
        state.ensure_mounted()?;
        state.selection.clear();
        Ok(())
    }

    pub async fn selected_ids(&self) -> Vec<RowId> {
        self.inner.state.read().await.selection.ids()
    }

    /// Selected rows of the loaded page, in page order.
    pub async fn selected_rows(&self) -> Vec<T> {
        self.inner
            .state
            .read()
            .await
            .selected_rows(&self.inner.id_field)
    }

    // ── Inline edit ──────────────────────────────────────────────

    /// Edits one cell.
    ///
    /// The row keeps its value while the update is in flight. On success the
    /// row is replaced with the server's copy (or the page is refetched when
    /// the server returned no row). On failure the cell rolls back, the error
    /// callback fires, and the failure is returned.
    pub async fn edit_cell(&self, id: &RowId, field: &str, input: Value) -> TableResult<Option<T>> {
        let key = CellKey::new(id.clone(), field);
        let payload = {
            let mut state = self.inner.state.write().await;
            state.ensure_mounted()?;
            let kind = state.editable_column(field)?.kind.clone();
            let proposed = coerce_cell(&kind, field, &input)?;

            let row = state
                .row(&self.inner.id_field, id)
                .ok_or_else(|| TableError::UnknownRow(id.clone()))?
                .to_json();
            let (id_key, id_value) = row
                .as_object()
                .and_then(|object| self.inner.id_field.locate(object))
                .map(|(k, v)| (k.to_string(), v.clone()))
                .ok_or_else(|| {
                    TableError::MissingRowId(self.inner.id_field.primary_name().to_string())
                })?;
            let previous = row.get(field).cloned().unwrap_or(Value::Null);

            let current = state.cells.get(&key).cloned().unwrap_or_default();
            let pending = current.begin(&key, previous, proposed.clone())?;
            state.cells.insert(key.clone(), pending);
            edit_payload(&id_key, id_value, field, proposed)
        };

        debug!("{}: editing {} on row {}", self.inner.client.entity_name(), field, id);
        let result = self.inner.client.update(&payload, &self.inner.scope).await;

        match result.into_result() {
            Ok(Some(row)) => {
                let mut state = self.inner.state.write().await;
                state.ensure_mounted()?;
                let stored = row.field(field).unwrap_or(Value::Null);
                transition(&mut state.cells, &key, |cell| cell.confirm(stored));
                if !state.replace_at(&self.inner.id_field, id, row.clone()) {
                    debug!("row {id} left the page before its edit was confirmed");
                }
                Ok(Some(row))
            }
            Ok(None) => {
                {
                    let mut state = self.inner.state.write().await;
                    state.ensure_mounted()?;
                    let proposed = payload.get(field).cloned().unwrap_or(Value::Null);
                    transition(&mut state.cells, &key, |cell| cell.confirm(proposed));
                }
                self.fetch().await?;
                Ok(None)
            }
            Err(failure) => {
                {
                    let mut state = self.inner.state.write().await;
                    state.ensure_mounted()?;
                    let message = failure.message.clone();
                    transition(&mut state.cells, &key, |cell| cell.roll_back(message));
                }
                warn!(
                    "{}: edit of {} on row {} rejected: {}",
                    self.inner.client.entity_name(),
                    field,
                    id,
                    failure
                );
                self.notify_error(&failure);
                Err(TableError::Mutation(failure))
            }
        }
    }

    /// Edit state of one cell; `Clean` when it was never edited.
    pub async fn cell_state(&self, id: &RowId, field: &str) -> CellEditState {
        let key = CellKey::new(id.clone(), field);
        self.inner
            .state
            .read()
            .await
            .cells
            .get(&key)
            .cloned()
            .unwrap_or_default()
    }

    // ── Columns ──────────────────────────────────────────────────

    /// Moves the column at display position `from` to `to`.
    pub async fn reorder_columns(&self, from: usize, to: usize) -> TableResult<Vec<String>> {
        let order = {
            let mut state = self.inner.state.write().await;
            state.ensure_mounted()?;
            let mut order = state.column_order.clone();
            move_column(&mut order, from, to)?;
            state.column_order = order.clone();
            order
        };
        self.notify_column_order(&order);
        Ok(order)
    }

    /// Replaces the column order. Must name every column exactly once.
    pub async fn set_column_order(&self, order: Vec<String>) -> TableResult<()> {
        {
            let mut state = self.inner.state.write().await;
            state.ensure_mounted()?;
            check_order(&state.columns, &order)?;
            if state.column_order == order {
                return Ok(());
            }
            state.column_order = order.clone();
        }
        self.notify_column_order(&order);
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────

    /// Applies a descriptor change. Returns whether the page must be
    /// refetched, plus whatever `change` produced.
    ///
    /// An `Idle` or `Error` table refetches even when the descriptor did not
    /// move, so repeating the last navigation retries a failed load.
    async fn change_descriptor<R>(
        &self,
        change: impl FnOnce(&mut TableState<T>) -> TableResult<R>,
    ) -> TableResult<(bool, R)> {
        let mut state = self.inner.state.write().await;
        state.ensure_mounted()?;
        let before = state.descriptor.clone();
        let produced = change(&mut *state)?;
        let moved = state.descriptor != before;
        if moved && !self.inner.config.carry_selection {
            state.selection.clear();
        }
        let settled = matches!(state.status, TableStatus::Loaded | TableStatus::Fetching);
        Ok((moved || !settled, produced))
    }

    async fn navigate(
        &self,
        change: impl FnOnce(&mut TableState<T>) -> TableResult<()>,
    ) -> TableResult<FetchOutcome> {
        let (stale, ()) = self.change_descriptor(change).await?;
        if stale {
            self.fetch().await
        } else {
            Ok(FetchOutcome::Unchanged)
        }
    }

    pub(crate) async fn fetch(&self) -> TableResult<FetchOutcome> {
        let (ticket, descriptor) = {
            let mut state = self.inner.state.write().await;
            state.ensure_mounted()?;
            state.generation += 1;
            state.status = TableStatus::Fetching;
            (state.generation, state.descriptor.clone())
        };

        let result = self
            .inner
            .client
            .fetch_all(&descriptor, &self.inner.scope)
            .await;
        Ok(self.commit(ticket, result).await)
    }

    async fn commit(
        &self,
        ticket: u64,
        result: MutationResult<PaginatedResult<T>>,
    ) -> FetchOutcome {
        let entity = self.inner.client.entity_name();
        let failure = {
            let mut state = self.inner.state.write().await;
            if state.unmounted || ticket != state.generation {
                debug!("{entity}: discarding response to fetch #{ticket}");
                return FetchOutcome::Discarded;
            }
            match result.into_result() {
                Ok(page) => {
                    state.page = page.unwrap_or_default();
                    state.status = TableStatus::Loaded;
                    let loaded = state.loaded_ids(&self.inner.id_field);
                    if !self.inner.config.carry_selection {
                        state.selection.retain(|id| loaded.contains(id));
                    }
                    state
                        .cells
                        .retain(|key, cell| cell.is_pending() && loaded.contains(&key.row));
                    debug!(
                        "{entity}: loaded {} rows (page {} of {})",
                        state.page.len(),
                        state.descriptor.page_or_first(),
                        state.page.total_pages
                    );
                    None
                }
                Err(failure) => {
                    state.status = TableStatus::Error(failure.message.clone());
                    Some(failure)
                }
            }
        };

        match failure {
            Some(failure) => {
                warn!("{entity}: fetch failed: {failure}");
                FetchOutcome::Failed(failure)
            }
            None => FetchOutcome::Committed,
        }
    }

    pub(crate) fn notify_error(&self, failure: &MutationFailure) {
        if let Some(callback) = &self.inner.callbacks.on_error {
            callback(failure);
        }
    }

    fn notify_column_order(&self, order: &[String]) {
        if let Some(callback) = &self.inner.callbacks.on_column_order_change {
            callback(order);
        }
    }
}

fn check_sortable(columns: &[ColumnDef], field: &str) -> TableResult<()> {
    if columns.is_empty() || columns.iter().any(|c| c.field == field && c.sortable) {
        Ok(())
    } else {
        Err(TableError::NotSortable(field.to_string()))
    }
}

fn coerce_cell(kind: &FieldKind, field: &str, input: &Value) -> TableResult<Value> {
    coerce_input(kind, input).map_err(|err| match err {
        TableError::InvalidValue { reason, .. } => TableError::InvalidValue {
            field: field.to_string(),
            reason,
        },
        other => other,
    })
}

fn transition(
    cells: &mut HashMap<CellKey, CellEditState>,
    key: &CellKey,
    step: impl FnOnce(CellEditState) -> CellEditState,
) {
    if let Some(cell) = cells.remove(key) {
        cells.insert(key.clone(), step(cell));
    }
}

/// Builder for [`DataTable`].
pub struct DataTableBuilder<T> {
    client: EntityClient<T>,
    scope: OrgScope,
    config: TableConfig,
    columns: Vec<ColumnDef>,
    search_fields: Vec<SearchField>,
    base_filters: BTreeMap<String, FilterValue>,
    callbacks: Callbacks,
}

impl<T: EntityRecord> DataTableBuilder<T> {
    fn new(client: EntityClient<T>, scope: OrgScope) -> Self {
        Self {
            client,
            scope,
            config: TableConfig::default(),
            columns: Vec::new(),
            search_fields: Vec::new(),
            base_filters: BTreeMap::new(),
            callbacks: Callbacks::default(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: TableConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn columns(mut self, columns: Vec<ColumnDef>) -> Self {
        self.columns = columns;
        self
    }

    #[must_use]
    pub fn search_fields(mut self, fields: Vec<SearchField>) -> Self {
        self.search_fields = fields;
        self
    }

    /// A fixed filter sent with every fetch (e.g. the parent record's id).
    ///
    /// `build` rejects a key that an advanced search field also writes.
    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.base_filters.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn on_error(mut self, callback: impl Fn(&MutationFailure) + Send + Sync + 'static) -> Self {
        self.callbacks.on_error = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_column_order_change(
        mut self,
        callback: impl Fn(&[String]) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_column_order_change = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_advanced_search_change(
        mut self,
        callback: impl Fn(&BTreeMap<String, FieldFilter>) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_advanced_search_change = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> TableResult<DataTable<T>> {
        if self.config.page_size == 0 {
            return Err(TableError::InvalidPage("page size must be at least 1".to_string()));
        }

        let mut descriptor = QueryDescriptor::new()
            .with_page(1)
            .with_page_size(self.config.page_size);
        if let Some(field) = &self.config.default_sort_field {
            descriptor = descriptor.with_sort(field.clone(), self.config.default_sort_direction);
        }
        let advanced = AdvancedSearch::new(self.search_fields)
            .with_fixed_filters(self.base_filters.clone())?;
        descriptor.extra = self.base_filters;
        descriptor.validate()?;

        let id_field = match self.config.id_field.as_deref() {
            Some(name) => IdField::from_config(Some(name)),
            None => self.client.id_field().clone(),
        };
        let column_order = self.columns.iter().map(|c| c.field.clone()).collect();

        let state = TableState {
            status: TableStatus::Idle,
            descriptor,
            advanced,
            page: PaginatedResult::empty(),
            selection: Selection::new(),
            cells: HashMap::new(),
            columns: self.columns,
            column_order,
            generation: 0,
            unmounted: false,
        };

        Ok(DataTable {
            inner: Arc::new(Inner {
                client: self.client,
                scope: self.scope,
                config: self.config,
                id_field,
                state: RwLock::new(state),
                callbacks: self.callbacks,
            }),
        })
    }
}
