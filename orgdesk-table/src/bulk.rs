//! Bulk actions over the selected rows.
//!
//! Mutations run concurrently, one request per row. After any row succeeds
//! the table refetches its current descriptor instead of patching the page
//! locally, so pagination totals stay authoritative.

use crate::engine::{DataTable, FetchOutcome};
use crate::error::{TableError, TableResult};
use futures::future::join_all;
use orgdesk_types::{EntityRecord, MutationFailure, RowId};
use serde_json::{Map, Value};
use tracing::{info, warn};

/// Per-row results of a bulk action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkOutcome {
    pub succeeded: Vec<RowId>,
    pub failed: Vec<(RowId, MutationFailure)>,
    /// Whether the follow-up fetch committed.
    pub refreshed: bool,
}

impl BulkOutcome {
    fn collect<D>(
        ids: Vec<RowId>,
        results: impl IntoIterator<Item = Result<D, MutationFailure>>,
    ) -> Self {
        let mut outcome = Self::default();
        for (id, result) in ids.into_iter().zip(results) {
            match result {
                Ok(_) => outcome.succeeded.push(id),
                Err(failure) => outcome.failed.push((id, failure)),
            }
        }
        outcome
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<T: EntityRecord> DataTable<T> {
    /// Deletes every selected row.
    pub async fn bulk_delete(&self) -> TableResult<BulkOutcome> {
        let ids = self.bulk_targets().await?;
        info!(
            "{}: deleting {} rows",
            self.inner.client.entity_name(),
            ids.len()
        );

        let client = &self.inner.client;
        let scope = &self.inner.scope;
        let results = join_all(ids.iter().map(|id| client.delete(id.as_str(), scope))).await;
        let outcome = BulkOutcome::collect(ids, results.into_iter().map(|r| r.into_result()));
        self.finish_bulk(outcome).await
    }

    /// Applies the same partial update to every selected row.
    pub async fn bulk_update(&self, patch: &Value) -> TableResult<BulkOutcome> {
        let Some(patch) = patch.as_object() else {
            return Err(TableError::InvalidValue {
                field: "patch".to_string(),
                reason: "bulk updates take an object".to_string(),
            });
        };

        let (ids, payloads) = {
            let state = self.inner.state.read().await;
            state.ensure_mounted()?;
            let ids = state.selection.ids();
            if ids.is_empty() {
                return Err(TableError::EmptySelection);
            }
            let payloads: Vec<Value> = ids
                .iter()
                .map(|id| {
                    let row = state.row(&self.inner.id_field, id).map(|row| row.to_json());
                    bulk_payload(patch, self.id_entry(row.as_ref(), id))
                })
                .collect();
            (ids, payloads)
        };
        info!(
            "{}: updating {} rows",
            self.inner.client.entity_name(),
            ids.len()
        );

        let client = &self.inner.client;
        let scope = &self.inner.scope;
        let results = join_all(payloads.iter().map(|payload| client.update(payload, scope))).await;
        let outcome = BulkOutcome::collect(ids, results.into_iter().map(|r| r.into_result()));
        self.finish_bulk(outcome).await
    }

    /// Selected rows of the loaded page, for export.
    pub async fn export_selected(&self) -> TableResult<Vec<T>> {
        let state = self.inner.state.read().await;
        state.ensure_mounted()?;
        let rows = state.selected_rows(&self.inner.id_field);
        if rows.is_empty() {
            return Err(TableError::EmptySelection);
        }
        Ok(rows)
    }

    /// Selected rows as a pretty-printed JSON array.
    pub async fn export_selected_json(&self) -> TableResult<String> {
        let rows = self.export_selected().await?;
        Ok(serde_json::to_string_pretty(&rows)?)
    }

    async fn bulk_targets(&self) -> TableResult<Vec<RowId>> {
        let state = self.inner.state.read().await;
        state.ensure_mounted()?;
        let ids = state.selection.ids();
        if ids.is_empty() {
            return Err(TableError::EmptySelection);
        }
        Ok(ids)
    }

    /// The id key and value to send for a row. Rows selected on another
    /// page are addressed by their id string.
    fn id_entry(&self, row: Option<&Value>, id: &RowId) -> (String, Value) {
        row.and_then(Value::as_object)
            .and_then(|object| self.inner.id_field.locate(object))
            .map(|(key, value)| (key.to_string(), value.clone()))
            .unwrap_or_else(|| {
                (
                    self.inner.id_field.primary_name().to_string(),
                    Value::String(id.as_str().to_string()),
                )
            })
    }

    async fn finish_bulk(&self, mut outcome: BulkOutcome) -> TableResult<BulkOutcome> {
        {
            let mut state = self.inner.state.write().await;
            state.ensure_mounted()?;
            for id in &outcome.succeeded {
                state.selection.deselect(id);
            }
        }

        for (id, failure) in &outcome.failed {
            warn!(
                "{}: bulk action failed for row {}: {}",
                self.inner.client.entity_name(),
                id,
                failure
            );
            self.notify_error(failure);
        }

        if !outcome.succeeded.is_empty() {
            outcome.refreshed = self.fetch().await? == FetchOutcome::Committed;
        }
        Ok(outcome)
    }
}

fn bulk_payload(patch: &Map<String, Value>, (id_key, id_value): (String, Value)) -> Value {
    let mut payload = patch.clone();
    payload.insert(id_key, id_value);
    Value::Object(payload)
}
