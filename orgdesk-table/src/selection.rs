//! Row selection.

use orgdesk_types::RowId;
use std::collections::BTreeSet;

/// The set of selected row ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<RowId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips one row. Returns whether the row is now selected.
    pub fn toggle(&mut self, id: RowId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn select(&mut self, id: RowId) {
        self.ids.insert(id);
    }

    pub fn deselect(&mut self, id: &RowId) -> bool {
        self.ids.remove(id)
    }

    pub fn select_all(&mut self, ids: impl IntoIterator<Item = RowId>) {
        self.ids.extend(ids);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.ids.contains(id)
    }

    /// Keeps only the ids accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&RowId) -> bool) {
        self.ids.retain(|id| keep(id));
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in sorted order.
    pub fn ids(&self) -> Vec<RowId> {
        self.ids.iter().cloned().collect()
    }
}
