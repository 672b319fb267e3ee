//! Advanced search.
//!
//! Structured per-field filters kept apart from the free-text search term.
//! Filters become extra descriptor keys:
//! - `Equals` -> `field=value`
//! - `Range` -> `fieldMin=..&fieldMax=..`
//! - `OneOf` -> repeated `field=..`
//!
//! Any change to the filter set sends the table back to page 1.

use crate::columns::{parse_date, FieldKind};
use crate::error::{TableError, TableResult};
use orgdesk_types::{FilterValue, QueryDescriptor, Scalar};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A field offered in the advanced search panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
}

impl SearchField {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
        }
    }

    fn min_key(&self) -> String {
        format!("{}Min", self.name)
    }

    fn max_key(&self) -> String {
        format!("{}Max", self.name)
    }
}

/// Filter applied to one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum FieldFilter {
    Equals { value: Scalar },
    Range {
        #[serde(default)]
        min: Option<Scalar>,
        #[serde(default)]
        max: Option<Scalar>,
    },
    OneOf { values: Vec<Scalar> },
}

impl FieldFilter {
    pub fn equals(value: impl Into<Scalar>) -> Self {
        FieldFilter::Equals {
            value: value.into(),
        }
    }

    pub fn range(min: Option<Scalar>, max: Option<Scalar>) -> Self {
        FieldFilter::Range { min, max }
    }

    pub fn one_of(values: impl IntoIterator<Item = impl Into<Scalar>>) -> Self {
        FieldFilter::OneOf {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Accumulated advanced-search state for one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvancedSearch {
    fields: Vec<SearchField>,
    filters: BTreeMap<String, FieldFilter>,
    fixed: BTreeMap<String, FilterValue>,
}

impl AdvancedSearch {
    pub fn new(fields: Vec<SearchField>) -> Self {
        Self {
            fields,
            filters: BTreeMap::new(),
            fixed: BTreeMap::new(),
        }
    }

    /// Registers the table's fixed filters, which every `apply` keeps.
    ///
    /// A fixed key may not be one this search writes.
    pub fn with_fixed_filters(
        mut self,
        fixed: BTreeMap<String, FilterValue>,
    ) -> TableResult<Self> {
        let owned = self.owned_keys();
        if let Some(key) = fixed.keys().find(|key| owned.contains(*key)) {
            return Err(TableError::InvalidFilter {
                field: key.clone(),
                reason: "already fixed by the table's base filters".to_string(),
            });
        }
        self.fixed = fixed;
        Ok(self)
    }

    pub fn fields(&self) -> &[SearchField] {
        &self.fields
    }

    pub fn filters(&self) -> &BTreeMap<String, FieldFilter> {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    fn field(&self, name: &str) -> TableResult<&SearchField> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| TableError::UnknownField(name.to_string()))
    }

    /// Sets the filter for a field. Returns whether the filter set changed.
    ///
    /// A blank text equality removes the field's filter.
    pub fn set(&mut self, name: &str, filter: FieldFilter) -> TableResult<bool> {
        let field = self.field(name)?;
        if let FieldFilter::Equals {
            value: Scalar::Text(text),
        } = &filter
        {
            if text.trim().is_empty() {
                return Ok(self.remove(name));
            }
        }
        validate(field, &filter)?;
        let previous = self.filters.insert(name.to_string(), filter.clone());
        Ok(previous.as_ref() != Some(&filter))
    }

    /// Removes a field's filter. Returns whether one was set.
    pub fn remove(&mut self, name: &str) -> bool {
        self.filters.remove(name).is_some()
    }

    /// Removes every filter. Returns whether any was set.
    pub fn clear(&mut self) -> bool {
        let had_filters = !self.filters.is_empty();
        self.filters.clear();
        had_filters
    }

    /// Descriptor keys this search may write.
    pub fn owned_keys(&self) -> BTreeSet<String> {
        self.fields
            .iter()
            .flat_map(|f| [f.name.clone(), f.min_key(), f.max_key()])
            .collect()
    }

    /// The extra descriptor keys for the current filters.
    pub fn to_extras(&self) -> BTreeMap<String, FilterValue> {
        let mut extras = BTreeMap::new();
        for field in &self.fields {
            match self.filters.get(&field.name) {
                Some(FieldFilter::Equals { value }) => {
                    extras.insert(field.name.clone(), FilterValue::Single(value.clone()));
                }
                Some(FieldFilter::Range { min, max }) => {
                    if let Some(min) = min {
                        extras.insert(field.min_key(), FilterValue::Single(min.clone()));
                    }
                    if let Some(max) = max {
                        extras.insert(field.max_key(), FilterValue::Single(max.clone()));
                    }
                }
                Some(FieldFilter::OneOf { values }) => {
                    extras.insert(field.name.clone(), FilterValue::Many(values.clone()));
                }
                None => {}
            }
        }
        extras
    }

    /// Merges the filters into `descriptor`, replacing whatever this search
    /// wrote before. Fixed filters are always present afterwards. The page
    /// resets to 1 when the filter keys change.
    pub fn apply(&self, descriptor: &QueryDescriptor) -> QueryDescriptor {
        let mut next = descriptor.clone();
        for key in self.owned_keys() {
            next.extra.remove(&key);
        }
        next.extra.extend(self.fixed.iter().map(|(k, v)| (k.clone(), v.clone())));
        next.extra.extend(self.to_extras());
        if next.extra != descriptor.extra {
            next.page = Some(1);
        }
        next
    }
}

fn invalid(field: &SearchField, reason: impl Into<String>) -> TableError {
    TableError::InvalidFilter {
        field: field.name.clone(),
        reason: reason.into(),
    }
}

/// Sort key used to compare range bounds.
fn ordinal(field: &SearchField, value: &Scalar) -> TableResult<f64> {
    match (&field.kind, value) {
        (FieldKind::Number, Scalar::Int(i)) => Ok(*i as f64),
        (FieldKind::Number, Scalar::Float(f)) => Ok(*f),
        (FieldKind::Date, Scalar::Text(text)) => parse_date(text)
            .map(|ts| ts as f64)
            .ok_or_else(|| invalid(field, format!("`{text}` is not a date"))),
        (FieldKind::Number, other) => Err(invalid(field, format!("`{other}` is not a number"))),
        (_, other) => Err(invalid(field, format!("`{other}` is not a date"))),
    }
}

fn check_value(field: &SearchField, value: &Scalar) -> TableResult<()> {
    match (&field.kind, value) {
        (FieldKind::Text, Scalar::Text(_)) => Ok(()),
        (FieldKind::Bool, Scalar::Bool(_)) => Ok(()),
        (FieldKind::Number | FieldKind::Date, v) => ordinal(field, v).map(|_| ()),
        (FieldKind::Select(options), Scalar::Text(text)) => {
            if options.iter().any(|o| o == text) {
                Ok(())
            } else {
                Err(invalid(field, format!("`{text}` is not one of {options:?}")))
            }
        }
        (kind, v) => Err(invalid(field, format!("`{v}` does not fit a {kind:?} field"))),
    }
}

fn validate(field: &SearchField, filter: &FieldFilter) -> TableResult<()> {
    match filter {
        FieldFilter::Equals { value } => check_value(field, value),
        FieldFilter::Range { min, max } => {
            if !field.kind.is_ordered() {
                return Err(invalid(field, "range filters need a number or date field"));
            }
            let low = min.as_ref().map(|v| ordinal(field, v)).transpose()?;
            let high = max.as_ref().map(|v| ordinal(field, v)).transpose()?;
            match (low, high) {
                (None, None) => Err(invalid(field, "range needs a lower or upper bound")),
                (Some(low), Some(high)) if low > high => {
                    Err(invalid(field, "lower bound is above upper bound"))
                }
                _ => Ok(()),
            }
        }
        FieldFilter::OneOf { values } => {
            if values.is_empty() {
                return Err(invalid(field, "pick at least one value"));
            }
            if field.kind == FieldKind::Bool {
                return Err(invalid(field, "set membership does not apply to booleans"));
            }
            values.iter().try_for_each(|v| check_value(field, v))
        }
    }
}
