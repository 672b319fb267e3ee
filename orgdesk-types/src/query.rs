//! List-query descriptors.
//!
//! A [`QueryDescriptor`] is an immutable description of what a list screen
//! wants to see. Every interaction produces a new descriptor; comparing the
//! old and new values decides whether a refetch is needed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Query parameter names owned by the descriptor itself. Extra filter keys
/// may not use them.
pub const RESERVED_KEYS: &[&str] = &[
    "page",
    "pageSize",
    "sortField",
    "sortDirection",
    "search",
    "organizationId",
];

/// A scalar filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Renders the value as a querystring parameter value.
    pub fn to_param(&self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }

    /// Converts the value to JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Bool(b) => serde_json::Value::Bool(*b),
            Scalar::Int(i) => serde_json::Value::from(*i),
            Scalar::Float(f) => serde_json::Value::from(*f),
            Scalar::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_param())
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

/// Value of an extra filter key: one scalar or a set of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Single(Scalar),
    Many(Vec<Scalar>),
}

impl From<Scalar> for FilterValue {
    fn from(value: Scalar) -> Self {
        FilterValue::Single(value)
    }
}

impl From<Vec<Scalar>> for FilterValue {
    fn from(values: Vec<Scalar>) -> Self {
        FilterValue::Many(values)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Single(s.into())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Single(s.into())
    }
}

impl From<i64> for FilterValue {
    fn from(i: i64) -> Self {
        FilterValue::Single(i.into())
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Single(b.into())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// The opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// Describes list-query intent for one entity listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    /// 1-based page number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_direction: Option<SortDirection>,
    /// Free-text search term. Never empty when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Arbitrary extra filter fields, ordered by key.
    #[serde(flatten)]
    pub extra: BTreeMap<String, FilterValue>,
}

impl QueryDescriptor {
    /// Creates an empty descriptor (server defaults for everything).
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_field = Some(field.into());
        self.sort_direction = Some(direction);
        self
    }

    #[must_use]
    pub fn without_sort(mut self) -> Self {
        self.sort_field = None;
        self.sort_direction = None;
        self
    }

    /// Sets the search term. Blank terms clear the search.
    #[must_use]
    pub fn with_search(mut self, term: impl AsRef<str>) -> Self {
        let term = term.as_ref().trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self
    }

    #[must_use]
    pub fn with_filter(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn without_filter(mut self, key: &str) -> Self {
        self.extra.remove(key);
        self
    }

    #[must_use]
    pub fn without_filters(mut self) -> Self {
        self.extra.clear();
        self
    }

    /// The effective page, 1 when unset.
    pub fn page_or_first(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// Checks page bounds and extra key names.
    pub fn validate(&self) -> crate::Result<()> {
        if self.page == Some(0) {
            return Err(crate::Error::InvalidDescriptor("page must be >= 1".into()));
        }
        if self.page_size == Some(0) {
            return Err(crate::Error::InvalidDescriptor(
                "pageSize must be >= 1".into(),
            ));
        }
        if self.sort_direction.is_some() && self.sort_field.is_none() {
            return Err(crate::Error::InvalidDescriptor(
                "sortDirection given without sortField".into(),
            ));
        }
        if let Some(key) = self.extra.keys().find(|k| RESERVED_KEYS.contains(&k.as_str())) {
            return Err(crate::Error::ReservedKey(key.clone()));
        }
        Ok(())
    }

    /// Renders the descriptor as querystring pairs.
    ///
    /// Multi-valued filters become repeated keys, in value order.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_string(), page.to_string()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("pageSize".to_string(), size.to_string()));
        }
        if let Some(field) = &self.sort_field {
            pairs.push(("sortField".to_string(), field.clone()));
            let direction = self.sort_direction.unwrap_or_default();
            pairs.push(("sortDirection".to_string(), direction.as_str().to_string()));
        }
        if let Some(term) = self.search.as_deref().filter(|t| !t.is_empty()) {
            pairs.push(("search".to_string(), term.to_string()));
        }
        for (key, value) in &self.extra {
            match value {
                FilterValue::Single(v) => pairs.push((key.clone(), v.to_param())),
                FilterValue::Many(values) => {
                    pairs.extend(values.iter().map(|v| (key.clone(), v.to_param())))
                }
            }
        }
        pairs
    }
}
