//! Tenant and row identifiers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Identifier of the organization (tenant) a request is scoped to.
///
/// Always non-empty and free of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrganizationId(String);

impl OrganizationId {
    /// Parses an organization id, trimming whitespace.
    pub fn parse(s: &str) -> crate::Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(crate::Error::InvalidOrganizationId(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OrganizationId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OrganizationId {
    type Error = crate::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrganizationId> for String {
    fn from(id: OrganizationId) -> Self {
        id.0
    }
}

/// Tenant scope passed explicitly to every entity client call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrgScope {
    /// Request belongs to one organization.
    Tenant(OrganizationId),
    /// Request is not tied to an organization (platform-level entities).
    Unscoped,
}

impl OrgScope {
    /// Returns the organization id when scoped to a tenant.
    pub fn organization_id(&self) -> Option<&OrganizationId> {
        match self {
            OrgScope::Tenant(id) => Some(id),
            OrgScope::Unscoped => None,
        }
    }

    pub fn is_tenant(&self) -> bool {
        matches!(self, OrgScope::Tenant(_))
    }
}

impl From<OrganizationId> for OrgScope {
    fn from(id: OrganizationId) -> Self {
        OrgScope::Tenant(id)
    }
}

/// Identity of a table row, unique within a page and stable across refetches.
///
/// String and integer ids are both accepted; integers are kept in their
/// decimal form so `1` and `"1"` identify the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds a row id from a JSON id value. Only non-empty strings and
    /// integers qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(Self(n.to_string())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Which JSON field carries a row's identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IdField {
    /// `_id`, falling back to `id`.
    #[default]
    Auto,
    /// A caller-chosen field name.
    Named(String),
}

impl IdField {
    /// Builds an id field from an optional configured name.
    pub fn from_config(name: Option<&str>) -> Self {
        match name {
            Some(n) if !n.trim().is_empty() => IdField::Named(n.trim().to_string()),
            _ => IdField::Auto,
        }
    }

    /// The field name used when writing a new id into a payload.
    pub fn primary_name(&self) -> &str {
        match self {
            IdField::Auto => "_id",
            IdField::Named(name) => name,
        }
    }

    /// Finds the id key and value inside a JSON object.
    pub fn locate<'a>(&self, object: &'a Map<String, Value>) -> Option<(&'a str, &'a Value)> {
        let named;
        let candidates: &[&str] = match self {
            IdField::Auto => &["_id", "id"],
            IdField::Named(name) => {
                named = [name.as_str()];
                &named
            }
        };
        candidates.iter().find_map(|key| {
            object
                .get_key_value(*key)
                .filter(|(_, v)| RowId::from_value(v).is_some())
                .map(|(k, v)| (k.as_str(), v))
        })
    }

    /// Extracts the row id from a JSON value, if it is an object carrying one.
    pub fn extract(&self, value: &Value) -> Option<RowId> {
        let object = value.as_object()?;
        self.locate(object).and_then(|(_, v)| RowId::from_value(v))
    }
}
