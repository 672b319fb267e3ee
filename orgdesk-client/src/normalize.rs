//! List response normalization.
//!
//! List endpoints answer either with a bare JSON array or with an envelope
//! `{data, totalCount, totalPages}`. The shape is decided once, here, and
//! everything downstream sees a [`PaginatedResult`].
//!
//! Missing totals are filled in consistently:
//! - `totalCount` defaults to the number of rows in `data`;
//! - `totalPages` is trusted when the server sends it, unless it is `0`
//!   while `totalCount > 0`;
//! - otherwise it is `ceil(totalCount / pageSize)` when the page size is
//!   known, `1` when it is not, and `0` for an empty result.

use crate::error::{ClientError, ClientResult};
use orgdesk_types::{total_pages_for, PaginatedResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope-shaped list body. Totals are optional on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
}

/// A list body as returned by the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListBody<T> {
    BareArray(Vec<T>),
    Envelope(ListEnvelope<T>),
}

impl<T: DeserializeOwned> ListBody<T> {
    /// Decides the body shape and decodes the rows.
    pub fn from_value(body: Value) -> ClientResult<Self> {
        let is_envelope = matches!(
            &body,
            Value::Object(map) if map.get("data").is_some_and(Value::is_array)
        );
        if body.is_array() {
            serde_json::from_value(body)
                .map(ListBody::BareArray)
                .map_err(|e| ClientError::Shape(format!("list rows: {e}")))
        } else if is_envelope {
            serde_json::from_value(body)
                .map(ListBody::Envelope)
                .map_err(|e| ClientError::Shape(format!("list envelope: {e}")))
        } else {
            Err(ClientError::Shape(format!(
                "expected an array or a {{data, totalCount, totalPages}} envelope, got {}",
                json_kind(&body)
            )))
        }
    }
}

impl<T> ListBody<T> {
    pub fn rows(&self) -> &[T] {
        match self {
            ListBody::BareArray(rows) => rows,
            ListBody::Envelope(envelope) => &envelope.data,
        }
    }

    /// Converts into the canonical paginated shape.
    pub fn into_page(self, page_size: Option<u32>) -> PaginatedResult<T> {
        match self {
            ListBody::BareArray(rows) => PaginatedResult::from_bare(rows),
            ListBody::Envelope(envelope) => {
                let total_count = envelope
                    .total_count
                    .unwrap_or(envelope.data.len() as u64);
                let total_pages = match envelope.total_pages {
                    Some(pages) if pages > 0 || total_count == 0 => pages,
                    _ if total_count == 0 => 0,
                    _ => page_size.map_or(1, |size| total_pages_for(total_count, size)),
                };
                PaginatedResult {
                    data: envelope.data,
                    total_count,
                    total_pages,
                }
            }
        }
    }
}

/// Normalizes a list response body into a [`PaginatedResult`].
pub fn normalize_list<T: DeserializeOwned>(
    body: Value,
    page_size: Option<u32>,
) -> ClientResult<PaginatedResult<T>> {
    ListBody::from_value(body).map(|list| list.into_page(page_size))
}

/// Extracts a server error message (`message`, then `error`) from a body.
pub fn error_message(body: &Value) -> Option<String> {
    match body {
        Value::Object(map) => ["message", "error"].iter().find_map(|key| {
            map.get(*key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }),
        Value::String(text) if !text.trim().is_empty() && text.len() <= 200 => {
            Some(text.trim().to_string())
        }
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object without a data array",
    }
}
