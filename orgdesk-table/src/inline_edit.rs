//! Inline cell editing.
//!
//! Edits are optimistic-confirm: the table shows the proposed value as
//! pending, and the row only changes once the server answers with the
//! confirmed row. Each edited cell moves through
//! `Clean -> Pending -> Confirmed | RolledBack`.

use crate::columns::{parse_date, FieldKind};
use crate::error::{TableError, TableResult};
use orgdesk_types::RowId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifies one cell of the loaded page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub row: RowId,
    pub field: String,
}

impl CellKey {
    pub fn new(row: RowId, field: impl Into<String>) -> Self {
        Self {
            row,
            field: field.into(),
        }
    }
}

/// Edit state of one cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum CellEditState {
    /// No edit in progress; the cell shows the row's value.
    #[default]
    Clean,
    /// Waiting for the server. The row still holds `previous`.
    Pending { previous: Value, proposed: Value },
    /// The server accepted the edit; `value` is what it stored.
    Confirmed { value: Value },
    /// The server rejected the edit; the cell shows `previous` again.
    RolledBack { previous: Value, error: String },
}

impl CellEditState {
    pub fn is_pending(&self) -> bool {
        matches!(self, CellEditState::Pending { .. })
    }

    /// Starts an edit. Fails while an earlier edit of the cell is in flight.
    pub fn begin(&self, key: &CellKey, previous: Value, proposed: Value) -> TableResult<Self> {
        if self.is_pending() {
            return Err(TableError::EditPending {
                row: key.row.clone(),
                field: key.field.clone(),
            });
        }
        Ok(CellEditState::Pending { previous, proposed })
    }

    /// The server stored `value`.
    pub fn confirm(self, value: Value) -> Self {
        match self {
            CellEditState::Pending { .. } => CellEditState::Confirmed { value },
            other => other,
        }
    }

    /// The server rejected the edit.
    pub fn roll_back(self, error: impl Into<String>) -> Self {
        match self {
            CellEditState::Pending { previous, .. } => CellEditState::RolledBack {
                previous,
                error: error.into(),
            },
            other => other,
        }
    }

    /// The value to render, given the row's current value for the cell.
    pub fn display_value<'a>(&'a self, row_value: &'a Value) -> &'a Value {
        match self {
            CellEditState::Pending { proposed, .. } => proposed,
            CellEditState::RolledBack { previous, .. } => previous,
            CellEditState::Clean | CellEditState::Confirmed { .. } => row_value,
        }
    }
}

fn invalid(kind: &FieldKind, raw: &Value, reason: &str) -> TableError {
    let kind = match kind {
        FieldKind::Text => "text",
        FieldKind::Number => "number",
        FieldKind::Date => "date",
        FieldKind::Bool => "bool",
        FieldKind::Select(_) => "select",
    };
    TableError::InvalidValue {
        field: kind.to_string(),
        reason: format!("{raw}: {reason}"),
    }
}

/// Converts user input into the JSON value stored for a column kind.
///
/// Text input is parsed; already-typed JSON passes through when it fits.
/// An empty string clears the cell (`null`).
pub fn coerce_input(kind: &FieldKind, raw: &Value) -> TableResult<Value> {
    let text = match raw {
        Value::String(s) if s.trim().is_empty() => return Ok(Value::Null),
        Value::String(s) => Some(s.trim()),
        Value::Null => return Ok(Value::Null),
        _ => None,
    };

    match (kind, text) {
        (FieldKind::Text, Some(s)) => Ok(Value::String(s.to_string())),
        (FieldKind::Text, None) => Ok(Value::String(raw.to_string())),

        (FieldKind::Number, Some(s)) => {
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Value::from(i));
            }
            s.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| invalid(kind, raw, "not a number"))
        }
        (FieldKind::Number, None) if raw.is_number() => Ok(raw.clone()),

        (FieldKind::Bool, Some(s)) => match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "0" => Ok(Value::Bool(false)),
            _ => Err(invalid(kind, raw, "not a yes/no value")),
        },
        (FieldKind::Bool, None) if raw.is_boolean() => Ok(raw.clone()),

        (FieldKind::Date, Some(s)) => match parse_date(s) {
            Some(_) => Ok(Value::String(s.to_string())),
            None => Err(invalid(kind, raw, "not a date")),
        },

        (FieldKind::Select(options), Some(s)) => {
            if options.iter().any(|o| o == s) {
                Ok(Value::String(s.to_string()))
            } else {
                Err(invalid(kind, raw, "not an allowed option"))
            }
        }

        _ => Err(invalid(kind, raw, "unsupported input")),
    }
}

/// Builds the single-field update payload for one cell. `id` is the row's
/// id value as the server sent it.
pub fn edit_payload(id_key: &str, id: Value, field: &str, value: Value) -> Value {
    let mut payload = Map::new();
    payload.insert(id_key.to_string(), id);
    payload.insert(field.to_string(), value);
    Value::Object(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key() -> CellKey {
        CellKey::new(RowId::new("t1"), "title")
    }

    #[test]
    fn pending_then_confirmed() {
        let state = CellEditState::Clean
            .begin(&key(), json!("A"), json!("B"))
            .unwrap();
        assert_eq!(state.display_value(&json!("A")), &json!("B"));
        let state = state.confirm(json!("B!"));
        assert_eq!(state, CellEditState::Confirmed { value: json!("B!") });
    }

    #[test]
    fn pending_then_rolled_back_shows_previous() {
        let state = CellEditState::Clean
            .begin(&key(), json!("A"), json!("B"))
            .unwrap()
            .roll_back("nope");
        assert_eq!(state.display_value(&json!("A")), &json!("A"));
        assert!(matches!(state, CellEditState::RolledBack { ref error, .. } if error == "nope"));
    }

    #[test]
    fn second_edit_while_pending_is_rejected() {
        let state = CellEditState::Clean
            .begin(&key(), json!("A"), json!("B"))
            .unwrap();
        assert!(matches!(
            state.begin(&key(), json!("A"), json!("C")),
            Err(TableError::EditPending { .. })
        ));
    }

    #[test]
    fn confirm_outside_pending_is_a_no_op() {
        assert_eq!(CellEditState::Clean.confirm(json!(1)), CellEditState::Clean);
    }

    #[test]
    fn coerces_by_kind() {
        assert_eq!(coerce_input(&FieldKind::Number, &json!("42")).unwrap(), json!(42));
        assert_eq!(coerce_input(&FieldKind::Number, &json!("2.5")).unwrap(), json!(2.5));
        assert_eq!(coerce_input(&FieldKind::Bool, &json!("Yes")).unwrap(), json!(true));
        assert_eq!(coerce_input(&FieldKind::Text, &json!("  hi ")).unwrap(), json!("hi"));
        assert_eq!(coerce_input(&FieldKind::Date, &json!("2024-02-29")).unwrap(), json!("2024-02-29"));
        assert_eq!(coerce_input(&FieldKind::Number, &json!("")).unwrap(), Value::Null);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(coerce_input(&FieldKind::Number, &json!("abc")).is_err());
        assert!(coerce_input(&FieldKind::Date, &json!("2023-02-30")).is_err());
        let select = FieldKind::Select(vec!["open".into(), "done".into()]);
        assert!(coerce_input(&select, &json!("closed")).is_err());
        assert_eq!(coerce_input(&select, &json!("done")).unwrap(), json!("done"));
    }

    #[test]
    fn payload_carries_id_and_field() {
        let payload = edit_payload("_id", json!("t1"), "title", json!("B"));
        assert_eq!(payload, json!({"_id": "t1", "title": "B"}));
    }
}
