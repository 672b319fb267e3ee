use crate::{IdField, RowId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Anything that can be listed, fetched and mutated through an entity client.
///
/// Implemented for every cloneable serde type; rows are inspected through
/// their JSON form, so typed structs and raw `serde_json::Value` rows behave
/// the same way.
pub trait EntityRecord: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The row as JSON. Rows that fail to serialize read as `null`.
    fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// The row's identity under the given id field.
    fn row_id(&self, id_field: &IdField) -> Option<RowId> {
        id_field.extract(&self.to_json())
    }

    /// A top-level field value.
    fn field(&self, name: &str) -> Option<Value> {
        match self.to_json() {
            Value::Object(mut map) => map.remove(name),
            _ => None,
        }
    }
}

impl<T> EntityRecord for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}
