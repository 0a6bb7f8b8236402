//! Typed record bag with formatted-value precedence
//!
//! Rows come off the wire as open string-keyed JSON objects. For a field `f`
//! the store may also send a sibling key `f` + [`FORMATTED_VALUE_SUFFIX`]
//! holding the human-readable rendering (option-set label, formatted money,
//! localized date). [`RecordBag::field`] resolves that precedence once so
//! callers never probe key variants by hand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fixed key suffix under which the store annotates a raw value with its
/// display rendering.
pub const FORMATTED_VALUE_SUFFIX: &str = "@OData.Community.Display.V1.FormattedValue";

/// Resolved view of one field: formatted display text when the store sent
/// one, the raw scalar otherwise, absent when neither exists. JSON `null`
/// counts as absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Absent,
    Raw(&'a Value),
    Formatted(&'a str),
}

/// One record as returned by the remote store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordBag {
    fields: Map<String, Value>,
}

impl RecordBag {
    pub fn new(fields: Map<String, Value>) -> Self {
        RecordBag { fields }
    }

    /// Wrap a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Option<RecordBag> {
        match value {
            Value::Object(fields) => Some(RecordBag { fields }),
            _ => None,
        }
    }

    /// Resolve a field with formatted-value precedence.
    pub fn field(&self, field: &str) -> FieldValue<'_> {
        let formatted_key = format!("{field}{FORMATTED_VALUE_SUFFIX}");
        if let Some(Value::String(text)) = self.fields.get(&formatted_key) {
            return FieldValue::Formatted(text);
        }
        match self.fields.get(field) {
            None | Some(Value::Null) => FieldValue::Absent,
            Some(value) => FieldValue::Raw(value),
        }
    }

    /// The formatted rendering alone, if the store sent one.
    pub fn formatted(&self, field: &str) -> Option<&str> {
        match self.field(field) {
            FieldValue::Formatted(text) => Some(text),
            _ => None,
        }
    }

    /// Raw key access without precedence or null filtering.
    pub fn raw(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Raw string value of a field, for id and name columns.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Whether the field holds exactly this string id.
    pub fn matches_id(&self, field: &str, id: &str) -> bool {
        self.text(field) == Some(id)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for RecordBag {
    fn from(fields: Map<String, Value>) -> Self {
        RecordBag { fields }
    }
}
