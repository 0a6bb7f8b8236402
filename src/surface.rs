//! Display boundary
//!
//! The rendering surface is an external collaborator: it reads the session
//! through a shared borrow and reports user actions back as intents, never
//! mutating state itself. The one piece of display logic owned here is the
//! field display rule shared by grid cells and form cells.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::{FieldValue, RecordBag};
use crate::session::SessionState;

/// Placeholder shown for absent field values.
pub const VALUE_PLACEHOLDER: &str = "--";

/// User actions a surface reports back to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceIntent {
    EntitySelected(String),
    ViewSelected(String),
    FormSelected(String),
    RecordSelected(String),
    BackRequested,
}

/// Renders session state.
pub trait DisplaySurface {
    fn present(&mut self, session: &SessionState);
}

/// Display text for one field: the formatted rendering when the store sent
/// one, else the raw value as text, else the placeholder.
pub fn display_text(record: &RecordBag, field: &str) -> String {
    match record.field(field) {
        FieldValue::Formatted(text) => text.to_owned(),
        FieldValue::Raw(value) => scalar_text(value),
        FieldValue::Absent => VALUE_PLACEHOLDER.to_owned(),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
