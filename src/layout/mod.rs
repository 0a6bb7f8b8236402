//! Declarative-layout interpreter
//!
//! Turns the host's two layout dialects into renderable models: view layout
//! XML becomes a flat, ordered column list and form XML becomes a
//! tab → section → row → cell tree. Both parsers are total; malformed input
//! degrades to an empty model and is logged, never raised.

mod form;
mod grid;
mod node;

pub use form::parse_form_xml;
pub use grid::parse_layout_xml;

use serde::{Deserialize, Serialize};

/// One grid column from view layout XML.
///
/// `display_name` mirrors `name` verbatim; no metadata lookup is performed.
/// A cell without a `name` attribute keeps both as `None` so the column count
/// still matches the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridColumn {
    pub name: Option<String>,
    /// Pixel width hint, 100 when missing or non-numeric.
    pub width: u32,
    pub display_name: Option<String>,
    /// Reserved for linked-entity column aliasing; not populated by the
    /// layout parser.
    pub alias: Option<String>,
}

/// One form tab with its sections flattened across the tab's layout columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormTab {
    pub id: String,
    pub name: String,
    pub label: String,
    pub visible: bool,
    pub sections: Vec<FormSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSection {
    pub id: String,
    pub name: String,
    pub label: String,
    pub visible: bool,
    pub rows: Vec<FormRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormRow {
    pub cells: Vec<FormCell>,
}

/// One data-bound form cell. Unbound cells (spacers, static labels, subgrids
/// without a simple field) never make it into the tree, so `field_name` is
/// always non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormCell {
    pub id: String,
    pub control_id: String,
    pub field_name: String,
    pub label: String,
    pub visible: bool,
    pub row_span: u32,
    pub col_span: u32,
}
