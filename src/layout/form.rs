//! Form XML → tab/section/row/cell tree

use tracing::{debug, warn};

use super::node::XmlNode;
use super::{FormCell, FormRow, FormSection, FormTab};

/// Parse form XML into the ordered tab tree.
///
/// Tabs live under the `form`/`tabs` path. Each tab's sections are flattened
/// across its layout columns into one ordered list, since the columns are a
/// visual hint rather than part of the model. Cells that bind no data field
/// are dropped.
/// Malformed input yields an empty tree; reader failures are logged once.
pub fn parse_form_xml(form_xml: &str) -> Vec<FormTab> {
    if form_xml.trim().is_empty() {
        return Vec::new();
    }
    let root = match XmlNode::parse(form_xml) {
        Ok(root) => root,
        Err(err) => {
            warn!(error = %err, "failed to parse form xml");
            return Vec::new();
        }
    };
    if root.name != "form" {
        debug!(root = %root.name, "form xml root is not a form");
        return Vec::new();
    }
    let Some(tabs) = root.child("tabs") else {
        debug!("form xml has no tabs element");
        return Vec::new();
    };
    tabs.children("tab").map(tab_from_node).collect()
}

fn tab_from_node(tab: &XmlNode) -> FormTab {
    let name = attr_string(tab, "name");
    let sections = tab
        .children("columns")
        .flat_map(|columns| columns.children("column"))
        .flat_map(|column| column.children("sections"))
        .flat_map(|sections| sections.children("section"))
        .map(section_from_node)
        .collect();
    FormTab {
        id: attr_string(tab, "id"),
        label: label_text(tab).unwrap_or_else(|| name.clone()),
        visible: visible_flag(tab),
        name,
        sections,
    }
}

fn section_from_node(section: &XmlNode) -> FormSection {
    let name = attr_string(section, "name");
    let rows = section
        .children("rows")
        .flat_map(|rows| rows.children("row"))
        .map(row_from_node)
        .collect();
    FormSection {
        id: attr_string(section, "id"),
        label: label_text(section).unwrap_or_else(|| name.clone()),
        visible: visible_flag(section),
        name,
        rows,
    }
}

fn row_from_node(row: &XmlNode) -> FormRow {
    FormRow {
        cells: row.children("cell").filter_map(cell_from_node).collect(),
    }
}

/// A cell survives only when its control binds a non-empty data field.
fn cell_from_node(cell: &XmlNode) -> Option<FormCell> {
    let control = cell.child("control")?;
    let field_name = control
        .attr("datafieldname")
        .filter(|f| !f.is_empty())?
        .to_owned();
    Some(FormCell {
        id: attr_string(cell, "id"),
        control_id: attr_string(control, "id"),
        label: label_text(cell).unwrap_or_else(|| field_name.clone()),
        visible: visible_flag(cell),
        row_span: span_attr(cell, "rowspan"),
        col_span: span_attr(cell, "colspan"),
        field_name,
    })
}

fn attr_string(node: &XmlNode, name: &str) -> String {
    node.attr(name).unwrap_or_default().to_owned()
}

/// Descriptive label: the first `labels`/`label` child's non-empty
/// `description` attribute.
fn label_text(node: &XmlNode) -> Option<String> {
    node.children("labels")
        .flat_map(|labels| labels.children("label"))
        .next()
        .and_then(|label| label.attr("description"))
        .filter(|d| !d.is_empty())
        .map(str::to_owned)
}

/// `visible` defaults to true; only the literal `false` hides a node.
fn visible_flag(node: &XmlNode) -> bool {
    node.attr("visible") != Some("false")
}

fn span_attr(cell: &XmlNode, name: &str) -> u32 {
    cell.attr(name)
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(1)
}
