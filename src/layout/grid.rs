//! View layout XML → grid columns

use tracing::{debug, warn};

use super::node::XmlNode;
use super::GridColumn;

const DEFAULT_COLUMN_WIDTH: u32 = 100;

/// Parse view layout XML into the ordered column list.
///
/// The canonical shape is a `grid` root holding one `row` whose repeated
/// `cell` elements each describe a column. Missing path or malformed input
/// yields an empty list; reader failures are logged once.
pub fn parse_layout_xml(layout_xml: &str) -> Vec<GridColumn> {
    if layout_xml.trim().is_empty() {
        return Vec::new();
    }
    let root = match XmlNode::parse(layout_xml) {
        Ok(root) => root,
        Err(err) => {
            warn!(error = %err, "failed to parse view layout xml");
            return Vec::new();
        }
    };
    if root.name != "grid" {
        debug!(root = %root.name, "layout xml root is not a grid");
        return Vec::new();
    }
    let Some(row) = root.child("row") else {
        debug!("layout grid has no row element");
        return Vec::new();
    };
    row.children("cell").map(column_from_cell).collect()
}

fn column_from_cell(cell: &XmlNode) -> GridColumn {
    let name = cell.attr("name").map(str::to_owned);
    let width = cell
        .attr("width")
        .and_then(|w| w.parse::<u32>().ok())
        .unwrap_or(DEFAULT_COLUMN_WIDTH);
    GridColumn {
        display_name: name.clone(),
        name,
        width,
        alias: None,
    }
}
