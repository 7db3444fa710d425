//! Bulk layouts: row-major 2-D arrays of cell descriptors.

use derive_more::{Display, Error, From};

use crate::types::CellContent;

/// `layout[y][x]`; rows may have different lengths.
pub type Layout = Vec<Vec<CellContent>>;

#[derive(Debug, Display, Error, From)]
pub enum LayoutError {
    #[display("layout is not valid JSON: {_0}")]
    Json(serde_json::Error),
}

/// Parse a JSON layout such as `[[1, 0], [{"kind": 2, "height": 3}, null]]`.
pub fn parse_layout(json: &str) -> Result<Layout, LayoutError> {
    Ok(serde_json::from_str(json)?)
}
