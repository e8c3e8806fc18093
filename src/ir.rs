use crate::data::Table;
use serde::Serialize;

// =============================================================================
// Phase 1: Resolution
// =============================================================================

/// Encoding with every channel reduced to a column name of the resolved table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedEncoding {
    pub x: Option<String>,
    pub y: Option<String>,
    pub color: Option<Vec<String>>,
    pub size: Option<Vec<String>>,
    pub shape: Option<Vec<String>>,
}

impl ResolvedEncoding {
    /// Declared aesthetics as (dimension name, columns)
    pub fn aesthetics(&self) -> Vec<(&'static str, Vec<String>)> {
        [
            ("color", &self.color),
            ("size", &self.size),
            ("shape", &self.shape),
        ]
        .into_iter()
        .filter_map(|(name, cols)| cols.clone().map(|c| (name, c)))
        .collect()
    }
}

// =============================================================================
// Phase 2: Grid coordination
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridShape {
    pub n_rows: usize,
    pub n_cols: usize,
}

/// Position of one subplot in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Subplot {
    pub row: usize,
    pub col: usize,
}

/// Aesthetic values resolved from the palettes for one group
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Style {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
}

/// One group, ready to hand to a mark: where to draw, what rows, how to style them
#[derive(Debug, Clone, PartialEq)]
pub struct DrawInstruction {
    pub subplot: Subplot,
    pub group: usize,
    pub data: Table,
    pub style: Style,
    pub title: String,
}

/// Serializable summary of a draw instruction (the row subset is reduced to its size)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawSummary {
    pub row: usize,
    pub col: usize,
    pub group: usize,
    pub rows: usize,
    pub title: String,
    pub style: Style,
}

impl From<&DrawInstruction> for DrawSummary {
    fn from(d: &DrawInstruction) -> Self {
        Self {
            row: d.subplot.row,
            col: d.subplot.col,
            group: d.group,
            rows: d.data.height(),
            title: d.title.clone(),
            style: d.style.clone(),
        }
    }
}

/// The whole plan for one chart, as emitted by the CLI's JSON output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawPlan {
    pub grid: GridShape,
    pub groups: Vec<DrawSummary>,
}
