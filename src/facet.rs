// Facet-grid coordination: grid shape, subplot placement, styles and titles

use crate::data::{Table, Value};
use crate::dimension::GroupedDimensionIndex;
use crate::encoding::{Encoding, FacetSpec};
use crate::error::{PlotError, Result};
use crate::ir::{
    DrawInstruction, DrawPlan, DrawSummary, GridShape, ResolvedEncoding, Style, Subplot,
};
use crate::palette::{PaletteMap, Palettes};
use crate::resolve::resolve_encoding;
use tracing::debug;

pub const FACET_ROW: &str = "facet_row";
pub const FACET_COL: &str = "facet_col";

/// How facet dense indices map to subplot coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Grid,
    /// A single column facet flowing row-major, `n` subplots per row
    WrapCols(usize),
    /// A single row facet flowing column-major, `n` subplots per column
    WrapRows(usize),
}

/// Palettes built over the whole, unsplit table
#[derive(Debug, Clone, Default)]
struct ResolvedPalettes {
    color: Option<PaletteMap<String>>,
    size: Option<PaletteMap<f64>>,
    shape: Option<PaletteMap<String>>,
}

/// Turns a table plus encoding and facet specifications into draw instructions.
///
/// Every group of the shared partition becomes one instruction. Aesthetic
/// values come from palettes over the entire table, so the same category gets
/// the same color in every subplot.
#[derive(Debug, Clone)]
pub struct FacetGridCoordinator {
    table: Table,
    encoding: ResolvedEncoding,
    facet: FacetSpec,
    index: GroupedDimensionIndex,
    palettes: ResolvedPalettes,
    layout: Layout,
    shape: GridShape,
}

impl FacetGridCoordinator {
    pub fn new(table: &Table, encoding: &Encoding, facet: &FacetSpec) -> Result<Self> {
        Self::with_palettes(table, encoding, facet, &Palettes::default())
    }

    pub fn with_palettes(
        table: &Table,
        encoding: &Encoding,
        facet: &FacetSpec,
        palettes: &Palettes,
    ) -> Result<Self> {
        // 1. Validate the facet request before touching data
        let layout = validate_facet(facet)?;

        // 2. Resolve computed channels once
        let (table, encoding) = resolve_encoding(encoding, table)?;

        // 3. One partition over facet and aesthetic dimensions together
        let mut dimensions = vec![
            (FACET_ROW, facet.row.clone()),
            (FACET_COL, facet.col.clone()),
        ];
        dimensions.extend(encoding.aesthetics());
        let index = GroupedDimensionIndex::new(&table, dimensions)?;

        // 4. Palettes over the entire table
        let palettes = ResolvedPalettes {
            color: encoding
                .color
                .as_ref()
                .map(|cols| palettes.color.assign(&table, cols))
                .transpose()?,
            size: encoding
                .size
                .as_ref()
                .map(|cols| palettes.size.assign(&table, cols))
                .transpose()?,
            shape: encoding
                .shape
                .as_ref()
                .map(|cols| palettes.shape.assign(&table, cols))
                .transpose()?,
        };

        let shape = grid_shape(&index, layout)?;
        debug!(n_rows = shape.n_rows, n_cols = shape.n_cols, groups = index.len(), "facet grid");

        Ok(Self {
            table,
            encoding,
            facet: facet.clone(),
            index,
            palettes,
            layout,
            shape,
        })
    }

    pub fn grid_shape(&self) -> GridShape {
        self.shape
    }

    /// The table after computed channels were materialized
    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn encoding(&self) -> &ResolvedEncoding {
        &self.encoding
    }

    pub fn index(&self) -> &GroupedDimensionIndex {
        &self.index
    }

    /// One draw instruction per group, in grouping order
    pub fn emit(&self) -> Result<Vec<DrawInstruction>> {
        (0..self.index.len())
            .map(|group| {
                Ok(DrawInstruction {
                    subplot: self.subplot(group)?,
                    group,
                    data: self.index.group(group)?.clone(),
                    style: self.style(group)?,
                    title: self.title(group)?,
                })
            })
            .collect()
    }

    /// Serializable overview of [`emit`](Self::emit)
    pub fn plan(&self) -> Result<DrawPlan> {
        let groups = self.emit()?.iter().map(DrawSummary::from).collect();
        Ok(DrawPlan {
            grid: self.shape,
            groups,
        })
    }

    fn subplot(&self, group: usize) -> Result<Subplot> {
        let row = self.index.index(group, FACET_ROW)?;
        let col = self.index.index(group, FACET_COL)?;
        Ok(match self.layout {
            Layout::Grid => Subplot { row, col },
            Layout::WrapCols(n) => Subplot {
                row: col / n,
                col: col % n,
            },
            Layout::WrapRows(n) => Subplot {
                row: row % n,
                col: row / n,
            },
        })
    }

    fn style(&self, group: usize) -> Result<Style> {
        Ok(Style {
            color: lookup(&self.index, group, "color", self.palettes.color.as_ref())?,
            size: lookup(&self.index, group, "size", self.palettes.size.as_ref())?,
            shape: lookup(&self.index, group, "shape", self.palettes.shape.as_ref())?,
        })
    }

    /// `r1=v1, r2=v2 | c1=v3`, skipping dimensions without columns
    fn title(&self, group: usize) -> Result<String> {
        let mut parts = Vec::new();
        for (name, columns) in [(FACET_ROW, &self.facet.row), (FACET_COL, &self.facet.col)] {
            if columns.is_empty() {
                continue;
            }
            let values = self.index.item(group, name)?;
            let pairs: Vec<String> = columns
                .iter()
                .zip(&values)
                .map(|(c, v)| format!("{}={}", c, v))
                .collect();
            parts.push(pairs.join(", "));
        }
        Ok(parts.join(" | "))
    }
}

fn lookup<T: Clone>(
    index: &GroupedDimensionIndex,
    group: usize,
    name: &str,
    palette: Option<&PaletteMap<T>>,
) -> Result<Option<T>> {
    let Some(palette) = palette else {
        return Ok(None);
    };
    let key: Vec<Value> = index.item(group, name)?;
    Ok(palette.get(&key).cloned())
}

fn validate_facet(facet: &FacetSpec) -> Result<Layout> {
    let Some(wrap) = facet.wrap else {
        return Ok(Layout::Grid);
    };
    if wrap == 0 {
        return Err(PlotError::Unsupported("wrap limit must be at least 1".to_string()));
    }
    match (facet.row.is_empty(), facet.col.is_empty()) {
        (true, true) => Err(PlotError::Unsupported(
            "wrap requires a row or col facet".to_string(),
        )),
        (false, false) => Err(PlotError::Unsupported(
            "wrap cannot be combined with both row and col facets".to_string(),
        )),
        (true, false) => Ok(Layout::WrapCols(wrap)),
        (false, true) => Ok(Layout::WrapRows(wrap)),
    }
}

fn grid_shape(index: &GroupedDimensionIndex, layout: Layout) -> Result<GridShape> {
    let rows = index.n_unique(FACET_ROW)?;
    let cols = index.n_unique(FACET_COL)?;
    let (n_rows, n_cols) = match layout {
        Layout::Grid => (rows, cols),
        Layout::WrapCols(n) => (cols.div_ceil(n), cols.min(n)),
        Layout::WrapRows(n) => (rows.min(n), rows.div_ceil(n)),
    };
    Ok(GridShape {
        n_rows: n_rows.max(1),
        n_cols: n_cols.max(1),
    })
}
