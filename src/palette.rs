// Categorical palettes for color, size and shape aesthetics

use crate::data::{Table, Value};
use crate::error::{PlotError, Result};
use crate::group::distinct_keys;
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, warn};

/// Key tuple -> palette value, in first-occurrence order of the keys
pub type PaletteMap<T> = IndexMap<Vec<Value>, T>;

/// Map each distinct key tuple of `columns` to `palette[rank % palette.len()]`.
///
/// Keys are ranked by first occurrence. When there are more keys than palette
/// entries the palette cycles. An empty column list maps the empty tuple to
/// the first palette entry.
pub fn create_palette<S, T>(table: &Table, columns: &[S], palette: &[T]) -> Result<PaletteMap<T>>
where
    S: AsRef<str>,
    T: Clone,
{
    if palette.is_empty() {
        return Err(PlotError::EmptyPalette);
    }
    if columns.is_empty() {
        return Ok(IndexMap::from([(Vec::new(), palette[0].clone())]));
    }
    // No rows, no keys; columns the empty table lacks are not an error here
    if table.is_empty() {
        return Ok(IndexMap::new());
    }

    let keys = distinct_keys(table, columns)?;
    if keys.len() > palette.len() {
        warn!(
            keys = keys.len(),
            palette = palette.len(),
            "more categories than palette entries, values will repeat"
        );
    }
    debug!(keys = keys.len(), "assigned palette");

    Ok(keys
        .into_keys()
        .enumerate()
        .map(|(i, key)| (key, palette[i % palette.len()].clone()))
        .collect())
}

/// Categorical colors as `#rrggbb` strings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ColorPalette {
    colors: Vec<String>,
}

impl ColorPalette {
    pub fn new(colors: Vec<String>) -> Self {
        Self { colors }
    }

    /// The ten-color categorical sequence
    pub fn category10() -> Self {
        Self::new(
            [
                "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2",
                "#7f7f7f", "#bcbd22", "#17becf",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        )
    }

    pub fn values(&self) -> &[String] {
        &self.colors
    }

    pub fn assign<S: AsRef<str>>(
        &self,
        table: &Table,
        columns: &[S],
    ) -> Result<PaletteMap<String>> {
        create_palette(table, columns, &self.colors)
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::category10()
    }
}

/// Ascending marker sizes, in pixels
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct SizePalette {
    sizes: Vec<f64>,
}

impl SizePalette {
    pub fn new(sizes: Vec<f64>) -> Self {
        Self { sizes }
    }

    pub fn default_range() -> Self {
        Self::new(vec![2.0, 4.0, 6.0, 8.0, 10.0, 12.0])
    }

    pub fn values(&self) -> &[f64] {
        &self.sizes
    }

    pub fn assign<S: AsRef<str>>(&self, table: &Table, columns: &[S]) -> Result<PaletteMap<f64>> {
        create_palette(table, columns, &self.sizes)
    }
}

impl Default for SizePalette {
    fn default() -> Self {
        Self::default_range()
    }
}

/// Marker symbols: `o` circle, `s` square, `^` triangle up, `D` diamond, `v` triangle down
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ShapePalette {
    shapes: Vec<String>,
}

impl ShapePalette {
    pub fn new(shapes: Vec<String>) -> Self {
        Self { shapes }
    }

    pub fn default_shapes() -> Self {
        Self::new(["o", "s", "^", "D", "v"].iter().map(|s| s.to_string()).collect())
    }

    pub fn values(&self) -> &[String] {
        &self.shapes
    }

    pub fn assign<S: AsRef<str>>(
        &self,
        table: &Table,
        columns: &[S],
    ) -> Result<PaletteMap<String>> {
        create_palette(table, columns, &self.shapes)
    }
}

impl Default for ShapePalette {
    fn default() -> Self {
        Self::default_shapes()
    }
}

/// The three aesthetic palettes used when resolving a chart
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Palettes {
    pub color: ColorPalette,
    pub size: SizePalette,
    pub shape: ShapePalette,
}
