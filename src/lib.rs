// Library exports for facetgraph

pub mod chart;
pub mod columns;
pub mod csv_reader;
pub mod data;
pub mod dimension;
pub mod encoding;
pub mod error;
pub mod facet;
pub mod graph;
pub mod group;
pub mod ir;
pub mod mark;
pub mod palette;
pub mod parser;
pub mod resolve;

pub use chart::Chart;
pub use columns::{normalize, Columns};
pub use data::{Column, DataType, Table, Value};
pub use dimension::GroupedDimensionIndex;
pub use encoding::{Channel, Encoding, FacetSpec};
pub use error::PlotError;
pub use facet::FacetGridCoordinator;
pub use graph::{Backend, PlottersBackend, RecordingBackend};
pub use group::{group_by, with_index};
pub use mark::{Mark, MarkStyle};
pub use palette::{create_palette, Palettes};

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;

/// Largest accepted output side, in pixels
pub const MAX_DIMENSION: u32 = 16_384;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
    /// The draw plan as JSON, without rendering
    #[serde(rename = "json")]
    Json,
}

/// Chart-wide settings, passed explicitly to every chart.
///
/// Defaults: a 10x6 inch figure at 80 dpi (800x480 pixels), 14pt titles,
/// 12pt axis labels, grid lines on, category10/ascending/`o s ^ D v` palettes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_figsize")]
    pub figsize: (f64, f64),
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    #[serde(default = "default_title_fontsize")]
    pub title_fontsize: u32,
    #[serde(default = "default_label_fontsize")]
    pub label_fontsize: u32,
    #[serde(default = "default_grid")]
    pub grid: bool,
    #[serde(default)]
    pub palettes: Palettes,
}

fn default_figsize() -> (f64, f64) { (10.0, 6.0) }
fn default_dpi() -> u32 { 80 }
fn default_title_fontsize() -> u32 { 14 }
fn default_label_fontsize() -> u32 { 12 }
fn default_grid() -> bool { true }

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            figsize: default_figsize(),
            dpi: default_dpi(),
            title_fontsize: default_title_fontsize(),
            label_fontsize: default_label_fontsize(),
            grid: default_grid(),
            palettes: Palettes::default(),
        }
    }
}

impl ChartConfig {
    pub fn from_json_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.pixel_size()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("Invalid config '{}'", path.display()))
    }

    /// Output size in pixels. Each side must land in `1..=MAX_DIMENSION`.
    pub fn pixel_size(&self) -> anyhow::Result<(u32, u32)> {
        let (w, h) = self.figsize;
        let side = |inches: f64| -> anyhow::Result<u32> {
            let px = (inches * self.dpi as f64).round();
            if !(1.0..=MAX_DIMENSION as f64).contains(&px) {
                anyhow::bail!(
                    "Figure size {}x{} at {} dpi must be 1 to {} pixels per side",
                    w,
                    h,
                    self.dpi,
                    MAX_DIMENSION
                );
            }
            Ok(px as u32)
        };
        Ok((side(w)?, side(h)?))
    }
}
