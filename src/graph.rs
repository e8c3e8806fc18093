use crate::data::Value;
use crate::ir::{GridShape, Subplot};
use crate::ChartConfig;
use anyhow::{anyhow, Context, Result};
use image::ImageEncoder;
use indexmap::IndexMap;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;

/// Style configuration for line layers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineStyle {
    pub color: Option<String>,
    pub width: Option<f64>,
    pub alpha: Option<f64>,
}

/// Style configuration for point layers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointStyle {
    pub color: Option<String>,
    pub size: Option<f64>,
    pub shape: Option<String>,
    pub alpha: Option<f64>,
}

/// Style configuration for bar layers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarStyle {
    pub color: Option<String>,
    pub alpha: Option<f64>,
    pub width: Option<f64>,
}

/// A drawing target for a grid of subplots.
///
/// Marks call exactly one primitive per group; implementations must not rely
/// on state shared between calls beyond what they record themselves.
pub trait Backend {
    /// Called once, before any other call, with the final grid dimensions
    fn prepare(&mut self, grid: GridShape) -> Result<()>;

    fn set_title(&mut self, subplot: Subplot, title: &str) -> Result<()>;

    fn scatter(
        &mut self,
        subplot: Subplot,
        x: &[Value],
        y: &[Value],
        style: &PointStyle,
    ) -> Result<()>;

    fn line(
        &mut self,
        subplot: Subplot,
        x: &[Value],
        y: &[Value],
        style: &LineStyle,
    ) -> Result<()>;

    fn bar(
        &mut self,
        subplot: Subplot,
        x: &[Value],
        y: &[Value],
        style: &BarStyle,
    ) -> Result<()>;
}

// =============================================================================
// Recording backend
// =============================================================================

/// One call received by a [`RecordingBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Prepare(GridShape),
    Title {
        subplot: Subplot,
        title: String,
    },
    Scatter {
        subplot: Subplot,
        x: Vec<Value>,
        y: Vec<Value>,
        style: PointStyle,
    },
    Line {
        subplot: Subplot,
        x: Vec<Value>,
        y: Vec<Value>,
        style: LineStyle,
    },
    Bar {
        subplot: Subplot,
        x: Vec<Value>,
        y: Vec<Value>,
        style: BarStyle,
    },
}

/// Records every call instead of drawing
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    pub calls: Vec<DrawCall>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for RecordingBackend {
    fn prepare(&mut self, grid: GridShape) -> Result<()> {
        self.calls.push(DrawCall::Prepare(grid));
        Ok(())
    }

    fn set_title(&mut self, subplot: Subplot, title: &str) -> Result<()> {
        self.calls.push(DrawCall::Title {
            subplot,
            title: title.to_string(),
        });
        Ok(())
    }

    fn scatter(
        &mut self,
        subplot: Subplot,
        x: &[Value],
        y: &[Value],
        style: &PointStyle,
    ) -> Result<()> {
        self.calls.push(DrawCall::Scatter {
            subplot,
            x: x.to_vec(),
            y: y.to_vec(),
            style: style.clone(),
        });
        Ok(())
    }

    fn line(
        &mut self,
        subplot: Subplot,
        x: &[Value],
        y: &[Value],
        style: &LineStyle,
    ) -> Result<()> {
        self.calls.push(DrawCall::Line {
            subplot,
            x: x.to_vec(),
            y: y.to_vec(),
            style: style.clone(),
        });
        Ok(())
    }

    fn bar(
        &mut self,
        subplot: Subplot,
        x: &[Value],
        y: &[Value],
        style: &BarStyle,
    ) -> Result<()> {
        self.calls.push(DrawCall::Bar {
            subplot,
            x: x.to_vec(),
            y: y.to_vec(),
            style: style.clone(),
        });
        Ok(())
    }
}

// =============================================================================
// Plotters backend
// =============================================================================

#[derive(Debug, Clone)]
enum Layer {
    Points(Vec<(Value, f64)>, PointStyle),
    Line(Vec<(Value, f64)>, LineStyle),
    Bars(Vec<(Value, f64)>, BarStyle),
}

impl Layer {
    fn data(&self) -> &[(Value, f64)] {
        match self {
            Layer::Points(d, _) | Layer::Line(d, _) | Layer::Bars(d, _) => d,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Panel {
    title: Option<String>,
    layers: Vec<Layer>,
}

/// Axis ranges shared by every subplot
#[derive(Debug, Clone, PartialEq)]
struct Scales {
    x: Range<f64>,
    y: Range<f64>,
    /// Set when the x axis is categorical; categories sit at `index + 0.5`
    categories: Option<Vec<String>>,
}

impl Scales {
    fn position(&self, x: &Value) -> f64 {
        match &self.categories {
            Some(cats) => {
                let label = x.to_string();
                cats.iter().position(|c| *c == label).unwrap_or(0) as f64 + 0.5
            }
            None => x.as_f64().unwrap_or(0.0),
        }
    }
}

/// Buffers the primitives for every subplot, then draws the whole grid with
/// shared axes onto a bitmap (PNG) or SVG surface.
#[derive(Debug, Clone)]
pub struct PlottersBackend {
    config: ChartConfig,
    grid: GridShape,
    panels: IndexMap<Subplot, Panel>,
}

impl PlottersBackend {
    pub fn new(config: ChartConfig) -> Self {
        Self {
            config,
            grid: GridShape { n_rows: 1, n_cols: 1 },
            panels: IndexMap::new(),
        }
    }

    fn panel(&mut self, subplot: Subplot) -> Result<&mut Panel> {
        if subplot.row >= self.grid.n_rows || subplot.col >= self.grid.n_cols {
            anyhow::bail!(
                "Subplot ({}, {}) outside the {}x{} grid",
                subplot.row,
                subplot.col,
                self.grid.n_rows,
                self.grid.n_cols
            );
        }
        Ok(self.panels.entry(subplot).or_default())
    }

    /// Finalize and encode the grid as PNG
    pub fn render_png(&self) -> Result<Vec<u8>> {
        let (width, height) = self.config.pixel_size()?;
        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            self.draw(&root)?;
            root.present()
                .map_err(|e| anyhow!("Failed to present drawing: {}", e))?;
        }

        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(&buffer, width, height, image::ColorType::Rgb8)
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }

    /// Finalize the grid as an SVG document
    pub fn render_svg(&self) -> Result<String> {
        let (width, height) = self.config.pixel_size()?;
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
            self.draw(&root)?;
            root.present()
                .map_err(|e| anyhow!("Failed to present drawing: {}", e))?;
        }
        Ok(svg)
    }

    fn scales(&self) -> Scales {
        let layers: Vec<&Layer> = self.panels.values().flat_map(|p| p.layers.iter()).collect();

        let has_bars = layers.iter().any(|l| matches!(l, Layer::Bars(..)));
        let all_numeric = layers
            .iter()
            .flat_map(|l| l.data())
            .all(|(x, _)| x.as_f64().is_some());

        let categories = if has_bars || !all_numeric {
            // Order of first appearance across subplots
            let mut cats: Vec<String> = Vec::new();
            for (x, _) in layers.iter().flat_map(|l| l.data()) {
                let label = x.to_string();
                if !cats.contains(&label) {
                    cats.push(label);
                }
            }
            Some(cats)
        } else {
            None
        };

        let x = match &categories {
            Some(cats) => 0.0..(cats.len().max(1) as f64),
            None => padded_range(
                layers
                    .iter()
                    .flat_map(|l| l.data())
                    .filter_map(|(x, _)| x.as_f64()),
            ),
        };

        let mut ys: Vec<f64> = layers.iter().flat_map(|l| l.data()).map(|(_, y)| *y).collect();
        if has_bars {
            ys.push(0.0);
        }
        let y = padded_range(ys.into_iter());

        Scales { x, y, categories }
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        root.fill(&WHITE)
            .map_err(|e| anyhow!("Failed to fill background: {}", e))?;

        let scales = self.scales();
        let areas = root.split_evenly((self.grid.n_rows, self.grid.n_cols));
        for (i, area) in areas.iter().enumerate() {
            let subplot = Subplot {
                row: i / self.grid.n_cols,
                col: i % self.grid.n_cols,
            };
            self.draw_panel(area, self.panels.get(&subplot), &scales)?;
        }
        Ok(())
    }

    fn draw_panel<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        panel: Option<&Panel>,
        scales: &Scales,
    ) -> Result<()> {
        let mut builder = ChartBuilder::on(area);
        builder.margin(10).x_label_area_size(30).y_label_area_size(40);
        if let Some(title) = panel.and_then(|p| p.title.as_deref()).filter(|t| !t.is_empty()) {
            builder.caption(title, ("sans-serif", self.config.title_fontsize as f64));
        }
        let mut chart = builder
            .build_cartesian_2d(scales.x.clone(), scales.y.clone())
            .map_err(|e| anyhow!("Failed to build chart: {}", e))?;

        // Configure mesh with category labels on a categorical x axis
        let category_label = |x: &f64| -> String {
            let idx = x.floor();
            match &scales.categories {
                Some(cats) if idx >= 0.0 && (idx as usize) < cats.len() => {
                    cats[idx as usize].clone()
                }
                _ => String::new(),
            }
        };
        {
            let mut mesh = chart.configure_mesh();
            mesh.label_style(("sans-serif", self.config.label_fontsize as f64));
            if !self.config.grid {
                mesh.disable_mesh();
            }
            if let Some(cats) = &scales.categories {
                mesh.x_labels(cats.len()).x_label_formatter(&category_label);
            }
            mesh.draw()
                .map_err(|e| anyhow!("Failed to draw mesh: {}", e))?;
        }

        let Some(panel) = panel else {
            return Ok(());
        };

        for layer in &panel.layers {
            match layer {
                Layer::Points(data, style) => {
                    let color = parse_color(style.color.as_deref()).mix(style.alpha.unwrap_or(1.0));
                    let size = style.size.unwrap_or(3.0).round() as i32;
                    for (xv, y) in data {
                        let coord = (scales.position(xv), *y);
                        match marker_vertices(style.shape.as_deref(), size) {
                            Some(vertices) => {
                                chart
                                    .draw_series(std::iter::once(
                                        EmptyElement::at(coord)
                                            + Polygon::new(vertices, color.filled()),
                                    ))
                                    .map_err(|e| anyhow!("Failed to draw point: {}", e))?;
                            }
                            None => {
                                chart
                                    .draw_series(std::iter::once(Circle::new(
                                        coord,
                                        size,
                                        color.filled(),
                                    )))
                                    .map_err(|e| anyhow!("Failed to draw point: {}", e))?;
                            }
                        }
                    }
                }
                Layer::Line(data, style) => {
                    let color = parse_color(style.color.as_deref()).mix(style.alpha.unwrap_or(1.0));
                    let width = style.width.unwrap_or(1.0).round().max(1.0) as u32;
                    let points: Vec<(f64, f64)> =
                        data.iter().map(|(x, y)| (scales.position(x), *y)).collect();
                    chart
                        .draw_series(LineSeries::new(points, color.stroke_width(width)))
                        .map_err(|e| anyhow!("Failed to draw line series: {}", e))?;
                }
                Layer::Bars(data, style) => {
                    let color = parse_color(style.color.as_deref()).mix(style.alpha.unwrap_or(1.0));
                    let bar_width = style.width.unwrap_or(0.8);
                    for (xv, y) in data {
                        let x_center = scales.position(xv);
                        chart
                            .draw_series(std::iter::once(Rectangle::new(
                                [
                                    (x_center - bar_width / 2.0, 0.0),
                                    (x_center + bar_width / 2.0, *y),
                                ],
                                color.filled(),
                            )))
                            .map_err(|e| anyhow!("Failed to draw bar: {}", e))?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl Backend for PlottersBackend {
    fn prepare(&mut self, grid: GridShape) -> Result<()> {
        if grid.n_rows == 0 || grid.n_cols == 0 {
            anyhow::bail!("Grid must have at least one row and one column");
        }
        self.grid = grid;
        self.panels.clear();
        Ok(())
    }

    fn set_title(&mut self, subplot: Subplot, title: &str) -> Result<()> {
        self.panel(subplot)?.title = Some(title.to_string());
        Ok(())
    }

    fn scatter(
        &mut self,
        subplot: Subplot,
        x: &[Value],
        y: &[Value],
        style: &PointStyle,
    ) -> Result<()> {
        let data = pairs(x, y)?;
        self.panel(subplot)?.layers.push(Layer::Points(data, style.clone()));
        Ok(())
    }

    fn line(
        &mut self,
        subplot: Subplot,
        x: &[Value],
        y: &[Value],
        style: &LineStyle,
    ) -> Result<()> {
        let data = pairs(x, y)?;
        self.panel(subplot)?.layers.push(Layer::Line(data, style.clone()));
        Ok(())
    }

    fn bar(
        &mut self,
        subplot: Subplot,
        x: &[Value],
        y: &[Value],
        style: &BarStyle,
    ) -> Result<()> {
        let data = pairs(x, y)?;
        self.panel(subplot)?.layers.push(Layer::Bars(data, style.clone()));
        Ok(())
    }
}

/// Zip x and y, dropping rows where either is null. Y must be numeric.
fn pairs(x: &[Value], y: &[Value]) -> Result<Vec<(Value, f64)>> {
    if x.len() != y.len() {
        anyhow::bail!(
            "X and Y data must have the same length (x: {}, y: {})",
            x.len(),
            y.len()
        );
    }
    let mut out = Vec::with_capacity(x.len());
    for (xv, yv) in x.iter().zip(y) {
        if xv.is_null() || yv.is_null() {
            continue;
        }
        let y = yv
            .as_f64()
            .ok_or_else(|| anyhow!("Y values must be numeric, got '{}'", yv))?;
        out.push((xv.clone(), y));
    }
    Ok(out)
}

/// Data range with 5% padding on each side; a single value gets +/- 1
fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min > max {
        0.0..1.0
    } else if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

/// Pixel-space polygon for a marker symbol; `None` means a circle
fn marker_vertices(shape: Option<&str>, size: i32) -> Option<Vec<(i32, i32)>> {
    let s = size.max(1);
    match shape {
        Some("s") => Some(vec![(-s, -s), (s, -s), (s, s), (-s, s)]),
        Some("^") => Some(vec![(0, -s), (s, s), (-s, s)]),
        Some("v") => Some(vec![(0, s), (s, -s), (-s, -s)]),
        Some("D") => Some(vec![(0, -s), (s, 0), (0, s), (-s, 0)]),
        _ => None,
    }
}

/// Parse a `#rrggbb` or named color; anything else falls back to the first palette color
fn parse_color(color: Option<&str>) -> RGBColor {
    const DEFAULT: RGBColor = RGBColor(0x1f, 0x77, 0xb4);
    match color {
        Some(hex) if hex.len() == 7 && hex.is_ascii() && hex.starts_with('#') => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
            match (channel(1), channel(3), channel(5)) {
                (Ok(r), Ok(g), Ok(b)) => RGBColor(r, g, b),
                _ => DEFAULT,
            }
        }
        Some("red") => RED,
        Some("green") => GREEN,
        Some("blue") => BLUE,
        Some("black") => BLACK,
        Some("yellow") => YELLOW,
        Some("cyan") => CYAN,
        Some("magenta") => MAGENTA,
        Some("white") => WHITE,
        _ => DEFAULT,
    }
}
