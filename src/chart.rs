// Immutable chart builder: data, encoding, facet, mark and config

use crate::data::Table;
use crate::encoding::{Encoding, FacetSpec};
use crate::error::{PlotError, Result};
use crate::facet::FacetGridCoordinator;
use crate::graph::{Backend, PlottersBackend};
use crate::ir::DrawPlan;
use crate::mark::{Mark, MarkStyle};
use crate::{ChartConfig, OutputFormat};
use std::sync::Arc;
use tracing::info;

/// A declarative chart. Every builder method returns a new chart; the
/// receiver is left unchanged and the table is shared, not copied.
#[derive(Debug, Clone)]
pub struct Chart {
    table: Arc<Table>,
    encoding: Encoding,
    facet: FacetSpec,
    mark: Option<Mark>,
    config: ChartConfig,
}

impl Chart {
    pub fn new(table: impl Into<Arc<Table>>) -> Self {
        Self {
            table: table.into(),
            encoding: Encoding::default(),
            facet: FacetSpec::default(),
            mark: None,
            config: ChartConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(&self, config: ChartConfig) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    /// Bind channels; channels already bound and absent from `encoding` are kept
    #[must_use]
    pub fn encode(&self, encoding: &Encoding) -> Self {
        Self {
            encoding: self.encoding.merge(encoding),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn mark(&self, mark: Mark) -> Self {
        Self {
            mark: Some(mark),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn mark_point(&self) -> Self {
        self.mark(Mark::Point(MarkStyle::default()))
    }

    #[must_use]
    pub fn mark_line(&self) -> Self {
        self.mark(Mark::Line(MarkStyle::default()))
    }

    #[must_use]
    pub fn mark_bar(&self) -> Self {
        self.mark(Mark::Bar(MarkStyle::default()))
    }

    #[must_use]
    pub fn facet(&self, facet: &FacetSpec) -> Self {
        Self {
            facet: facet.clone(),
            ..self.clone()
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn facet_spec(&self) -> &FacetSpec {
        &self.facet
    }

    pub fn current_mark(&self) -> Option<&Mark> {
        self.mark.as_ref()
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Build a fresh coordinator; nothing is cached between calls
    pub fn coordinator(&self) -> Result<FacetGridCoordinator> {
        FacetGridCoordinator::with_palettes(
            &self.table,
            &self.encoding,
            &self.facet,
            &self.config.palettes,
        )
    }

    pub fn plan(&self) -> Result<DrawPlan> {
        self.coordinator()?.plan()
    }

    /// Validate, then draw every group onto `backend`.
    ///
    /// All checks run before the first backend call, so a failed display
    /// leaves the backend untouched.
    pub fn display(&self, backend: &mut dyn Backend) -> Result<()> {
        // 1. Validate the chart definition
        let mark = self.mark.as_ref().ok_or(PlotError::UnboundMark)?;
        if self.encoding.x.is_none() {
            return Err(PlotError::MissingChannel("x"));
        }
        if self.encoding.y.is_none() {
            return Err(PlotError::MissingChannel("y"));
        }

        // 2. Resolve the grid and check positional columns exist
        let coordinator = self.coordinator()?;
        let resolved = coordinator.encoding();
        let x_col = resolved.x.as_deref().ok_or(PlotError::MissingChannel("x"))?;
        let y_col = resolved.y.as_deref().ok_or(PlotError::MissingChannel("y"))?;
        coordinator.table().column(x_col)?;
        coordinator.table().column(y_col)?;

        let instructions = coordinator.emit()?;
        let grid = coordinator.grid_shape();
        info!(
            mark = mark.name(),
            n_rows = grid.n_rows,
            n_cols = grid.n_cols,
            groups = instructions.len(),
            "displaying chart"
        );

        // 3. Draw
        backend.prepare(grid)?;
        for instruction in &instructions {
            if !instruction.title.is_empty() {
                backend.set_title(instruction.subplot, &instruction.title)?;
            }
            let x = &instruction.data.column(x_col)?.values;
            let y = &instruction.data.column(y_col)?.values;
            mark.plot(backend, instruction.subplot, x, y, &instruction.style)?;
        }
        Ok(())
    }

    /// Render to bytes: PNG, SVG, or the JSON draw plan
    pub fn render(&self, format: OutputFormat) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Json => {
                let plan = self.plan()?;
                let json = serde_json::to_vec_pretty(&plan).map_err(anyhow::Error::from)?;
                Ok(json)
            }
            OutputFormat::Png => {
                let mut backend = PlottersBackend::new(self.config.clone());
                self.display(&mut backend)?;
                Ok(backend.render_png()?)
            }
            OutputFormat::Svg => {
                let mut backend = PlottersBackend::new(self.config.clone());
                self.display(&mut backend)?;
                Ok(backend.render_svg()?.into_bytes())
            }
        }
    }
}
