// Mark variants and their dispatch to backend primitives

use crate::data::Value;
use crate::graph::{Backend, BarStyle, LineStyle, PointStyle};
use crate::ir::{Style, Subplot};
use anyhow::Result;

/// Fixed visual properties of a mark, overridden per group by mapped aesthetics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkStyle {
    pub color: Option<String>,
    pub size: Option<f64>,
    pub shape: Option<String>,
    pub alpha: Option<f64>,
}

impl MarkStyle {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn color(&self, color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn size(&self, size: f64) -> Self {
        Self {
            size: Some(size),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn shape(&self, shape: impl Into<String>) -> Self {
        Self {
            shape: Some(shape.into()),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn alpha(&self, alpha: f64) -> Self {
        Self {
            alpha: Some(alpha),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    Point(MarkStyle),
    Line(MarkStyle),
    Bar(MarkStyle),
}

impl Mark {
    pub fn name(&self) -> &'static str {
        match self {
            Mark::Point(_) => "point",
            Mark::Line(_) => "line",
            Mark::Bar(_) => "bar",
        }
    }

    /// Draw one group. Mapped aesthetics in `style` win over the mark's fixed style.
    pub fn plot(
        &self,
        backend: &mut dyn Backend,
        subplot: Subplot,
        x: &[Value],
        y: &[Value],
        style: &Style,
    ) -> Result<()> {
        match self {
            Mark::Point(fixed) => {
                let point = PointStyle {
                    color: style.color.clone().or_else(|| fixed.color.clone()),
                    size: style.size.or(fixed.size),
                    shape: style.shape.clone().or_else(|| fixed.shape.clone()),
                    alpha: fixed.alpha,
                };
                backend.scatter(subplot, x, y, &point)
            }
            Mark::Line(fixed) => {
                // Size maps to stroke width
                let line = LineStyle {
                    color: style.color.clone().or_else(|| fixed.color.clone()),
                    width: style.size.or(fixed.size),
                    alpha: fixed.alpha,
                };
                backend.line(subplot, x, y, &line)
            }
            Mark::Bar(fixed) => {
                let bar = BarStyle {
                    color: style.color.clone().or_else(|| fixed.color.clone()),
                    alpha: fixed.alpha,
                    width: None,
                };
                backend.bar(subplot, x, y, &bar)
            }
        }
    }
}

impl std::str::FromStr for Mark {
    type Err = crate::error::PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "point" => Ok(Mark::Point(MarkStyle::default())),
            "line" => Ok(Mark::Line(MarkStyle::default())),
            "bar" => Ok(Mark::Bar(MarkStyle::default())),
            other => Err(crate::error::PlotError::Unsupported(format!(
                "unknown mark '{}' (expected point, line or bar)",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{DrawCall, RecordingBackend};

    const SP: Subplot = Subplot { row: 0, col: 1 };

    fn xy() -> (Vec<Value>, Vec<Value>) {
        (vec![Value::Int(1), Value::Int(2)], vec![Value::float(0.5), Value::float(1.5)])
    }

    #[test]
    fn test_point_mapped_style_wins() {
        let (x, y) = xy();
        let mark = Mark::Point(MarkStyle::new().color("red").size(5.0).alpha(0.5));
        let style = Style {
            color: Some("#1f77b4".to_string()),
            size: None,
            shape: Some("s".to_string()),
        };
        let mut backend = RecordingBackend::new();
        mark.plot(&mut backend, SP, &x, &y, &style).unwrap();

        assert_eq!(
            backend.calls,
            vec![DrawCall::Scatter {
                subplot: SP,
                x,
                y,
                style: PointStyle {
                    color: Some("#1f77b4".to_string()),
                    size: Some(5.0),
                    shape: Some("s".to_string()),
                    alpha: Some(0.5),
                },
            }]
        );
    }

    #[test]
    fn test_line_uses_size_as_width() {
        let (x, y) = xy();
        let style = Style {
            size: Some(4.0),
            ..Style::default()
        };
        let mut backend = RecordingBackend::new();
        Mark::Line(MarkStyle::new())
            .plot(&mut backend, SP, &x, &y, &style)
            .unwrap();
        match &backend.calls[0] {
            DrawCall::Line { style, .. } => assert_eq!(style.width, Some(4.0)),
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_bar_ignores_size_and_shape() {
        let (x, y) = xy();
        let style = Style {
            color: Some("green".to_string()),
            size: Some(8.0),
            shape: Some("D".to_string()),
        };
        let mut backend = RecordingBackend::new();
        Mark::Bar(MarkStyle::new())
            .plot(&mut backend, SP, &x, &y, &style)
            .unwrap();
        match &backend.calls[0] {
            DrawCall::Bar { style, .. } => assert_eq!(
                *style,
                BarStyle {
                    color: Some("green".to_string()),
                    alpha: None,
                    width: None,
                }
            ),
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("bar".parse::<Mark>().unwrap().name(), "bar");
        assert!("area".parse::<Mark>().is_err());
    }
}
