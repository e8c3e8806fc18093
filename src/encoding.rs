// Declarative encoding and facet specifications

use crate::columns::Columns;
use crate::error::Result;
use crate::parser::{parse_expression, Expr};

/// Where a channel's values come from
#[derive(Debug, Clone, PartialEq)]
pub enum Channel {
    /// An existing column, by name
    Column(String),
    /// An arithmetic expression, materialized as a column named by its source text
    Computed { source: String, expr: Expr },
}

impl Channel {
    pub fn column(name: impl Into<String>) -> Self {
        Channel::Column(name.into())
    }

    /// Parse an expression once, up front
    pub fn expr(source: &str) -> Result<Self> {
        let expr = parse_expression(source)?;
        Ok(Channel::Computed {
            source: source.trim().to_string(),
            expr,
        })
    }

    /// Command-line form: `=expr` is an expression, anything else a column name
    pub fn parse(arg: &str) -> Result<Self> {
        match arg.strip_prefix('=') {
            Some(source) => Self::expr(source),
            None => Ok(Self::column(arg)),
        }
    }

    /// Name of the column holding this channel's values once resolved
    pub fn name(&self) -> &str {
        match self {
            Channel::Column(name) => name,
            Channel::Computed { source, .. } => source,
        }
    }
}

impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        Channel::column(name)
    }
}

impl From<String> for Channel {
    fn from(name: String) -> Self {
        Channel::Column(name)
    }
}

/// Channel bindings. `x` and `y` take one channel; `color`, `size` and
/// `shape` take zero or more, forming a composite key.
///
/// Every setter returns a new value and leaves `self` untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encoding {
    pub x: Option<Channel>,
    pub y: Option<Channel>,
    pub color: Option<Vec<Channel>>,
    pub size: Option<Vec<Channel>>,
    pub shape: Option<Vec<Channel>>,
}

fn channels(columns: impl Into<Columns>) -> Vec<Channel> {
    columns.into().into_vec().into_iter().map(Channel::Column).collect()
}

impl Encoding {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn x(&self, channel: impl Into<Channel>) -> Self {
        Self {
            x: Some(channel.into()),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn y(&self, channel: impl Into<Channel>) -> Self {
        Self {
            y: Some(channel.into()),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn color(&self, columns: impl Into<Columns>) -> Self {
        Self {
            color: Some(channels(columns)),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn size(&self, columns: impl Into<Columns>) -> Self {
        Self {
            size: Some(channels(columns)),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn shape(&self, columns: impl Into<Columns>) -> Self {
        Self {
            shape: Some(channels(columns)),
            ..self.clone()
        }
    }

    /// Bind aesthetics to arbitrary channels, including computed ones
    #[must_use]
    pub fn color_channels(&self, channels: Vec<Channel>) -> Self {
        Self {
            color: Some(channels),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn size_channels(&self, channels: Vec<Channel>) -> Self {
        Self {
            size: Some(channels),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn shape_channels(&self, channels: Vec<Channel>) -> Self {
        Self {
            shape: Some(channels),
            ..self.clone()
        }
    }

    /// Overlay the bound channels of `changes` onto this encoding
    #[must_use]
    pub fn merge(&self, changes: &Encoding) -> Self {
        Self {
            x: changes.x.clone().or_else(|| self.x.clone()),
            y: changes.y.clone().or_else(|| self.y.clone()),
            color: changes.color.clone().or_else(|| self.color.clone()),
            size: changes.size.clone().or_else(|| self.size.clone()),
            shape: changes.shape.clone().or_else(|| self.shape.clone()),
        }
    }

    /// All bound channels, positional first
    pub fn all_channels(&self) -> impl Iterator<Item = &Channel> {
        self.x
            .iter()
            .chain(self.y.iter())
            .chain(self.color.iter().flatten())
            .chain(self.size.iter().flatten())
            .chain(self.shape.iter().flatten())
    }
}

/// Facet layout: row columns, column columns and an optional wrap limit.
/// Setters are replace-on-write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetSpec {
    pub row: Vec<String>,
    pub col: Vec<String>,
    pub wrap: Option<usize>,
}

impl FacetSpec {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn row(&self, columns: impl Into<Columns>) -> Self {
        Self {
            row: columns.into().into_vec(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn col(&self, columns: impl Into<Columns>) -> Self {
        Self {
            col: columns.into().into_vec(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn wrap(&self, limit: usize) -> Self {
        Self {
            wrap: Some(limit),
            ..self.clone()
        }
    }

    pub fn is_faceted(&self) -> bool {
        !self.row.is_empty() || !self.col.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_do_not_mutate() {
        let base = Encoding::new().x("a");
        let derived = base.y("b").color(["c", "d"]);
        assert_eq!(base.y, None);
        assert_eq!(base.color, None);
        assert_eq!(derived.x, Some(Channel::column("a")));
        assert_eq!(
            derived.color,
            Some(vec![Channel::column("c"), Channel::column("d")])
        );
    }

    #[test]
    fn test_merge_overrides_bound_channels_only() {
        let base = Encoding::new().x("a").y("b").shape("s");
        let merged = base.merge(&Encoding::new().y("z").color("c"));
        assert_eq!(merged.x, Some(Channel::column("a")));
        assert_eq!(merged.y, Some(Channel::column("z")));
        assert_eq!(merged.color, Some(vec![Channel::column("c")]));
        assert_eq!(merged.shape, Some(vec![Channel::column("s")]));
    }

    #[test]
    fn test_empty_aesthetic_is_bound() {
        let enc = Encoding::new().color(Columns::none());
        assert_eq!(enc.color, Some(Vec::new()));
    }

    #[test]
    fn test_channel_parse() {
        assert_eq!(Channel::parse("mass").unwrap(), Channel::column("mass"));
        let computed = Channel::parse("= mass / 1000 ").unwrap();
        assert_eq!(computed.name(), "mass / 1000");
        assert!(matches!(computed, Channel::Computed { .. }));
        assert!(Channel::parse("=mass /").is_err());
    }

    #[test]
    fn test_facet_spec_replace_on_write() {
        let base = FacetSpec::new().row("a");
        let wrapped = base.col(["b", "c"]).wrap(3);
        assert_eq!(base.col, Vec::<String>::new());
        assert_eq!(base.wrap, None);
        assert_eq!(wrapped.row, vec!["a"]);
        assert_eq!(wrapped.col, vec!["b", "c"]);
        assert_eq!(wrapped.wrap, Some(3));
        assert!(wrapped.is_faceted());
        assert!(!FacetSpec::new().is_faceted());
    }
}
