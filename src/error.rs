use thiserror::Error;

/// Errors surfaced by grouping, indexing, palette assignment and chart display.
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Mark must be defined before displaying the chart")]
    UnboundMark,

    #[error("Unknown dimension '{0}'")]
    UnknownDimension(String),

    #[error("Group index {index} out of range for {len} groups")]
    GroupOutOfRange { index: usize, len: usize },

    #[error("Unsupported configuration: {0}")]
    Unsupported(String),

    #[error("No {0} channel specified (use encode with {0}: ...)")]
    MissingChannel(&'static str),

    #[error("Column '{0}' not found")]
    UnknownColumn(String),

    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),

    #[error("Column '{name}' has {len} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        len: usize,
        expected: usize,
    },

    #[error("Palette must contain at least one value")]
    EmptyPalette,

    #[error("Expression '{expr}': {reason}")]
    Expression { expr: String, reason: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Render error: {0}")]
    Render(#[from] anyhow::Error),
}

pub type Result<T, E = PlotError> = std::result::Result<T, E>;
