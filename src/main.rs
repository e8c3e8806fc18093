use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use facetgraph::csv_reader;
use facetgraph::{Channel, Chart, ChartConfig, Encoding, FacetSpec, Mark, OutputFormat, Table};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Png,
    Svg,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Png => OutputFormat::Png,
            Format::Svg => OutputFormat::Svg,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "facetgraph")]
#[command(about = "Render faceted charts from CSV data", long_about = None)]
struct Args {
    /// X channel: a column name, or `=expr` for a computed column
    #[arg(long)]
    x: Option<String>,

    /// Y channel: a column name, or `=expr` for a computed column
    #[arg(long)]
    y: Option<String>,

    /// Color columns (comma-separated)
    #[arg(long, value_delimiter = ',')]
    color: Vec<String>,

    /// Size columns (comma-separated)
    #[arg(long, value_delimiter = ',')]
    size: Vec<String>,

    /// Shape columns (comma-separated)
    #[arg(long, value_delimiter = ',')]
    shape: Vec<String>,

    /// Row facet columns (comma-separated)
    #[arg(long, value_delimiter = ',')]
    row: Vec<String>,

    /// Column facet columns (comma-separated)
    #[arg(long, value_delimiter = ',')]
    col: Vec<String>,

    /// Wrap a single facet dimension after this many subplots
    #[arg(long)]
    wrap: Option<usize>,

    /// Mark type: point, line or bar
    #[arg(long, default_value = "point")]
    mark: Mark,

    /// JSON chart configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Png)]
    format: Format,

    /// CSV input file (defaults to stdin)
    #[arg(long)]
    input: Option<PathBuf>,
}

fn channels(args: &[String]) -> Result<Option<Vec<Channel>>> {
    if args.is_empty() {
        return Ok(None);
    }
    let channels = args
        .iter()
        .map(|a| Channel::parse(a))
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid aesthetic channel")?;
    Ok(Some(channels))
}

fn build_encoding(args: &Args) -> Result<Encoding> {
    let mut encoding = Encoding::new();
    if let Some(x) = &args.x {
        encoding = encoding.x(Channel::parse(x).context("Invalid x channel")?);
    }
    if let Some(y) = &args.y {
        encoding = encoding.y(Channel::parse(y).context("Invalid y channel")?);
    }
    if let Some(color) = channels(&args.color)? {
        encoding = encoding.color_channels(color);
    }
    if let Some(size) = channels(&args.size)? {
        encoding = encoding.size_channels(size);
    }
    if let Some(shape) = channels(&args.shape)? {
        encoding = encoding.shape_channels(shape);
    }
    Ok(encoding)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ChartConfig::from_path(path)?,
        None => ChartConfig::default(),
    };

    // Read the input file (CSV, or a JSON array of records) or CSV from stdin
    let table = match &args.input {
        Some(path) if path.extension().is_some_and(|e| e == "json") => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read '{}'", path.display()))?;
            let json: serde_json::Value =
                serde_json::from_str(&text).context("Failed to parse JSON input")?;
            Table::from_json(&json)
        }
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("Failed to open '{}'", path.display()))?;
            csv_reader::read_csv(file)
        }
        None => csv_reader::read_csv_from_stdin(),
    }
    .context("Failed to read input data")?;

    let mut facet = FacetSpec::new().row(args.row.clone()).col(args.col.clone());
    if let Some(wrap) = args.wrap {
        facet = facet.wrap(wrap);
    }

    let chart = Chart::new(table)
        .with_config(config)
        .encode(&build_encoding(&args)?)
        .mark(args.mark.clone())
        .facet(&facet);

    let bytes = chart
        .render(args.format.into())
        .context("Failed to render chart")?;

    // Write output to stdout
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(&bytes)
        .context("Failed to write output to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}
