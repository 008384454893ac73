// finboard: normalize financial API responses and render widget data from the command line.
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use shared::utils::{extract_table_rows, fields_for_mode, search_fields};
use shared::widget::{ChartType, DisplayMode, WidgetConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use engine::chart;
use engine::config::EngineSettings;
use engine::logging::init_logging;
use engine::ohlc;
use engine::providers;
use engine::services::{JsonFileSource, WidgetService};

#[derive(Parser)]
#[command(name = "finboard", about = "Financial dashboard data engine", version)]
struct Cli {
    /// JSON settings file (environment variables still override it)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize saved API responses into OHLC series
    Normalize {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the detected source format of a response
    Detect { file: PathBuf },
    /// Project a response onto chart points
    Chart(ChartArgs),
    /// List the selectable fields of a response
    Fields(FieldsArgs),
    /// Print the table rows extracted from an array in a response
    Table { file: PathBuf, array_path: String },
    /// Show how a URL would be routed (API key values are redacted)
    Route { url: String },
    /// Render stored widgets against canned responses
    Render {
        /// JSON array of widget configurations
        widgets: PathBuf,
        /// JSON object mapping request URLs to responses
        #[arg(long)]
        responses: PathBuf,
    },
}

#[derive(Args)]
struct ChartArgs {
    file: PathBuf,
    #[arg(long, value_enum, default_value_t = ChartKind::Candlestick)]
    chart_type: ChartKind,
}

#[derive(Args)]
struct FieldsArgs {
    file: PathBuf,
    #[arg(long, value_enum, default_value_t = ModeKind::Card)]
    mode: ModeKind,
    /// Array to list item fields of (table mode)
    #[arg(long)]
    array_path: Option<String>,
    /// Fuzzy filter over field paths and values
    #[arg(long)]
    search: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ChartKind {
    Candlestick,
    Linear,
}

impl From<ChartKind> for ChartType {
    fn from(kind: ChartKind) -> Self {
        match kind {
            ChartKind::Candlestick => ChartType::Candlestick,
            ChartKind::Linear => ChartType::Linear,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeKind {
    Card,
    Table,
    Chart,
}

impl From<ModeKind> for DisplayMode {
    fn from(kind: ModeKind) -> Self {
        match kind {
            ModeKind::Card => DisplayMode::Card,
            ModeKind::Table => DisplayMode::Table,
            ModeKind::Chart => DisplayMode::Chart,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = EngineSettings::load(cli.config.as_deref())?;
    init_logging(&settings.log_level);

    match cli.command {
        Command::Normalize { files } => normalize(files).await,
        Command::Detect { file } => {
            let response = read_json(&file)?;
            println!("{}", ohlc::detect_data_format(&response));
            Ok(())
        }
        Command::Chart(args) => {
            let response = read_json(&args.file)?;
            let series = chart::chart_from_response(&response, args.chart_type.into())?;
            print_json(&series)
        }
        Command::Fields(args) => {
            let response = read_json(&args.file)?;
            let mut fields = fields_for_mode(&response, args.mode.into(), args.array_path.as_deref());
            if let Some(term) = args.search.as_deref() {
                fields = search_fields(fields, term);
            }
            print_json(&json!({
                "fields": fields,
                "displayModes": chart::available_display_modes(&response),
            }))
        }
        Command::Table { file, array_path } => {
            let response = read_json(&file)?;
            print_json(&extract_table_rows(&response, Some(&array_path)))
        }
        Command::Route { url } => route(&url, &settings),
        Command::Render { widgets, responses } => render(&settings, &widgets, &responses).await,
    }
}

// Each file is read and mapped on the blocking pool; output keeps argument order
async fn normalize(files: Vec<PathBuf>) -> Result<()> {
    let handles: Vec<_> = files
        .into_iter()
        .map(|file| {
            tokio::task::spawn_blocking(move || -> Result<Value> {
                let response = read_json(&file)?;
                let result = ohlc::map_to_ohlc(&response);
                info!(file = %file.display(), format = %result.format, points = result.data.len(), "Normalized response");
                Ok(json!({ "file": file.display().to_string(), "result": result }))
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        results.push(handle.await??);
    }
    print_json(&results)
}

fn route(url: &str, settings: &EngineSettings) -> Result<()> {
    let routed = providers::route_request(url, &settings.api_keys)?;
    let headers: Vec<Value> = routed
        .headers
        .iter()
        .map(|(name, value)| {
            let shown = if name.eq_ignore_ascii_case("accept") { value.as_str() } else { "<redacted>" };
            json!({ "name": name, "value": shown })
        })
        .collect();
    print_json(&json!({
        "provider": routed.provider,
        "keyInjected": routed.key_applied,
        "headers": headers,
    }))
}

async fn render(settings: &EngineSettings, widgets: &Path, responses: &Path) -> Result<()> {
    let widgets: Vec<WidgetConfig> = serde_json::from_value(read_json(widgets)?)
        .with_context(|| format!("'{}' is not a list of widget configurations", widgets.display()))?;
    let source = JsonFileSource::from_file(responses)?;
    let service = Arc::new(WidgetService::new(settings, Arc::new(source)));

    let handles: Vec<_> = widgets
        .into_iter()
        .map(|widget| {
            let service = Arc::clone(&service);
            tokio::task::spawn_blocking(move || {
                let view = service.refresh(&widget);
                (widget, view)
            })
        })
        .collect();

    let mut rendered = Vec::with_capacity(handles.len());
    for handle in handles {
        let (widget, view) = handle.await?;
        let entry = match view {
            Ok(view) => json!({ "id": widget.id, "name": widget.name, "view": view }),
            Err(e) => {
                tracing::warn!(widget = %widget.name, kind = e.kind(), error = %e, "Widget refresh failed");
                json!({ "id": widget.id, "name": widget.name, "error": e.to_string() })
            }
        };
        rendered.push(entry);
    }

    print_json(&json!({
        "renderedAt": chrono::Utc::now().to_rfc3339(),
        "widgets": rendered,
        "cache": service.cache_stats(),
    }))
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("'{}' is not valid JSON", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
