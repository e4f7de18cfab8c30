//! benchview CLI - Render benchmark dashboard views from a results server

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::{debug, info};

use benchview::{
    client::ServerClient,
    html::{self, PageView},
    session::{Page, Session},
};
use benchview_core::{
    changes::ChangeInteraction, selection::parse_baseline, BenchmarkChoice, Catalog,
    ChangeSelection, ChangeTableController, ChartType, ComparisonController,
    ComparisonSelection, DashboardConfig, Event, Thresholds, TimelineController,
    TimelineInteraction,
};

/// benchview: Changes tables, comparison charts and timelines
#[derive(Parser, Debug)]
#[command(name = "benchview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the results server
    #[arg(long, global = true, env = "BENCHVIEW_SERVER", default_value = "http://localhost:8000/")]
    server: String,

    /// Path to the page catalog JSON file
    #[arg(long, global = true, env = "BENCHVIEW_CATALOG", default_value = "catalog.json")]
    catalog: PathBuf,

    /// Change threshold in percent
    #[arg(long, global = true, env = "BENCHVIEW_CHANGE_THRESHOLD", default_value = "3.0")]
    change_threshold: f64,

    /// Trend threshold in percent
    #[arg(long, global = true, env = "BENCHVIEW_TREND_THRESHOLD", default_value = "4.0")]
    trend_threshold: f64,

    /// Width of the plot container in pixels
    #[arg(long, global = true, default_value = "900")]
    width: f64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the colored changes table of one revision
    Changes(ChangesArgs),

    /// Draw comparison bar charts
    Compare(CompareArgs),

    /// Draw a timeline or the grid of miniature timelines
    Timeline(TimelineArgs),
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Write the page to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "html")]
    format: Format,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    Html,
    Json,
}

#[derive(Parser, Debug)]
struct ChangesArgs {
    /// Executable id
    #[arg(long)]
    exe: String,

    /// Environment id
    #[arg(long)]
    env: String,

    /// Revision commit id (defaults to the project's latest)
    #[arg(long)]
    rev: Option<String>,

    /// Trend depth in revisions
    #[arg(long, default_value = "10")]
    trend: u32,

    /// Sort every table by this column
    #[arg(long)]
    sort: Option<usize>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Parser, Debug)]
struct CompareArgs {
    /// Executable keys (comma-separated)
    #[arg(long, value_delimiter = ',', required = true)]
    exe: Vec<String>,

    /// Benchmark ids (comma-separated)
    #[arg(long, value_delimiter = ',', required = true)]
    ben: Vec<String>,

    /// Environment ids (comma-separated)
    #[arg(long, value_delimiter = ',', required = true)]
    env: Vec<String>,

    /// Draw horizontal bars
    #[arg(long)]
    horizontal: bool,

    /// Executable key to normalize against ("none" for no baseline)
    #[arg(long)]
    baseline: Option<String>,

    /// Chart type: "normal bars", "stacked bars" or "relative bars"
    #[arg(long, default_value = "normal bars", value_parser = parse_chart)]
    chart: ChartType,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Parser, Debug)]
struct TimelineArgs {
    /// URL query of the timeline (e.g. "?exe=1&ben=float&env=1")
    #[arg(default_value = "")]
    query: String,

    /// Benchmark name, "grid" or "show_none"; overrides the query
    #[arg(long)]
    ben: Option<String>,

    #[command(flatten)]
    output: OutputArgs,
}

fn parse_chart(value: &str) -> std::result::Result<ChartType, benchview_core::Error> {
    value.parse()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config = dashboard_config(&cli)?;
    let catalog = Catalog::load_from_file(&cli.catalog)
        .with_context(|| format!("Failed to load catalog: {:?}", cli.catalog))?;
    let client = ServerClient::new(&cli.server)
        .with_context(|| format!("Invalid server URL: {}", cli.server))?;
    debug!("Server: {}", client.base());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    runtime.block_on(async {
        match cli.command {
            Commands::Changes(args) => changes_command(args, config, catalog, client).await,
            Commands::Compare(args) => compare_command(args, config, catalog, client).await,
            Commands::Timeline(args) => timeline_command(args, config, catalog, client).await,
        }
    })
}

fn dashboard_config(cli: &Cli) -> Result<DashboardConfig> {
    let thresholds = Thresholds::new(cli.change_threshold, cli.trend_threshold)
        .context("Invalid threshold configuration")?;

    let mut config = DashboardConfig {
        thresholds,
        ..Default::default()
    };
    config.viewport.width = cli.width;
    config.validate().context("Invalid dashboard configuration")?;

    Ok(config)
}

/// Changes table of one revision
async fn changes_command(
    args: ChangesArgs,
    config: DashboardConfig,
    catalog: Catalog,
    client: ServerClient,
) -> Result<()> {
    let revision = match args.rev {
        Some(rev) => rev,
        None => catalog
            .project_of(&args.exe)
            .and_then(|project| catalog.revisions_for(project).first())
            .map(|r| r.commitid.clone())
            .with_context(|| format!("No revision given and none known for executable {}", args.exe))?,
    };
    let selection = ChangeSelection {
        trend: args.trend,
        revision,
        executable: args.exe,
        environment: args.env,
    };
    info!("Loading changes for revision {}", selection.revision);

    let controller = ChangeTableController::new(config.clone(), catalog, selection.clone())
        .context("Failed to set up the changes table")?;
    let mut session = Session::new(controller, client, config);
    session.run(Event::SelectionChanged(selection)).await;

    if let Some(column) = args.sort {
        let tables = session
            .controller()
            .table()
            .map(|t| t.tables.len())
            .unwrap_or(0);
        for table in 0..tables {
            session
                .run(Event::Interaction(ChangeInteraction::Sort { table, column }))
                .await;
        }
    }

    emit(session.page(), &args.output)
}

/// Comparison charts for a selection
async fn compare_command(
    args: CompareArgs,
    config: DashboardConfig,
    catalog: Catalog,
    client: ServerClient,
) -> Result<()> {
    let selection = comparison_selection(&args);
    info!("Comparing {} executables", selection.executables.len());

    let controller = ComparisonController::new(config.clone(), catalog, selection.clone());
    let mut session = Session::new(controller, client, config);
    session.run(Event::SelectionChanged(selection)).await;

    emit(session.page(), &args.output)
}

/// Selection of the comparison view; "none" means no baseline
fn comparison_selection(args: &CompareArgs) -> ComparisonSelection {
    ComparisonSelection {
        executables: args.exe.clone(),
        benchmarks: args.ben.clone(),
        environments: args.env.clone(),
        horizontal: args.horizontal,
        baseline: args.baseline.as_deref().and_then(parse_baseline),
        chart: args.chart,
    }
}

/// Timeline for a URL query
async fn timeline_command(
    args: TimelineArgs,
    config: DashboardConfig,
    catalog: Catalog,
    client: ServerClient,
) -> Result<()> {
    let controller = TimelineController::with_defaults(config.clone(), catalog);
    let mut session = Session::new(controller, client, config);
    session
        .run(Event::Interaction(TimelineInteraction::UrlChanged(args.query)))
        .await;

    if let Some(ben) = args.ben {
        let mut selection = session.controller().selection().clone();
        selection.benchmark = BenchmarkChoice::from(ben);
        session.run(Event::SelectionChanged(selection)).await;
    }

    emit(session.page(), &args.output)
}

/// Print or write a finished page
fn emit<V: PageView>(page: &Page<V>, output: &OutputArgs) -> Result<()> {
    if page.failed_requests > 0 {
        info!("{} request(s) failed; showing what was loaded", page.failed_requests);
    }

    let content = match output.format {
        Format::Html => html::render_page(page).context("Failed to render page")?,
        Format::Json => serde_json::to_string_pretty(page).context("Failed to serialize page")?,
    };

    match &output.output {
        Some(path) => {
            html::write_page(path, &content)
                .with_context(|| format!("Failed to write output: {:?}", path))?;
            info!("Wrote {:?}", path);
        }
        None => println!("{}", content),
    }

    Ok(())
}
