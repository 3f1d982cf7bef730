//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

use towermap_core::{
    PipelineController, PipelineState, PlacedMarker, ProgressReporter, RenderSurface, RunConfig,
    RunSummary, SkippedRecord,
};
use towermap_resolver::HttpResolver;
use towermap_shared::{
    AppConfig, IRAN_MCC, LookupSettings, MapSettings, Operator, TowerMapError, init_config,
    load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// towermap — put cell towers from a spreadsheet on a map.
#[derive(Parser)]
#[command(
    name = "towermap",
    version,
    about = "Resolve CID/LAC rows from a spreadsheet to tower locations and render them on a map.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Resolve every tower in a spreadsheet and write the map page.
    Resolve {
        /// Spreadsheet (.xlsx, .xls, .ods) with CID in column A and LAC in column B.
        input: PathBuf,

        /// Operator the towers belong to (defaults to the configured operator).
        #[arg(short, long)]
        operator: Option<Operator>,

        /// Output page path (defaults to the configured output).
        #[arg(short = 'O', long)]
        out: Option<PathBuf>,
    },

    /// List the supported operators and their network codes.
    Operators,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "towermap=info",
        1 => "towermap=debug",
        _ => "towermap=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Resolve {
            input,
            operator,
            out,
        } => cmd_resolve(input, operator, out).await,
        Command::Operators => cmd_operators(),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

async fn cmd_resolve(
    input: PathBuf,
    operator: Option<Operator>,
    out: Option<PathBuf>,
) -> Result<()> {
    let config = load_config()?;

    let run_config = RunConfig {
        input,
        operator: operator.unwrap_or(config.defaults.operator),
        output: out.unwrap_or_else(|| config.defaults.output.clone()),
        map: MapSettings::from(&config),
    };

    info!(
        input = %run_config.input.display(),
        operator = %run_config.operator,
        output = %run_config.output.display(),
        "resolving towers"
    );

    let resolver = HttpResolver::new(&LookupSettings::from_config(&config)?)?;
    let mut controller = PipelineController::new(resolver, TerminalSurface::default());
    let reporter = CliProgress::new()?;

    let summary = controller.run(&run_config, &reporter).await?;
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("  Operator: {} (MNC {})", summary.operator, summary.operator.mnc());
    println!("  Towers:   {}", summary.total_records);
    println!("  Markers:  {}", summary.markers.len());
    println!("  Skipped:  {}", summary.skipped.len());
    for entry in &summary.skipped {
        println!("    {}  {}", entry.record, entry.reason);
    }
    println!("  Map:      {}", summary.output.display());
    println!("  Time:     {:.1}s", summary.elapsed.as_secs_f64());
    println!();
}

fn cmd_operators() -> Result<()> {
    let default = load_config()?.defaults.operator;

    println!("  {:<10} {:>4} {:>4}", "OPERATOR", "MCC", "MNC");
    for op in Operator::ALL {
        let marker = if op == default { "  (default)" } else { "" };
        println!("  {:<10} {IRAN_MCC:>4} {:>4}{marker}", op.name(), op.mnc());
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Ok(Self { spinner })
    }
}

impl ProgressReporter for CliProgress {
    fn state(&self, state: PipelineState) {
        match state {
            // The surface prints after `Done`; clear first so lines don't interleave.
            PipelineState::Done | PipelineState::Idle => self.spinner.finish_and_clear(),
            other => self.spinner.set_message(other.to_string()),
        }
    }

    fn record_resolved(&self, marker: &PlacedMarker) {
        self.spinner.set_message(format!(
            "marker {} at {},{}",
            marker.id, marker.location.latitude, marker.location.longitude
        ));
    }

    fn record_skipped(&self, skipped: &SkippedRecord) {
        self.spinner
            .suspend(|| eprintln!("  skipped {}: {}", skipped.record, skipped.reason));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Terminal rendering surface
// ---------------------------------------------------------------------------

/// Points the user at the written page; a browser does the rendering.
#[derive(Default)]
struct TerminalSurface {
    current: Mutex<Option<Url>>,
}

impl RenderSurface for TerminalSurface {
    fn display_document(&self, path: &Path) -> towermap_shared::Result<()> {
        let url = file_url(path)?;
        println!("  Open {url} in a browser to view the map.");
        if let Ok(mut current) = self.current.lock() {
            *current = Some(url);
        }
        Ok(())
    }

    fn reload(&self) -> towermap_shared::Result<()> {
        let current = self
            .current
            .lock()
            .map_err(|_| TowerMapError::validation("surface state poisoned"))?;
        match current.as_ref() {
            Some(url) => {
                println!("  Map updated; reload {url} to see the changes.");
                Ok(())
            }
            None => Err(TowerMapError::validation("no map page is being shown")),
        }
    }
}

fn file_url(path: &Path) -> towermap_shared::Result<Url> {
    let absolute = std::path::absolute(path).map_err(|e| TowerMapError::io(path, e))?;
    Url::from_file_path(&absolute).map_err(|()| {
        TowerMapError::validation(format!(
            "cannot express {} as a file URL",
            absolute.display()
        ))
    })
}
