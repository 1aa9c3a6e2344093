use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use usb_stack_config::config::StackConfig;
use usb_stack_config::device::{DeviceStackManager, FunctionMeta, SharedTotals};
use usb_stack_config::events::{self, EventOutcome};
use usb_stack_config::host::HostLayer;
use usb_stack_config::ledger::store::SnapshotView;
use usb_stack_config::platform::ProcessorFamily;

/// Log level for the application
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Verbose,
    Debug,
    Trace,
}

/// USB stack configuration command line arguments
#[derive(Parser, Debug)]
#[command(name = "usb-stack-config")]
#[command(version, about = "Replay USB stack configuration events and print the resulting ledger", long_about = None)]
struct CliArgs {
    /// Stack configuration file (JSON, defaults apply when omitted)
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Host event script (JSON array)
    #[arg(short = 'e', long, value_name = "FILE")]
    events: PathBuf,

    /// Log level (error, warn, info, verbose, debug, trace)
    #[arg(short = 'l', long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,

    /// Increase verbosity (-v for verbose, -vv for debug, -vvv for trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

/// Everything printed after a replay
#[derive(Serialize)]
struct ReplayReport<'a> {
    processor: &'a str,
    family: ProcessorFamily,
    outcomes: Vec<EventOutcome>,
    /// `None` while the device stack was never activated
    totals: Option<SharedTotals>,
    functions: Vec<FunctionMeta>,
    ledger: SnapshotView<'a>,
}

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = CliArgs::parse();

    // Initialize logging with CLI arguments
    init_logging(args.log_level, args.verbose, args.log_json);

    tracing::info!("Starting usb-stack-config v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => {
            tracing::info!("Loading configuration from {}", path.display());
            StackConfig::load(path)?
        }
        None => StackConfig::default(),
    };

    let script = events::load_events(&args.events)?;
    tracing::info!("Replaying {} events for {}", script.len(), config.processor);

    let mut manager = DeviceStackManager::from_config(&config);
    let mut host = HostLayer::new(&config.host);
    let outcomes = events::replay(&mut manager, &mut host, &script)?;

    let totals = manager
        .totals()
        .map_err(|e| tracing::debug!("No device totals: {}", e))
        .ok();
    let report = ReplayReport {
        processor: manager.platform().processor(),
        family: manager.platform().family(),
        outcomes,
        totals,
        functions: manager.get_meta(),
        ledger: manager.ledger().view(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Initialize logging with the specified level and verbosity
fn init_logging(level: LogLevel, verbose_count: u8, json: bool) {
    // Verbose count overrides log level
    let effective_level = match verbose_count {
        0 => level,
        1 => LogLevel::Verbose,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    // Build filter string based on effective level
    let filter = match effective_level {
        LogLevel::Error => "usb_stack_config=error",
        LogLevel::Warn => "usb_stack_config=warn",
        LogLevel::Info => "usb_stack_config=info",
        LogLevel::Verbose => "usb_stack_config=debug,usb_stack_config::ledger=info",
        LogLevel::Debug => "usb_stack_config=debug",
        LogLevel::Trace => "usb_stack_config=trace",
    };

    // Environment variable takes highest priority
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    // Logs go to stderr, stdout carries the report
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
    {
        eprintln!("failed to initialize tracing: {}", err);
    }
}
