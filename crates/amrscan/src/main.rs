//! amrscan - Azure Managed Redis discovery CLI

use amrscan_core::{Config, DiscoveryReport, Settings, discovery};
use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod error;
mod output;

use cli::Cli;
use error::AmrScanError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.quiet_mode(), cli.debug);
    std::panic::set_hook(Box::new(log_panic));

    if let Err(e) = run(&cli).await {
        e.print_diagnostic();
        std::process::exit(1);
    }

    Ok(())
}

fn init_tracing(quiet: bool, debug_enabled: bool) {
    // Check for RUST_LOG env var first, then fall back to the flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = if debug_enabled {
            "amrscan=debug,amrscan_core=debug"
        } else if quiet {
            "off"
        } else {
            "amrscan=info,amrscan_core=info"
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    debug!(
        "Tracing initialized (quiet: {}, debug: {})",
        quiet, debug_enabled
    );
}

/// Report panics through tracing so quiet mode keeps stderr clean
///
/// Scan tasks that panic are recovered as failed subscriptions; the default
/// hook would still print a backtrace banner for each of them.
fn log_panic(info: &std::panic::PanicHookInfo<'_>) {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    match info.location() {
        Some(location) => error!(
            "Panic at {}:{}: {}",
            location.file(),
            location.line(),
            message
        ),
        None => error!("Panic: {}", message),
    }
}

async fn run(cli: &Cli) -> Result<(), AmrScanError> {
    let config = match &cli.config_file {
        Some(path) => {
            debug!("Loading config from explicit path: {:?}", path);
            Config::load_from_path(path)?
        }
        None => {
            debug!("Loading config from default location");
            Config::load()?
        }
    };

    let settings = Settings::from_env(config, cli.overrides())?;
    debug!("Resolved settings: {:?}", settings);

    let run = discovery::discover(&settings).await?;
    let resources = run.resources();

    if cli.quiet_mode() {
        println!("{}", output::render_quiet(&resources));
        return Ok(());
    }

    let report = DiscoveryReport::new(resources);
    println!("{}", output::render_report(&report, cli.output_format)?);
    Ok(())
}
