//! Command-line interface definition

use std::path::PathBuf;

use amrscan_core::Overrides;
use clap::{ArgAction, Parser};

use crate::output::OutputFormat;

/// Azure Managed Redis discovery across subscriptions
#[derive(Parser, Debug)]
#[command(name = "amrscan")]
#[command(
    version,
    about = "Discover Azure Managed Redis caches across every visible subscription"
)]
#[command(long_about = "
Discover Azure Managed Redis (Microsoft.Cache/redisEnterprise) caches across
every subscription a service principal can read.

By default only the comma-separated list of subscription IDs that contain at
least one cache is printed. Pass --quiet false (or --debug) for the full report.

EXAMPLES:
    # Subscription IDs with at least one cache
    amrscan

    # Full report as a table
    amrscan --quiet false

    # Full report as JSON for scripting
    amrscan --quiet false -o json

    # Scan only two subscriptions, one at a time
    AZURE_SUBSCRIPTION_FILTER=sub-a,sub-b amrscan --max-workers 1

ENVIRONMENT:
    AZURE_TENANT_ID             Azure AD tenant of the service principal
    AZURE_CLIENT_ID             Application (client) ID
    AZURE_CLIENT_SECRET         Client secret
    AZURE_SUBSCRIPTION_FILTER   Comma-separated subscription allow-list
    AZURE_AUTHORITY_HOST        Token authority (default login.microsoftonline.com)
    AMRSCAN_CONFIG_FILE         Alternate configuration file
    RUST_LOG                    Overrides the log filter
")]
pub struct Cli {
    /// Report format when not in quiet mode
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,

    /// Enable debug logging and the full report
    #[arg(long)]
    pub debug: bool,

    /// Print only the subscription IDs that contain caches
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub quiet: bool,

    /// Maximum number of subscriptions scanned concurrently
    #[arg(long, value_parser = parse_workers)]
    pub max_workers: Option<usize>,

    /// Path to alternate configuration file
    #[arg(long, env = "AMRSCAN_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Token authority host
    #[arg(long)]
    pub authority_host: Option<String>,

    /// Resource Manager endpoint
    #[arg(long)]
    pub management_endpoint: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, value_parser = parse_timeout)]
    pub timeout: Option<u64>,
}

impl Cli {
    /// Debug always shows the full report
    pub fn quiet_mode(&self) -> bool {
        self.quiet && !self.debug
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            max_workers: self.max_workers,
            authority_host: self.authority_host.clone(),
            management_endpoint: self.management_endpoint.clone(),
            timeout_secs: self.timeout,
        }
    }
}

fn parse_workers(raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn parse_timeout(raw: &str) -> Result<u64, String> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err("must be at least 1 second".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
