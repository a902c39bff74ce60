//! Discovery pipeline: list subscriptions, fan out scans, collect results

pub mod fanout;
pub mod lister;
pub mod scanner;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::azure::{AzureClient, ResourceSource, SubscriptionSource};
use crate::config::Settings;
use crate::error::Result;
use crate::model::{ResourceRecord, ScanOutcome, SubscriptionDescriptor, WorkerCount};

pub use fanout::scan_all;
pub use lister::list_subscriptions;
pub use scanner::{ResourceScanner, Scanner, to_record};

/// Everything a completed run produced
#[derive(Debug, Clone)]
pub struct DiscoveryRun {
    /// Subscriptions that were scanned, in scan order
    pub subscriptions: Vec<SubscriptionDescriptor>,
    /// One outcome per subscription, positionally aligned
    pub outcomes: Vec<ScanOutcome>,
    pub workers: WorkerCount,
    pub elapsed: Duration,
}

impl DiscoveryRun {
    /// All records from successful scans, in subscription order
    pub fn resources(&self) -> Vec<ResourceRecord> {
        self.outcomes
            .iter()
            .flat_map(|o| o.resources().iter().cloned())
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScanOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }
}

/// Authenticate with the service principal in `settings` and run discovery
///
/// Authentication and subscription listing failures are returned as errors.
/// Per-subscription failures are not; they show up in
/// [`DiscoveryRun::failures`].
pub async fn discover(settings: &Settings) -> Result<DiscoveryRun> {
    info!("Starting AMR Resource Discovery");
    info!(
        "Service Principal: {}",
        settings.client_id.as_deref().unwrap_or("<unset>")
    );
    info!(
        "Tenant: {}",
        settings.tenant_id.as_deref().unwrap_or("<unset>")
    );

    let client = Arc::new(AzureClient::connect(settings).await?);
    run(
        client,
        settings.subscription_filter.as_deref(),
        settings.max_workers,
    )
    .await
}

/// Run discovery against an already authenticated client
pub async fn run<C>(
    client: Arc<C>,
    allow_list: Option<&[String]>,
    workers: WorkerCount,
) -> Result<DiscoveryRun>
where
    C: SubscriptionSource + ResourceSource + 'static,
{
    let start = Instant::now();

    let subscriptions = list_subscriptions(client.as_ref(), allow_list).await?;

    info!(
        "Scanning {} subscriptions for AMR resources...",
        subscriptions.len()
    );
    let scanner = Arc::new(ResourceScanner::new(client));
    let outcomes = scan_all(scanner, &subscriptions, workers).await;

    let run = DiscoveryRun {
        subscriptions,
        outcomes,
        workers,
        elapsed: start.elapsed(),
    };

    info!("Discovery completed!");
    info!("Total AMR resources found: {}", run.resources().len());
    let failed = run.failures().count();
    if failed > 0 {
        warn!("{} of {} subscriptions could not be scanned", failed, run.subscriptions.len());
    }

    debug!("Subscriptions scanned (summary):");
    for sub in &run.subscriptions {
        debug!("  - {} ({})", sub.display_name, sub.id);
    }
    debug!("Statistics:");
    debug!("  Number of workers used: {}", run.workers.get());
    debug!("  Elapsed time: {:.2} seconds", run.elapsed.as_secs_f64());

    Ok(run)
}
