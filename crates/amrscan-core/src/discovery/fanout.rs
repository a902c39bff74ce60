//! Bounded, order-preserving fan-out of subscription scans
//!
//! At most `workers` scans are in flight at once. A permit is taken from a
//! semaphore *before* each task is spawned, so tasks start in submission
//! order and with `workers == 1` execution is strictly sequential.
//!
//! Results land in a slot per input index. Completion order never affects
//! the output: `outcomes[i]` always belongs to `subscriptions[i]`.

use std::any::Any;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error};

use super::scanner::Scanner;
use crate::model::{ScanOutcome, SubscriptionDescriptor, WorkerCount};

/// Scan every subscription with at most `workers` scans outstanding
///
/// A unit that panics or is otherwise lost is reported as
/// [`ScanOutcome::Failed`] for its subscription; siblings are unaffected.
pub async fn scan_all<S>(
    scanner: Arc<S>,
    subscriptions: &[SubscriptionDescriptor],
    workers: WorkerCount,
) -> Vec<ScanOutcome>
where
    S: Scanner + ?Sized + 'static,
{
    if subscriptions.is_empty() {
        return Vec::new();
    }

    debug!(
        "Scanning {} subscriptions with {} workers",
        subscriptions.len(),
        workers.get()
    );

    let permits = Arc::new(Semaphore::new(workers.get()));
    let mut slots: Vec<Option<ScanOutcome>> = vec![None; subscriptions.len()];
    let mut handles: Vec<(usize, JoinHandle<ScanOutcome>)> =
        Vec::with_capacity(subscriptions.len());

    for (idx, subscription) in subscriptions.iter().enumerate() {
        let permit = match Arc::clone(&permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                slots[idx] = Some(failed(subscription, format!("worker pool closed: {}", e)));
                continue;
            }
        };

        let scanner = Arc::clone(&scanner);
        let subscription = subscription.clone();
        let handle = tokio::spawn(async move {
            let _permit = permit;
            scanner.scan(&subscription).await
        });
        handles.push((idx, handle));
    }

    for (idx, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => failed(&subscriptions[idx], join_error_reason(e)),
        };
        slots[idx] = Some(outcome);
    }

    slots
        .into_iter()
        .zip(subscriptions)
        .map(|(slot, subscription)| {
            slot.unwrap_or_else(|| failed(subscription, "scan did not complete".to_string()))
        })
        .collect()
}

fn failed(subscription: &SubscriptionDescriptor, reason: String) -> ScanOutcome {
    error!(
        "Error scanning subscription {} ({}): {}",
        subscription.display_name, subscription.id, reason
    );
    ScanOutcome::Failed {
        subscription: subscription.clone(),
        reason,
    }
}

fn join_error_reason(err: JoinError) -> String {
    if err.is_panic() {
        format!("scan panicked: {}", panic_message(err.into_panic()))
    } else {
        format!("scan task failed: {}", err)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
