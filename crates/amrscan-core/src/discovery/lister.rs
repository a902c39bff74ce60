//! Subscription discovery

use tracing::{debug, info};

use crate::azure::SubscriptionSource;
use crate::error::{CoreError, Result};
use crate::model::SubscriptionDescriptor;

const UNKNOWN: &str = "Unknown";

/// List every subscription visible to the credential
///
/// When `allow_list` is given, subscriptions whose id is not in it are
/// dropped. A failed call and an empty result are both errors: there is
/// nothing to scan either way.
pub async fn list_subscriptions<S>(
    source: &S,
    allow_list: Option<&[String]>,
) -> Result<Vec<SubscriptionDescriptor>>
where
    S: SubscriptionSource + ?Sized,
{
    debug!("Discovering accessible subscriptions...");

    let raw = source
        .list_subscriptions()
        .await
        .map_err(|e| CoreError::SubscriptionList(e.to_string()))?;
    let visible = raw.len();

    let subscriptions: Vec<SubscriptionDescriptor> = raw
        .into_iter()
        .filter(|sub| allow_list.is_none_or(|ids| ids.iter().any(|id| id == &sub.subscription_id)))
        .map(|sub| SubscriptionDescriptor {
            id: sub.subscription_id,
            display_name: sub.display_name.unwrap_or_else(|| UNKNOWN.to_string()),
            state: sub.state.unwrap_or_else(|| UNKNOWN.to_string()),
        })
        .collect();

    if let Some(ids) = allow_list {
        debug!(
            "Subscription filter kept {} of {} visible subscriptions ({} ids in filter)",
            subscriptions.len(),
            visible,
            ids.len()
        );
    }

    if subscriptions.is_empty() {
        return Err(CoreError::NoSubscriptions);
    }

    info!("Found {} accessible subscriptions", subscriptions.len());
    Ok(subscriptions)
}
