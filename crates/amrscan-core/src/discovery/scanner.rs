//! Per-subscription resource scan

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::azure::{AzureResource, ResourceSource};
use crate::error::Result;
use crate::model::{
    AMR_RESOURCE_FILTER, ResourceRecord, ScanOutcome, SubscriptionDescriptor,
    resource_group_from_id,
};

/// One unit of fan-out work
///
/// Implementations must not panic on API failures; they report them as
/// [`ScanOutcome::Failed`]. The scheduler still guards against panics.
#[async_trait]
pub trait Scanner: Send + Sync {
    async fn scan(&self, subscription: &SubscriptionDescriptor) -> ScanOutcome;
}

/// Lists redisEnterprise caches in a subscription
pub struct ResourceScanner<R: ?Sized> {
    source: Arc<R>,
    filter: String,
}

impl<R: ResourceSource + ?Sized> ResourceScanner<R> {
    pub fn new(source: Arc<R>) -> Self {
        Self {
            source,
            filter: AMR_RESOURCE_FILTER.to_string(),
        }
    }
}

#[async_trait]
impl<R: ResourceSource + ?Sized> Scanner for ResourceScanner<R> {
    async fn scan(&self, subscription: &SubscriptionDescriptor) -> ScanOutcome {
        debug!(
            "Scanning: {} ({})",
            subscription.display_name, subscription.id
        );

        let raw = match self
            .source
            .list_resources(&subscription.id, &self.filter)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    "Failed to query subscription {} ({}): {}",
                    subscription.display_name, subscription.id, e
                );
                return ScanOutcome::Failed {
                    subscription: subscription.clone(),
                    reason: e.to_string(),
                };
            }
        };

        let mut resources = Vec::with_capacity(raw.len());
        let mut skipped = 0;
        for item in raw {
            match to_record(subscription, item) {
                Ok(record) => resources.push(record),
                Err(e) => {
                    warn!("Skipping resource in {}: {}", subscription.display_name, e);
                    skipped += 1;
                }
            }
        }

        if resources.is_empty() {
            debug!("  No AMR resources found in {}", subscription.display_name);
        } else {
            debug!(
                "  Found {} AMR resources in {}",
                resources.len(),
                subscription.display_name
            );
        }

        ScanOutcome::Found {
            subscription: subscription.clone(),
            resources,
            skipped,
        }
    }
}

/// Map one listed resource to a record
pub fn to_record(
    subscription: &SubscriptionDescriptor,
    resource: AzureResource,
) -> Result<ResourceRecord> {
    let resource_group = resource_group_from_id(&resource.id)?.to_string();
    let provisioning_state = resource
        .property("provisioningState")
        .map(str::to_string)
        .or_else(|| resource.provisioning_state.clone());
    let redis_version = resource.property("redisVersion").map(str::to_string);

    Ok(ResourceRecord {
        subscription_id: subscription.id.clone(),
        subscription_name: subscription.display_name.clone(),
        resource_group,
        resource_name: resource.name,
        resource_id: resource.id,
        location: resource.location,
        resource_type: resource.resource_type,
        provisioning_state,
        redis_version,
        tags: resource.tags.unwrap_or_default(),
        created_date: resource.created_time,
    })
}
