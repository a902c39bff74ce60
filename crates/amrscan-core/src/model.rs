//! Data types produced and consumed by a discovery run

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Azure resource type of an Azure Managed Redis cache
pub const AMR_RESOURCE_TYPE: &str = "Microsoft.Cache/redisEnterprise";

/// Server-side filter passed to the resource listing call
pub const AMR_RESOURCE_FILTER: &str = "resourceType eq 'Microsoft.Cache/redisEnterprise'";

/// Position of the resource group name in `resource_id.split('/')`
const RESOURCE_GROUP_SEGMENT: usize = 4;

/// A subscription visible to the service principal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionDescriptor {
    pub id: String,
    pub display_name: String,
    pub state: String,
}

impl SubscriptionDescriptor {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        state: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            state: state.into(),
        }
    }
}

/// One discovered cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub subscription_id: String,
    pub subscription_name: String,
    pub resource_group: String,
    pub resource_name: String,
    pub resource_id: String,
    pub location: String,
    pub resource_type: String,
    pub provisioning_state: Option<String>,
    pub redis_version: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub created_date: Option<String>,
}

impl ResourceRecord {
    /// Resource type without its provider namespace, e.g. `redisEnterprise`
    pub fn short_type(&self) -> &str {
        self.resource_type
            .rsplit('/')
            .next()
            .unwrap_or(&self.resource_type)
    }
}

/// Extract the resource group from an ARM resource id
///
/// Ids look like `/subscriptions/{sub}/resourceGroups/{rg}/providers/...`;
/// the group is taken by position and not otherwise validated.
///
/// ```rust
/// use amrscan_core::model::resource_group_from_id;
///
/// let rg = resource_group_from_id(
///     "/subscriptions/abc/resourceGroups/myRG/providers/Microsoft.Cache/redisEnterprise/cache1",
/// )
/// .unwrap();
/// assert_eq!(rg, "myRG");
/// ```
pub fn resource_group_from_id(resource_id: &str) -> Result<&str> {
    resource_id
        .split('/')
        .nth(RESOURCE_GROUP_SEGMENT)
        .ok_or_else(|| CoreError::MalformedResourceId {
            resource_id: resource_id.to_string(),
        })
}

/// Result of scanning one subscription
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// The listing call succeeded
    Found {
        subscription: SubscriptionDescriptor,
        resources: Vec<ResourceRecord>,
        /// Items dropped because their id could not be parsed
        skipped: usize,
    },
    /// The listing call (or the task running it) failed
    Failed {
        subscription: SubscriptionDescriptor,
        reason: String,
    },
}

impl ScanOutcome {
    pub fn subscription(&self) -> &SubscriptionDescriptor {
        match self {
            ScanOutcome::Found { subscription, .. } | ScanOutcome::Failed { subscription, .. } => {
                subscription
            }
        }
    }

    /// Records found; empty for a failed scan
    pub fn resources(&self) -> &[ResourceRecord] {
        match self {
            ScanOutcome::Found { resources, .. } => resources,
            ScanOutcome::Failed { .. } => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ScanOutcome::Failed { .. })
    }
}

/// Number of subscriptions scanned at the same time; never zero
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerCount(usize);

impl WorkerCount {
    pub fn new(count: usize) -> Result<Self> {
        if count == 0 {
            return Err(CoreError::Validation(
                "worker count must be at least 1".to_string(),
            ));
        }
        Ok(Self(count))
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        Self(crate::config::settings::DEFAULT_MAX_WORKERS)
    }
}
