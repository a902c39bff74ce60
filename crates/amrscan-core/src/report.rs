//! Summary statistics and the structured discovery report

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Local, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::model::ResourceRecord;

/// Aggregate view over discovered records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_resources: usize,
    pub subscriptions_with_resources: usize,
    /// Distinct locations, sorted
    pub locations: Vec<String>,
    pub resource_types: BTreeMap<String, usize>,
    /// Records without a provisioning state are not counted
    pub provisioning_states: BTreeMap<String, usize>,
}

impl SummaryStats {
    pub fn from_records(records: &[ResourceRecord]) -> Self {
        let mut subscriptions = BTreeSet::new();
        let mut locations = BTreeSet::new();
        let mut resource_types = BTreeMap::new();
        let mut provisioning_states = BTreeMap::new();

        for record in records {
            subscriptions.insert(record.subscription_id.as_str());
            locations.insert(record.location.clone());
            *resource_types
                .entry(record.resource_type.clone())
                .or_insert(0) += 1;
            if let Some(state) = &record.provisioning_state {
                *provisioning_states.entry(state.clone()).or_insert(0) += 1;
            }
        }

        Self {
            total_resources: records.len(),
            subscriptions_with_resources: subscriptions.len(),
            locations: locations.into_iter().collect(),
            resource_types,
            provisioning_states,
        }
    }
}

/// Document rendered for JSON and YAML output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub discovery_timestamp: String,
    pub summary: SummaryStats,
    pub resources: Vec<ResourceRecord>,
}

impl DiscoveryReport {
    /// Build a report stamped with the current local time
    pub fn new(resources: Vec<ResourceRecord>) -> Self {
        Self::with_timestamp(
            Local::now().to_rfc3339_opts(SecondsFormat::Micros, false),
            resources,
        )
    }

    pub fn with_timestamp(discovery_timestamp: String, resources: Vec<ResourceRecord>) -> Self {
        Self {
            discovery_timestamp,
            summary: SummaryStats::from_records(&resources),
            resources,
        }
    }
}

/// Sorted, de-duplicated ids of subscriptions that have at least one record
pub fn subscription_ids_with_resources(records: &[ResourceRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.subscription_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
