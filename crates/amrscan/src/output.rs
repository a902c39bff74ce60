//! Rendering of discovery results

use std::fmt::Write as _;

use amrscan_core::report::{DiscoveryReport, subscription_ids_with_resources};
use amrscan_core::ResourceRecord;
use comfy_table::presets::ASCII_FULL;
use comfy_table::Table;
use serde::Serialize;

use crate::error::Result;

/// Longest subscription name shown in the table before truncation
const SUBSCRIPTION_NAME_WIDTH: usize = 20;

pub const NO_RESOURCES_MESSAGE: &str = "No AMR resources found to output.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Default)]
pub enum OutputFormat {
    /// Summary plus a grid of resources
    #[default]
    Table,
    /// Full report as JSON
    Json,
    /// Full report as YAML
    Yaml,
}

/// Render the report in the requested format
pub fn render_report(report: &DiscoveryReport, format: OutputFormat) -> Result<String> {
    if report.resources.is_empty() {
        return Ok(NO_RESOURCES_MESSAGE.to_string());
    }

    match format {
        OutputFormat::Json => to_json(report),
        OutputFormat::Yaml => to_yaml(report),
        OutputFormat::Table => Ok(render_table(report)),
    }
}

/// Comma-separated ids of subscriptions with at least one cache
pub fn render_quiet(records: &[ResourceRecord]) -> String {
    subscription_ids_with_resources(records).join(",")
}

fn to_json<T: Serialize>(data: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

fn to_yaml<T: Serialize>(data: &T) -> Result<String> {
    Ok(serde_yaml::to_string(data)?)
}

fn render_table(report: &DiscoveryReport) -> String {
    let stats = &report.summary;
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(
        out,
        "\nAMR Resource Discovery Details (Generated: {})",
        report.discovery_timestamp
    );
    let _ = writeln!(out, "{}", "=".repeat(70));
    let _ = writeln!(out, "Total Resources Found: {}", stats.total_resources);
    let _ = writeln!(
        out,
        "Subscriptions with AMR: {}",
        stats.subscriptions_with_resources
    );
    let _ = writeln!(out, "Locations: {}", stats.locations.join(", "));

    if !stats.resource_types.is_empty() {
        let _ = writeln!(out, "\nResource Types:");
        for (resource_type, count) in &stats.resource_types {
            let _ = writeln!(out, "  {}: {}", resource_type, count);
        }
    }

    if !stats.provisioning_states.is_empty() {
        let _ = writeln!(out, "\nProvisioning States:");
        for (state, count) in &stats.provisioning_states {
            let _ = writeln!(out, "  {}: {}", state, count);
        }
    }

    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.set_header(vec!["Subscription", "Subscription ID", "Resource Name", "Type"]);
    for record in &report.resources {
        table.add_row(vec![
            truncate_name(&record.subscription_name),
            record.subscription_id.clone(),
            record.resource_name.clone(),
            record.short_type().to_string(),
        ]);
    }

    let _ = writeln!(out, "\nDetailed AMR Resources:");
    let _ = write!(out, "{}", table);
    out
}

/// Shorten long subscription names to keep the grid readable
fn truncate_name(name: &str) -> String {
    if name.chars().count() > SUBSCRIPTION_NAME_WIDTH {
        let head: String = name.chars().take(SUBSCRIPTION_NAME_WIDTH).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}
