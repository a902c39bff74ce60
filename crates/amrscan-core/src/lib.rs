//! # amrscan-core
//!
//! Discovers Azure Managed Redis caches (`Microsoft.Cache/redisEnterprise`)
//! across every subscription a service principal can see.
//!
//! A run is:
//!
//! 1. **Authenticate** - client credentials grant against Azure AD
//! 2. **List subscriptions** - optionally narrowed by an allow-list
//! 3. **Fan out** - scan each subscription with a bounded number of
//!    concurrent requests, keeping results in subscription order
//! 4. **Report** - summary statistics plus the full record list
//!
//! Only steps 1 and 2 can fail a run. A subscription whose scan fails is
//! reported as [`ScanOutcome::Failed`] and contributes no records.
//!
//! ## Example
//!
//! ```rust,ignore
//! use amrscan_core::{Config, Overrides, Settings, discovery, report::DiscoveryReport};
//!
//! let settings = Settings::from_env(Config::load()?, Overrides::default())?;
//! let run = discovery::discover(&settings).await?;
//! let report = DiscoveryReport::new(run.resources());
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

pub mod azure;
pub mod config;
pub mod discovery;
pub mod error;
pub mod model;
pub mod report;

#[cfg(test)]
mod test_logs;

pub use config::{Config, ConfigError, Overrides, Settings};
pub use discovery::DiscoveryRun;
pub use error::{CoreError, Result};
pub use model::{ResourceRecord, ScanOutcome, SubscriptionDescriptor, WorkerCount};
pub use report::{DiscoveryReport, SummaryStats};
