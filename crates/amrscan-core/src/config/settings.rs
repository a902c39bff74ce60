//! Resolved runtime settings
//!
//! Built once at process start and passed by reference. Precedence, lowest
//! to highest: built-in defaults, config file, environment, command line.

use std::fmt;
use std::time::Duration;

use super::config::Config;
use super::error::{ConfigError, Result};
use crate::model::WorkerCount;

pub const ENV_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const ENV_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const ENV_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
pub const ENV_SUBSCRIPTION_FILTER: &str = "AZURE_SUBSCRIPTION_FILTER";
pub const ENV_AUTHORITY_HOST: &str = "AZURE_AUTHORITY_HOST";

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
pub const DEFAULT_MAX_WORKERS: usize = 8;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub max_workers: Option<usize>,
    pub authority_host: Option<String>,
    pub management_endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Everything a discovery run needs to know
#[derive(Clone)]
pub struct Settings {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub subscription_filter: Option<Vec<String>>,
    pub max_workers: WorkerCount,
    pub authority_host: String,
    pub management_endpoint: String,
    pub timeout: Duration,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("subscription_filter", &self.subscription_filter)
            .field("max_workers", &self.max_workers)
            .field("authority_host", &self.authority_host)
            .field("management_endpoint", &self.management_endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Settings {
    /// Resolve settings from the process environment
    pub fn from_env(file: Config, overrides: Overrides) -> Result<Self> {
        Self::resolve(file, |key| std::env::var(key).ok(), overrides)
    }

    /// Resolve settings with an explicit environment lookup
    ///
    /// Empty environment values are treated as unset.
    pub fn resolve<F>(file: Config, env: F, overrides: Overrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let subscription_filter = match env(ENV_SUBSCRIPTION_FILTER) {
            Some(raw) => parse_subscription_filter(&raw),
            None => file
                .subscription_filter
                .as_deref()
                .and_then(|ids| normalize_filter(ids.iter().map(String::as_str))),
        };

        let workers = overrides
            .max_workers
            .or(file.max_workers)
            .unwrap_or(DEFAULT_MAX_WORKERS);
        let max_workers = WorkerCount::new(workers).map_err(|e| ConfigError::InvalidValue {
            key: "max_workers".to_string(),
            message: e.to_string(),
        })?;

        let timeout_secs = overrides
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_secs".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let authority_host = overrides
            .authority_host
            .or_else(|| env(ENV_AUTHORITY_HOST))
            .or(file.authority_host)
            .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string());
        let management_endpoint = overrides
            .management_endpoint
            .or(file.management_endpoint)
            .unwrap_or_else(|| DEFAULT_MANAGEMENT_ENDPOINT.to_string());

        Ok(Self {
            tenant_id: env(ENV_TENANT_ID).or(file.tenant_id),
            client_id: env(ENV_CLIENT_ID).or(file.client_id),
            client_secret: env(ENV_CLIENT_SECRET).or(file.client_secret),
            subscription_filter,
            max_workers,
            authority_host: trim_trailing_slash(authority_host),
            management_endpoint: trim_trailing_slash(management_endpoint),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Parse a comma-separated allow-list such as `AZURE_SUBSCRIPTION_FILTER`
///
/// Entries are trimmed and blanks dropped. Returns `None` when nothing is left,
/// meaning "no filter".
pub fn parse_subscription_filter(raw: &str) -> Option<Vec<String>> {
    normalize_filter(raw.split(','))
}

fn normalize_filter<'a>(ids: impl Iterator<Item = &'a str>) -> Option<Vec<String>> {
    let ids: Vec<String> = ids
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect();
    (!ids.is_empty()).then_some(ids)
}

fn trim_trailing_slash(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
