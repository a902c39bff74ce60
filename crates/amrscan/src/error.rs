//! Error types for amrscan
//!
//! Every variant here ends the run with exit status 1. Per-subscription scan
//! failures never reach this layer.

use amrscan_core::{ConfigError, CoreError};
use colored::Colorize;
use thiserror::Error;

/// A remedy shown under an error, with optional commands to run
#[derive(Debug, Clone, PartialEq)]
pub struct Tip {
    pub description: String,
    pub commands: Vec<String>,
}

impl Tip {
    fn new(description: impl Into<String>, commands: &[&str]) -> Self {
        Self {
            description: description.into(),
            commands: commands.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Error report in the style cargo uses:
///
/// ```text
/// error: AZURE_TENANT_ID is required
///
///   tip: Set AZURE_TENANT_ID for the service principal
///       export AZURE_TENANT_ID=...
/// ```
pub struct CliDiagnostic {
    headline: String,
    note: Option<String>,
    tips: Vec<Tip>,
}

impl CliDiagnostic {
    pub fn for_error(err: &AmrScanError) -> Self {
        let note = match err {
            AmrScanError::AuthenticationFailed { .. } => {
                Some("The token request to Azure AD was rejected.".to_string())
            }
            _ => None,
        };
        Self {
            headline: err.to_string(),
            note,
            tips: err.suggestions(),
        }
    }

    /// Lay out the diagnostic; only the labels are coloured
    pub fn render(&self) -> String {
        let mut out = format!("{}{}{}\n", "error".red().bold(), ": ".bold(), self.headline);
        if let Some(note) = &self.note {
            out.push_str(&format!("  {}\n", note));
        }
        for tip in &self.tips {
            out.push_str(&format!(
                "\n  {}{}{}\n",
                "tip".yellow().bold(),
                ": ".bold(),
                tip.description
            ));
            for command in &tip.commands {
                out.push_str(&format!("      {}\n", command));
            }
        }
        out
    }
}

/// Main error type for the amrscan application
#[derive(Error, Debug)]
pub enum AmrScanError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{variable} is required")]
    MissingCredentials { variable: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Failed to discover subscriptions: {message}")]
    SubscriptionDiscovery { message: String },

    #[error("No subscriptions found")]
    NoSubscriptions,

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for amrscan operations
pub type Result<T> = std::result::Result<T, AmrScanError>;

impl AmrScanError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<Tip> {
        match self {
            AmrScanError::MissingCredentials { variable } => vec![Tip::new(
                format!("Set {} for the service principal", variable),
                &[format!("export {}=...", variable).as_str()],
            )],
            AmrScanError::AuthenticationFailed { .. } => vec![
                Tip::new(
                    "Verify the service principal credentials",
                    &["AZURE_TENANT_ID", "AZURE_CLIENT_ID", "AZURE_CLIENT_SECRET"],
                ),
                Tip::new("Check that the client secret has not expired", &[]),
            ],
            AmrScanError::SubscriptionDiscovery { .. } => vec![Tip::new(
                "Ensure the service principal has Reader access on at least one subscription",
                &[],
            )],
            AmrScanError::NoSubscriptions => vec![
                Tip::new(
                    "Check AZURE_SUBSCRIPTION_FILTER matches subscriptions the principal can see",
                    &["unset AZURE_SUBSCRIPTION_FILTER"],
                ),
                Tip::new("Grant the service principal Reader access on a subscription", &[]),
            ],
            AmrScanError::ConnectionError { .. } => vec![
                Tip::new("Check network connectivity", &[]),
                Tip::new(
                    "Verify the endpoints if you override them",
                    &["--authority-host <url>", "--management-endpoint <url>"],
                ),
            ],
            AmrScanError::Configuration(_) => vec![Tip::new(
                "Check the config file or point at another one",
                &["amrscan --config-file <path>"],
            )],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr
    pub fn print_diagnostic(&self) {
        eprint!("{}", CliDiagnostic::for_error(self).render());
    }
}

impl From<CoreError> for AmrScanError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::MissingCredential { variable } => AmrScanError::MissingCredentials {
                variable: variable.to_string(),
            },
            CoreError::Authentication { message } => AmrScanError::AuthenticationFailed { message },
            CoreError::SubscriptionList(message) => AmrScanError::SubscriptionDiscovery { message },
            CoreError::NoSubscriptions => AmrScanError::NoSubscriptions,
            CoreError::Http(e) => AmrScanError::ConnectionError {
                message: e.to_string(),
            },
            CoreError::Config(e) => AmrScanError::from(e),
            CoreError::Validation(message) => AmrScanError::InvalidInput { message },
            CoreError::Url(e) => AmrScanError::InvalidInput {
                message: e.to_string(),
            },
            other => AmrScanError::SubscriptionDiscovery {
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for AmrScanError {
    fn from(err: ConfigError) -> Self {
        AmrScanError::Configuration(err.to_string())
    }
}

impl From<serde_json::Error> for AmrScanError {
    fn from(err: serde_json::Error) -> Self {
        AmrScanError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<serde_yaml::Error> for AmrScanError {
    fn from(err: serde_yaml::Error) -> Self {
        AmrScanError::OutputError {
            message: format!("YAML error: {}", err),
        }
    }
}
