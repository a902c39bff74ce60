//! Unified error handling for amrscan-core
//!
//! Only authentication and subscription discovery failures end a run.
//! Everything that goes wrong inside a single subscription scan is folded
//! into a [`ScanOutcome::Failed`](crate::ScanOutcome::Failed) instead.
//!
//! # Example
//!
//! ```rust
//! use amrscan_core::CoreError;
//!
//! let err = CoreError::MissingCredential { variable: "AZURE_CLIENT_SECRET" };
//! assert_eq!(err.to_string(), "AZURE_CLIENT_SECRET is required");
//! ```

use thiserror::Error;

use crate::config::ConfigError;

/// Core error type for discovery operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Credential rejected by the token endpoint
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// A required credential value was not provided
    #[error("{variable} is required")]
    MissingCredential { variable: &'static str },

    /// The subscription listing call failed
    #[error("Failed to discover subscriptions: {0}")]
    SubscriptionList(String),

    /// Listing succeeded but nothing (after filtering) was visible
    #[error("No subscriptions found")]
    NoSubscriptions,

    /// Non-success HTTP status from an Azure endpoint
    #[error("Azure API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Transport level failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid URL built from configured endpoints
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Resource id does not have the `/subscriptions/{sub}/resourceGroups/{rg}/...` shape
    #[error("Malformed resource id '{resource_id}': expected /subscriptions/{{sub}}/resourceGroups/{{rg}}/...")]
    MalformedResourceId { resource_id: String },

    /// A `nextLink` pointed back at a page that was already fetched
    #[error("Pagination loop: nextLink {link} was already fetched")]
    PaginationLoop { link: String },

    /// Validation error (e.g., worker count)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
