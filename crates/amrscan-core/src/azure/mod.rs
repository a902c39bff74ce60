//! Azure Resource Manager access
//!
//! [`ClientSecretCredential`] performs the service principal token exchange;
//! [`AzureClient`] issues the two read-only listing calls. The lister and the
//! scanner only see the [`SubscriptionSource`] and [`ResourceSource`] traits,
//! so tests can substitute in-memory fakes.

pub mod client;
pub mod credential;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;

pub use client::AzureClient;
pub use credential::{AccessToken, ClientSecretCredential};

/// Subscription as returned by `GET /subscriptions`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureSubscription {
    pub subscription_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Generic resource as returned by `GET /subscriptions/{id}/resources`
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureResource {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub properties: Option<Value>,
    /// Present when listed with `$expand=provisioningState`
    #[serde(default)]
    pub provisioning_state: Option<String>,
    /// Present when listed with `$expand=createdTime`
    #[serde(default)]
    pub created_time: Option<String>,
}

impl AzureResource {
    /// String property from the nested `properties` object, if any
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|p| p.get(key))
            .and_then(Value::as_str)
    }
}

/// One page of a list response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(default)]
    pub next_link: Option<String>,
}

/// Anything that can list subscriptions
#[async_trait]
pub trait SubscriptionSource: Send + Sync {
    async fn list_subscriptions(&self) -> Result<Vec<AzureSubscription>>;
}

/// Anything that can list resources in one subscription
#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn list_resources(
        &self,
        subscription_id: &str,
        filter: &str,
    ) -> Result<Vec<AzureResource>>;
}
