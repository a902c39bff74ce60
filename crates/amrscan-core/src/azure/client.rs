//! Read-only Azure Resource Manager client

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use super::credential::{AccessToken, ClientSecretCredential};
use super::{AzureResource, AzureSubscription, Page, ResourceSource, SubscriptionSource};
use crate::config::Settings;
use crate::error::{CoreError, Result};

/// User agent string for amrscan HTTP requests
const AMRSCAN_USER_AGENT: &str = concat!("amrscan/", env!("CARGO_PKG_VERSION"));

pub const SUBSCRIPTIONS_API_VERSION: &str = "2022-12-01";
pub const RESOURCES_API_VERSION: &str = "2021-04-01";

/// Extra fields requested from the generic resource listing
const RESOURCE_EXPAND: &str = "createdTime,provisioningState";

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Authenticated client shared read-only by all scan workers
#[derive(Clone)]
pub struct AzureClient {
    http: reqwest::Client,
    management_endpoint: Url,
    token: AccessToken,
}

impl std::fmt::Debug for AzureClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureClient")
            .field("management_endpoint", &self.management_endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl AzureClient {
    /// Build the HTTP client used for both the token and the listing calls
    pub fn http_client(settings: &Settings) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .user_agent(AMRSCAN_USER_AGENT)
            .timeout(settings.timeout)
            .build()?)
    }

    /// Authenticate and return a ready client
    ///
    /// Fails with [`CoreError::MissingCredential`] or
    /// [`CoreError::Authentication`]; both are fatal to the run.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let credential = ClientSecretCredential::from_settings(settings)?;
        let http = Self::http_client(settings)?;
        let token = credential
            .get_token(&http, &settings.management_endpoint)
            .await?;
        Self::with_token(http, &settings.management_endpoint, token)
    }

    /// Create a client from an already acquired token
    pub fn with_token(
        http: reqwest::Client,
        management_endpoint: &str,
        token: AccessToken,
    ) -> Result<Self> {
        Ok(Self {
            http,
            management_endpoint: Url::parse(management_endpoint)?,
            token,
        })
    }

    fn endpoint_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.management_endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                CoreError::Validation(format!(
                    "management endpoint '{}' cannot be used as a base URL",
                    self.management_endpoint
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a list endpoint and follow `nextLink` until exhausted
    ///
    /// A link that was already fetched is an error rather than a silent stop,
    /// since the items gathered so far would be incomplete.
    async fn get_all<T: DeserializeOwned>(&self, first: Url) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(first);
        let mut pages = 0usize;
        let mut visited = HashSet::new();

        while let Some(url) = next.take() {
            if !visited.insert(url.as_str().to_owned()) {
                return Err(CoreError::PaginationLoop {
                    link: url.to_string(),
                });
            }
            trace!("GET {}", url);
            let response = self
                .http
                .get(url)
                .bearer_auth(&self.token.access_token)
                .send()
                .await?;

            let status = response.status();
            let text = response.text().await?;
            if !status.is_success() {
                return Err(api_error(status.as_u16(), &text));
            }

            let page: Page<T> = serde_json::from_str(&text)?;
            pages += 1;
            items.extend(page.value);
            next = page
                .next_link
                .filter(|link| !link.is_empty())
                .map(|link| Url::parse(&link))
                .transpose()?;
        }

        debug!("Fetched {} items across {} page(s)", items.len(), pages);
        Ok(items)
    }
}

fn api_error(status: u16, body: &str) -> CoreError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|envelope| match (envelope.error.code, envelope.error.message) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (Some(code), None) => code,
            (None, Some(message)) => message,
            (None, None) => "unknown error".to_string(),
        })
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "empty response body".to_string()
            } else {
                body.trim().to_string()
            }
        });
    CoreError::Api { status, message }
}

#[async_trait]
impl SubscriptionSource for AzureClient {
    async fn list_subscriptions(&self) -> Result<Vec<AzureSubscription>> {
        let mut url = self.endpoint_url(&["subscriptions"])?;
        url.query_pairs_mut()
            .append_pair("api-version", SUBSCRIPTIONS_API_VERSION);
        self.get_all(url).await
    }
}

#[async_trait]
impl ResourceSource for AzureClient {
    async fn list_resources(
        &self,
        subscription_id: &str,
        filter: &str,
    ) -> Result<Vec<AzureResource>> {
        let mut url = self.endpoint_url(&["subscriptions", subscription_id, "resources"])?;
        url.query_pairs_mut()
            .append_pair("$filter", filter)
            .append_pair("$expand", RESOURCE_EXPAND)
            .append_pair("api-version", RESOURCES_API_VERSION);
        self.get_all(url).await
    }
}
