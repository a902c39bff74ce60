//! Service principal authentication (OAuth2 client credentials grant)

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Settings;
use crate::config::settings::{ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_TENANT_ID};
use crate::error::{CoreError, Result};

/// Bearer token for Azure Resource Manager
#[derive(Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"[redacted]")
            .field("token_type", &self.token_type)
            .finish()
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    scope: String,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client id, tenant and secret of a service principal
#[derive(Clone)]
pub struct ClientSecretCredential {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    authority_host: String,
}

impl fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("authority_host", &self.authority_host)
            .finish_non_exhaustive()
    }
}

impl ClientSecretCredential {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        authority_host: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            authority_host: authority_host.into(),
        }
    }

    /// Build a credential from settings, failing if any part is missing
    ///
    /// The secret is checked first, matching the order users are told to
    /// set things up in.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client_secret = settings
            .client_secret
            .clone()
            .ok_or(CoreError::MissingCredential {
                variable: ENV_CLIENT_SECRET,
            })?;
        let tenant_id = settings
            .tenant_id
            .clone()
            .ok_or(CoreError::MissingCredential {
                variable: ENV_TENANT_ID,
            })?;
        let client_id = settings
            .client_id
            .clone()
            .ok_or(CoreError::MissingCredential {
                variable: ENV_CLIENT_ID,
            })?;

        Ok(Self::new(
            tenant_id,
            client_id,
            client_secret,
            settings.authority_host.clone(),
        ))
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }

    /// Exchange the secret for a token scoped to `resource`
    ///
    /// Any failure, including transport errors, is reported as
    /// [`CoreError::Authentication`].
    pub async fn get_token(&self, http: &reqwest::Client, resource: &str) -> Result<AccessToken> {
        let url = self.token_url();
        debug!("Requesting token from {}", url);

        let body = serde_urlencoded::to_string(TokenRequest {
            grant_type: "client_credentials",
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            scope: format!("{}/.default", resource.trim_end_matches('/')),
        })
        .map_err(|e| CoreError::Authentication {
            message: e.to_string(),
        })?;

        let response = http
            .post(&url)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await
            .map_err(|e| CoreError::Authentication {
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| CoreError::Authentication {
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<TokenErrorResponse>(&text)
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(CoreError::Authentication { message });
        }

        let token: AccessToken =
            serde_json::from_str(&text).map_err(|e| CoreError::Authentication {
                message: format!("unexpected token response: {}", e),
            })?;

        info!(
            "Successfully authenticated with service principal: {}",
            self.client_id
        );
        Ok(token)
    }
}
