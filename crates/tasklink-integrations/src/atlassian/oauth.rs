use tasklink_core::config::AtlassianConfig;
use tasklink_core::error::{Result, TasklinkError};
use tasklink_core::types::TokenSet;
use tracing::debug;
use url::Url;

/// Scopes requested for reading users and reading/writing issues.
const SCOPES: &str = "read:jira-user read:jira-work write:jira-work";

const AUDIENCE: &str = "api.atlassian.com";

/// Atlassian OAuth 2.0 (3LO) authorization-code client.
pub struct AtlassianAuth {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    http: reqwest::Client,
}

impl AtlassianAuth {
    pub fn new(config: &AtlassianConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// Consent page URL. `prompt=consent` forces the grant screen every time.
    pub fn consent_url(&self) -> Result<String> {
        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("audience", AUDIENCE),
                ("client_id", self.client_id.as_str()),
                ("scope", SCOPES),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| TasklinkError::Config(format!("invalid auth url {:?}: {e}", self.auth_url)))?;
        Ok(url.into())
    }

    /// Exchange an authorization code for a token set.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenSet> {
        let params = [
            ("grant_type", "authorization_code"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let resp = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| TasklinkError::Request(format!("atlassian token exchange failed: {e}")))?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| TasklinkError::Request(format!("atlassian token read failed: {e}")))?;
        debug!(status, "token endpoint responded");

        if !(200..300).contains(&status) {
            return Err(TasklinkError::AuthExchangeFailed { status, body: text });
        }

        let json: serde_json::Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(_) => return Err(TasklinkError::AuthExchangeFailed { status, body: text }),
        };

        let has_token = json["access_token"].as_str().is_some_and(|t| !t.is_empty());
        if !has_token {
            return Err(TasklinkError::AuthExchangeFailed { status, body: text });
        }

        serde_json::from_value(json).map_err(|e| TasklinkError::AuthExchangeFailed {
            status,
            body: format!("unexpected token response: {e}"),
        })
    }
}
