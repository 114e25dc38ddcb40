use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, TasklinkError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub atlassian: AtlassianConfig,
    #[serde(default)]
    pub jira: JiraConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// OAuth client identity and provider endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlassianConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    /// Root for accessible-resources and the per-site REST API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_redirect_uri() -> String {
    "http://localhost:5001/callback".to_string()
}

fn default_auth_url() -> String {
    "https://auth.atlassian.com/authorize".to_string()
}

fn default_token_url() -> String {
    "https://auth.atlassian.com/oauth/token".to_string()
}

fn default_api_base() -> String {
    "https://api.atlassian.com".to_string()
}

impl Default for AtlassianConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: default_redirect_uri(),
            auth_url: default_auth_url(),
            token_url: default_token_url(),
            api_base: default_api_base(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    #[serde(default = "default_project_key")]
    pub project_key: String,
}

fn default_project_key() -> String {
    "KAN".to_string()
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            project_key: default_project_key(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_open_browser")]
    pub open_browser: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5001
}

fn default_open_browser() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            open_browser: default_open_browser(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
}

fn default_token_path() -> PathBuf {
    PathBuf::from("tokens.json")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            token_path: default_token_path(),
        }
    }
}

impl Config {
    /// Load config: defaults → tasklink.toml → env vars (env wins).
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Defaults overlaid with the TOML file at `path`, if it exists.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| TasklinkError::Config(format!("failed to read config: {e}")))?;
        toml::from_str(&content)
            .map_err(|e| TasklinkError::Config(format!("failed to parse config: {e}")))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("JIRA_CLIENT_ID") {
            self.atlassian.client_id = v;
        }
        if let Ok(v) = std::env::var("JIRA_CLIENT_SECRET") {
            self.atlassian.client_secret = v;
        }
        if let Ok(v) = std::env::var("JIRA_REDIRECT_URI") {
            self.atlassian.redirect_uri = v;
        }
        if let Ok(v) = std::env::var("TASKLINK_PROJECT_KEY") {
            self.jira.project_key = v;
        }
        if let Ok(v) = std::env::var("TASKLINK_PORT") {
            self.server.port = v
                .parse()
                .map_err(|e| TasklinkError::Config(format!("invalid TASKLINK_PORT {v:?}: {e}")))?;
        }
        if let Ok(v) = std::env::var("TASKLINK_TOKEN_PATH") {
            self.storage.token_path = PathBuf::from(v);
        }
        Ok(())
    }

    /// True when both OAuth client credentials are present.
    pub fn has_credentials(&self) -> bool {
        !self.atlassian.client_id.is_empty() && !self.atlassian.client_secret.is_empty()
    }
}
