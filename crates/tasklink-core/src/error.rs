use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TasklinkError {
    #[error("tokens not found at {}. Please authenticate first.", .0.display())]
    TokensNotFound(PathBuf),

    #[error("stored tokens are malformed: {0}. Please authenticate again.")]
    TokensMalformed(String),

    #[error("authorization code exchange failed ({status})")]
    AuthExchangeFailed { status: u16, body: String },

    #[error("no accessible resources found for the given access token")]
    NoAccessibleResource,

    #[error("upstream request failed ({status})")]
    Upstream { status: u16, body: String },

    #[error("failed to create task in Jira ({status})")]
    CreationFailed { status: u16, body: String },

    #[error("{0}")]
    Validation(String),

    #[error("request error: {0}")]
    Request(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),
}

impl TasklinkError {
    /// True when the local token record is missing or unusable.
    pub fn is_not_authenticated(&self) -> bool {
        matches!(self, Self::TokensNotFound(_) | Self::TokensMalformed(_))
    }

    /// Raw provider response body, when the error carries one.
    pub fn upstream_body(&self) -> Option<&str> {
        match self {
            Self::AuthExchangeFailed { body, .. }
            | Self::Upstream { body, .. }
            | Self::CreationFailed { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TasklinkError>;
