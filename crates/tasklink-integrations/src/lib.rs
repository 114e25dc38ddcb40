pub mod atlassian;
pub mod flow;
pub mod http;
pub mod jira;
pub mod store;

use async_trait::async_trait;
use tasklink_core::error::Result;
use tasklink_core::types::TokenSet;

/// Single-slot persistence for the OAuth token set.
/// `save` replaces whatever was stored; `load` fails with a
/// not-authenticated error when nothing usable is stored.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn save(&self, tokens: &TokenSet) -> Result<()>;
    async fn load(&self) -> Result<TokenSet>;
}
