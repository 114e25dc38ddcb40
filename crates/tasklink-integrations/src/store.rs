use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tasklink_core::error::{Result, TasklinkError};
use tasklink_core::types::TokenSet;

use crate::TokenStore;

/// Token set kept as a JSON file. Re-read on every `load`.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn save(&self, tokens: &TokenSet) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TasklinkError::Storage(format!("failed to create {}: {e}", parent.display())))?;
        }

        let content = serde_json::to_string_pretty(tokens)
            .map_err(|e| TasklinkError::Storage(format!("failed to encode tokens: {e}")))?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| TasklinkError::Storage(format!("failed to write {}: {e}", self.path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| TasklinkError::Storage(format!("failed to restrict {}: {e}", self.path.display())))?;
        }

        Ok(())
    }

    async fn load(&self) -> Result<TokenSet> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TasklinkError::TokensNotFound(self.path.clone()))
            }
            Err(e) => {
                return Err(TasklinkError::Storage(format!("failed to read {}: {e}", self.path.display())))
            }
        };

        if content.trim().is_empty() {
            return Err(TasklinkError::TokensNotFound(self.path.clone()));
        }

        let json: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| TasklinkError::TokensMalformed(format!("invalid json: {e}")))?;

        match json.get("access_token").and_then(|v| v.as_str()) {
            Some(token) if !token.is_empty() => {}
            _ => {
                return Err(TasklinkError::TokensMalformed(
                    "access token not found in the saved tokens".to_string(),
                ))
            }
        }

        serde_json::from_value(json).map_err(|e| TasklinkError::TokensMalformed(e.to_string()))
    }
}
