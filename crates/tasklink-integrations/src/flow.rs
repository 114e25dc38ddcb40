//! Authorization-code flow and the operations that run once tokens exist.
//!
//! Login only builds a URL. The callback exchanges the code, persists the
//! token set and immediately lists the project's issues as a smoke test.
//! Task creation reloads tokens from the store on every call.

use std::sync::Arc;

use tasklink_core::config::Config;
use tasklink_core::error::{Result, TasklinkError};
use tasklink_core::types::{CreateTaskRequest, NormalizedIssue};
use tracing::info;

use crate::atlassian::AtlassianAuth;
use crate::jira::normalize::{normalize, normalize_all};
use crate::jira::JiraClient;
use crate::TokenStore;

pub struct IssueFlow {
    auth: AtlassianAuth,
    jira: JiraClient,
    store: Arc<dyn TokenStore>,
    project_key: String,
}

impl IssueFlow {
    pub fn new(config: &Config, store: Arc<dyn TokenStore>) -> Self {
        Self {
            auth: AtlassianAuth::new(&config.atlassian),
            jira: JiraClient::new(config.atlassian.api_base.clone()),
            store,
            project_key: config.jira.project_key.clone(),
        }
    }

    pub fn login_url(&self) -> Result<String> {
        self.auth.consent_url()
    }

    /// Exchange `code`, store the tokens, then return every issue in the project.
    pub async fn complete_authorization(&self, code: &str) -> Result<Vec<NormalizedIssue>> {
        let tokens = self.auth.exchange_code(code).await?;
        self.store.save(&tokens).await?;
        info!("authorization complete, tokens saved");

        let resource_id = self.jira.discover_resource(&tokens.access_token).await?;
        let raw = self
            .jira
            .search_issues(&tokens.access_token, &resource_id, &self.project_key)
            .await?;
        info!(project = %self.project_key, count = raw.len(), "listed issues");

        Ok(normalize_all(&raw))
    }

    /// Create a task and return it as re-fetched from the provider.
    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<NormalizedIssue> {
        validate(request)?;

        let tokens = self.store.load().await?;
        let resource_id = self.jira.discover_resource(&tokens.access_token).await?;

        let key = self
            .jira
            .create_issue(
                &tokens.access_token,
                &resource_id,
                &self.project_key,
                &request.summary,
                &request.description,
            )
            .await?;
        info!(%key, "created task");

        let raw = self.jira.get_issue(&tokens.access_token, &resource_id, &key).await?;
        Ok(normalize(&raw))
    }
}

fn validate(request: &CreateTaskRequest) -> Result<()> {
    if request.summary.trim().is_empty() {
        return Err(TasklinkError::Validation("Task summary is required.".to_string()));
    }
    if request.description.trim().is_empty() {
        return Err(TasklinkError::Validation("Task description is required.".to_string()));
    }
    Ok(())
}
