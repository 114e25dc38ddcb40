use serde_json::{json, Value};
use tasklink_core::error::{Result, TasklinkError};
use tracing::debug;

/// Results requested per search page; a shorter page ends the sweep.
pub const PAGE_SIZE: usize = 100;

/// Issue type used for every created work item.
const ISSUE_TYPE: &str = "Task";

/// Thin REST client for Jira Cloud, addressed through the Atlassian API gateway.
/// Every call takes the bearer token and site id explicitly; nothing is cached.
pub struct JiraClient {
    api_base: String,
    http: reqwest::Client,
}

impl JiraClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn site_url(&self, resource_id: &str) -> String {
        format!("{}/ex/jira/{resource_id}/rest/api/3", self.api_base)
    }

    async fn read(resp: reqwest::Response, what: &str) -> Result<(u16, String)> {
        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .map_err(|e| TasklinkError::Request(format!("jira {what} read failed: {e}")))?;
        Ok((status, text))
    }

    async fn get_json(
        &self,
        url: &str,
        access_token: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<Value> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| TasklinkError::Request(format!("jira {what} request failed: {e}")))?;

        let (status, text) = Self::read(resp, what).await?;
        if status != 200 {
            return Err(TasklinkError::Upstream { status, body: text });
        }

        serde_json::from_str(&text).map_err(|e| TasklinkError::Upstream {
            status,
            body: format!("invalid json in {what} response: {e}: {text}"),
        })
    }

    /// Id of the first site this token can reach.
    pub async fn discover_resource(&self, access_token: &str) -> Result<String> {
        let url = format!("{}/oauth/token/accessible-resources", self.api_base);
        let json = self
            .get_json(&url, access_token, &[], "accessible-resources")
            .await?;

        let resources = json.as_array().ok_or_else(|| TasklinkError::Upstream {
            status: 200,
            body: format!("accessible-resources is not a list: {json}"),
        })?;
        let first = resources.first().ok_or(TasklinkError::NoAccessibleResource)?;

        let id = first["id"].as_str().ok_or_else(|| TasklinkError::Upstream {
            status: 200,
            body: format!("accessible resource without id: {first}"),
        })?;
        debug!(resource_id = id, site = first["url"].as_str().unwrap_or_default(), "resolved jira site");
        Ok(id.to_string())
    }

    /// All issues of `project_key`, fetched page by page in provider order.
    /// Any failed page aborts the whole search.
    pub async fn search_issues(
        &self,
        access_token: &str,
        resource_id: &str,
        project_key: &str,
    ) -> Result<Vec<Value>> {
        let url = format!("{}/search", self.site_url(resource_id));
        let jql = format!("project={project_key}");
        let mut start_at = 0;
        let mut all = Vec::new();

        loop {
            let query = [
                ("jql", jql.clone()),
                ("startAt", start_at.to_string()),
                ("maxResults", PAGE_SIZE.to_string()),
            ];
            let page = self.get_json(&url, access_token, &query, "search").await?;
            let issues = page["issues"].as_array().cloned().unwrap_or_default();
            let count = issues.len();
            all.extend(issues);
            debug!(start_at, count, "fetched search page");

            if count < PAGE_SIZE {
                break;
            }
            start_at += PAGE_SIZE;
        }

        Ok(all)
    }

    pub async fn get_issue(&self, access_token: &str, resource_id: &str, key: &str) -> Result<Value> {
        let url = format!("{}/issue/{key}", self.site_url(resource_id));
        self.get_json(&url, access_token, &[], "issue").await
    }

    /// Create a Task in `project_key` and return its key.
    pub async fn create_issue(
        &self,
        access_token: &str,
        resource_id: &str,
        project_key: &str,
        summary: &str,
        description: &str,
    ) -> Result<String> {
        let body = issue_payload(project_key, summary, description);

        let resp = self
            .http
            .post(format!("{}/issue", self.site_url(resource_id)))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| TasklinkError::Request(format!("jira create request failed: {e}")))?;

        let (status, text) = Self::read(resp, "create").await?;
        if status != 201 {
            return Err(TasklinkError::CreationFailed { status, body: text });
        }

        let created: Value = serde_json::from_str(&text).map_err(|e| TasklinkError::CreationFailed {
            status,
            body: format!("invalid json in create response: {e}: {text}"),
        })?;

        created["key"]
            .as_str()
            .map(str::to_string)
            .ok_or(TasklinkError::CreationFailed { status, body: text })
    }
}

/// Creation body with the description wrapped in a single-paragraph
/// Atlassian Document Format document.
fn issue_payload(project_key: &str, summary: &str, description: &str) -> Value {
    json!({
        "fields": {
            "project": { "key": project_key },
            "summary": summary,
            "description": {
                "type": "doc",
                "version": 1,
                "content": [{
                    "type": "paragraph",
                    "content": [{ "type": "text", "text": description }]
                }]
            },
            "issuetype": { "name": ISSUE_TYPE }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jira::normalize::normalize;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SITE: &str = "/ex/jira/cloud-1/rest/api/3";

    fn page(start: usize, len: usize) -> Value {
        let issues: Vec<Value> = (start..start + len)
            .map(|i| json!({"key": format!("KAN-{i}"), "fields": {"summary": format!("task {i}")}}))
            .collect();
        json!({"startAt": start, "maxResults": PAGE_SIZE, "issues": issues})
    }

    #[tokio::test]
    async fn test_discover_resource_uses_first_entry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/token/accessible-resources"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "cloud-1", "url": "https://acme.atlassian.net"},
                {"id": "cloud-2", "url": "https://other.atlassian.net"}
            ])))
            .mount(&server)
            .await;

        let client = JiraClient::new(server.uri());
        assert_eq!(client.discover_resource("tok").await.unwrap(), "cloud-1");
    }

    #[tokio::test]
    async fn test_discover_resource_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/token/accessible-resources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = JiraClient::new(server.uri());
        assert!(matches!(
            client.discover_resource("tok").await,
            Err(TasklinkError::NoAccessibleResource)
        ));
    }

    #[tokio::test]
    async fn test_discover_resource_upstream_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/token/accessible-resources"))
            .and(header("Authorization", "Bearer expired"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/oauth/token/accessible-resources"))
            .and(header("Authorization", "Bearer garbled"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = JiraClient::new(server.uri());
        match client.discover_resource("expired").await {
            Err(TasklinkError::Upstream { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "Unauthorized");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
        assert!(matches!(
            client.discover_resource("garbled").await,
            Err(TasklinkError::Upstream { status: 200, .. })
        ));
    }

    #[tokio::test]
    async fn test_search_walks_pages_until_short_page() {
        let server = MockServer::start().await;
        for (start, len) in [(0, 100), (100, 100), (200, 40)] {
            Mock::given(method("GET"))
                .and(path(format!("{SITE}/search")))
                .and(query_param("jql", "project=KAN"))
                .and(query_param("startAt", start.to_string()))
                .and(query_param("maxResults", "100"))
                .respond_with(ResponseTemplate::new(200).set_body_json(page(start, len)))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = JiraClient::new(server.uri());
        let issues = client.search_issues("tok", "cloud-1", "KAN").await.unwrap();
        assert_eq!(issues.len(), 240);
        for (i, issue) in issues.iter().enumerate() {
            assert_eq!(issue["key"], format!("KAN-{i}"));
        }
    }

    #[tokio::test]
    async fn test_search_single_short_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{SITE}/search")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"issues": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = JiraClient::new(server.uri());
        assert!(client.search_issues("tok", "cloud-1", "KAN").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_failed_page_aborts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{SITE}/search")))
            .and(query_param("startAt", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page(0, 100)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{SITE}/search")))
            .and(query_param("startAt", "100"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = JiraClient::new(server.uri());
        match client.search_issues("tok", "cloud-1", "KAN").await {
            Err(TasklinkError::Upstream { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "maintenance");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_issue_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{SITE}/issue/KAN-404")))
            .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"errorMessages":["Issue does not exist"]}"#))
            .mount(&server)
            .await;

        let client = JiraClient::new(server.uri());
        assert!(matches!(
            client.get_issue("tok", "cloud-1", "KAN-404").await,
            Err(TasklinkError::Upstream { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{SITE}/issue")))
            .and(header("Authorization", "Bearer tok"))
            .and(body_partial_json(json!({"fields": {
                "project": {"key": "KAN"},
                "summary": "Test Task",
                "issuetype": {"name": "Task"},
                "description": {"type": "doc", "version": 1}
            }})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "10001", "key": "KAN-7"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{SITE}/issue/KAN-7")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "key": "KAN-7",
                "fields": {
                    "summary": "Test Task",
                    "status": {"name": "To Do"},
                    "assignee": null,
                    "description": issue_payload("KAN", "Test Task", "Body text")["fields"]["description"]
                }
            })))
            .mount(&server)
            .await;

        let client = JiraClient::new(server.uri());
        let key = client
            .create_issue("tok", "cloud-1", "KAN", "Test Task", "Body text")
            .await
            .unwrap();
        assert_eq!(key, "KAN-7");

        let issue = normalize(&client.get_issue("tok", "cloud-1", &key).await.unwrap());
        assert_eq!(issue.summary.as_deref(), Some("Test Task"));
        assert_eq!(issue.description_text().as_deref(), Some("Body text"));
        assert_eq!(issue.status.as_deref(), Some("To Do"));
    }

    #[tokio::test]
    async fn test_create_rejected_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{SITE}/issue")))
            .respond_with(ResponseTemplate::new(400).set_body_string(r#"{"errors":{"summary":"You must specify a summary of the issue."}}"#))
            .mount(&server)
            .await;

        let client = JiraClient::new(server.uri());
        match client.create_issue("tok", "cloud-1", "KAN", "", "x").await {
            Err(TasklinkError::CreationFailed { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("You must specify a summary"));
            }
            other => panic!("expected creation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_requires_201() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{SITE}/issue")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"key": "KAN-8"})))
            .mount(&server)
            .await;

        let client = JiraClient::new(server.uri());
        assert!(matches!(
            client.create_issue("tok", "cloud-1", "KAN", "s", "d").await,
            Err(TasklinkError::CreationFailed { status: 200, .. })
        ));
    }

    #[test]
    fn test_issue_payload_shape() {
        let body = issue_payload("OPS", "Title", "Line");
        assert_eq!(body["fields"]["project"]["key"], "OPS");
        assert_eq!(body["fields"]["issuetype"]["name"], "Task");
        assert_eq!(body["fields"]["description"]["content"][0]["type"], "paragraph");
        assert_eq!(body["fields"]["description"]["content"][0]["content"][0]["text"], "Line");
    }
}
