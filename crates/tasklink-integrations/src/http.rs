use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tasklink_core::error::{Result, TasklinkError};
use tasklink_core::types::CreateTaskRequest;
use tokio::net::TcpListener;
use tracing::{error, warn};

use crate::flow::IssueFlow;

#[derive(serde::Deserialize)]
pub struct OAuthCallback {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// JSON error body: `{"error": ..., "details": ...}`.
pub struct ApiError(TasklinkError);

impl From<TasklinkError> for ApiError {
    fn from(e: TasklinkError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            TasklinkError::Validation(_)
            | TasklinkError::TokensNotFound(_)
            | TasklinkError::TokensMalformed(_)
            | TasklinkError::AuthExchangeFailed { .. }
            | TasklinkError::CreationFailed { .. } => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, details = self.0.upstream_body().unwrap_or_default(), "request failed");
        } else {
            warn!(error = %self.0, "request rejected");
        }

        let mut body = json!({ "error": self.0.to_string() });
        if let Some(details) = self.0.upstream_body() {
            body["details"] = json!(details);
        }
        (status, Json(body)).into_response()
    }
}

async fn login(State(flow): State<Arc<IssueFlow>>) -> std::result::Result<Response, ApiError> {
    let url = flow.login_url()?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}

async fn oauth_callback(
    State(flow): State<Arc<IssueFlow>>,
    Query(params): Query<OAuthCallback>,
) -> std::result::Result<Response, ApiError> {
    if let Some(error) = params.error {
        let reason = params.error_description.unwrap_or_default();
        return Err(TasklinkError::Validation(format!("Authorization failed: {error} {reason}").trim_end().to_string()).into());
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| TasklinkError::Validation("No authorization code received.".to_string()))?;

    let issues = flow.complete_authorization(&code).await?;
    Ok(Json(issues).into_response())
}

async fn create_task(
    State(flow): State<Arc<IssueFlow>>,
    payload: std::result::Result<Json<CreateTaskRequest>, JsonRejection>,
) -> std::result::Result<Response, ApiError> {
    let Json(request) = payload
        .map_err(|e| TasklinkError::Validation(format!("Invalid request body: {}", e.body_text())))?;

    let issue = flow.create_task(&request).await?;
    Ok(Json(issue).into_response())
}

pub fn router(flow: Arc<IssueFlow>) -> Router {
    Router::new()
        .route("/", get(login))
        .route("/callback", get(oauth_callback))
        .route("/create_task", post(create_task))
        .with_state(flow)
}

/// Serve the local login/callback/task endpoints until the listener closes.
pub async fn serve(listener: TcpListener, flow: Arc<IssueFlow>) -> Result<()> {
    axum::serve(listener, router(flow))
        .await
        .map_err(|e| TasklinkError::Request(format!("http server error: {e}")))
}
