use std::path::Path;
use std::sync::Arc;

use tasklink_core::config::Config;
use tasklink_integrations::flow::IssueFlow;
use tasklink_integrations::store::FileTokenStore;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::var("TASKLINK_CONFIG")
        .unwrap_or_else(|_| "tasklink.toml".to_string());

    let config = Config::load(Path::new(&config_path)).unwrap_or_else(|e| {
        error!("failed to load config: {e}");
        std::process::exit(1);
    });

    // Missing credentials only surface as provider errors during the flow.
    if !config.has_credentials() {
        warn!("JIRA_CLIENT_ID or JIRA_CLIENT_SECRET is not set; authorization will fail");
    }

    let store = Arc::new(FileTokenStore::new(config.storage.token_path.clone()));
    let flow = Arc::new(IssueFlow::new(&config, store));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap_or_else(|e| {
        error!("failed to bind {addr}: {e}");
        std::process::exit(1);
    });
    info!(%addr, project = %config.jira.project_key, "tasklink: listening");

    if config.server.open_browser {
        let login = format!("http://localhost:{}/", config.server.port);
        if let Err(e) = open::that(&login) {
            warn!("failed to open browser: {e}. Visit {login} to sign in.");
        }
    }

    if let Err(e) = tasklink_integrations::http::serve(listener, flow).await {
        error!("server error: {e}");
        std::process::exit(1);
    }
}
