use serde::{Deserialize, Serialize};

/// OAuth token response as returned by the provider.
/// Only `access_token` is interpreted; everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenSet {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Alias-resolved view of a provider work item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedIssue {
    pub key: Option<String>,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub assignee: Option<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    /// Plain string or rich-text document, whichever the provider sent.
    pub description: Option<serde_json::Value>,
}

impl NormalizedIssue {
    /// Description flattened to plain text. Rich-text documents are walked
    /// depth-first and their `text` nodes concatenated; block nodes are
    /// separated by newlines.
    pub fn description_text(&self) -> Option<String> {
        match self.description.as_ref()? {
            serde_json::Value::String(s) => Some(s.clone()),
            doc @ serde_json::Value::Object(_) => {
                let mut blocks = Vec::new();
                collect_blocks(doc, &mut blocks);
                Some(blocks.join("\n"))
            }
            other => Some(other.to_string()),
        }
    }
}

fn collect_blocks(node: &serde_json::Value, blocks: &mut Vec<String>) {
    let Some(children) = node["content"].as_array() else {
        return;
    };
    if children.iter().any(|c| c["type"] == "text") {
        let line: String = children
            .iter()
            .filter_map(|c| c["text"].as_str())
            .collect();
        blocks.push(line);
        return;
    }
    for child in children {
        collect_blocks(child, blocks);
    }
}

/// Inbound body of `POST /create_task`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
}
