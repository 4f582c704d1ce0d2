use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "reposearch/0.1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, without a trailing slash.
    pub base_url: String,
    /// Personal access token. Without one, requests go out unauthenticated.
    pub token: Option<String>,
    pub user_agent: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Page size for search and user repository listings.
    pub per_page: u32,
    pub contributors_per_page: u32,
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 12,
            per_page: 30,
            contributors_per_page: 10,
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `GITHUB_TOKEN` (or `GITHUB_OAUTH_TOKEN`) and `GITHUB_API_URL`.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Apply environment overrides on top of `self`.
    pub fn with_env(mut self) -> Self {
        let token = std::env::var("GITHUB_TOKEN")
            .or_else(|_| std::env::var("GITHUB_OAUTH_TOKEN"))
            .ok()
            .filter(|t| !t.trim().is_empty());
        if token.is_some() {
            self.token = token;
        }
        if let Ok(url) = std::env::var("GITHUB_API_URL") {
            if !url.trim().is_empty() {
                self.base_url = url;
            }
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}
