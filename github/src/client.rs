use anyhow::Result;
use reqwest::header::ACCEPT;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Once;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{FetchError, FetchOutcome};
use crate::flag::RateLimitFlag;
use crate::retry::Retrier;
use crate::types::{Contributor, Repository, SearchResponse};

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw";

static NO_TOKEN_WARNING: Once = Once::new();

#[derive(Serialize)]
struct SearchQuery<'a> {
    q: &'a str,
    page: u32,
    sort: &'static str,
    order: &'static str,
    per_page: u32,
}

#[derive(Serialize)]
struct PageQuery {
    per_page: u32,
}

/// Error body the API sends with most non-2xx responses.
#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

/// GitHub REST client. Every call goes through the same [`Retrier`], so all
/// endpoints share retry, backoff and rate-limit handling.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    config: ClientConfig,
    retrier: Retrier,
}

impl GithubClient {
    pub fn new(config: ClientConfig, flag: RateLimitFlag) -> Result<Self> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let retrier = Retrier::new(config.retry.clone(), flag);
        Ok(Self { http, config, retrier })
    }

    pub fn config(&self) -> &ClientConfig { &self.config }

    pub fn rate_limit_flag(&self) -> &RateLimitFlag { self.retrier.flag() }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn get(&self, url: &str, accept: &'static str) -> RequestBuilder {
        self.authorize(self.http.get(url).header(ACCEPT, accept))
    }

    /// Attach the token if there is one; otherwise warn once per process.
    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => req.bearer_auth(token),
            None => {
                NO_TOKEN_WARNING.call_once(|| {
                    warn!("no GitHub token set (GITHUB_TOKEN); requests are unauthenticated and heavily rate limited");
                });
                req
            }
        }
    }

    /// `GET /search/repositories`, most starred first.
    pub async fn search_repositories(&self, q: &str, page: u32) -> FetchOutcome<SearchResponse> {
        let url = self.endpoint("/search/repositories");
        let query = SearchQuery { q, page, sort: "stars", order: "desc", per_page: self.config.per_page };
        debug!(q, page, "searching repositories");
        self.retrier.invoke(|| send_json(self.get(&url, JSON_MEDIA_TYPE).query(&query))).await
    }

    /// Look a repository up by numeric id or by `owner/name`.
    pub async fn repository(&self, id: &str) -> FetchOutcome<Repository> {
        let url = if id.contains('/') {
            self.endpoint(&format!("/repos/{id}"))
        } else {
            self.endpoint(&format!("/repositories/{id}"))
        };
        self.retrier.invoke(|| send_json(self.get(&url, JSON_MEDIA_TYPE))).await
    }

    /// Contributors at `contributors_url`, most commits first.
    pub async fn contributors(&self, contributors_url: &str) -> FetchOutcome<Vec<Contributor>> {
        let query = PageQuery { per_page: self.config.contributors_per_page };
        self.retrier
            .invoke(|| send_json(self.get(contributors_url, JSON_MEDIA_TYPE).query(&query)))
            .await
    }

    /// Language names at `languages_url`, largest byte count first.
    pub async fn languages(&self, languages_url: &str) -> FetchOutcome<Vec<String>> {
        let outcome: FetchOutcome<HashMap<String, u64>> =
            self.retrier.invoke(|| send_json(self.get(languages_url, JSON_MEDIA_TYPE))).await;
        outcome.map(|bytes| {
            let mut langs: Vec<(String, u64)> = bytes.into_iter().collect();
            langs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            langs.into_iter().map(|(name, _)| name).collect()
        })
    }

    /// `GET /users/{username}/repos`.
    pub async fn user_repositories(&self, username: &str) -> FetchOutcome<Vec<Repository>> {
        let url = self.endpoint(&format!("/users/{username}/repos"));
        let query = PageQuery { per_page: self.config.per_page };
        self.retrier.invoke(|| send_json(self.get(&url, JSON_MEDIA_TYPE).query(&query))).await
    }

    /// Raw README markdown of `owner/name`, or `None` when the repository has none.
    pub async fn readme(&self, owner: &str, name: &str) -> FetchOutcome<Option<String>> {
        let url = self.endpoint(&format!("/repos/{owner}/{name}/readme"));
        self.retrier
            .invoke(|| {
                let req = self.get(&url, RAW_MEDIA_TYPE);
                async move {
                    match send_text(req).await {
                        Ok(text) => Ok(Some(text)),
                        Err(FetchError::Status { status: 404, .. }) => Ok(None),
                        Err(err) => Err(err),
                    }
                }
            })
            .await
    }
}

async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, FetchError> {
    let resp = checked(req.send().await?).await?;
    resp.json::<T>().await.map_err(|e| FetchError::Decode(e.to_string()))
}

async fn send_text(req: RequestBuilder) -> Result<String, FetchError> {
    let resp = checked(req.send().await?).await?;
    Ok(resp.text().await?)
}

/// Turn a non-2xx response into a [`FetchError::Status`] carrying the API's own message.
async fn checked(resp: Response) -> Result<Response, FetchError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiMessage>(&body)
        .ok()
        .map(|m| m.message)
        .filter(|m| !m.trim().is_empty())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "request failed".to_string());
    Err(FetchError::Status { status: status.as_u16(), message })
}
