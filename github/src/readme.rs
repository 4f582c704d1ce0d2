use async_trait::async_trait;
use ranker::{strip_markdown, Enricher};

use crate::client::GithubClient;
use crate::error::FetchOutcome;
use crate::types::Repository;

/// Enriches a repository with its README, markdown stripped.
///
/// Repositories without an owner or name, or without a README, get no text.
/// Rate limiting and fetch failures are reported as errors so the ranker
/// degrades just that candidate.
#[derive(Debug, Clone)]
pub struct ReadmeEnricher {
    client: GithubClient,
}

impl ReadmeEnricher {
    pub fn new(client: GithubClient) -> Self { Self { client } }
}

#[async_trait]
impl Enricher<Repository> for ReadmeEnricher {
    async fn enrich(&self, repo: &Repository) -> anyhow::Result<String> {
        let owner = match repo.owner_login() {
            Some(o) if !repo.name.is_empty() => o,
            _ => return Ok(String::new()),
        };
        match self.client.readme(owner, &repo.name).await {
            FetchOutcome::Success(Some(md)) => Ok(strip_markdown(&md)),
            FetchOutcome::Success(None) => Ok(String::new()),
            FetchOutcome::RateLimited => anyhow::bail!("rate limited fetching README of {owner}/{}", repo.name),
            FetchOutcome::Failed(msg) => anyhow::bail!("README of {owner}/{}: {msg}", repo.name),
        }
    }
}
