use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::client::GithubClient;
use crate::error::FetchOutcome;
use crate::types::{Contributor, Repository};

pub const DEFAULT_PROFILE_LIMIT: usize = 50;
const AUGMENT_CONCURRENCY: usize = 6;

/// A user's repository together with its languages and top contributors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileRepo {
    pub repo: Repository,
    pub languages: Vec<String>,
    pub contributors: Vec<Contributor>,
}

/// List `username`'s repositories and augment the first `limit` of them.
///
/// Language and contributor lookups that fail leave empty lists behind; only
/// a failed listing is reported.
pub async fn load_profile(client: &GithubClient, username: &str, limit: usize) -> FetchOutcome<Vec<ProfileRepo>> {
    let repos = match client.user_repositories(username).await {
        FetchOutcome::Success(repos) => repos,
        FetchOutcome::RateLimited => return FetchOutcome::RateLimited,
        FetchOutcome::Failed(msg) => return FetchOutcome::Failed(msg),
    };
    let augmented: Vec<ProfileRepo> = stream::iter(repos.into_iter().take(limit))
        .map(|repo| augment(client, repo))
        .buffered(AUGMENT_CONCURRENCY)
        .collect()
        .await;
    FetchOutcome::Success(augmented)
}

async fn augment(client: &GithubClient, repo: Repository) -> ProfileRepo {
    let languages = async {
        match repo.languages_url.as_deref() {
            Some(url) => client.languages(url).await.ok().unwrap_or_default(),
            None => Vec::new(),
        }
    };
    let contributors = async {
        match repo.contributors_url.as_deref() {
            Some(url) => client.contributors(url).await.ok().unwrap_or_default(),
            None => Vec::new(),
        }
    };
    let (languages, contributors) = futures::join!(languages, contributors);
    ProfileRepo { repo, languages, contributors }
}
