use tracing::error;

use crate::client::GithubClient;
use crate::error::FetchOutcome;
use crate::types::Repository;

/// Query used when the search box is empty.
pub const DEFAULT_SEARCH_TERM: &str = "stars:>1000";

/// Build the search API query for a raw term: names only, or the default listing.
pub fn search_term(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_SEARCH_TERM.to_string()
    } else {
        format!("{trimmed} in:name")
    }
}

/// Repositories shown for one page of results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoPage {
    pub items: Vec<Repository>,
    pub total_count: u64,
}

/// Load one page of search results, degrading every failure to an empty page.
///
/// Rate limiting is silent here; callers learn about it from the client's
/// [`RateLimitFlag`](crate::RateLimitFlag).
pub async fn load_repos(client: &GithubClient, query: &str, page: u32) -> RepoPage {
    match client.search_repositories(query, page).await {
        FetchOutcome::Success(resp) => RepoPage { items: resp.items, total_count: resp.total_count },
        FetchOutcome::RateLimited => RepoPage::default(),
        FetchOutcome::Failed(msg) => {
            error!(query, page, error = %msg, "failed to load repositories");
            RepoPage::default()
        }
    }
}

/// Number of result pages for `total_count` hits.
pub fn total_pages(total_count: u64, per_page: u32) -> u64 {
    if per_page == 0 {
        return 0;
    }
    total_count.div_ceil(per_page as u64)
}
