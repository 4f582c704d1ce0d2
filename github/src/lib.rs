//! GitHub REST access that tolerates rate limiting and transient failures.
//!
//! Every endpoint goes through one retry path: transient statuses back off
//! exponentially, a 403 trips a shared [`RateLimitFlag`] and returns
//! [`FetchOutcome::RateLimited`], anything else becomes
//! [`FetchOutcome::Failed`]. Nothing here returns `Err` to the caller.

pub mod client;
pub mod config;
pub mod error;
pub mod flag;
pub mod profile;
pub mod readme;
pub mod retry;
pub mod search;
pub mod types;

pub use client::GithubClient;
pub use config::ClientConfig;
pub use error::{ErrorClass, FetchError, FetchOutcome};
pub use flag::RateLimitFlag;
pub use profile::{load_profile, ProfileRepo};
pub use readme::ReadmeEnricher;
pub use retry::{Retrier, RetryPolicy, RetryState};
pub use search::{load_repos, search_term, RepoPage};
pub use types::{Contributor, Owner, Repository, SearchResponse};
