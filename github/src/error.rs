use thiserror::Error;

/// How the fetch client reacts to a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 403: the API refused us. Flag it and stop.
    RateLimited,
    /// 429/502/503/504: worth another try after a pause.
    Transient,
    Other,
}

/// A failed request attempt, before classification.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport(e) => e.status().map(|s| s.as_u16()),
            FetchError::Decode(_) => None,
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self.status() {
            Some(403) => ErrorClass::RateLimited,
            Some(429 | 502 | 503 | 504) => ErrorClass::Transient,
            _ => ErrorClass::Other,
        }
    }
}

/// Result of one logical request. The fetch client never returns anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    Success(T),
    /// The API rejected the request as forbidden or over quota.
    RateLimited,
    /// Any other failure, with the best message available.
    Failed(String),
}

impl<T> FetchOutcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            FetchOutcome::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool { matches!(self, FetchOutcome::Success(_)) }

    pub fn is_rate_limited(&self) -> bool { matches!(self, FetchOutcome::RateLimited) }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Success(v) => FetchOutcome::Success(f(v)),
            FetchOutcome::RateLimited => FetchOutcome::RateLimited,
            FetchOutcome::Failed(msg) => FetchOutcome::Failed(msg),
        }
    }

    /// Turn the outcome into a `Result` for callers that want `?`.
    pub fn into_result(self) -> anyhow::Result<T> {
        match self {
            FetchOutcome::Success(v) => Ok(v),
            FetchOutcome::RateLimited => Err(anyhow::anyhow!("rate limited by the GitHub API")),
            FetchOutcome::Failed(msg) => Err(anyhow::anyhow!(msg)),
        }
    }
}
