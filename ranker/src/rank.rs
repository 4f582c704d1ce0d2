//! Best-effort reordering of fetched candidates by similarity to a query.
//!
//! The head of the candidate list (up to `enrich_cap` items) is optionally
//! enriched with extra text, fetched `window` items at a time, then scored.
//! Candidates past the cap follow the ranked head in their original order.
//! Any fault along the way leaves the input order as it was.

use async_trait::async_trait;
use futures::future::{join_all, select, Either, FutureExt};
use futures::pin_mut;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::scorer::{apply_order, ranked_order, similarity_scores};
use crate::tokenizer::tokenize;
use crate::{Candidate, Document};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    /// A trimmed query longer than this many characters is descriptive.
    pub min_query_chars: usize,
    /// A query with at least this many words is descriptive.
    pub min_query_words: usize,
    /// Only the first `enrich_cap` candidates are enriched and scored.
    pub enrich_cap: usize,
    /// Enrichment fetches in flight at once.
    pub window: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self { min_query_chars: 20, min_query_words: 3, enrich_cap: 30, window: 6 }
    }
}

/// Source of extra text for a candidate, e.g. its README.
#[async_trait]
pub trait Enricher<T: Sync + ?Sized>: Send + Sync {
    async fn enrich(&self, item: &T) -> anyhow::Result<String>;
}

/// Enricher for callers that rank on names and descriptions alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEnrichment;

#[async_trait]
impl<T: Sync + ?Sized> Enricher<T> for NoEnrichment {
    async fn enrich(&self, _item: &T) -> anyhow::Result<String> {
        Ok(String::new())
    }
}

/// Cancellation handle for one ranking invocation.
///
/// Clones share state. Once abandoned, enrichment still in flight is dropped
/// and no ranked order is produced.
#[derive(Debug, Clone, Default)]
pub struct Liveness {
    abandoned: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl Liveness {
    pub fn new() -> Self { Self::default() }

    pub fn abandon(&self) {
        self.abandoned.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_live(&self) -> bool { !self.abandoned.load(Ordering::SeqCst) }

    /// Resolves once [`Liveness::abandon`] has been called on any clone.
    pub async fn abandoned(&self) {
        // registered before the flag is read, so a concurrent abandon is not missed
        let notified = self.notify.notified();
        if !self.is_live() {
            return;
        }
        notified.await;
    }
}

#[derive(Debug, Error)]
pub enum RankError {
    #[error("ranking abandoned by caller")]
    Abandoned,
    #[error("ranking panicked")]
    Panicked,
}

#[derive(Debug, Clone, Default)]
pub struct Ranker {
    config: RankConfig,
}

impl Ranker {
    pub fn new(config: RankConfig) -> Self { Self { config } }

    pub fn config(&self) -> &RankConfig { &self.config }

    /// Whether `query` reads like a description rather than a keyword.
    pub fn is_descriptive(&self, query: &str) -> bool {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return false;
        }
        trimmed.chars().count() > self.config.min_query_chars
            || trimmed.split_whitespace().count() >= self.config.min_query_words
    }

    /// Reorder `items` by relevance to `query`, or return them unchanged.
    ///
    /// Never fails: enrichment errors degrade single candidates to no extra
    /// text, and any other fault yields the input order.
    pub async fn maybe_rank<T, E>(&self, query: &str, items: Vec<T>, enricher: Option<&E>) -> Vec<T>
    where
        T: Candidate + Sync,
        E: Enricher<T> + ?Sized,
    {
        let live = Liveness::new();
        let plan = self.guarded_plan(query, &items, enricher, &live).await;
        commit(items, plan)
    }

    /// Like [`Ranker::maybe_rank`], but returns `None` if `live` was abandoned
    /// before the ranked order could be committed.
    pub async fn maybe_rank_until<T, E>(
        &self,
        query: &str,
        items: Vec<T>,
        enricher: Option<&E>,
        live: &Liveness,
    ) -> Option<Vec<T>>
    where
        T: Candidate + Sync,
        E: Enricher<T> + ?Sized,
    {
        if !live.is_live() {
            return None;
        }
        let plan = self.guarded_plan(query, &items, enricher, live).await;
        if matches!(plan, Err(RankError::Abandoned)) || !live.is_live() {
            debug!("ranking abandoned; discarding result");
            return None;
        }
        Some(commit(items, plan))
    }

    /// [`Ranker::plan`] with panics from candidates or scoring turned into [`RankError::Panicked`].
    async fn guarded_plan<T, E>(
        &self,
        query: &str,
        items: &[T],
        enricher: Option<&E>,
        live: &Liveness,
    ) -> Result<Option<Vec<usize>>, RankError>
    where
        T: Candidate + Sync,
        E: Enricher<T> + ?Sized,
    {
        match AssertUnwindSafe(self.plan(query, items, enricher, live)).catch_unwind().await {
            Ok(plan) => plan,
            Err(_) => Err(RankError::Panicked),
        }
    }

    /// Order of the full candidate list, or `None` when ranking does not apply.
    async fn plan<T, E>(
        &self,
        query: &str,
        items: &[T],
        enricher: Option<&E>,
        live: &Liveness,
    ) -> Result<Option<Vec<usize>>, RankError>
    where
        T: Candidate + Sync,
        E: Enricher<T> + ?Sized,
    {
        if items.is_empty() || !self.is_descriptive(query) {
            return Ok(None);
        }
        if tokenize(query).is_empty() {
            debug!("query has no index terms; skipping ranking");
            return Ok(None);
        }

        let head_len = self.config.enrich_cap.min(items.len());
        let head = &items[..head_len];
        let extra = match enricher {
            Some(e) => self.gather(head, e, live).await?,
            None => vec![String::new(); head_len],
        };
        let docs: Vec<Document> = head
            .iter()
            .zip(extra)
            .map(|(item, extra)| Document::from_candidate(item, &extra))
            .collect();
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();

        let scores = match similarity_scores(query, &texts) {
            Some(s) => s,
            None => return Ok(None),
        };
        let mut order = ranked_order(&scores);
        order.extend(head_len..items.len());
        info!(candidates = items.len(), scored = head_len, "ranked candidates");
        Ok(Some(order))
    }

    /// Fetch extra text for each head candidate, one window at a time.
    async fn gather<T, E>(&self, head: &[T], enricher: &E, live: &Liveness) -> Result<Vec<String>, RankError>
    where
        T: Candidate + Sync,
        E: Enricher<T> + ?Sized,
    {
        let mut texts = Vec::with_capacity(head.len());
        for window in head.chunks(self.config.window.max(1)) {
            if !live.is_live() {
                return Err(RankError::Abandoned);
            }
            let fetches = window.iter().map(|item| async move {
                match AssertUnwindSafe(enricher.enrich(item)).catch_unwind().await {
                    Ok(Ok(text)) => text,
                    Ok(Err(err)) => {
                        warn!(id = %item.id(), error = %err, "enrichment failed; using empty text");
                        String::new()
                    }
                    Err(_) => {
                        warn!(id = %item.id(), "enrichment panicked; using empty text");
                        String::new()
                    }
                }
            });
            let window_done = join_all(fetches);
            let abandoned = live.abandoned();
            pin_mut!(window_done, abandoned);
            let settled = match select(window_done, abandoned).await {
                Either::Left((settled, _)) => settled,
                Either::Right(_) => {
                    debug!(in_flight = window.len(), "abandoned mid-window; dropping enrichment");
                    return Err(RankError::Abandoned);
                }
            };
            if !live.is_live() {
                return Err(RankError::Abandoned);
            }
            texts.extend(settled);
        }
        Ok(texts)
    }
}

fn commit<T>(items: Vec<T>, plan: Result<Option<Vec<usize>>, RankError>) -> Vec<T> {
    match plan {
        Ok(Some(order)) => apply_order(items, &order),
        Ok(None) => items,
        Err(err) => {
            warn!(error = %err, "ranking degraded; keeping original order");
            items
        }
    }
}
