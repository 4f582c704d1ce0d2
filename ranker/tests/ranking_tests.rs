use async_trait::async_trait;
use parking_lot::Mutex;
use ranker::{rank_scored, Candidate, Document, Enricher, Liveness, NoEnrichment, RankConfig, Ranker};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
struct Repo {
    id: usize,
    name: String,
    description: Option<String>,
}

impl Repo {
    fn new(id: usize, name: &str, description: Option<&str>) -> Self {
        Self { id, name: name.to_string(), description: description.map(str::to_string) }
    }
}

impl Candidate for Repo {
    fn id(&self) -> String { self.id.to_string() }
    fn name(&self) -> &str { &self.name }
    fn description(&self) -> Option<&str> { self.description.as_deref() }
}

fn numbered(n: usize) -> Vec<Repo> {
    (0..n).map(|i| Repo::new(i, &format!("repo-{i}"), None)).collect()
}

fn ids(repos: &[Repo]) -> Vec<usize> {
    repos.iter().map(|r| r.id).collect()
}

fn sorted_ids(repos: &[Repo]) -> Vec<usize> {
    let mut out = ids(repos);
    out.sort_unstable();
    out
}

/// Returns canned text per id and records every call.
#[derive(Default)]
struct CannedEnricher {
    texts: HashMap<usize, String>,
    fail: Option<usize>,
    panic_on: Option<usize>,
    calls: Mutex<Vec<usize>>,
}

#[async_trait]
impl Enricher<Repo> for CannedEnricher {
    async fn enrich(&self, item: &Repo) -> anyhow::Result<String> {
        self.calls.lock().push(item.id);
        if self.fail == Some(item.id) {
            anyhow::bail!("readme fetch failed for {}", item.id);
        }
        if self.panic_on == Some(item.id) {
            panic!("enricher blew up on {}", item.id);
        }
        Ok(self.texts.get(&item.id).cloned().unwrap_or_default())
    }
}

const LONG_QUERY: &str = "react native mobile app framework for cross platform development";

#[tokio::test]
async fn enriched_text_decides_the_winner() {
    let items = vec![
        Repo::new(1, "awesome-lists", Some("curated lists of links")),
        Repo::new(2, "rn-kit", Some("toolkit")),
        Repo::new(3, "pandas", Some("data analysis library")),
    ];
    let mut texts = HashMap::new();
    texts.insert(1, "collection of resources".to_string());
    texts.insert(2, "React Native is a mobile app framework for cross platform development".to_string());
    texts.insert(3, "dataframes in python".to_string());
    let enricher = CannedEnricher { texts, ..Default::default() };

    let ranked = Ranker::default().maybe_rank(LONG_QUERY, items, Some(&enricher)).await;
    assert_eq!(ids(&ranked), vec![2, 1, 3]);
}

#[tokio::test]
async fn keyword_query_skips_ranking_and_enrichment() {
    let items = vec![
        Repo::new(7, "golang-tools", None),
        Repo::new(3, "go", Some("the go programming language")),
        Repo::new(9, "gopher", None),
    ];
    let enricher = CannedEnricher::default();
    let ranked = Ranker::default().maybe_rank("go", items.clone(), Some(&enricher)).await;
    assert_eq!(ranked, items);
    assert!(enricher.calls.lock().is_empty());
}

#[tokio::test]
async fn stopword_only_query_fetches_nothing() {
    let items = numbered(4);
    let enricher = CannedEnricher::default();
    let ranked = Ranker::default().maybe_rank("the and of is", items.clone(), Some(&enricher)).await;
    assert_eq!(ranked, items);
    assert!(enricher.calls.lock().is_empty());
}

#[tokio::test]
async fn empty_candidates_stay_empty() {
    let ranked = Ranker::default().maybe_rank::<Repo, NoEnrichment>(LONG_QUERY, Vec::new(), None).await;
    assert!(ranked.is_empty());
}

#[tokio::test]
async fn ranks_on_names_without_enricher() {
    let items = vec![
        Repo::new(0, "grocery-list", Some("shopping helper")),
        Repo::new(1, "tokio", Some("asynchronous runtime for rust")),
        Repo::new(2, "notes", None),
    ];
    let ranked = Ranker::default()
        .maybe_rank::<Repo, NoEnrichment>("asynchronous runtime written in rust", items, None)
        .await;
    assert_eq!(ids(&ranked), vec![1, 0, 2]);
}

#[tokio::test]
async fn only_the_first_thirty_are_enriched() {
    let items = numbered(40);
    let enricher = CannedEnricher::default();
    let ranked = Ranker::default().maybe_rank("image compression command line tool", items, Some(&enricher)).await;

    let mut calls = enricher.calls.lock().clone();
    calls.sort_unstable();
    assert_eq!(calls, (0..30).collect::<Vec<_>>());
    assert_eq!(ranked.len(), 40);
    assert_eq!(ids(&ranked[30..]), (30..40).collect::<Vec<_>>());
}

fn window_three_corpus() -> HashMap<usize, String> {
    (0..35)
        .map(|i| {
            let text = if i % 5 == 0 { "fast rendering engine" } else { "unrelated text" };
            (i, text.to_string())
        })
        .collect()
}

fn doc_text(d: &Document) -> &str {
    &d.text
}

#[tokio::test]
async fn failed_enrichment_degrades_one_candidate() {
    let corpus = window_three_corpus();
    let enricher = CannedEnricher { texts: corpus.clone(), fail: Some(15), ..Default::default() };
    let query = "fast rendering engine for games";
    let ranked = Ranker::default().maybe_rank(query, numbered(35), Some(&enricher)).await;

    assert_eq!(ranked.len(), 35);
    assert_eq!(sorted_ids(&ranked[..5]), vec![0, 5, 10, 20, 25]);
    // 15 falls back to name only and sits among the zero scores in input order
    let zeros: Vec<usize> = (0..30).filter(|i| i % 5 != 0 || *i == 15).collect();
    assert_eq!(ids(&ranked[5..30]), zeros);
    assert_eq!(ids(&ranked[30..]), (30..35).collect::<Vec<_>>());
    assert_eq!(enricher.calls.lock().len(), 30);

    // the same documents scored directly: the degraded one scores exactly 0
    let docs: Vec<Document> = numbered(30)
        .iter()
        .map(|r| {
            let extra = if r.id == 15 { String::new() } else { corpus[&r.id].clone() };
            Document::from_candidate(r, &extra)
        })
        .collect();
    let scored = rank_scored(query, docs, doc_text);
    let degraded = scored.iter().find(|s| s.item.id == "15").unwrap();
    assert_eq!(degraded.score, 0.0);
    assert!(scored[..5].iter().all(|s| s.score > 0.0));
    let scored_tail: Vec<usize> = scored[5..].iter().map(|s| s.item.id.parse().unwrap()).collect();
    assert_eq!(scored_tail, zeros);
}

/// Candidate whose description accessor blows up.
#[derive(Debug, Clone, PartialEq)]
struct Fragile(usize);

impl Candidate for Fragile {
    fn id(&self) -> String { self.0.to_string() }
    fn name(&self) -> &str { "http-client" }
    fn description(&self) -> Option<&str> {
        if self.0 == 1 {
            panic!("description unavailable for {}", self.0);
        }
        Some("fast rust http client library")
    }
}

#[tokio::test]
async fn panic_while_scoring_keeps_input_order() {
    let items: Vec<Fragile> = (0..4).map(Fragile).collect();
    let ranked = Ranker::default()
        .maybe_rank::<Fragile, NoEnrichment>("fast rust http client library", items.clone(), None)
        .await;
    assert_eq!(ranked, items);

    let live = Liveness::new();
    let out = Ranker::default()
        .maybe_rank_until::<Fragile, NoEnrichment>("fast rust http client library", items.clone(), None, &live)
        .await;
    assert_eq!(out, Some(items));
}

#[tokio::test]
async fn panicking_enrichment_is_absorbed() {
    let enricher = CannedEnricher { texts: window_three_corpus(), panic_on: Some(15), ..Default::default() };
    let ranked = Ranker::default().maybe_rank("fast rendering engine for games", numbered(35), Some(&enricher)).await;

    assert_eq!(ranked.len(), 35);
    assert_eq!(sorted_ids(&ranked[..5]), vec![0, 5, 10, 20, 25]);
    assert_eq!(ids(&ranked[30..]), (30..35).collect::<Vec<_>>());
}

#[tokio::test]
async fn ties_keep_input_order() {
    let items = vec![
        Repo::new(4, "vector", Some("database")),
        Repo::new(2, "vector", Some("database")),
        Repo::new(8, "gamma", Some("unrelated")),
        Repo::new(6, "vector", Some("database")),
        Repo::new(10, "cooking", None),
        Repo::new(11, "garden", None),
        Repo::new(12, "music", None),
    ];
    let ranked = Ranker::default()
        .maybe_rank::<Repo, NoEnrichment>("embedded vector database engine", items, None)
        .await;
    assert_eq!(ids(&ranked), vec![4, 2, 6, 8, 10, 11, 12]);
}

/// Tracks how many enrichments overlap and what had settled when each began.
#[derive(Default)]
struct SlowEnricher {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    settled: AtomicUsize,
    starts: Mutex<Vec<(usize, usize)>>,
}

#[async_trait]
impl Enricher<Repo> for SlowEnricher {
    async fn enrich(&self, item: &Repo) -> anyhow::Result<String> {
        self.starts.lock().push((item.id, self.settled.load(Ordering::SeqCst)));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10 + (item.id % 6) as u64 * 7)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.settled.fetch_add(1, Ordering::SeqCst);
        Ok(String::new())
    }
}

#[tokio::test(start_paused = true)]
async fn enrichment_runs_in_windows_of_six() {
    let enricher = SlowEnricher::default();
    let ranked = Ranker::default().maybe_rank("distributed key value store", numbered(30), Some(&enricher)).await;

    assert_eq!(ranked.len(), 30);
    assert_eq!(enricher.max_in_flight.load(Ordering::SeqCst), 6);
    let starts = enricher.starts.lock().clone();
    assert_eq!(starts.len(), 30);
    for (id, settled_at_start) in starts {
        assert!(settled_at_start >= (id / 6) * 6, "candidate {id} started before its predecessors settled");
    }
}

#[tokio::test(start_paused = true)]
async fn custom_window_and_cap_are_honoured() {
    let config = RankConfig { enrich_cap: 8, window: 3, ..RankConfig::default() };
    let enricher = SlowEnricher::default();
    let ranked = Ranker::new(config).maybe_rank("distributed key value store", numbered(12), Some(&enricher)).await;

    assert_eq!(ranked.len(), 12);
    assert_eq!(enricher.max_in_flight.load(Ordering::SeqCst), 3);
    assert_eq!(enricher.starts.lock().len(), 8);
    assert_eq!(ids(&ranked[8..]), vec![8, 9, 10, 11]);
}

/// Abandons the ranking as soon as it is asked for text.
struct AbandoningEnricher {
    live: Liveness,
    calls: AtomicUsize,
}

#[async_trait]
impl Enricher<Repo> for AbandoningEnricher {
    async fn enrich(&self, _item: &Repo) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.live.abandon();
        Ok("distributed key value store".to_string())
    }
}

#[tokio::test]
async fn abandoned_ranking_discards_results() {
    let live = Liveness::new();
    let enricher = AbandoningEnricher { live: live.clone(), calls: AtomicUsize::new(0) };
    let out = Ranker::default()
        .maybe_rank_until("distributed key value store", numbered(20), Some(&enricher), &live)
        .await;
    assert!(out.is_none());
    // the first window settles, the second is never started
    assert_eq!(enricher.calls.load(Ordering::SeqCst), 6);
}

/// Never answers within the lifetime of a test.
struct StalledEnricher {
    calls: AtomicUsize,
}

#[async_trait]
impl Enricher<Repo> for StalledEnricher {
    async fn enrich(&self, _item: &Repo) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(String::new())
    }
}

#[tokio::test(start_paused = true)]
async fn abandon_does_not_wait_for_in_flight_window() {
    let live = Liveness::new();
    let canceller = live.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.abandon();
    });
    let enricher = StalledEnricher { calls: AtomicUsize::new(0) };
    let start = tokio::time::Instant::now();

    let out = Ranker::default()
        .maybe_rank_until("distributed key value store", numbered(20), Some(&enricher), &live)
        .await;

    assert!(out.is_none());
    assert_eq!(start.elapsed(), Duration::from_millis(100));
    assert_eq!(enricher.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn abandoned_before_start_does_nothing() {
    let live = Liveness::new();
    live.abandon();
    let enricher = CannedEnricher::default();
    let out = Ranker::default()
        .maybe_rank_until("distributed key value store", numbered(5), Some(&enricher), &live)
        .await;
    assert!(out.is_none());
    assert!(enricher.calls.lock().is_empty());
}

#[tokio::test]
async fn live_ranking_commits() {
    let live = Liveness::new();
    let items = vec![
        Repo::new(0, "notes", None),
        Repo::new(1, "sled", Some("embedded key value store")),
        Repo::new(2, "garden", None),
        Repo::new(3, "music", None),
    ];
    let out = Ranker::default()
        .maybe_rank_until::<Repo, NoEnrichment>("embedded key value store", items, None, &live)
        .await;
    assert_eq!(out.map(|r| ids(&r)), Some(vec![1, 0, 2, 3]));
}
