//! Client-side relevance ranking: tokenization, TF-IDF weighting, cosine
//! similarity and the best-effort orchestrator that ties them together.

pub mod idf;
pub mod markdown;
pub mod rank;
pub mod scorer;
pub mod tokenizer;

pub use idf::{compute_idf, IdfTable};
pub use markdown::{strip_markdown, summarize};
pub use rank::{Enricher, Liveness, NoEnrichment, RankConfig, RankError, Ranker};
pub use scorer::{cosine, rank, rank_scored, similarity_scores, Scored, WeightedVector};
pub use tokenizer::{tokenize, tokenize_markdown, Tokens};

/// Something the ranker can reorder.
pub trait Candidate {
    fn id(&self) -> String;
    fn name(&self) -> &str;
    fn description(&self) -> Option<&str>;
}

/// Text scored for one candidate during a single ranking call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: String,
    pub text: String,
}

impl Document {
    /// Name, description and any enrichment text, space separated.
    pub fn from_candidate<C: Candidate + ?Sized>(item: &C, extra: &str) -> Self {
        let text = format!("{} {} {}", item.name(), item.description().unwrap_or(""), extra);
        Self { id: item.id(), text }
    }
}
