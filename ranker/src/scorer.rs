use std::cmp::Ordering;
use std::collections::HashMap;

use crate::idf::{compute_idf, IdfTable};
use crate::tokenizer::{tokenize, Tokens};

/// Term counts within one document.
pub fn term_freq(tokens: &Tokens) -> HashMap<&str, u32> {
    let mut tf = HashMap::new();
    for term in tokens {
        *tf.entry(term).or_insert(0) += 1;
    }
    tf
}

/// Sparse tf * idf vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightedVector {
    weights: HashMap<String, f64>,
}

impl WeightedVector {
    pub fn from_tokens(tokens: &Tokens, idf: &IdfTable) -> Self {
        let weights = term_freq(tokens)
            .into_iter()
            .map(|(term, tf)| (term.to_string(), tf as f64 * idf.weight(term)))
            .collect();
        Self { weights }
    }

    pub fn from_weights<I, S>(weights: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self { weights: weights.into_iter().map(|(t, w)| (t.into(), w)).collect() }
    }

    pub fn weight(&self, term: &str) -> f64 { self.weights.get(term).copied().unwrap_or(0.0) }

    pub fn norm(&self) -> f64 {
        self.weights.values().map(|w| w * w).sum::<f64>().sqrt()
    }

    pub fn dot(&self, other: &WeightedVector) -> f64 {
        let (small, large) = if self.weights.len() <= other.weights.len() { (self, other) } else { (other, self) };
        let mut s = 0.0;
        for (term, w) in &small.weights {
            if let Some(v) = large.weights.get(term) {
                s += w * v;
            }
        }
        s
    }
}

fn norm_or_one(v: &WeightedVector) -> f64 {
    let n = v.norm();
    if n == 0.0 { 1.0 } else { n }
}

/// Cosine similarity. A zero-norm side divides by 1, so empty vectors score 0.
pub fn cosine(a: &WeightedVector, b: &WeightedVector) -> f64 {
    let s = a.dot(b) / (norm_or_one(a) * norm_or_one(b));
    if s.is_finite() { s } else { 0.0 }
}

/// An item with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<T> {
    pub item: T,
    pub score: f64,
}

/// Similarity of each text to `query`, in input order.
///
/// Returns `None` when the query has no terms or there are no texts; callers
/// then keep their input as it is.
pub fn similarity_scores<S: AsRef<str>>(query: &str, texts: &[S]) -> Option<Vec<f64>> {
    let q_tokens = tokenize(query);
    if q_tokens.is_empty() || texts.is_empty() {
        return None;
    }
    let doc_tokens: Vec<Tokens> = texts.iter().map(|t| tokenize(t.as_ref())).collect();
    let idf = compute_idf(doc_tokens.iter().chain(std::iter::once(&q_tokens)));

    let q_vec = WeightedVector::from_tokens(&q_tokens, &idf);
    let scores = doc_tokens
        .iter()
        .map(|tokens| cosine(&q_vec, &WeightedVector::from_tokens(tokens, &idf)))
        .collect();
    Some(scores)
}

/// Indices sorted by descending score; equal scores keep input order.
pub fn ranked_order(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    order
}

/// Rearrange `items` so that position `i` holds the item at `order[i]`.
///
/// `order` must be a permutation of `0..items.len()`.
pub(crate) fn apply_order<T>(items: Vec<T>, order: &[usize]) -> Vec<T> {
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    order.iter().filter_map(|&i| slots.get_mut(i).and_then(Option::take)).collect()
}

/// Score and sort `items` by similarity of `text(item)` to `query`.
pub fn rank_scored<T, F>(query: &str, items: Vec<T>, text: F) -> Vec<Scored<T>>
where
    F: Fn(&T) -> &str,
{
    let texts: Vec<&str> = items.iter().map(&text).collect();
    let scores = match similarity_scores(query, &texts) {
        Some(s) => s,
        None => return items.into_iter().map(|item| Scored { item, score: 0.0 }).collect(),
    };
    let order = ranked_order(&scores);
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|i| slots[i].take().map(|item| Scored { item, score: scores[i] }))
        .collect()
}

/// Like [`rank_scored`] but returns only the items. A query without terms
/// or an empty input comes back untouched.
pub fn rank<T, F>(query: &str, items: Vec<T>, text: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let texts: Vec<&str> = items.iter().map(&text).collect();
    match similarity_scores(query, &texts) {
        Some(scores) => {
            let order = ranked_order(&scores);
            apply_order(items, &order)
        }
        None => items,
    }
}
