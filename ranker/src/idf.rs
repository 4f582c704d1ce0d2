use std::collections::{HashMap, HashSet};

use crate::tokenizer::Tokens;

/// Inverse document frequency weights for one ranking call.
#[derive(Debug, Clone, Default)]
pub struct IdfTable {
    weights: HashMap<String, f64>,
    num_docs: usize,
}

impl IdfTable {
    /// Weight of `term`, or 0 for terms the corpus never saw.
    pub fn weight(&self, term: &str) -> f64 {
        self.weights.get(term).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, term: &str) -> bool { self.weights.contains_key(term) }

    pub fn num_docs(&self) -> usize { self.num_docs }

    pub fn len(&self) -> usize { self.weights.len() }

    pub fn is_empty(&self) -> bool { self.weights.is_empty() }
}

/// Compute `idf(t) = ln(N / (1 + df(t)))` over the supplied token sets.
///
/// Each set counts a term at most once. A term present in every set gets a
/// weight slightly below zero; that is kept as is. During ranking the caller
/// passes the query's tokens as one of the sets.
pub fn compute_idf<'a, I>(token_sets: I) -> IdfTable
where
    I: IntoIterator<Item = &'a Tokens>,
{
    let mut df: HashMap<&'a str, u32> = HashMap::new();
    let mut num_docs = 0usize;
    for tokens in token_sets {
        num_docs += 1;
        let seen: HashSet<&'a str> = tokens.iter().collect();
        for term in seen {
            *df.entry(term).or_insert(0) += 1;
        }
    }
    let n = num_docs.max(1) as f64;
    let weights = df
        .into_iter()
        .map(|(term, df_t)| (term.to_string(), (n / (1.0 + df_t as f64)).ln()))
        .collect();
    IdfTable { weights, num_docs }
}
