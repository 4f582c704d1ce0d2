use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::iter::Filter;
use std::str::SplitWhitespace;
use unicode_normalization::UnicodeNormalization;

use crate::markdown::strip_markdown;

lazy_static! {
    static ref PUNCT: Regex = Regex::new(r"[\p{P}$+<=>^`|~]").expect("valid regex");
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","an","and","are","as","at",
            "be","but","by",
            "for","from",
            "had","has","have",
            "in","is","it",
            "not",
            "of","on","or",
            "that","the","this","to",
            "was","were","which","with",
            "you","your",
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

fn keep(token: &&str) -> bool { !is_stopword(token) }

/// Lazy iterator over the terms of a [`Tokens`].
pub type Terms<'a> = Filter<SplitWhitespace<'a>, fn(&&'a str) -> bool>;

/// The index terms of one text.
///
/// Holds the normalized text and yields terms on demand, so the sequence can
/// be walked as many times as needed without re-running normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    normalized: String,
}

impl Tokens {
    pub fn iter<'a>(&'a self) -> Terms<'a> {
        self.normalized.split_whitespace().filter(keep as fn(&&'a str) -> bool)
    }

    pub fn is_empty(&self) -> bool { self.iter().next().is_none() }

    pub fn len(&self) -> usize { self.iter().count() }

    pub fn to_vec(&self) -> Vec<String> { self.iter().map(str::to_string).collect() }
}

impl<'a> IntoIterator for &'a Tokens {
    type Item = &'a str;
    type IntoIter = Terms<'a>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

/// Tokenize text using NFKC normalization, lowercasing, punctuation stripping and stopword removal.
pub fn tokenize(text: &str) -> Tokens {
    if text.trim().is_empty() {
        return Tokens::default();
    }
    let lowered = text.nfkc().collect::<String>().to_lowercase();
    let normalized = PUNCT.replace_all(&lowered, " ").into_owned();
    Tokens { normalized }
}

/// Tokenize a markdown body: code, images, links and structural punctuation go first.
pub fn tokenize_markdown(text: &str) -> Tokens {
    tokenize(&strip_markdown(text))
}
