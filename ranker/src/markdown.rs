//! Markdown stripping and short summaries of README bodies.

use lazy_static::lazy_static;
use regex::Regex;

pub const DEFAULT_SUMMARY_WORDS: usize = 20;
const SUMMARY_SCAN_CHARS: usize = 1000;

lazy_static! {
    // Order matters: fences before inline code, images before links.
    static ref STRIP_PASSES: Vec<Regex> = [
        r"(?s)```.*?```",
        r"`[^`]*`",
        r"!\[[^\]]*\]\([^)]*\)",
        r"\[[^\]]*\]\([^)]*\)",
        r"[#>*_~-]+",
        r"\s+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect();
}

/// Remove code, images, links and structural punctuation from markdown.
///
/// Every removed span is replaced by a single space, so words on either side of
/// a link never fuse into one token. Whitespace is collapsed and the result trimmed.
pub fn strip_markdown(md: &str) -> String {
    if md.is_empty() {
        return String::new();
    }
    let mut text = md.to_string();
    for re in STRIP_PASSES.iter() {
        text = re.replace_all(&text, " ").into_owned();
    }
    text.trim().to_string()
}

/// First `words` words of the stripped text, with `...` appended when truncated.
pub fn summarize(text: &str, words: usize) -> String {
    if text.is_empty() {
        return String::new();
    }
    let stripped = strip_markdown(text);
    let head: String = stripped.chars().take(SUMMARY_SCAN_CHARS).collect();
    let toks: Vec<&str> = head.split_whitespace().collect();
    if toks.len() <= words {
        return toks.join(" ");
    }
    format!("{}...", toks[..words].join(" "))
}
