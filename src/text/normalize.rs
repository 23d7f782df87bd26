//! Tokenizer and stopword filter

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Function words that never carry topical weight.
pub const STOPWORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "being", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has",
    "have", "he", "her", "his", "how", "i", "if", "in", "into", "is", "it", "its", "may", "me",
    "might", "must", "my", "no", "not", "of", "on", "or", "our", "over", "she", "should", "so",
    "than", "that", "the", "their", "them", "then", "there", "these", "they", "this", "those",
    "to", "too", "under", "up", "us", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "why", "will", "with", "would", "you", "your",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOPWORDS.iter().copied().collect());

/// A whitespace-delimited word and its byte span in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSpan<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Split text into lowercase, stopword-free terms of three or more characters.
///
/// Tokens are runs of alphanumeric characters; everything else separates them.
pub fn normalize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter_map(normalize_token)
        .collect()
}

fn normalize_token(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    // Lowercasing can introduce combining marks (e.g. 'İ'), keep letters and digits only
    let token: String = raw
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect();
    if token.chars().count() <= 2 || STOPWORD_SET.contains(token.as_str()) {
        return None;
    }
    Some(token)
}

/// Normalized terms as a set.
pub fn term_set(text: &str) -> HashSet<String> {
    normalize(text).into_iter().collect()
}

/// Whether a word is a stopword, ignoring case and edge punctuation.
pub fn is_stopword(word: &str) -> bool {
    let cleaned = strip_edge_punctuation(word).to_lowercase();
    STOPWORD_SET.contains(cleaned.as_str())
}

/// Trim leading and trailing characters that are not letters or digits.
pub fn strip_edge_punctuation(text: &str) -> &str {
    text.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Canonical form of an anchor phrase, used as the key for anchor uniqueness.
pub fn normalize_phrase(phrase: &str) -> String {
    strip_edge_punctuation(phrase)
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split text on whitespace, keeping the byte span of every word.
pub fn split_words(text: &str) -> Vec<WordSpan<'_>> {
    let mut words = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                words.push(WordSpan {
                    text: &text[s..i],
                    start: s,
                    end: i,
                });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        words.push(WordSpan {
            text: &text[s..],
            start: s,
            end: text.len(),
        });
    }

    words
}
