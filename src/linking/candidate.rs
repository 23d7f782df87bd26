//! Anchor candidate extraction
//!
//! Slides word windows over a block's plain text and keeps the phrases that
//! could plausibly serve as anchor text for one target page.

use crate::catalog::CatalogEntry;
use crate::config::EngineConfig;
use crate::markup::TextBlock;
use crate::text::{is_stopword, normalize, normalize_phrase, split_words, strip_edge_punctuation};
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Phrases that make poor anchors.
///
/// Entries with several words are rejected anywhere inside a phrase; single
/// words only when they are the whole phrase.
pub const FORBIDDEN_ANCHORS: &[&str] = &[
    "click here",
    "read more",
    "learn more",
    "find out more",
    "see more",
    "more info",
    "more information",
    "check out",
    "go here",
    "this article",
    "this post",
    "this page",
    "this guide",
    "this link",
    "our website",
    "here",
    "link",
    "this",
    "article",
    "post",
    "page",
    "website",
    "site",
    "more",
    "info",
];

/// Words trimmed from anchor edges like stopwords. They are too vague to
/// start or end a link even when the rest of the phrase is fine.
const FILLER_WORDS: &[&str] = &[
    "also", "click", "even", "here", "just", "more", "now", "really", "there", "today",
];

static FORBIDDEN_PHRASES: Lazy<Vec<String>> = Lazy::new(|| {
    FORBIDDEN_ANCHORS
        .iter()
        .filter(|f| f.contains(' '))
        .map(|f| format!(" {} ", f))
        .collect()
});

static FORBIDDEN_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    FORBIDDEN_ANCHORS
        .iter()
        .copied()
        .filter(|f| !f.contains(' '))
        .collect()
});

/// Punctuation that ends a sentence or clause.
const SENTENCE_BREAKS: &[char] = &['.', '!', '?', ';', ':'];

/// A phrase from a block that could anchor a link to one page.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorCandidate {
    /// The phrase as it appears in the block text
    pub phrase: String,
    pub word_count: usize,
    pub block_index: usize,
    /// Byte offset of the phrase in the block's plain text
    pub offset: usize,
    /// Normalized terms shared with the target page
    pub shared_terms: usize,
    /// `offset / text length`, in `[0, 1)`
    pub position: f64,
}

impl AnchorCandidate {
    /// Zero-overlap candidates must clear the higher direct-accept threshold.
    pub fn is_direct(&self) -> bool {
        self.shared_terms == 0
    }

    /// Key used for anchor uniqueness.
    pub fn normalized(&self) -> String {
        normalize_phrase(&self.phrase)
    }
}

/// Whether a phrase is, or contains, a forbidden anchor.
pub fn is_forbidden(phrase: &str) -> bool {
    let words: Vec<String> = phrase
        .split_whitespace()
        .map(|w| strip_edge_punctuation(w).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return true;
    }
    let joined = words.join(" ");
    if FORBIDDEN_WORDS.contains(joined.as_str()) {
        return true;
    }
    let padded = format!(" {} ", joined);
    FORBIDDEN_PHRASES.iter().any(|f| padded.contains(f.as_str()))
}

fn is_edge_filler(word: &str) -> bool {
    if is_stopword(word) {
        return true;
    }
    let cleaned = strip_edge_punctuation(word).to_lowercase();
    cleaned.is_empty() || FILLER_WORDS.contains(&cleaned.as_str())
}

/// Extract up to `max_candidates_per_page` anchor candidates for `entry`.
///
/// Candidates whose normalized phrase is in `used_anchors` are dropped.
pub fn extract_candidates(
    block: &TextBlock,
    entry: &CatalogEntry,
    used_anchors: &HashSet<String>,
    config: &EngineConfig,
) -> Vec<AnchorCandidate> {
    let text = block.text.as_str();
    let words = split_words(text);
    if words.is_empty() || config.min_anchor_words == 0 {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for len in config.min_anchor_words..=config.max_anchor_words {
        if len > words.len() {
            break;
        }
        for start in 0..=words.len() - len {
            let window = &words[start..start + len];
            if window[..len - 1]
                .iter()
                .any(|w| w.text.ends_with(SENTENCE_BREAKS))
            {
                continue;
            }

            let raw = &text[window[0].start..window[len - 1].end];
            if strip_edge_punctuation(raw).chars().count() < config.min_anchor_chars
                || is_forbidden(raw)
            {
                continue;
            }

            // Trim vague words off both edges
            let mut lo = 0;
            let mut hi = len;
            while lo < hi && is_edge_filler(window[lo].text) {
                lo += 1;
            }
            while hi > lo && is_edge_filler(window[hi - 1].text) {
                hi -= 1;
            }
            let kept = &window[lo..hi];
            if kept.len() < config.min_anchor_words {
                continue;
            }

            let span = &text[kept[0].start..kept[kept.len() - 1].end];
            let lead = span.len() - span.trim_start_matches(|c: char| !c.is_alphanumeric()).len();
            let phrase = strip_edge_punctuation(span);
            if phrase.chars().count() < config.min_anchor_chars || is_forbidden(phrase) {
                continue;
            }

            let key = normalize_phrase(phrase);
            if used_anchors.contains(&key) || !seen.insert(key) {
                continue;
            }

            let shared_terms = normalize(phrase)
                .into_iter()
                .collect::<HashSet<_>>()
                .iter()
                .filter(|t| entry.terms.contains(*t))
                .count();
            let offset = kept[0].start + lead;
            candidates.push(AnchorCandidate {
                phrase: phrase.to_string(),
                word_count: kept.len(),
                block_index: block.index,
                offset,
                shared_terms,
                position: offset as f64 / text.len() as f64,
            });
        }
    }

    candidates.sort_by(|a, b| {
        b.shared_terms
            .cmp(&a.shared_terms)
            .then_with(|| sweet_spot(b.word_count).cmp(&sweet_spot(a.word_count)))
            .then_with(|| a.offset.cmp(&b.offset))
            .then_with(|| a.phrase.len().cmp(&b.phrase.len()))
    });
    candidates.truncate(config.max_candidates_per_page);
    candidates
}

fn sweet_spot(word_count: usize) -> bool {
    (4..=5).contains(&word_count)
}
