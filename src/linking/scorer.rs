//! Anchor quality scoring
//!
//! Lexical heuristics only: word count, stopword edges, term overlap with the
//! target page and with the surrounding text, position in the block and
//! duplication of the section heading. Every weight comes from
//! [`ScoringWeights`].

use super::candidate::{is_forbidden, AnchorCandidate};
use crate::catalog::CatalogEntry;
use crate::config::{EngineConfig, PreferredPosition, ScoringWeights};
use crate::markup::TextBlock;
use crate::text::{is_stopword, term_set};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashSet;

/// Words that make an anchor read as a strong call to a resource.
pub const POWER_WORDS: &[&str] = &[
    "advanced",
    "best",
    "checklist",
    "complete",
    "comprehensive",
    "definitive",
    "effective",
    "essential",
    "expert",
    "framework",
    "guide",
    "practical",
    "proven",
    "strategy",
    "strategies",
    "techniques",
    "tips",
    "tutorial",
    "ultimate",
];

static POWER_WORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| POWER_WORDS.iter().copied().collect());

/// Sub-scores of one candidate. Penalties are stored as negative values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub word_count: f64,
    pub stopword_boundary: f64,
    pub forbidden: f64,
    pub power_words: f64,
    pub title_relevance: f64,
    pub context_relevance: f64,
    pub position: f64,
    pub heading_duplication: f64,
}

impl ScoreBreakdown {
    /// Sum of all components, never below zero.
    pub fn total(&self) -> f64 {
        let sum = self.word_count
            + self.stopword_boundary
            + self.forbidden
            + self.power_words
            + self.title_relevance
            + self.context_relevance
            + self.position
            + self.heading_duplication;
        sum.max(0.0)
    }
}

/// Dice coefficient of two term sets; 0 when both are empty.
pub fn dice(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    2.0 * shared as f64 / (a.len() + b.len()) as f64
}

/// Scores anchor candidates against a target page.
#[derive(Debug, Clone)]
pub struct Scorer {
    weights: ScoringWeights,
    min_words: usize,
    max_words: usize,
    preferred_position: PreferredPosition,
}

impl Scorer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            weights: config.weights.clone(),
            min_words: config.min_anchor_words,
            max_words: config.max_anchor_words,
            preferred_position: config.preferred_position,
        }
    }

    pub fn score(
        &self,
        candidate: &AnchorCandidate,
        entry: &CatalogEntry,
        block: &TextBlock,
    ) -> ScoreBreakdown {
        let w = &self.weights;
        let words: Vec<&str> = candidate.phrase.split_whitespace().collect();
        let terms = term_set(&candidate.phrase);

        let mut breakdown = ScoreBreakdown {
            word_count: self.word_count_score(words.len()),
            ..Default::default()
        };

        if words.first().is_some_and(|word| is_stopword(word)) {
            breakdown.stopword_boundary -= w.leading_stopword_penalty;
        }
        if words.len() > 1 && words.last().is_some_and(|word| is_stopword(word)) {
            breakdown.stopword_boundary -= w.trailing_stopword_penalty;
        }

        if is_forbidden(&candidate.phrase) {
            breakdown.forbidden = -w.forbidden_penalty;
        }

        let power = terms
            .iter()
            .filter(|t| POWER_WORD_SET.contains(t.as_str()))
            .count();
        breakdown.power_words = (power as f64 * w.power_word_bonus).min(w.power_word_cap);

        breakdown.title_relevance = dice(&terms, &entry.terms) * w.title_relevance;
        breakdown.context_relevance = dice(&terms, &surrounding_terms(candidate, block)) * w.context_relevance;
        breakdown.position = self.position_score(candidate.position);

        if let Some(heading) = &block.heading {
            if !terms.is_empty() {
                let heading_terms = term_set(heading);
                let overlap = terms.iter().filter(|t| heading_terms.contains(*t)).count();
                if overlap as f64 / terms.len() as f64 >= w.heading_overlap_ratio {
                    breakdown.heading_duplication = -w.heading_duplication_penalty;
                }
            }
        }

        breakdown
    }

    fn word_count_score(&self, count: usize) -> f64 {
        let w = &self.weights;
        if count < self.min_words {
            -w.out_of_range_penalty * (self.min_words - count) as f64
        } else if count > self.max_words {
            -w.out_of_range_penalty * (count - self.max_words) as f64
        } else if (4..=5).contains(&count) {
            w.word_count_fit + w.sweet_spot_bonus
        } else {
            w.word_count_fit
        }
    }

    fn position_score(&self, fraction: f64) -> f64 {
        let w = &self.weights;
        match self.preferred_position {
            PreferredPosition::Middle => {
                if (0.25..=0.75).contains(&fraction) {
                    w.position_bonus
                } else if fraction < 0.10 {
                    -w.early_position_penalty
                } else {
                    0.0
                }
            }
            PreferredPosition::Start if fraction < 0.33 => w.position_bonus,
            PreferredPosition::End if fraction > 0.66 => w.position_bonus,
            _ => 0.0,
        }
    }
}

/// Terms of the block text with the candidate span cut out.
fn surrounding_terms(candidate: &AnchorCandidate, block: &TextBlock) -> HashSet<String> {
    let text = &block.text;
    let start = candidate.offset.min(text.len());
    let end = (start + candidate.phrase.len()).min(text.len());
    match (text.get(..start), text.get(end..)) {
        (Some(before), Some(after)) => {
            let mut terms = term_set(before);
            terms.extend(term_set(after));
            terms
        }
        _ => term_set(text),
    }
}
