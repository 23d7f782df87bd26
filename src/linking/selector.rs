//! Per-block link selection

use super::candidate::{extract_candidates, AnchorCandidate};
use super::scorer::{ScoreBreakdown, Scorer};
use super::state::EngineState;
use crate::catalog::{Catalog, TargetPage};
use crate::config::EngineConfig;
use crate::markup::{Exclusion, MarkupError, TextBlock};
use serde::Serialize;
use thiserror::Error;

/// A block that could not be processed. The block is skipped; the run goes on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("Block {index} has malformed markup: {source}")]
    Markup { index: usize, source: MarkupError },
}

/// Why a block is not considered for linking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    Excluded { exclusion: Exclusion },
    TooManyLinks { existing: usize },
    TooShort { chars: usize },
}

/// The chosen anchor and target for one block.
#[derive(Debug, Clone)]
pub struct LinkDecision {
    pub anchor: AnchorCandidate,
    pub target: TargetPage,
    pub target_url: String,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

impl LinkDecision {
    pub fn block_index(&self) -> usize {
        self.anchor.block_index
    }

    pub fn target_slug(&self) -> &str {
        &self.target.slug
    }
}

/// `None` when the block may receive a link, else the reason it may not.
pub fn eligibility(block: &TextBlock, config: &EngineConfig) -> Option<SkipReason> {
    if let Some(exclusion) = &block.exclusion {
        return Some(SkipReason::Excluded {
            exclusion: exclusion.clone(),
        });
    }
    if block.existing_links >= config.max_existing_links {
        return Some(SkipReason::TooManyLinks {
            existing: block.existing_links,
        });
    }
    let chars = block.char_len();
    if chars < config.min_block_chars {
        return Some(SkipReason::TooShort { chars });
    }
    None
}

/// Pick the best (page, anchor) pair for a block.
///
/// Pages are tried in catalog order, skipping targets already linked in this
/// run. A later candidate replaces the current best only with a strictly
/// higher score, so catalog order and then candidate order break ties.
pub fn select_best_link(
    block: &TextBlock,
    catalog: &Catalog,
    state: &EngineState,
    config: &EngineConfig,
    base_url: &str,
) -> Result<Option<LinkDecision>, BlockError> {
    if eligibility(block, config).is_some() {
        return Ok(None);
    }
    if let Some(defect) = &block.defect {
        return Err(BlockError::Markup {
            index: block.index,
            source: defect.clone(),
        });
    }

    let scorer = Scorer::new(config);
    let mut best: Option<(AnchorCandidate, &TargetPage, ScoreBreakdown, f64)> = None;

    for entry in catalog.entries() {
        if state.is_target_used(&entry.page.slug) {
            continue;
        }
        for candidate in extract_candidates(block, entry, state.used_anchors(), config) {
            let breakdown = scorer.score(&candidate, entry, block);
            let score = breakdown.total();
            let threshold = if candidate.is_direct() {
                config.direct_accept_score.max(config.min_quality_score)
            } else {
                config.min_quality_score
            };
            if score < threshold {
                continue;
            }
            if best.as_ref().map_or(true, |(_, _, _, s)| score > *s) {
                best = Some((candidate, &entry.page, breakdown, score));
            }
        }
    }

    Ok(best.map(|(anchor, page, breakdown, score)| LinkDecision {
        anchor,
        target_url: page.resolve_url(base_url),
        target: page.clone(),
        score,
        breakdown,
    }))
}
