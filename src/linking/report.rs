//! Link report

use super::selector::{LinkDecision, SkipReason};
use crate::text::normalize_phrase;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

/// One injected link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkRecord {
    pub anchor_text: String,
    pub target_slug: String,
    pub target_url: String,
    pub score: f64,
    pub block_index: usize,
}

impl From<&LinkDecision> for LinkRecord {
    fn from(decision: &LinkDecision) -> Self {
        Self {
            anchor_text: decision.anchor.phrase.clone(),
            target_slug: decision.target.slug.clone(),
            target_url: decision.target_url.clone(),
            score: decision.score,
            block_index: decision.block_index(),
        }
    }
}

/// What happened to a scanned block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BlockOutcome {
    Linked {
        target_slug: String,
        anchor_text: String,
    },
    Skipped {
        reason: SkipReason,
    },
    /// No candidate cleared the quality threshold
    NoCandidate,
    /// A decision was made but could not be injected safely
    InjectionConflict {
        target_slug: String,
        anchor_text: String,
        error: String,
    },
    /// The block could not be processed
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockReport {
    pub block_index: usize,
    #[serde(flatten)]
    pub outcome: BlockOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkStats {
    pub links_injected: usize,
    pub unique_targets: usize,
    pub unique_anchors: usize,
    pub average_score: f64,
    /// Blocks visited before the run stopped
    pub blocks_scanned: usize,
    pub blocks_eligible: usize,
}

/// Outcome of one document run.
#[derive(Debug, Clone, Serialize)]
pub struct LinkReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Injected links in document order
    pub links: Vec<LinkRecord>,
    pub blocks: Vec<BlockReport>,
    pub stats: LinkStats,
}

impl Default for LinkReport {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkReport {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            links: Vec::new(),
            blocks: Vec::new(),
            stats: LinkStats::default(),
        }
    }

    pub(crate) fn record(&mut self, block_index: usize, outcome: BlockOutcome) {
        self.stats.blocks_scanned += 1;
        if !matches!(outcome, BlockOutcome::Skipped { .. }) {
            self.stats.blocks_eligible += 1;
        }
        self.blocks.push(BlockReport {
            block_index,
            outcome,
        });
    }

    pub(crate) fn record_link(&mut self, decision: &LinkDecision) {
        self.links.push(LinkRecord::from(decision));
        self.record(
            decision.block_index(),
            BlockOutcome::Linked {
                target_slug: decision.target.slug.clone(),
                anchor_text: decision.anchor.phrase.clone(),
            },
        );
    }

    /// Recompute the link-derived statistics.
    pub(crate) fn finish(&mut self) {
        let stats = &mut self.stats;
        stats.links_injected = self.links.len();
        stats.unique_targets = self
            .links
            .iter()
            .map(|l| l.target_slug.as_str())
            .collect::<HashSet<_>>()
            .len();
        stats.unique_anchors = self
            .links
            .iter()
            .map(|l| normalize_phrase(&l.anchor_text))
            .collect::<HashSet<_>>()
            .len();
        stats.average_score = if self.links.is_empty() {
            0.0
        } else {
            self.links.iter().map(|l| l.score).sum::<f64>() / self.links.len() as f64
        };
    }

    pub fn outcome(&self, block_index: usize) -> Option<&BlockOutcome> {
        self.blocks
            .iter()
            .find(|b| b.block_index == block_index)
            .map(|b| &b.outcome)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
