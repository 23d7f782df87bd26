//! Anchor selection and document-level linking
//!
//! The pipeline for one block: [`eligibility`] → [`extract_candidates`] per
//! catalog page → [`Scorer`] → best decision → [`SafeInjector`](crate::markup::SafeInjector).
//! [`LinkEngine`] drives it over a whole document.

mod candidate;
mod engine;
mod report;
mod scorer;
mod selector;
mod state;

pub use candidate::{extract_candidates, is_forbidden, AnchorCandidate, FORBIDDEN_ANCHORS};
pub use engine::{BlocksResult, EngineError, EngineResult, LinkEngine, LinkResult};
pub use report::{BlockOutcome, BlockReport, LinkRecord, LinkReport, LinkStats};
pub use scorer::{dice, ScoreBreakdown, Scorer, POWER_WORDS};
pub use selector::{eligibility, select_best_link, BlockError, LinkDecision, SkipReason};
pub use state::EngineState;
