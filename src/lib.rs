//! Interlink: Internal Link Injection Engine
//!
//! Given rendered HTML and a catalog of pages on the same site, picks at most
//! one anchor phrase per paragraph or list item and turns it into a link to
//! the best-matching page.
//!
//! # Guarantees
//!
//! - **One link per target**: a page is linked at most once per document
//! - **One use per anchor**: the same phrase never anchors two links
//! - **No nesting**: text inside existing links, code or headings is never wrapped
//! - **Fail closed**: a block that cannot be rewritten safely is left as is
//!
//! # Example
//!
//! ```
//! use interlink::{EngineConfig, LinkEngine, TargetPage};
//!
//! let engine = LinkEngine::new(
//!     vec![TargetPage::new("Advanced Keyword Research Guide", "keyword-research-guide")],
//!     "https://example.com",
//!     EngineConfig::default(),
//! )
//! .unwrap();
//!
//! let result = engine.link_html(
//!     "<p>Our advanced keyword research guide covers every step for beginners.</p>",
//! );
//! assert_eq!(result.report.links.len(), 1);
//! ```

pub mod catalog;
pub mod config;
pub mod linking;
pub mod markup;
pub mod text;

pub use catalog::{Catalog, CatalogEntry, CatalogError, TargetPage};
pub use config::{ConfigError, EngineConfig, PreferredPosition, ScoringWeights};
pub use linking::{
    AnchorCandidate, BlockError, BlockOutcome, BlocksResult, EngineError, EngineResult,
    EngineState, LinkDecision, LinkEngine, LinkReport, LinkResult, LinkStats, ScoreBreakdown,
    Scorer, SkipReason,
};
pub use markup::{Document, InjectionConflict, MarkupError, SafeInjector, TextBlock};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
