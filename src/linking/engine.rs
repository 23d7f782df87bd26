//! Document orchestration
//!
//! One run walks a document's blocks in order, asks the selector for a
//! decision per block, injects it, and updates the run's [`EngineState`].
//! The engine itself is immutable and can be shared across threads; every
//! run owns its state.

use super::report::{BlockOutcome, LinkReport};
use super::selector::{eligibility, select_best_link};
use super::state::EngineState;
use crate::catalog::{Catalog, CatalogError, TargetPage};
use crate::config::{ConfigError, EngineConfig};
use crate::markup::{Document, ExistingLink, SafeInjector, TextBlock};
use pulldown_cmark::{html, Options, Parser};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fatal setup errors. Nothing is processed when one occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(#[from] CatalogError),

    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Rewritten HTML and what was done to it.
#[derive(Debug, Clone)]
pub struct LinkResult {
    pub html: String,
    pub report: LinkReport,
}

/// Rewritten pre-segmented blocks, in input order.
#[derive(Debug, Clone)]
pub struct BlocksResult {
    pub blocks: Vec<String>,
    pub report: LinkReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Scanning,
    Done,
}

/// Injects internal links into documents against a fixed catalog.
#[derive(Debug, Clone)]
pub struct LinkEngine {
    catalog: Catalog,
    base_url: String,
    config: EngineConfig,
    injector: SafeInjector,
}

impl LinkEngine {
    /// Validate `pages` and `config` and build an engine.
    pub fn new(
        pages: Vec<TargetPage>,
        base_url: impl Into<String>,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        let catalog = Catalog::new(pages)?;
        Self::with_catalog(catalog, base_url, config)
    }

    pub fn with_catalog(
        catalog: Catalog,
        base_url: impl Into<String>,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        config.validate()?;
        let injector = match &config.link_class {
            Some(class) => SafeInjector::new().with_class(class.clone()),
            None => SafeInjector::new(),
        };
        Ok(Self {
            catalog,
            base_url: base_url.into(),
            config,
            injector,
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Link an HTML document. Blocks that are not rewritten, and everything
    /// between blocks, come back byte-identical.
    pub fn link_html(&self, html: &str) -> LinkResult {
        let document = Document::parse(html, &self.config.excluded_sections);
        let (replacements, report) = self.run(&document.blocks, &document.existing_links);
        LinkResult {
            html: document.render(&replacements),
            report,
        }
    }

    /// Render CommonMark to HTML, then link it.
    pub fn link_markdown(&self, markdown: &str) -> LinkResult {
        let parser = Parser::new_ext(markdown, Options::all());
        let mut rendered = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut rendered, parser);
        self.link_html(&rendered)
    }

    /// Link blocks the host has already segmented.
    ///
    /// Blocks are re-indexed by position; existing links inside them seed the
    /// run state like they do for whole documents.
    pub fn link_blocks(&self, blocks: Vec<TextBlock>) -> BlocksResult {
        let blocks: Vec<TextBlock> = blocks
            .into_iter()
            .enumerate()
            .map(|(i, mut block)| {
                block.index = i;
                block
            })
            .collect();
        let existing: Vec<ExistingLink> = blocks
            .iter()
            .flat_map(|b| Document::parse(&b.markup, &[]).existing_links)
            .collect();

        let (mut replacements, report) = self.run(&blocks, &existing);
        let blocks = blocks
            .into_iter()
            .map(|b| replacements.remove(&b.index).unwrap_or(b.markup))
            .collect();
        BlocksResult { blocks, report }
    }

    fn run(
        &self,
        blocks: &[TextBlock],
        existing: &[ExistingLink],
    ) -> (HashMap<usize, String>, LinkReport) {
        let mut state = EngineState::seeded(&self.catalog, &self.base_url, existing);
        let mut report = LinkReport::new();
        let mut replacements = HashMap::new();
        let mut phase = Phase::Scanning;
        let max_links = self.config.max_links_per_document;

        debug!(
            run_id = %report.run_id,
            blocks = blocks.len(),
            seeded_targets = state.used_target_slugs().len(),
            seeded_anchors = state.used_anchors().len(),
            "starting link run"
        );

        for block in blocks {
            if state.links_injected() >= max_links {
                phase = Phase::Done;
            }
            if phase == Phase::Done {
                break;
            }

            if let Some(reason) = eligibility(block, &self.config) {
                debug!(block = block.index, ?reason, "block skipped");
                report.record(block.index, BlockOutcome::Skipped { reason });
                continue;
            }

            let decision =
                match select_best_link(block, &self.catalog, &state, &self.config, &self.base_url) {
                    Ok(Some(decision)) => decision,
                    Ok(None) => {
                        debug!(block = block.index, "no candidate above threshold");
                        report.record(block.index, BlockOutcome::NoCandidate);
                        continue;
                    }
                    Err(err) => {
                        warn!(block = block.index, error = %err, "skipping block");
                        report.record(
                            block.index,
                            BlockOutcome::Failed {
                                error: err.to_string(),
                            },
                        );
                        continue;
                    }
                };

            match self
                .injector
                .inject(&block.markup, &decision.anchor.phrase, &decision.target_url)
            {
                Ok(markup) => {
                    debug!(
                        block = block.index,
                        target = %decision.target.slug,
                        anchor = %decision.anchor.phrase,
                        score = decision.score,
                        "link injected"
                    );
                    state.record(&decision);
                    report.record_link(&decision);
                    replacements.insert(block.index, markup);
                }
                Err(conflict) => {
                    warn!(
                        block = block.index,
                        target = %decision.target.slug,
                        anchor = %decision.anchor.phrase,
                        error = %conflict,
                        "injection refused"
                    );
                    report.record(
                        block.index,
                        BlockOutcome::InjectionConflict {
                            target_slug: decision.target.slug.clone(),
                            anchor_text: decision.anchor.phrase.clone(),
                            error: conflict.to_string(),
                        },
                    );
                }
            }
        }

        report.finish();
        info!(
            run_id = %report.run_id,
            links = report.stats.links_injected,
            scanned = report.stats.blocks_scanned,
            eligible = report.stats.blocks_eligible,
            average_score = report.stats.average_score,
            "link run finished"
        );
        (replacements, report)
    }
}
