//! Per-run link bookkeeping

use super::selector::LinkDecision;
use crate::catalog::Catalog;
use crate::markup::ExistingLink;
use crate::text::normalize_phrase;
use std::collections::HashSet;

/// What one document run has linked so far.
///
/// Created fresh for every run and owned by it; nothing is shared between
/// documents.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    used_target_slugs: HashSet<String>,
    used_anchors: HashSet<String>,
    links_injected: usize,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a document that already contains `existing` links.
    ///
    /// A catalog page counts as linked when an `href` equals its resolved URL
    /// or contains its `/slug/` path. Existing link texts count as used anchors.
    pub fn seeded(catalog: &Catalog, base_url: &str, existing: &[ExistingLink]) -> Self {
        let mut state = Self::new();
        for link in existing {
            let text = normalize_phrase(&link.text);
            if !text.is_empty() {
                state.used_anchors.insert(text);
            }
            if link.href.is_empty() {
                continue;
            }
            for entry in catalog.entries() {
                let page = &entry.page;
                if links_to(&link.href, &page.resolve_url(base_url), &page.slug) {
                    state.used_target_slugs.insert(page.slug.clone());
                }
            }
        }
        state
    }

    pub fn is_target_used(&self, slug: &str) -> bool {
        self.used_target_slugs.contains(slug)
    }

    pub fn is_anchor_used(&self, anchor: &str) -> bool {
        self.used_anchors.contains(&normalize_phrase(anchor))
    }

    pub fn used_anchors(&self) -> &HashSet<String> {
        &self.used_anchors
    }

    pub fn used_target_slugs(&self) -> &HashSet<String> {
        &self.used_target_slugs
    }

    pub fn links_injected(&self) -> usize {
        self.links_injected
    }

    /// Record a successfully injected link.
    pub fn record(&mut self, decision: &LinkDecision) {
        self.used_target_slugs.insert(decision.target.slug.clone());
        self.used_anchors.insert(decision.anchor.normalized());
        self.links_injected += 1;
    }
}

fn links_to(href: &str, url: &str, slug: &str) -> bool {
    let href = href.trim();
    if href.trim_end_matches('/') == url.trim_end_matches('/') {
        return true;
    }
    let path = href.split(|c: char| c == '?' || c == '#').next().unwrap_or(href);
    path.contains(&format!("/{}/", slug)) || path.ends_with(&format!("/{}", slug))
}
