//! Shared fixtures for integration tests
//!
//! A small SEO blog: five catalog pages and paragraphs written so that each
//! paragraph clearly matches exactly one page.

#![allow(dead_code)]

use interlink::{EngineConfig, LinkEngine, TargetPage};

pub const BASE_URL: &str = "https://example.com";

/// One paragraph per catalog page, in catalog order.
pub const PARAGRAPHS: &[&str] = &[
    "Our advanced keyword research guide covers every step for beginners.",
    "Before publishing, run through a technical seo audit checklist to catch crawl errors early.",
    "Growing authority takes patience, and proven link building strategies make the difference for new sites.",
    "A documented content marketing strategy framework keeps every writer aligned with business goals.",
    "Shops with one storefront benefit most from local seo tips for small business owners this year.",
];

pub fn site_pages() -> Vec<TargetPage> {
    vec![
        TargetPage::new("Advanced Keyword Research Guide", "keyword-research-guide")
            .with_keywords(["search volume"])
            .with_category("research"),
        TargetPage::new("Technical SEO Audit Checklist", "technical-seo-audit")
            .with_category("technical"),
        TargetPage::new("Link Building Strategies", "link-building-strategies")
            .with_description("Earning backlinks that last"),
        TargetPage::new("Content Marketing Strategy Framework", "content-marketing-strategy"),
        TargetPage::new("Local SEO Tips for Small Business", "local-seo-tips"),
    ]
}

pub fn engine() -> LinkEngine {
    engine_with(EngineConfig::default())
}

pub fn engine_with(config: EngineConfig) -> LinkEngine {
    LinkEngine::new(site_pages(), BASE_URL, config).expect("fixture catalog is valid")
}

/// Wrap each paragraph in `<p>` and join with newlines.
pub fn html_document(paragraphs: &[&str]) -> String {
    paragraphs
        .iter()
        .map(|p| format!("<p>{}</p>", p))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn url(slug: &str) -> String {
    format!("{}/{}/", BASE_URL, slug)
}

pub fn catalog_json() -> String {
    serde_json::to_string_pretty(&site_pages()).expect("pages serialize")
}
