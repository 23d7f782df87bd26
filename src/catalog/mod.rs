//! Target page catalog
//!
//! Pages arrive from the host application as loosely structured records
//! (usually sitemap or CMS exports). They are validated once, up front, so the
//! scoring path can rely on every page having a title and a unique slug.

use crate::text::term_set;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// A linkable destination page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPage {
    pub title: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Explicit destination; overrides `base_url/slug/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl TargetPage {
    pub fn new(title: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            description: None,
            keywords: Vec::new(),
            category: None,
            url: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Destination URL: the explicit `url` if set, else `base_url/slug/`.
    pub fn resolve_url(&self, base_url: &str) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        format!(
            "{}/{}/",
            base_url.trim_end_matches('/'),
            self.slug.trim_matches('/')
        )
    }
}

/// Catalog validation failures. Fatal: rejected before any block is scanned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("Catalog is empty")]
    Empty,

    #[error("Catalog entry {index} is missing `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("Catalog entry {index} has an invalid slug: {slug:?}")]
    InvalidSlug { index: usize, slug: String },

    #[error("Duplicate slug in catalog: {0}")]
    DuplicateSlug(String),

    #[error("Failed to read catalog: {0}")]
    Io(String),

    #[error("Failed to parse catalog: {0}")]
    Parse(String),
}

/// A validated page with its precomputed match terms.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub page: TargetPage,
    /// Normalized terms of the title, slug and keywords
    pub terms: HashSet<String>,
}

/// Validated, ordered set of target pages.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Validate pages, keeping caller order.
    pub fn new(pages: Vec<TargetPage>) -> Result<Self, CatalogError> {
        if pages.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(pages.len());
        for (index, mut page) in pages.into_iter().enumerate() {
            if page.title.trim().is_empty() {
                return Err(CatalogError::MissingField {
                    index,
                    field: "title",
                });
            }
            let slug = page.slug.trim().trim_matches('/').to_string();
            if slug.is_empty() {
                return Err(CatalogError::MissingField {
                    index,
                    field: "slug",
                });
            }
            if slug.chars().any(char::is_whitespace) {
                return Err(CatalogError::InvalidSlug {
                    index,
                    slug: page.slug.clone(),
                });
            }
            if !seen.insert(slug.clone()) {
                return Err(CatalogError::DuplicateSlug(slug));
            }

            page.slug = slug;
            entries.push(CatalogEntry::new(page));
        }

        Ok(Self { entries })
    }

    /// Parse a JSON array of pages.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let pages: Vec<TargetPage> =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(pages)
    }

    /// Parse a YAML sequence of pages.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let pages: Vec<TargetPage> =
            serde_yaml::from_str(yaml).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(pages)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CatalogError::Io(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            _ => Self::from_json(&content),
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, slug: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.page.slug == slug)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CatalogEntry {
    fn new(page: TargetPage) -> Self {
        let mut terms = term_set(&page.title);
        terms.extend(term_set(&page.slug));
        for keyword in &page.keywords {
            terms.extend(term_set(keyword));
        }
        Self { page, terms }
    }
}
