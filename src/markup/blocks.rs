//! Paragraph and list-item segmentation
//!
//! Splits an HTML document into non-overlapping text blocks, remembering the
//! byte range of each block's inner markup so rewritten blocks can be spliced
//! back into the untouched source. Blocks inside excluded zones (quotes,
//! tables, FAQ regions, existing links...) are kept but flagged.

use super::entities::decode;
use super::scanner::{
    attribute, is_void_element, tokenize, tokenize_lenient, ElementStack, MarkupError, Token,
    TokenKind,
};
use serde::Serialize;
use std::collections::HashMap;
use std::ops::Range;

/// Elements that terminate an open paragraph or list item.
const BOUNDARY_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "dd", "dt", "fieldset",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "main",
    "menu", "nav", "ol", "pre", "section", "summary", "table", "ul",
];

/// Ancestors whose content is never linked.
const EXCLUDED_ANCESTORS: &[&str] = &[
    "a", "aside", "blockquote", "button", "caption", "code", "figcaption", "figure", "footer",
    "form", "header", "nav", "pre", "q", "script", "style", "table", "tbody", "td", "tfoot",
    "th", "thead", "tr",
];

/// Elements whose text does not end up in a block's plain text.
const HIDDEN_TEXT: &[&str] = &["script", "style", "template"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    ListItem,
}

/// Why a block may not receive a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Exclusion {
    /// Nested inside an element such as `blockquote` or `table`
    Ancestor(String),
    /// Inside an element whose class or id marks an FAQ region
    FaqRegion,
    /// Under a heading listed in `excluded_sections`
    Section(String),
}

/// A paragraph- or list-item-level unit of linkable content.
#[derive(Debug, Clone)]
pub struct TextBlock {
    /// Position in document order
    pub index: usize,
    pub kind: BlockKind,
    /// Inner markup of the block element
    pub markup: String,
    /// Tag-stripped, entity-decoded, whitespace-collapsed text
    pub text: String,
    /// Byte range of `markup` within the source document
    pub range: Range<usize>,
    /// Number of `<a>` elements already in the block
    pub existing_links: usize,
    /// Text of the nearest preceding heading
    pub heading: Option<String>,
    pub exclusion: Option<Exclusion>,
    /// Set when the block's markup cannot be tokenized safely
    pub defect: Option<MarkupError>,
}

impl TextBlock {
    /// Build a standalone block from pre-segmented inner markup.
    pub fn from_markup(index: usize, markup: impl Into<String>) -> Self {
        let markup = markup.into();
        let len = markup.len();
        Self::build(index, BlockKind::Paragraph, markup, 0..len)
    }

    fn build(index: usize, kind: BlockKind, markup: String, range: Range<usize>) -> Self {
        let (text, existing_links, defect) = match tokenize(&markup) {
            Ok(tokens) => {
                let (text, links) = plain_text(&markup, &tokens);
                (text, links, None)
            }
            Err(err) => {
                let (tokens, _) = tokenize_lenient(&markup);
                let (text, links) = plain_text(&markup, &tokens);
                (text, links, Some(err))
            }
        };
        Self {
            index,
            kind,
            markup,
            text,
            range,
            existing_links,
            heading: None,
            exclusion: None,
            defect,
        }
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    pub fn with_exclusion(mut self, exclusion: Exclusion) -> Self {
        self.exclusion = Some(exclusion);
        self
    }

    /// Length of the plain text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A link that was already present in the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingLink {
    pub href: String,
    pub text: String,
}

/// A parsed HTML document: the untouched source plus its text blocks.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    pub blocks: Vec<TextBlock>,
    pub existing_links: Vec<ExistingLink>,
}

struct OpenBlock {
    kind: BlockKind,
    inner_start: usize,
    exclusion: Option<Exclusion>,
}

struct OpenSection {
    level: u8,
    heading: String,
}

impl Document {
    /// Segment a document. `excluded_sections` are heading texts (matched
    /// case-insensitively at the start or end of a heading) whose sections
    /// are never linked.
    pub fn parse(html: &str, excluded_sections: &[String]) -> Self {
        let (tokens, _) = tokenize_lenient(html);
        let mut segmenter = Segmenter::new(html, excluded_sections);
        for token in &tokens {
            segmenter.feed(token);
        }
        segmenter.finish()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Splice replacement inner markup (keyed by block index) into the source.
    ///
    /// Blocks without a replacement are copied byte for byte.
    pub fn render(&self, replacements: &HashMap<usize, String>) -> String {
        let mut out = String::with_capacity(self.source.len() + replacements.len() * 64);
        let mut cursor = 0;
        for block in &self.blocks {
            if let Some(markup) = replacements.get(&block.index) {
                out.push_str(&self.source[cursor..block.range.start]);
                out.push_str(markup);
                cursor = block.range.end;
            }
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

struct Segmenter<'a> {
    html: &'a str,
    excluded_sections: Vec<Vec<String>>,
    stack: ElementStack,
    open: Option<OpenBlock>,
    blocks: Vec<TextBlock>,
    /// Stack depth at which an FAQ-marked element was opened
    faq_depth: Option<usize>,
    heading_start: Option<(u8, usize)>,
    last_heading: Option<String>,
    excluded_section: Option<OpenSection>,
    link_start: Option<(String, usize)>,
    existing_links: Vec<ExistingLink>,
}

impl<'a> Segmenter<'a> {
    fn new(html: &'a str, excluded_sections: &[String]) -> Self {
        Self {
            html,
            excluded_sections: excluded_sections
                .iter()
                .map(|s| heading_words(s))
                .filter(|w| !w.is_empty())
                .collect(),
            stack: ElementStack::new(),
            open: None,
            blocks: Vec::new(),
            faq_depth: None,
            heading_start: None,
            last_heading: None,
            excluded_section: None,
            link_start: None,
            existing_links: Vec::new(),
        }
    }

    fn feed(&mut self, token: &Token) {
        let html = self.html;
        let raw = &html[token.range.clone()];
        match &token.kind {
            TokenKind::StartTag { name, self_closing } => {
                let name = name.as_str();
                let block_kind = match name {
                    "p" => Some(BlockKind::Paragraph),
                    "li" => Some(BlockKind::ListItem),
                    _ => None,
                };
                if block_kind.is_some() || BOUNDARY_ELEMENTS.contains(&name) {
                    self.close_block(token.range.start);
                }

                self.stack.apply(token);
                let opened = !self_closing && !is_void_element(name);
                if let Some(depth) = self.faq_depth {
                    // Implicit closes may have popped the marked element
                    if self.stack.depth() - usize::from(opened) < depth {
                        self.faq_depth = None;
                    }
                }
                if opened && self.faq_depth.is_none() && is_faq_marked(raw) {
                    self.faq_depth = Some(self.stack.depth());
                }

                if let Some(level) = heading_level(name) {
                    self.heading_start = Some((level, token.range.end));
                }
                if name == "a" {
                    let href = attribute(raw, "href").unwrap_or_default().to_string();
                    self.link_start = Some((href, token.range.end));
                }
                if let Some(kind) = block_kind {
                    let exclusion = self.current_exclusion();
                    self.open = Some(OpenBlock {
                        kind,
                        inner_start: token.range.end,
                        exclusion,
                    });
                }
            }
            TokenKind::EndTag { name } => {
                let name = name.as_str();
                let closes_block = match &self.open {
                    Some(open) => {
                        BOUNDARY_ELEMENTS.contains(&name)
                            || (name == "p" && open.kind == BlockKind::Paragraph)
                            || (name == "li" && open.kind == BlockKind::ListItem)
                    }
                    None => false,
                };
                if closes_block {
                    self.close_block(token.range.start);
                }
                if name == "a" {
                    if let Some((href, start)) = self.link_start.take() {
                        let inner = &self.html[start..token.range.start];
                        let text = collapse(&decode(&strip_tags(inner)));
                        self.existing_links.push(ExistingLink { href, text });
                    }
                }
                if let Some(level) = heading_level(name) {
                    if let Some((open_level, start)) = self.heading_start.take() {
                        let inner = &self.html[start..token.range.start];
                        let text = collapse(&decode(&strip_tags(inner)));
                        self.enter_heading(open_level.min(level), text);
                    }
                }

                self.stack.apply(token);
                if let Some(depth) = self.faq_depth {
                    if self.stack.depth() < depth {
                        self.faq_depth = None;
                    }
                }
            }
            _ => {}
        }
    }

    fn current_exclusion(&self) -> Option<Exclusion> {
        let names = self.stack.names();
        // The block element itself is on top of the stack
        let ancestors = &names[..names.len().saturating_sub(1)];
        if let Some(tag) = ancestors
            .iter()
            .find(|n| EXCLUDED_ANCESTORS.contains(&n.as_str()))
        {
            return Some(Exclusion::Ancestor(tag.clone()));
        }
        if self.faq_depth.is_some() {
            return Some(Exclusion::FaqRegion);
        }
        self.excluded_section
            .as_ref()
            .map(|s| Exclusion::Section(s.heading.clone()))
    }

    fn enter_heading(&mut self, level: u8, text: String) {
        if let Some(section) = &self.excluded_section {
            if level <= section.level {
                self.excluded_section = None;
            }
        }
        if self.excluded_section.is_none() && self.is_excluded_heading(&text) {
            self.excluded_section = Some(OpenSection {
                level,
                heading: text.clone(),
            });
        }
        self.last_heading = Some(text);
    }

    fn is_excluded_heading(&self, text: &str) -> bool {
        let words = heading_words(text);
        self.excluded_sections
            .iter()
            .any(|pattern| words.starts_with(pattern) || words.ends_with(pattern))
    }

    fn close_block(&mut self, end: usize) {
        let Some(open) = self.open.take() else {
            return;
        };
        if end <= open.inner_start {
            return;
        }
        let markup = self.html[open.inner_start..end].to_string();
        let mut block = TextBlock::build(self.blocks.len(), open.kind, markup, open.inner_start..end);
        if block.text.is_empty() {
            return;
        }
        block.heading = self.last_heading.clone();
        block.exclusion = open.exclusion;
        self.blocks.push(block);
    }

    fn finish(mut self) -> Document {
        self.close_block(self.html.len());
        Document {
            source: self.html.to_string(),
            blocks: self.blocks,
            existing_links: self.existing_links,
        }
    }
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn heading_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

fn is_faq_marked(raw_tag: &str) -> bool {
    ["class", "id"].iter().any(|attr| {
        attribute(raw_tag, attr)
            .map(|v| v.to_ascii_lowercase().contains("faq"))
            .unwrap_or(false)
    })
}

/// Plain text and link count of a tokenized fragment.
fn plain_text(markup: &str, tokens: &[Token]) -> (String, usize) {
    let mut text = String::new();
    let mut stack = ElementStack::new();
    let mut links = 0;

    for token in tokens {
        match &token.kind {
            TokenKind::Text => {
                if !stack.contains_any(HIDDEN_TEXT) {
                    text.push_str(&decode(&markup[token.range.clone()]));
                }
            }
            TokenKind::StartTag { name, .. } => {
                if name == "a" {
                    links += 1;
                }
                if name == "br" || breaks_text(name) {
                    text.push(' ');
                }
            }
            TokenKind::EndTag { name } => {
                if breaks_text(name) {
                    text.push(' ');
                }
            }
            TokenKind::Other => {}
        }
        stack.apply(token);
    }

    (collapse(&text), links)
}

fn breaks_text(name: &str) -> bool {
    name == "p" || name == "li" || BOUNDARY_ELEMENTS.contains(&name)
}

fn strip_tags(markup: &str) -> String {
    let (tokens, _) = tokenize_lenient(markup);
    tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Text)
        .map(|t| &markup[t.range.clone()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
