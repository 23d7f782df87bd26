//! Safe link injection
//!
//! Wraps the first linkable occurrence of an anchor phrase in a hyperlink.
//! "Linkable" is decided structurally: the block is tokenized, an open-element
//! stack is kept, and text under an existing link (or code, headings, form
//! controls) is never touched. When no safe occurrence exists the caller gets
//! an error and keeps the original markup.

use super::entities::{decode_with_offsets, escape_attribute};
use super::scanner::{tokenize, ElementStack, MarkupError, TokenKind};
use crate::text::split_words;

/// Ancestors under which text is never wrapped in a new link.
const NON_LINKABLE: &[&str] = &[
    "a", "button", "code", "h1", "h2", "h3", "h4", "h5", "h6", "kbd", "label", "option", "pre",
    "samp", "script", "select", "style", "textarea",
];

/// Why an anchor could not be wrapped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectionConflict {
    #[error("Anchor text not found in block")]
    NotFound,

    #[error("Anchor text only occurs inside existing links or code")]
    AlreadyLinked,

    #[error("Block markup is malformed: {0}")]
    Malformed(#[from] MarkupError),
}

/// Rewrites block markup to link an anchor phrase.
#[derive(Debug, Clone, Default)]
pub struct SafeInjector {
    class: Option<String>,
}

impl SafeInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `class` attribute to every injected link.
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Wrap the first safe, whole-word, case-insensitive occurrence of
    /// `anchor` in `<a href="url">`. Only that occurrence changes; the rest
    /// of the markup is copied byte for byte.
    pub fn inject(
        &self,
        markup: &str,
        anchor: &str,
        url: &str,
    ) -> Result<String, InjectionConflict> {
        let tokens = tokenize(markup)?;
        let anchor_words: Vec<&str> = anchor.split_whitespace().collect();
        if anchor_words.is_empty() {
            return Err(InjectionConflict::NotFound);
        }

        // (token index, linkable)
        let mut texts: Vec<(usize, bool)> = Vec::new();
        let mut stack = ElementStack::new();
        for (i, token) in tokens.iter().enumerate() {
            match &token.kind {
                TokenKind::Text => texts.push((i, !stack.contains_any(NON_LINKABLE))),
                TokenKind::EndTag { name } if name == "a" && !stack.contains("a") => {
                    // A closing tag without an opener: everything before it
                    // sits inside a link that started outside this block
                    for entry in texts.iter_mut() {
                        entry.1 = false;
                    }
                }
                _ => {}
            }
            stack.apply(token);
        }

        let mut shadowed = false;
        for (i, linkable) in texts {
            let range = tokens[i].range.clone();
            let decoded = decode_with_offsets(&markup[range.clone()]);
            let Some((start, end)) = find_phrase(&decoded.text, &anchor_words) else {
                continue;
            };
            if !linkable {
                shadowed = true;
                continue;
            }

            let (raw_start, raw_end) = decoded.raw_range(start, end);
            let (raw_start, raw_end) = (range.start + raw_start, range.start + raw_end);
            let label = decoded.text[start..end]
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");

            let mut out = String::with_capacity(markup.len() + url.len() + label.len() + 32);
            out.push_str(&markup[..raw_start]);
            out.push_str(&self.open_tag(url, &label));
            out.push_str(&markup[raw_start..raw_end]);
            out.push_str("</a>");
            out.push_str(&markup[raw_end..]);
            return Ok(out);
        }

        Err(if shadowed {
            InjectionConflict::AlreadyLinked
        } else {
            InjectionConflict::NotFound
        })
    }

    fn open_tag(&self, url: &str, label: &str) -> String {
        let mut tag = format!(
            r#"<a href="{}" title="{}""#,
            escape_attribute(url),
            escape_attribute(label)
        );
        if let Some(class) = &self.class {
            tag.push_str(&format!(r#" class="{}""#, escape_attribute(class)));
        }
        tag.push('>');
        tag
    }
}

/// Byte range of the first whole-word, case-insensitive match of `anchor`
/// in `text`. Punctuation at the outer edges of the match is tolerated and
/// left outside the range; whitespace runs between words are allowed.
fn find_phrase(text: &str, anchor: &[&str]) -> Option<(usize, usize)> {
    let words = split_words(text);
    let k = anchor.len();
    if k == 0 || words.len() < k {
        return None;
    }

    for i in 0..=words.len() - k {
        let window = &words[i..i + k];
        let matched = window.iter().zip(anchor).enumerate().all(|(j, (word, expected))| {
            let candidate = match (j == 0, j == k - 1) {
                (true, true) => trim_non_alnum(word.text),
                (true, false) => word.text.trim_start_matches(|c: char| !c.is_alphanumeric()),
                (false, true) => word.text.trim_end_matches(|c: char| !c.is_alphanumeric()),
                (false, false) => word.text,
            };
            eq_ignore_case(candidate, expected)
        });
        if !matched {
            continue;
        }

        let first = window[0];
        let last = window[k - 1];
        let lead = first.text.len()
            - first
                .text
                .trim_start_matches(|c: char| !c.is_alphanumeric())
                .len();
        let kept = last
            .text
            .trim_end_matches(|c: char| !c.is_alphanumeric())
            .len();
        let start = first.start + lead;
        let end = last.start + kept;
        if start < end {
            return Some((start, end));
        }
    }

    None
}

fn trim_non_alnum(word: &str) -> &str {
    word.trim_matches(|c: char| !c.is_alphanumeric())
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inject(markup: &str, anchor: &str) -> Result<String, InjectionConflict> {
        SafeInjector::new().inject(markup, anchor, "/seo-guide/")
    }

    #[test]
    fn wraps_first_occurrence_preserving_case() {
        let out = inject(
            "Our Keyword Research Guide helps. The keyword research guide is free.",
            "keyword research guide",
        )
        .unwrap();
        assert_eq!(
            out,
            r#"Our <a href="/seo-guide/" title="Keyword Research Guide">Keyword Research Guide</a> helps. The keyword research guide is free."#
        );
    }

    #[test]
    fn leaves_edge_punctuation_outside_the_link() {
        let out = inject("Read (keyword research guide), then act.", "keyword research guide").unwrap();
        assert!(out.contains(r#"(<a href="/seo-guide/" title="keyword research guide">keyword research guide</a>),"#));
    }

    #[test]
    fn matches_across_whitespace_runs() {
        let out = inject("the keyword\n   research guide", "keyword research guide").unwrap();
        assert!(out.contains(">keyword\n   research guide</a>"));
    }

    #[test]
    fn requires_whole_words() {
        let err = inject("keyword research guidelines for teams", "keyword research guide").unwrap_err();
        assert_eq!(err, InjectionConflict::NotFound);
    }

    #[test]
    fn refuses_text_inside_existing_links() {
        let markup = r#"See our <a href="/other/">keyword research guide</a> today."#;
        assert_eq!(inject(markup, "keyword research guide"), Err(InjectionConflict::AlreadyLinked));
    }

    #[test]
    fn skips_linked_occurrence_for_a_later_free_one() {
        let markup = r#"<a href="/x/">keyword research guide</a> and another keyword research guide."#;
        let out = inject(markup, "keyword research guide").unwrap();
        assert!(out.starts_with(r#"<a href="/x/">keyword research guide</a> and another <a href="/seo-guide/""#));
        assert_eq!(out.matches("<a ").count(), 2);
    }

    #[test]
    fn stray_closing_tag_marks_preceding_text_as_linked() {
        let markup = "keyword research guide</a> trailing words";
        assert_eq!(inject(markup, "keyword research guide"), Err(InjectionConflict::AlreadyLinked));
    }

    #[test]
    fn ignores_code_and_headings() {
        assert_eq!(
            inject("<code>keyword research guide</code>", "keyword research guide"),
            Err(InjectionConflict::AlreadyLinked)
        );
    }

    #[test]
    fn matches_through_character_references() {
        let out = inject("Don&#8217;t skip the SEO &amp; content plan today", "SEO & content plan").unwrap();
        assert!(out.contains(r#"title="SEO &amp; content plan">SEO &amp; content plan</a>"#));
    }

    #[test]
    fn reports_malformed_markup() {
        let err = inject(r#"keyword research guide <a href="/x""#, "keyword research guide").unwrap_err();
        assert!(matches!(err, InjectionConflict::Malformed(_)));
    }

    #[test]
    fn adds_class_and_escapes_attributes() {
        let out = SafeInjector::new()
            .with_class("internal-link")
            .inject("plain keyword research guide", "keyword research guide", "/a?b=1&c=\"2\"")
            .unwrap();
        assert!(out.contains(r#"href="/a?b=1&amp;c=&quot;2&quot;""#));
        assert!(out.contains(r#"class="internal-link">"#));
    }
}
