//! HTML tokenizer with byte ranges
//!
//! Produces a flat token stream over the source without building a tree, so
//! callers can rewrite the original bytes in place. Tag names are lowercased;
//! attribute values are extracted on demand.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::ops::Range;

// Quoted attribute values may contain `>`; a tag with an unclosed quote
// never matches and is reported by `push_text`.
static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|<!\[CDATA\[.*?\]\]>|<[!?][^>]*>|</?[A-Za-z][A-Za-z0-9:-]*(?:[^>"']|"[^"]*"|'[^']*')*>"#,
    )
    .expect("tag pattern is valid")
});

static ATTR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z_:][A-Za-z0-9_:.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("attribute pattern is valid")
});

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is raw text up to the matching close tag.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea"];

/// Markup that cannot be tokenized safely.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MarkupError {
    #[error("Unterminated tag at byte {0}")]
    UnterminatedTag(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    StartTag { name: String, self_closing: bool },
    EndTag { name: String },
    /// Comments, doctypes, processing instructions and CDATA
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Range<usize>,
}

impl Token {
    pub fn is_start(&self, tag: &str) -> bool {
        matches!(&self.kind, TokenKind::StartTag { name, .. } if name == tag)
    }

    pub fn is_end(&self, tag: &str) -> bool {
        matches!(&self.kind, TokenKind::EndTag { name } if name == tag)
    }
}

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Tokenize HTML into text and tag tokens covering the whole input.
///
/// Text between tags is emitted as-is. A `<` that starts something tag-like
/// but never closes, or closes only inside an unbalanced quote, is an error:
/// rewriting around it could corrupt the markup.
pub fn tokenize(html: &str) -> Result<Vec<Token>, MarkupError> {
    let (tokens, defects) = tokenize_lenient(html);
    match defects.first() {
        Some(&at) => Err(MarkupError::UnterminatedTag(at)),
        None => Ok(tokens),
    }
}

/// Tokenize without failing; unterminated tags stay in text tokens and their
/// byte positions are returned alongside.
pub fn tokenize_lenient(html: &str) -> (Vec<Token>, Vec<usize>) {
    let mut tokens = Vec::new();
    let mut defects = Vec::new();
    let mut pos = 0;

    while pos < html.len() {
        let Some(m) = TAG_PATTERN.find_at(html, pos) else {
            push_text(html, pos..html.len(), &mut tokens, &mut defects);
            break;
        };

        push_text(html, pos..m.start(), &mut tokens, &mut defects);
        let kind = classify_tag(m.as_str());

        if let TokenKind::StartTag {
            name,
            self_closing: false,
        } = &kind
        {
            if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                let name = name.clone();
                tokens.push(Token {
                    kind,
                    range: m.start()..m.end(),
                });
                let close = find_raw_text_end(html, m.end(), &name);
                if close > m.end() {
                    tokens.push(Token {
                        kind: TokenKind::Text,
                        range: m.end()..close,
                    });
                }
                pos = close;
                continue;
            }
        }

        tokens.push(Token {
            kind,
            range: m.start()..m.end(),
        });
        pos = m.end();
    }

    (tokens, defects)
}

fn push_text(html: &str, range: Range<usize>, tokens: &mut Vec<Token>, defects: &mut Vec<usize>) {
    if range.is_empty() {
        return;
    }
    let bytes = html[range.clone()].as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b != b'<' {
            continue;
        }
        let follows_tag = bytes
            .get(i + 1)
            .map(|n| n.is_ascii_alphabetic() || *n == b'/' || *n == b'!' || *n == b'?')
            .unwrap_or(false);
        if follows_tag {
            defects.push(range.start + i);
        }
    }
    tokens.push(Token {
        kind: TokenKind::Text,
        range,
    });
}

fn classify_tag(raw: &str) -> TokenKind {
    let inner = raw.trim_start_matches('<');
    if inner.starts_with('!') || inner.starts_with('?') {
        return TokenKind::Other;
    }
    let (closing, rest) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == ':' || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase();

    if closing {
        TokenKind::EndTag { name }
    } else {
        let self_closing = raw.trim_end_matches('>').trim_end().ends_with('/');
        TokenKind::StartTag { name, self_closing }
    }
}

fn find_raw_text_end(html: &str, from: usize, name: &str) -> usize {
    let needle = format!("</{}", name);
    html[from..]
        .to_ascii_lowercase()
        .find(&needle)
        .map(|offset| from + offset)
        .unwrap_or(html.len())
}

/// Read an attribute value from a raw start tag.
pub fn attribute<'a>(raw_tag: &'a str, attr: &str) -> Option<&'a str> {
    ATTR_PATTERN.captures_iter(raw_tag).find_map(|caps| {
        let name = caps.get(1)?.as_str();
        if !name.eq_ignore_ascii_case(attr) {
            return None;
        }
        caps.get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| m.as_str())
    })
}

/// Stack of open elements, following HTML's implicit-close rules for the
/// elements that matter to paragraph and list segmentation.
#[derive(Debug, Clone, Default)]
pub struct ElementStack {
    open: Vec<String>,
}

impl ElementStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a token. Returns `false` for an end tag with no matching opener.
    pub fn apply(&mut self, token: &Token) -> bool {
        match &token.kind {
            TokenKind::StartTag { name, self_closing } => {
                match name.as_str() {
                    "p" => self.close_implicit("p", &[]),
                    "li" => self.close_implicit("li", &["ul", "ol", "menu"]),
                    _ => {}
                }
                if !self_closing && !is_void_element(name) {
                    self.open.push(name.clone());
                }
                true
            }
            TokenKind::EndTag { name } => {
                match self.open.iter().rposition(|n| n == name) {
                    Some(idx) => {
                        self.open.truncate(idx);
                        true
                    }
                    None => false,
                }
            }
            _ => true,
        }
    }

    fn close_implicit(&mut self, tag: &str, scope: &[&str]) {
        for idx in (0..self.open.len()).rev() {
            let name = self.open[idx].as_str();
            if scope.contains(&name) {
                return;
            }
            if name == tag {
                self.open.truncate(idx);
                return;
            }
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.open.iter().any(|n| n == tag)
    }

    pub fn contains_any(&self, tags: &[&str]) -> bool {
        self.open.iter().any(|n| tags.contains(&n.as_str()))
    }

    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn names(&self) -> &[String] {
        &self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(html: &str) -> Vec<TokenKind> {
        tokenize(html).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_tags_and_text() {
        let html = r#"<p class="x">Hello <a href="/a/">world</a><br/></p>"#;
        let tokens = tokenize(html).unwrap();
        assert_eq!(tokens.len(), 7);
        assert!(tokens[0].is_start("p"));
        assert_eq!(&html[tokens[1].range.clone()], "Hello ");
        assert!(tokens[2].is_start("a"));
        assert!(tokens[4].is_end("a"));
        assert_eq!(
            tokens[5].kind,
            TokenKind::StartTag {
                name: "br".into(),
                self_closing: true
            }
        );
        assert!(tokens[6].is_end("p"));
    }

    #[test]
    fn tokens_cover_the_input() {
        let html = "<!DOCTYPE html><!-- note --><P>Text &amp; more</P>tail";
        let tokens = tokenize(html).unwrap();
        let rebuilt: String = tokens.iter().map(|t| &html[t.range.clone()]).collect();
        assert_eq!(rebuilt, html);
        assert!(tokens.iter().any(|t| t.is_start("p")));
    }

    #[test]
    fn script_content_is_raw_text() {
        let html = "<script>if (a < b) { x = '<p>'; }</script><p>after</p>";
        let k = kinds(html);
        assert!(matches!(&k[0], TokenKind::StartTag { name, .. } if name == "script"));
        assert_eq!(k[1], TokenKind::Text);
        assert!(matches!(&k[2], TokenKind::EndTag { name } if name == "script"));
        assert!(matches!(&k[3], TokenKind::StartTag { name, .. } if name == "p"));
    }

    #[test]
    fn unterminated_tag_is_an_error() {
        let err = tokenize(r#"<p>Some text <a href="/x" broken"#).unwrap_err();
        assert_eq!(err, MarkupError::UnterminatedTag(3 + "Some text ".len()));
    }

    #[test]
    fn quoted_attributes_may_contain_angle_brackets() {
        let html = r#"<p>Traffic <img alt="visits > 50% after the guide" title='a > b' src="c.png"> grew.</p>"#;
        let tokens = tokenize(html).unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(
            tokens[2].kind,
            TokenKind::StartTag {
                name: "img".into(),
                self_closing: false
            }
        );
        let img = &html[tokens[2].range.clone()];
        assert!(img.ends_with(r#"src="c.png">"#));
        assert_eq!(attribute(img, "alt"), Some("visits > 50% after the guide"));
        assert_eq!(&html[tokens[3].range.clone()], " grew.");
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let html = r#"<p>Text <img alt="never closed src=c.png> more</p>"#;
        let err = tokenize(html).unwrap_err();
        assert_eq!(err, MarkupError::UnterminatedTag(html.find("<img").unwrap()));
    }

    #[test]
    fn lenient_tokenizer_reports_defects() {
        let html = "<p>ok</p><p>bad <em text";
        let (tokens, defects) = tokenize_lenient(html);
        assert_eq!(defects, vec![html.find("<em").unwrap()]);
        assert!(tokens.iter().any(|t| t.is_end("p")));
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        let tokens = tokenize("<p>3 < 4 and 5 > 2</p>").unwrap();
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn reads_attributes() {
        let tag = r#"<div class='faq-block' id=main data-x="1">"#;
        assert_eq!(attribute(tag, "class"), Some("faq-block"));
        assert_eq!(attribute(tag, "ID"), Some("main"));
        assert_eq!(attribute(tag, "href"), None);
    }

    #[test]
    fn element_stack_closes_implicit_paragraphs() {
        let html = "<div><p>one<p>two</div><ul><li>a<li>b<ul><li>c</ul></ul>";
        let mut stack = ElementStack::new();
        let mut max_p = 0;
        for token in tokenize(html).unwrap() {
            stack.apply(&token);
            max_p = max_p.max(stack.names().iter().filter(|n| *n == "p").count());
        }
        assert_eq!(max_p, 1);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn unmatched_end_tag_is_reported() {
        let mut stack = ElementStack::new();
        let tokens = tokenize("text</a>").unwrap();
        assert!(stack.apply(&tokens[0]));
        assert!(!stack.apply(&tokens[1]));
    }
}
