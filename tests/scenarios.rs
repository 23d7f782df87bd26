//! End-to-end linking scenarios
//!
//! Each test runs the full engine on a small document and checks both the
//! rewritten markup and the report.

mod common;

use common::{engine, engine_with, html_document, url, PARAGRAPHS};
use interlink::linking::{extract_candidates, is_forbidden};
use interlink::{
    BlockOutcome, Catalog, EngineConfig, EngineState, InjectionConflict, SafeInjector,
    SkipReason, TargetPage, TextBlock,
};

// === Single block, single matching page ===

#[test]
fn links_the_reference_sentence() {
    let html = html_document(&PARAGRAPHS[..1]);
    let result = engine().link_html(&html);

    assert_eq!(result.report.links.len(), 1);
    let link = &result.report.links[0];
    assert_eq!(link.target_slug, "keyword-research-guide");
    assert_eq!(link.target_url, url("keyword-research-guide"));
    assert_eq!(link.block_index, 0);
    let words = link.anchor_text.split_whitespace().count();
    assert!((3..=5).contains(&words), "anchor: {}", link.anchor_text);
    assert!(link
        .anchor_text
        .to_lowercase()
        .contains("keyword research guide"));
    assert!(result.html.contains(&format!(
        r#"<a href="{}" title="{}">{}</a>"#,
        url("keyword-research-guide"),
        link.anchor_text,
        link.anchor_text
    )));
}

// === Competing blocks ===

#[test]
fn a_target_is_linked_only_once() {
    let html = html_document(&[
        PARAGRAPHS[0],
        "Every advanced keyword research guide should explain search volume and intent clearly.",
    ]);
    let result = engine().link_html(&html);

    assert_eq!(result.report.links.len(), 1);
    assert_eq!(result.report.links[0].block_index, 0);
    assert_eq!(result.html.matches("keyword-research-guide").count(), 1);
    assert_eq!(result.report.outcome(1), Some(&BlockOutcome::NoCandidate));
}

// === Short blocks ===

#[test]
fn short_blocks_are_never_linked() {
    let html = "<p>Read the keyword research guide.</p>";
    let result = engine().link_html(html);

    assert_eq!(result.html, html);
    assert!(result.report.links.is_empty());
    assert!(matches!(
        result.report.outcome(0),
        Some(BlockOutcome::Skipped {
            reason: SkipReason::TooShort { .. }
        })
    ));
}

// === Existing links ===

#[test]
fn phrase_inside_an_existing_link_is_left_alone() {
    let html = r#"<p>For the full walkthrough see <a href="https://other.example/">advanced keyword research guide</a> which explains each step in detail.</p>"#;
    let result = engine().link_html(html);

    assert_eq!(result.html, html);
    assert!(result.report.links.is_empty());
}

#[test]
fn injector_refuses_linked_occurrences() {
    let markup = r#"See the <a href="/other/">keyword research guide</a> first."#;
    let err = SafeInjector::new()
        .inject(markup, "keyword research guide", &url("keyword-research-guide"))
        .unwrap_err();
    assert_eq!(err, InjectionConflict::AlreadyLinked);
}

#[test]
fn documents_linking_a_page_already_do_not_link_it_again() {
    let html = format!(
        r#"<p>We covered this before in <a href="/blog/keyword-research-guide/">our earlier post</a>.</p>
<p>{}</p>"#,
        PARAGRAPHS[0]
    );
    let result = engine().link_html(&html);

    assert!(result
        .report
        .links
        .iter()
        .all(|l| l.target_slug != "keyword-research-guide"));
    assert_eq!(result.html, html);
}

#[test]
fn existing_link_text_is_not_reused_as_an_anchor() {
    let html = format!(
        r#"<p>Related: <a href="https://partner.example/">advanced keyword research guide</a></p>
<p>{}</p>"#,
        PARAGRAPHS[0]
    );
    let result = engine().link_html(&html);
    assert!(result
        .report
        .links
        .iter()
        .all(|l| l.anchor_text.to_lowercase() != "advanced keyword research guide"));
}

// === Forbidden anchors ===

#[test]
fn calls_to_action_are_rejected() {
    assert!(is_forbidden("click here to learn more"));

    let catalog = Catalog::new(vec![TargetPage::new("Learn More About SEO", "learn-more")]).unwrap();
    let block = TextBlock::from_markup(0, "click here to learn more");
    let candidates = extract_candidates(
        &block,
        &catalog.entries()[0],
        EngineState::new().used_anchors(),
        &EngineConfig::default(),
    );
    assert!(candidates.is_empty());
}

// === Per-document cap ===

#[test]
fn cap_stops_the_run_in_block_order() {
    let html = html_document(PARAGRAPHS);
    let result = engine_with(EngineConfig::default().with_max_links(3)).link_html(&html);

    let blocks: Vec<usize> = result.report.links.iter().map(|l| l.block_index).collect();
    assert_eq!(blocks, vec![0, 1, 2]);
    assert_eq!(result.report.stats.links_injected, 3);
    assert_eq!(result.report.stats.blocks_scanned, 3);
    assert_eq!(result.html.matches("<a ").count(), 3);
}

#[test]
fn every_paragraph_gets_its_own_page_without_a_cap() {
    let html = html_document(PARAGRAPHS);
    let result = engine().link_html(&html);

    let slugs: Vec<&str> = result
        .report
        .links
        .iter()
        .map(|l| l.target_slug.as_str())
        .collect();
    assert_eq!(
        slugs,
        vec![
            "keyword-research-guide",
            "technical-seo-audit",
            "link-building-strategies",
            "content-marketing-strategy",
            "local-seo-tips",
        ]
    );
    assert_eq!(result.report.stats.unique_targets, 5);
    assert_eq!(result.report.stats.unique_anchors, 5);
    assert!(result.report.stats.average_score >= 40.0);
}

// === Attribute values ===

#[test]
fn phrases_inside_attribute_values_are_never_linked() {
    let img = r#"<img alt="Chart: visits > 50% after our advanced keyword research guide went live for beginners" src="c.png">"#;
    let html = format!("<p>Traffic grew fast. {} {}</p>", img, PARAGRAPHS[0]);
    let result = engine().link_html(&html);

    assert_eq!(result.report.links.len(), 1);
    assert!(result.html.contains(img));
    let link_at = result.html.find("<a ").unwrap();
    assert!(link_at > result.html.find(img).unwrap() + img.len());
}

#[test]
fn attribute_only_mentions_leave_the_document_untouched() {
    let html = r#"<p>Traffic grew fast. <img alt="Chart: visits > 50% after our advanced keyword research guide went live" src="c.png"> More visitors arrived every single week after launch.</p>"#;
    let result = engine().link_html(html);

    assert_eq!(result.html, html);
    assert!(result.report.links.is_empty());
}

// === Excluded zones ===

#[test]
fn excluded_zones_are_skipped() {
    let html = format!(
        r#"<blockquote><p>{}</p></blockquote>
<table><tr><td><p>{}</p></td></tr></table>
<h2>Frequently Asked Questions</h2>
<p>{}</p>
<h2>Next steps</h2>
<p>{}</p>"#,
        PARAGRAPHS[0], PARAGRAPHS[1], PARAGRAPHS[2], PARAGRAPHS[3]
    );
    let result = engine().link_html(&html);

    let slugs: Vec<&str> = result
        .report
        .links
        .iter()
        .map(|l| l.target_slug.as_str())
        .collect();
    assert_eq!(slugs, vec!["content-marketing-strategy"]);
    for index in 0..3 {
        assert!(matches!(
            result.report.outcome(index),
            Some(BlockOutcome::Skipped {
                reason: SkipReason::Excluded { .. }
            })
        ));
    }
}

#[test]
fn faq_regions_are_skipped() {
    let html = format!(
        r#"<div class="faq-block"><p>{}</p></div><div id="main"><p>{}</p></div>"#,
        PARAGRAPHS[0], PARAGRAPHS[1]
    );
    let result = engine().link_html(&html);
    assert_eq!(result.report.links.len(), 1);
    assert_eq!(result.report.links[0].target_slug, "technical-seo-audit");
}

// === Other inputs ===

#[test]
fn markdown_is_rendered_then_linked() {
    let markdown = format!("## Getting started\n\n{}\n\n- {}\n", PARAGRAPHS[0], PARAGRAPHS[1]);
    let result = engine().link_markdown(&markdown);

    assert!(result.html.contains("<h2>Getting started</h2>"));
    assert!(result
        .html
        .contains(&format!(r#"href="{}""#, url("keyword-research-guide"))));
    assert!(result
        .html
        .contains(&format!(r#"href="{}""#, url("technical-seo-audit"))));
}

#[test]
fn pre_segmented_blocks_keep_their_order() {
    let blocks = vec![
        TextBlock::from_markup(7, PARAGRAPHS[1]),
        TextBlock::from_markup(7, "Too short."),
        TextBlock::from_markup(7, PARAGRAPHS[0]),
    ];
    let result = engine().link_blocks(blocks);

    assert_eq!(result.blocks.len(), 3);
    assert!(result.blocks[0].contains(&url("technical-seo-audit")));
    assert_eq!(result.blocks[1], "Too short.");
    assert!(result.blocks[2].contains(&url("keyword-research-guide")));
    let indices: Vec<usize> = result.report.links.iter().map(|l| l.block_index).collect();
    assert_eq!(indices, vec![0, 2]);
}

#[test]
fn unchanged_markup_survives_byte_for_byte() {
    let html = format!(
        "<!DOCTYPE html>\n<article>\n  <h1 class=\"title\">SEO&nbsp;notes</h1>\n  <p>{}</p>\n  <!-- sidebar -->\n  <p>Short &amp; sweet.</p>\n</article>\n",
        PARAGRAPHS[3]
    );
    let result = engine().link_html(&html);

    assert_eq!(result.report.links.len(), 1);
    let open = result.html.find("<a ").unwrap();
    let close = result.html.find("</a>").unwrap() + "</a>".len();
    let inner_start = result.html[open..].find('>').unwrap() + open + 1;
    let inner_end = close - "</a>".len();
    let restored = format!(
        "{}{}{}",
        &result.html[..open],
        &result.html[inner_start..inner_end],
        &result.html[close..]
    );
    assert_eq!(restored, html);
}

#[test]
fn report_serializes_to_json() {
    let result = engine().link_html(&html_document(PARAGRAPHS));
    let json: serde_json::Value = serde_json::from_str(&result.report.to_json().unwrap()).unwrap();

    assert_eq!(json["stats"]["links_injected"], 5);
    assert_eq!(json["links"][0]["target_slug"], "keyword-research-guide");
    assert_eq!(json["blocks"][0]["outcome"], "linked");
    assert!(json["generated_at"].is_string());
}
