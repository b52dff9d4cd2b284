//! HTML to plain text conversion
//!
//! CourtListener serves opinion bodies as HTML. Before an opinion can be
//! placed into completion context it is flattened to readable text:
//! script/style subtrees are dropped, block elements become line breaks,
//! and whitespace runs are collapsed.

use scraper::{ElementRef, Html, Node, Selector};

const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "svg", "head", "iframe"];

const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr", "td", "th",
    "blockquote", "pre", "section", "article", "center",
];

/// Convert an HTML document or fragment to plain text.
pub fn html_to_text(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    let doc = Html::parse_document(html);

    if let Ok(body_selector) = Selector::parse("body") {
        if let Some(body) = doc.select(&body_selector).next() {
            let mut buf = String::with_capacity(html.len());
            collect_text(&body, &mut buf);
            return collapse_whitespace(&buf);
        }
    }

    let raw: String = doc.root_element().text().collect();
    collapse_whitespace(&raw)
}

fn collect_text(node: &ElementRef<'_>, buf: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => buf.push_str(text),
            Node::Element(el) => {
                let tag = el.name();
                if SKIP_TAGS.contains(&tag) {
                    continue;
                }
                if BLOCK_TAGS.contains(&tag) {
                    buf.push('\n');
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(&child_ref, buf);
                }
            }
            _ => {}
        }
    }
}

/// Collapse runs of spaces into one and runs of newlines into at most two.
fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_space = true;
    let mut consecutive_newlines = 0u32;

    for ch in text.chars() {
        if ch == '\n' {
            consecutive_newlines += 1;
            if consecutive_newlines <= 2 {
                result.push('\n');
            }
            prev_was_space = true;
        } else if ch.is_whitespace() {
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
            consecutive_newlines = 0;
        } else {
            result.push(ch);
            prev_was_space = false;
            consecutive_newlines = 0;
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_become_lines() {
        let text = html_to_text("<p>First holding.</p><p>Second holding.</p>");
        assert_eq!(text, "First holding.\nSecond holding.");
    }

    #[test]
    fn test_scripts_and_styles_are_dropped() {
        let text = html_to_text(
            "<div>Opinion of the court<script>alert(1)</script><style>p{}</style></div>",
        );
        assert_eq!(text, "Opinion of the court");
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let text = html_to_text("<p>Per   curiam\n\n\n\topinion</p>");
        assert_eq!(text, "Per curiam opinion");
    }

    #[test]
    fn test_entities_are_decoded() {
        let text = html_to_text("<p>Smith &amp; Jones</p>");
        assert_eq!(text, "Smith & Jones");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(html_to_text(""), "");
        assert_eq!(html_to_text("   "), "");
    }
}
