//! Turns raw HTML into visible plain text.

use regex::Regex;
use scraper::Html;
use scraper::node::Node;

/// Subtrees that never contribute visible page content.
const SKIP_TAGS: &[&str] = &[
    "script", "style", "meta", "link", "noscript", "header", "footer", "nav",
];

/// Strips boilerplate markup and collapses whitespace.
pub struct TextExtractor {
    whitespace: Regex,
}

impl TextExtractor {
    pub fn new() -> Self {
        Self {
            whitespace: Regex::new(r"\s+").expect("whitespace pattern is valid"),
        }
    }

    /// Extracts the visible text of `html` with whitespace runs collapsed to
    /// single spaces.
    ///
    /// Script, style, metadata and navigation subtrees are discarded before
    /// the remaining text nodes are concatenated in document order.
    pub fn extract(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let mut raw = String::new();

        let mut stack = vec![document.tree.root()];
        while let Some(node) = stack.pop() {
            match node.value() {
                Node::Element(element) if SKIP_TAGS.contains(&element.name()) => continue,
                Node::Text(text) => {
                    raw.push_str(text);
                    raw.push(' ');
                }
                _ => {}
            }
            // Reverse so popping preserves document order.
            let children: Vec<_> = node.children().collect();
            for child in children.into_iter().rev() {
                stack.push(child);
            }
        }

        self.whitespace.replace_all(&raw, " ").trim().to_string()
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}
