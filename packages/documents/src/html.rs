//! Main-content text extraction from HTML.

use scraper::{Html, Selector};

/// Elements whose entire subtree is boilerplate, not content.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "iframe", "svg", "form",
];

/// Extracts the main textual content of a page: all text under `<body>`
/// with script/style/navigation subtrees stripped, whitespace collapsed,
/// and blocks separated by newlines.
#[must_use]
pub fn extract_main_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let body_sel = Selector::parse("body").unwrap_or_else(|_| unreachable!());
    let Some(body) = document.select(&body_sel).next() else {
        return String::new();
    };

    let mut parts: Vec<String> = Vec::new();
    collect_text(*body, &mut parts);

    parts.join("\n")
}

fn collect_text(node: ego_tree::NodeRef<'_, scraper::Node>, parts: &mut Vec<String>) {
    for child in node.children() {
        match child.value() {
            scraper::Node::Text(text) => {
                let collapsed = collapse_whitespace(&text);
                if !collapsed.is_empty() {
                    parts.push(collapsed);
                }
            }
            scraper::Node::Element(element) => {
                if SKIPPED_ELEMENTS.contains(&element.name()) {
                    continue;
                }
                collect_text(child, parts);
            }
            _ => {}
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_paragraph_text() {
        let html = "<html><body><p>Our refund window is 30 days.</p></body></html>";
        assert_eq!(extract_main_text(html), "Our refund window is 30 days.");
    }

    #[test]
    fn strips_script_style_and_nav() {
        let html = r"<html><body>
            <nav><a href='/'>Home</a></nav>
            <script>var tracking = true;</script>
            <style>p { color: red; }</style>
            <p>Visible content.</p>
        </body></html>";
        let text = extract_main_text(html);
        assert_eq!(text, "Visible content.");
    }

    #[test]
    fn collapses_whitespace_runs() {
        let html = "<html><body><p>spaced    \n   out</p></body></html>";
        assert_eq!(extract_main_text(html), "spaced out");
    }

    #[test]
    fn keeps_nested_content_blocks() {
        let html = "<html><body><div><h1>Title</h1><p>Body text.</p></div></body></html>";
        let text = extract_main_text(html);
        assert!(text.contains("Title"));
        assert!(text.contains("Body text."));
    }
}
