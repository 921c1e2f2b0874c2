//! Deterministic parsers for builder replies.
//!
//! The builder asks one well-scoped question per turn, so parsing stays
//! small: line-oriented product entries, URL and `Q:/A:` scanning, and a
//! handful of keyword checks.

use std::sync::OnceLock;

use regex::Regex;
use salescraft_documents::FaqItem;
use salescraft_models::Tone;

/// A product captured during the builder dialogue.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProductDraft {
    /// Product name.
    pub name: String,
    /// Short description.
    pub description: Option<String>,
    /// Unit price.
    pub price: Option<f64>,
}

/// Returns `true` when the user wants to skip or close the current
/// phase.
#[must_use]
pub fn is_skip(message: &str) -> bool {
    matches!(
        message.trim().trim_end_matches(['.', '!']).to_lowercase().as_str(),
        "skip" | "none" | "no" | "done" | "nothing" | "finish" | "that's all" | "no thanks"
    )
}

/// Scans a message for an explicit tone preference.
#[must_use]
pub fn parse_tone(message: &str) -> Option<Tone> {
    let lower = message.to_lowercase();
    if lower.contains("professional") {
        Some(Tone::Professional)
    } else if lower.contains("casual") {
        Some(Tone::Casual)
    } else if lower.contains("formal") {
        Some(Tone::Formal)
    } else if lower.contains("friendly") {
        Some(Tone::Friendly)
    } else {
        None
    }
}

/// Parses product lines of the form `name | price | description`.
/// Fields after the name are optional; a bare line is just a name.
#[must_use]
pub fn parse_product_lines(message: &str) -> Vec<ProductDraft> {
    message
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut fields = line.split('|').map(str::trim);
            let name = fields.next()?.trim_start_matches(['-', '*']).trim();
            if name.is_empty() {
                return None;
            }

            let price = fields.next().and_then(parse_price);
            let description = fields
                .next()
                .filter(|d| !d.is_empty())
                .map(ToString::to_string);

            Some(ProductDraft {
                name: name.to_string(),
                description,
                price,
            })
        })
        .collect()
}

/// Parses a price field, tolerating currency symbols and separators.
fn parse_price(field: &str) -> Option<f64> {
    let cleaned: String = field
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().ok().filter(|p: &f64| *p >= 0.0)
}

/// Extracts HTTP(S) URLs from a message.
#[must_use]
pub fn parse_urls(message: &str) -> Vec<String> {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    let re = URL_RE.get_or_init(|| {
        Regex::new(r"https?://[^\s<>\x22]+")
            .unwrap_or_else(|e| unreachable!("url pattern failed to compile: {e}"))
    });

    re.find_iter(message)
        .map(|m| m.as_str().trim_end_matches([',', '.', ';', ')']).to_string())
        .collect()
}

/// Extracts `Q: ... A: ...` pairs from a message by splitting on the
/// question markers.
#[must_use]
pub fn parse_faqs(message: &str) -> Vec<FaqItem> {
    let mut items = Vec::new();
    for block in message.split("Q:").skip(1) {
        let Some((question, answer)) = block.split_once("A:") else {
            continue;
        };
        let question = question.trim();
        let answer = answer.trim();
        if !question.is_empty() && !answer.is_empty() {
            items.push(FaqItem {
                question: question.to_string(),
                answer: answer.to_string(),
            });
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_variants() {
        assert!(is_skip("skip"));
        assert!(is_skip("  Done. "));
        assert!(is_skip("none"));
        assert!(!is_skip("skip the blue one"));
    }

    #[test]
    fn parses_full_product_line() {
        let drafts = parse_product_lines("Standing Desk | $499 | Electric height adjust");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].name, "Standing Desk");
        assert_eq!(drafts[0].price, Some(499.0));
        assert_eq!(
            drafts[0].description.as_deref(),
            Some("Electric height adjust")
        );
    }

    #[test]
    fn parses_bare_names_and_bullets() {
        let drafts = parse_product_lines("- Chair\n* Lamp\nDesk Mat");
        let names: Vec<&str> = drafts.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Chair", "Lamp", "Desk Mat"]);
    }

    #[test]
    fn ignores_garbage_price() {
        let drafts = parse_product_lines("Chair | call us");
        assert_eq!(drafts[0].price, None);
    }

    #[test]
    fn extracts_urls() {
        let urls = parse_urls("see https://acme.example/docs, and http://acme.example/faq.");
        assert_eq!(
            urls,
            vec![
                "https://acme.example/docs".to_string(),
                "http://acme.example/faq".to_string()
            ]
        );
    }

    #[test]
    fn extracts_faq_pairs() {
        let faqs = parse_faqs(
            "Q: What is the refund window?\nA: 30 days.\nQ: Do you ship abroad?\nA: Yes.",
        );
        assert_eq!(faqs.len(), 2);
        assert_eq!(faqs[0].question, "What is the refund window?");
        assert_eq!(faqs[0].answer, "30 days.");
        assert_eq!(faqs[1].answer, "Yes.");
    }

    #[test]
    fn tone_keywords() {
        assert_eq!(parse_tone("keep it professional please"), Some(Tone::Professional));
        assert_eq!(parse_tone("friendly!"), Some(Tone::Friendly));
        assert_eq!(parse_tone("whatever"), None);
    }
}
