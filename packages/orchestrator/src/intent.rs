//! Deterministic intent classification.
//!
//! A fixed, ordered rule table maps an inbound message into the closed
//! [`Intent`] set. The first matching rule wins, so classification is
//! order-stable and never calls the LLM. Rule order puts the most
//! specific signals (contact details, purchase language) ahead of the
//! broad topical buckets.

use std::sync::OnceLock;

use regex::Regex;
use salescraft_models::Intent;

struct Rule {
    intent: Intent,
    pattern: Regex,
}

fn rules() -> &'static [Rule] {
    static RULES: OnceLock<Vec<Rule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let rule = |intent: Intent, pattern: &str| Rule {
            intent,
            pattern: Regex::new(pattern).unwrap_or_else(|e| {
                unreachable!("intent rule pattern failed to compile: {e}")
            }),
        };

        vec![
            rule(
                Intent::Greeting,
                r"(?i)^\s*(hi|hello|hey|howdy|greetings|good\s+(morning|afternoon|evening))\b",
            ),
            // Contact details win over everything below: a message that
            // volunteers an email mid-pricing-question is still a lead.
            rule(
                Intent::LeadCapture,
                r"(?i)([a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,})|(\+?\d[\d\s().-]{7,}\d)|(my name is)|(you can (reach|call|email) me)",
            ),
            rule(
                Intent::PurchaseIntent,
                r"(?i)\b(buy|purchase|place (an |my )?order|checkout|add to cart|i('ll| will) take( it)?|sign me up)\b",
            ),
            rule(
                Intent::Pricing,
                r"(?i)\b(price|prices|pricing|cost|costs|how much|discount|deal|cheaper|expensive)\b",
            ),
            rule(
                Intent::Availability,
                r"(?i)\b(in stock|out of stock|stock|available|availability|deliver|delivery|shipping|ship|lead time|when can)\b",
            ),
            rule(
                Intent::Support,
                r"(?i)\b(help|support|issue|problem|broken|not working|refund|return|warranty|cancel|complaint)\b",
            ),
            rule(
                Intent::Objection,
                r"(?i)\b(too expensive|not sure|hesitant|think about it|maybe later|need to think|competitor|why should i)\b",
            ),
            rule(
                Intent::ProductInquiry,
                r"(?i)\b(product|products|catalog|catalogue|features?|specs?|specifications?|tell me (more )?about|what do you (sell|offer)|options|recommend|looking for)\b",
            ),
            rule(
                Intent::Smalltalk,
                r"(?i)\b(how are you|nice to meet|thank you|thanks|bye|goodbye|see you|have a (good|great|nice))\b",
            ),
        ]
    })
}

/// Classifies a message. Falls through to [`Intent::Other`] when no
/// rule matches.
#[must_use]
pub fn classify(message: &str) -> Intent {
    rules()
        .iter()
        .find(|rule| rule.pattern.is_match(message))
        .map_or(Intent::Other, |rule| rule.intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greets_on_openers() {
        assert_eq!(classify("hi"), Intent::Greeting);
        assert_eq!(classify("Hello there"), Intent::Greeting);
        assert_eq!(classify("good morning!"), Intent::Greeting);
    }

    #[test]
    fn greeting_must_open_the_message() {
        assert_ne!(classify("what does hello kitty cost"), Intent::Greeting);
    }

    #[test]
    fn email_address_is_lead_capture() {
        assert_eq!(
            classify("I'm Jane, jane@example.com, +1-555-1000"),
            Intent::LeadCapture
        );
    }

    #[test]
    fn phone_number_is_lead_capture() {
        assert_eq!(classify("call me at +1 (555) 123-4567"), Intent::LeadCapture);
    }

    #[test]
    fn pricing_keywords() {
        assert_eq!(classify("How much does the desk cost?"), Intent::Pricing);
        assert_eq!(classify("any discount available on bulk?"), Intent::Pricing);
    }

    #[test]
    fn availability_keywords() {
        assert_eq!(classify("Is the chair in stock?"), Intent::Availability);
        assert_eq!(classify("When can you deliver?"), Intent::Availability);
    }

    #[test]
    fn purchase_language() {
        assert_eq!(classify("I want to buy two of these"), Intent::PurchaseIntent);
        assert_eq!(classify("I'll take it"), Intent::PurchaseIntent);
    }

    #[test]
    fn support_keywords() {
        assert_eq!(classify("What is your refund policy?"), Intent::Support);
        assert_eq!(classify("my unit arrived broken"), Intent::Support);
    }

    #[test]
    fn product_inquiry() {
        assert_eq!(classify("Tell me about your products"), Intent::ProductInquiry);
        assert_eq!(classify("what do you sell?"), Intent::ProductInquiry);
    }

    #[test]
    fn unmatched_falls_to_other() {
        assert_eq!(classify("zxqv"), Intent::Other);
    }

    #[test]
    fn first_match_wins_over_later_rules() {
        // Mentions both a price word and an email; lead capture sits
        // earlier in the table and must win.
        assert_eq!(
            classify("pricing please, email me at a@b.co"),
            Intent::LeadCapture
        );
    }

    #[test]
    fn classification_is_stable() {
        let message = "do you have the standing desk in stock, and what's the price?";
        let first = classify(message);
        for _ in 0..10 {
            assert_eq!(classify(message), first);
        }
    }
}
