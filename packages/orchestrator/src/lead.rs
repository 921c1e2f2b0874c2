//! Lead qualification: transcript scan and strict-JSON extraction.

use salescraft_models::{ConversationTurn, LeadInfo};

/// Builds the extraction prompt over the full transcript. The model is
/// told to emit strict JSON with a fixed key set and nothing else.
#[must_use]
pub fn build_extraction_prompt(turns: &[ConversationTurn], incoming: &str) -> String {
    let mut transcript = String::new();
    for turn in turns {
        transcript.push_str(&format!("{}: {}\n", turn.role, turn.content));
    }
    transcript.push_str(&format!("user: {incoming}\n"));

    format!(
        "Extract customer contact details from this sales conversation.\n\
         Reply with ONLY a JSON object, no prose, using exactly these keys \
         (omit keys you cannot fill): \
         {{\"name\", \"email\", \"phone\", \"company\", \"interest_level\"}}.\n\
         interest_level is one of \"low\", \"medium\", \"high\".\n\n\
         Conversation:\n{transcript}"
    )
}

/// Parses the model's reply into a [`LeadInfo`] delta. Returns `None`
/// when the reply carries no parseable JSON object or the object is
/// empty — lead extraction failures are discarded for the turn.
#[must_use]
pub fn parse_extraction_reply(reply: &str) -> Option<LeadInfo> {
    let json = extract_json_object(reply)?;
    let lead: LeadInfo = serde_json::from_str(json).ok()?;

    if lead.is_empty() { None } else { Some(lead) }
}

/// Pulls the first balanced `{...}` object out of a reply, tolerating
/// code fences and prose the model was told not to produce.
fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let mut depth = 0_i32;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in reply[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&reply[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use salescraft_models::Role;

    use super::*;

    #[test]
    fn parses_clean_json() {
        let lead = parse_extraction_reply(
            r#"{"name": "Jane", "email": "jane@example.com", "phone": "+1-555-1000"}"#,
        )
        .unwrap();
        assert_eq!(lead.name.as_deref(), Some("Jane"));
        assert_eq!(lead.email.as_deref(), Some("jane@example.com"));
        assert_eq!(lead.phone.as_deref(), Some("+1-555-1000"));
    }

    #[test]
    fn tolerates_code_fences() {
        let reply = "```json\n{\"name\": \"Jane\"}\n```";
        let lead = parse_extraction_reply(reply).unwrap();
        assert_eq!(lead.name.as_deref(), Some("Jane"));
    }

    #[test]
    fn discards_empty_objects() {
        assert!(parse_extraction_reply("{}").is_none());
    }

    #[test]
    fn discards_non_json_replies() {
        assert!(parse_extraction_reply("I could not find any contact details.").is_none());
    }

    #[test]
    fn handles_braces_inside_strings() {
        let reply = r#"{"name": "Jane {the} Builder", "company": "Brace Co"}"#;
        let lead = parse_extraction_reply(reply).unwrap();
        assert_eq!(lead.name.as_deref(), Some("Jane {the} Builder"));
    }

    #[test]
    fn prompt_includes_every_turn_and_incoming() {
        let turns = vec![
            ConversationTurn::now(Role::User, "hi"),
            ConversationTurn::now(Role::Assistant, "hello!"),
        ];
        let prompt = build_extraction_prompt(&turns, "I'm Jane");
        assert!(prompt.contains("user: hi"));
        assert!(prompt.contains("assistant: hello!"));
        assert!(prompt.contains("user: I'm Jane"));
    }
}
