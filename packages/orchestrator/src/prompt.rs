//! System prompt assembly for the generation stage.

use salescraft_models::Agent;

/// Maximum catalog entries rendered into the prompt; anything beyond
/// this adds tokens without helping the model.
const MAX_PROMPT_PRODUCTS: usize = 20;

/// Builds the compact system prompt: identity, tone, catalog, selling
/// guidance, and retrieved context when present.
#[must_use]
pub fn build_system_prompt(agent: &Agent, retrieved_context: Option<&str>) -> String {
    let mut prompt = format!(
        "You are {name}, a sales assistant for {company}. {description}\n\
         Tone: {tone}. Reply in language: {language}. Keep answers short and concrete.",
        name = agent.name,
        company = agent.company_name,
        description = agent.company_description.trim(),
        tone = agent.tone,
        language = agent.language,
    );

    if !agent.products.is_empty() {
        let lines: Vec<String> = agent
            .products
            .iter()
            .take(MAX_PROMPT_PRODUCTS)
            .map(|p| format!("- {}", p.display_line()))
            .collect();
        prompt.push_str("\nProducts:\n");
        prompt.push_str(&lines.join("\n"));
    }

    if let Some(strategy) = &agent.sales_strategy
        && !strategy.trim().is_empty()
    {
        prompt.push_str("\nSales approach: ");
        prompt.push_str(strategy.trim());
    }

    if let Some(context) = retrieved_context
        && !context.trim().is_empty()
    {
        prompt.push_str(
            "\nUse the following company knowledge when it answers the question:\n",
        );
        prompt.push_str(context.trim());
    }

    prompt.push_str(
        "\nNever invent prices, stock levels, or policies that are not listed above.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use salescraft_models::{ProductEntry, ProductSummary, Tone};

    use super::*;

    fn test_agent() -> Agent {
        Agent {
            id: "a1".to_string(),
            owner_id: "u1".to_string(),
            name: "Alex".to_string(),
            company_name: "Acme".to_string(),
            company_description: "We sell widgets.".to_string(),
            tone: Tone::Friendly,
            language: "en".to_string(),
            greeting_message: None,
            sales_strategy: None,
            products: Vec::new(),
            index_namespace: "agent_a1".to_string(),
            is_active: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn renders_identity_and_tone() {
        let prompt = build_system_prompt(&test_agent(), None);
        assert!(prompt.contains("Alex"));
        assert!(prompt.contains("Acme"));
        assert!(prompt.contains("friendly"));
    }

    #[test]
    fn renders_mixed_product_shapes() {
        let mut agent = test_agent();
        agent.products = vec![
            ProductEntry::Name("Standing Desk".to_string()),
            ProductEntry::Detailed(ProductSummary {
                name: "Chair".to_string(),
                description: Some("Ergonomic".to_string()),
                price: Some(249.0),
                currency: None,
            }),
        ];
        let prompt = build_system_prompt(&agent, None);
        assert!(prompt.contains("- Standing Desk"));
        assert!(prompt.contains("- Chair (249.00 USD) - Ergonomic"));
    }

    #[test]
    fn includes_context_only_when_present() {
        let agent = test_agent();
        let without = build_system_prompt(&agent, None);
        assert!(!without.contains("company knowledge"));

        let with = build_system_prompt(&agent, Some("Refund window is 30 days."));
        assert!(with.contains("Refund window is 30 days."));
    }

    #[test]
    fn blank_context_is_ignored() {
        let prompt = build_system_prompt(&test_agent(), Some("   "));
        assert!(!prompt.contains("company knowledge"));
    }
}
