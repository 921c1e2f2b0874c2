#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Conversational agent builder.
//!
//! A phase machine that walks a merchant through creating an agent:
//! `agent_info` collects the company and agent identity, `products`
//! collects catalog entries, `training` collects URLs and FAQ pairs,
//! and the transition into `complete` materializes everything — the
//! agent row is finalized and activated, product rows are written, and
//! one ingestion job is enqueued per training artifact.
//!
//! A draft (inactive) agent row is created when the dialogue starts, so
//! documents uploaded mid-dialogue can ingest immediately against the
//! final agent id.

pub mod parse;

use chrono::Utc;
use salescraft_documents::{DocumentSource, FaqItem};
use salescraft_ingest::{IngestError, IngestJob, IngestQueue};
use salescraft_models::{
    Agent, Product, ProductEntry, ProductSummary, StockStatus, Tone, TrainingData, TrainingKind,
};
use salescraft_store::StoreError;
use serde::{Deserialize, Serialize};
use switchy_database::Database;
use thiserror::Error;

pub use parse::ProductDraft;

/// Errors from builder operations.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// Store read/write failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Ingestion enqueue failed.
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    /// The draft agent row backing this dialogue no longer exists.
    #[error("Builder session references a deleted agent")]
    AgentMissing,
}

/// Discrete stage of the builder dialogue.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BuilderPhase {
    /// Collecting company name, description, and agent name.
    AgentInfo,
    /// Collecting catalog entries.
    Products,
    /// Collecting training URLs and FAQ pairs.
    Training,
    /// Everything materialized; the agent is live.
    Complete,
}

/// Company/agent identity collected during `agent_info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentDraft {
    /// Merchant company name.
    pub company_name: Option<String>,
    /// What the company sells.
    pub company_description: Option<String>,
    /// Human-facing agent name.
    pub agent_name: Option<String>,
    /// Reply tone, when the merchant stated one.
    pub tone: Option<Tone>,
}

/// Training artifacts collected during the dialogue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingDraft {
    /// URLs to fetch and ingest on completion.
    pub urls: Vec<String>,
    /// FAQ pairs to ingest on completion.
    pub faqs: Vec<FaqItem>,
    /// Training rows already enqueued for mid-dialogue uploads.
    pub files: Vec<String>,
}

/// Everything accumulated so far.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Accumulator {
    /// Identity fields.
    pub agent: AgentDraft,
    /// Catalog entries.
    pub products: Vec<ProductDraft>,
    /// Training artifacts.
    pub training: TrainingDraft,
}

/// Full dialogue state, serialized between turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderState {
    /// Draft agent row backing this dialogue.
    pub agent_id: String,
    /// Current phase.
    pub phase: BuilderPhase,
    /// Collected data.
    pub accumulator: Accumulator,
}

/// Output of one builder turn.
#[derive(Debug, Clone)]
pub struct BuilderTurn {
    /// Next assistant prompt.
    pub reply: String,
    /// Set on the transition into `complete`.
    pub is_complete: bool,
    /// The materialized agent id, set only when `is_complete` is true.
    pub agent_id: Option<String>,
}

const OPENING_PROMPT: &str =
    "Let's set up your sales agent. First: what's your company called?";

/// Starts a builder dialogue: creates an inactive draft agent row and
/// returns the initial state plus the opening question.
///
/// # Errors
///
/// Returns [`BuilderError`] if the draft row cannot be created.
pub async fn start(db: &dyn Database, owner_id: &str) -> Result<(BuilderState, String), BuilderError> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();

    let draft = Agent {
        id: id.clone(),
        owner_id: owner_id.to_string(),
        name: "Draft Agent".to_string(),
        company_name: String::new(),
        company_description: String::new(),
        tone: Tone::default(),
        language: "en".to_string(),
        greeting_message: None,
        sales_strategy: None,
        products: Vec::new(),
        index_namespace: Agent::index_namespace_for(&id),
        is_active: false,
        created_at: now,
        updated_at: now,
    };

    salescraft_store::agents::insert(db, &draft).await?;

    let state = BuilderState {
        agent_id: id,
        phase: BuilderPhase::AgentInfo,
        accumulator: Accumulator::default(),
    };

    Ok((state, OPENING_PROMPT.to_string()))
}

/// Advances the dialogue by one turn: parses the user reply into the
/// accumulator, moves the phase forward when its required fields are
/// present, and materializes the agent on the `training` → `complete`
/// transition.
///
/// # Errors
///
/// Returns [`BuilderError`] if materialization fails; parsing itself
/// never errors.
pub async fn converse(
    db: &dyn Database,
    queue: &IngestQueue,
    state: &mut BuilderState,
    message: &str,
) -> Result<BuilderTurn, BuilderError> {
    match state.phase {
        BuilderPhase::AgentInfo => Ok(advance_agent_info(state, message)),
        BuilderPhase::Products => Ok(advance_products(state, message)),
        BuilderPhase::Training => advance_training(db, queue, state, message).await,
        BuilderPhase::Complete => Ok(BuilderTurn {
            reply: "Your agent is already live. Head to the dashboard to chat with it or tweak \
                    its configuration."
                .to_string(),
            is_complete: true,
            agent_id: Some(state.agent_id.clone()),
        }),
    }
}

/// Accepts a document upload at any phase: persists a `processing`
/// training row against the draft agent and enqueues ingestion
/// immediately. Returns the training row id.
///
/// # Errors
///
/// Returns [`BuilderError`] if the row cannot be written or the queue
/// is closed.
pub async fn attach_document(
    db: &dyn Database,
    queue: &IngestQueue,
    state: &mut BuilderState,
    filename: &str,
    bytes: Vec<u8>,
) -> Result<String, BuilderError> {
    let row = TrainingData::pending(
        &state.agent_id,
        TrainingKind::Pdf,
        serde_json::json!({ "filename": filename }),
    );
    salescraft_store::training::insert(db, &row).await?;

    queue
        .enqueue(IngestJob {
            training_data_id: row.id.clone(),
            agent_id: state.agent_id.clone(),
            index_namespace: Agent::index_namespace_for(&state.agent_id),
            source: DocumentSource::Pdf {
                filename: filename.to_string(),
                bytes,
            },
        })
        .await?;

    state.accumulator.training.files.push(row.id.clone());

    Ok(row.id)
}

fn advance_agent_info(state: &mut BuilderState, message: &str) -> BuilderTurn {
    let trimmed = message.trim();
    let draft = &mut state.accumulator.agent;

    if draft.tone.is_none()
        && let Some(tone) = parse::parse_tone(trimmed)
    {
        draft.tone = Some(tone);
    }

    // One question per turn: the reply fills the first missing field.
    if draft.company_name.is_none() {
        if trimmed.is_empty() {
            return ask("What's your company called?");
        }
        draft.company_name = Some(trimmed.to_string());
        let company = draft.company_name.clone().unwrap_or_default();
        return ask(&format!("Great. Describe what {company} sells, in a sentence or two."),
        );
    }

    if draft.company_description.is_none() {
        if trimmed.is_empty() {
            return ask("Tell me a bit about what you sell.");
        }
        draft.company_description = Some(trimmed.to_string());
        return ask("What should we name your agent? Customers will see this name in chat.",
        );
    }

    if draft.agent_name.is_none() {
        if trimmed.is_empty() {
            return ask("Give your agent a short name, like Alex or Maya.");
        }
        draft.agent_name = Some(trimmed.to_string());
    }

    state.phase = BuilderPhase::Products;
    ask("Now the catalog: list products one per line as `name | price | description`, \
         or say 'skip' to add them later.",
    )
}

fn advance_products(state: &mut BuilderState, message: &str) -> BuilderTurn {
    if parse::is_skip(message) {
        state.phase = BuilderPhase::Training;
        return ask("Last step: share website URLs or FAQ entries (`Q: ... A: ...`) to train your \
             agent on, or say 'skip' to finish.",
        );
    }

    let drafts = parse::parse_product_lines(message);
    if drafts.is_empty() {
        return ask("I couldn't read any products from that. Use one line per product, like \
             `Standing Desk | 499 | Electric height adjust`, or say 'skip'.",
        );
    }

    state.accumulator.products.extend(drafts);
    let total = state.accumulator.products.len();
    ask(&format!("Got it — {total} product(s) so far. Add more lines, or say 'done' to move on."),
    )
}

async fn advance_training(
    db: &dyn Database,
    queue: &IngestQueue,
    state: &mut BuilderState,
    message: &str,
) -> Result<BuilderTurn, BuilderError> {
    if !parse::is_skip(message) {
        let urls = parse::parse_urls(message);
        let faqs = parse::parse_faqs(message);

        if urls.is_empty() && faqs.is_empty() {
            return Ok(ask("I couldn't find URLs or `Q: ... A: ...` pairs in that. Share some, or say \
                 'skip' to finish.",
            ));
        }

        state.accumulator.training.urls.extend(urls);
        state.accumulator.training.faqs.extend(faqs);

        let urls_count = state.accumulator.training.urls.len();
        let faqs_count = state.accumulator.training.faqs.len();
        return Ok(ask(&format!(
                "Collected {urls_count} URL(s) and {faqs_count} FAQ(s). Add more, or say \
                 'done' to finish."
            ),
        ));
    }

    let agent_id = materialize(db, queue, state).await?;
    state.phase = BuilderPhase::Complete;

    let agent_name = state
        .accumulator
        .agent
        .agent_name
        .clone()
        .unwrap_or_else(|| "Your agent".to_string());

    Ok(BuilderTurn {
        reply: format!(
            "All set! {agent_name} is live. Share the chat link with customers, or keep \
             training it from the dashboard."
        ),
        is_complete: true,
        agent_id: Some(agent_id),
    })
}

fn ask(question: &str) -> BuilderTurn {
    BuilderTurn {
        reply: question.to_string(),
        is_complete: false,
        agent_id: None,
    }
}

/// Finalizes the draft agent: writes the accumulated configuration,
/// activates the agent, inserts product rows, and enqueues one
/// ingestion job per training artifact.
async fn materialize(
    db: &dyn Database,
    queue: &IngestQueue,
    state: &BuilderState,
) -> Result<String, BuilderError> {
    let Some(mut agent) = salescraft_store::agents::get(db, &state.agent_id).await? else {
        return Err(BuilderError::AgentMissing);
    };

    let acc = &state.accumulator;
    let now = Utc::now();

    agent.name = acc
        .agent
        .agent_name
        .clone()
        .unwrap_or_else(|| "Sales Agent".to_string());
    agent.company_name = acc.agent.company_name.clone().unwrap_or_default();
    agent.company_description = acc.agent.company_description.clone().unwrap_or_default();
    agent.tone = acc.agent.tone.unwrap_or_default();
    agent.greeting_message = Some(format!(
        "Hi! I'm {}, the {} assistant. How can I help you today?",
        agent.name, agent.company_name
    ));
    agent.products = acc
        .products
        .iter()
        .map(|draft| {
            ProductEntry::Detailed(ProductSummary {
                name: draft.name.clone(),
                description: draft.description.clone(),
                price: draft.price,
                currency: None,
            })
        })
        .collect();
    agent.is_active = true;
    agent.updated_at = now;

    salescraft_store::agents::update(db, &agent).await?;

    for draft in &acc.products {
        let product = Product {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: agent.id.clone(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            detailed_description: None,
            price: draft.price,
            currency: "USD".to_string(),
            image_url: None,
            category: None,
            features: Vec::new(),
            specifications: std::collections::BTreeMap::new(),
            stock_status: StockStatus::default(),
            sku: None,
            is_featured: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        salescraft_store::products::insert(db, &product).await?;
    }

    for url in &acc.training.urls {
        enqueue_training(
            db,
            queue,
            &agent,
            TrainingKind::Url,
            serde_json::json!({ "url": url }),
            DocumentSource::Url { url: url.clone() },
        )
        .await?;
    }

    if !acc.training.faqs.is_empty() {
        enqueue_training(
            db,
            queue,
            &agent,
            TrainingKind::Faq,
            serde_json::json!({ "faq_count": acc.training.faqs.len() }),
            DocumentSource::Faq {
                items: acc.training.faqs.clone(),
            },
        )
        .await?;
    }

    log::info!(
        "Builder materialized agent {} ({} products, {} urls, {} faqs)",
        agent.id,
        acc.products.len(),
        acc.training.urls.len(),
        acc.training.faqs.len()
    );

    Ok(agent.id)
}

async fn enqueue_training(
    db: &dyn Database,
    queue: &IngestQueue,
    agent: &Agent,
    kind: TrainingKind,
    metadata: serde_json::Value,
    source: DocumentSource,
) -> Result<(), BuilderError> {
    let row = TrainingData::pending(&agent.id, kind, metadata);
    salescraft_store::training::insert(db, &row).await?;

    queue
        .enqueue(IngestJob {
            training_data_id: row.id,
            agent_id: agent.id.clone(),
            index_namespace: agent.index_namespace.clone(),
            source,
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_state() -> BuilderState {
        BuilderState {
            agent_id: "draft-1".to_string(),
            phase: BuilderPhase::AgentInfo,
            accumulator: Accumulator::default(),
        }
    }

    #[test]
    fn agent_info_fills_fields_in_order() {
        let mut state = fresh_state();

        let turn = advance_agent_info(&mut state, "Acme");
        assert!(turn.reply.contains("Acme"));
        assert_eq!(
            state.accumulator.agent.company_name.as_deref(),
            Some("Acme")
        );
        assert_eq!(state.phase, BuilderPhase::AgentInfo);

        advance_agent_info(&mut state, "We sell widgets.");
        assert_eq!(
            state.accumulator.agent.company_description.as_deref(),
            Some("We sell widgets.")
        );

        let turn = advance_agent_info(&mut state, "Alex");
        assert_eq!(state.accumulator.agent.agent_name.as_deref(), Some("Alex"));
        assert_eq!(state.phase, BuilderPhase::Products);
        assert!(turn.reply.contains("catalog"));
        assert!(!turn.is_complete);
    }

    #[test]
    fn empty_reply_reasks_without_advancing() {
        let mut state = fresh_state();
        let turn = advance_agent_info(&mut state, "   ");
        assert!(state.accumulator.agent.company_name.is_none());
        assert!(turn.reply.contains("company"));
    }

    #[test]
    fn products_phase_accumulates_and_skips() {
        let mut state = fresh_state();
        state.phase = BuilderPhase::Products;

        advance_products(&mut state, "Desk | 499 | Standing desk\nChair | 249");
        assert_eq!(state.accumulator.products.len(), 2);
        assert_eq!(state.phase, BuilderPhase::Products);

        let turn = advance_products(&mut state, "done");
        assert_eq!(state.phase, BuilderPhase::Training);
        assert!(turn.reply.contains("URLs"));
    }

    #[test]
    fn unparseable_products_reask() {
        let mut state = fresh_state();
        state.phase = BuilderPhase::Products;

        let turn = advance_products(&mut state, "   \n  ");
        assert!(state.accumulator.products.is_empty());
        assert!(turn.reply.contains("one line per product"));
    }
}
