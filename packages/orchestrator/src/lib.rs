#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Conversation orchestrator: the staged reply pipeline.
//!
//! Turns an inbound user utterance into a grounded assistant reply
//! through five stages over a mutable turn state:
//!
//! 1. Greeting short-circuit (new session + configured greeting).
//! 2. Keyword-rule intent classification (no LLM call).
//! 3. Context retrieval (skipped for agents with zero indexed vectors;
//!    every failure degrades to "no context").
//! 4. Response generation (fixed fallback reply on any LLM failure).
//! 5. Lead qualification (gated on a transcript-length threshold;
//!    failures are silently discarded for the turn).
//!
//! The pipeline never errors: exactly one assistant reply comes back
//! from every invocation, and the whole turn is bounded by a cumulative
//! wall-clock budget. Per-stage timings are recorded and logged.

pub mod intent;
pub mod lead;
pub mod prompt;

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

use salescraft_ai::{ChatOptions, LlmProvider, with_retry};
use salescraft_models::{Agent, ChatMessage, ConversationTurn, Intent, LeadInfo};
use salescraft_vector::VectorIndex;

/// Fixed reply used when generation fails or the turn budget is spent.
pub const FALLBACK_REPLY: &str = "I'm having trouble right now, please try again shortly.";

/// Tunable parameters for a chat turn.
#[derive(Debug, Clone)]
pub struct TurnConfig {
    /// How many trailing history turns are included in the prompt.
    pub max_history: usize,
    /// Minimum transcript length (including the incoming message)
    /// before lead qualification runs.
    pub lead_qualify_min_messages: usize,
    /// Retrieval result count.
    pub retrieval_top_k: u32,
    /// Minimum similarity score for a hit to be used.
    pub retrieval_score_floor: f32,
    /// Soft cap on concatenated context characters.
    pub context_char_cap: usize,
    /// Cumulative wall-clock budget for the whole turn.
    pub turn_budget: Duration,
    /// Generation parameters.
    pub chat_options: ChatOptions,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            max_history: 4,
            lead_qualify_min_messages: 5,
            retrieval_top_k: 3,
            retrieval_score_floor: 0.5,
            context_char_cap: 1500,
            turn_budget: Duration::from_secs(15),
            chat_options: ChatOptions::default(),
        }
    }
}

/// Elapsed time of one pipeline stage.
#[derive(Debug, Clone)]
pub struct StageTiming {
    /// Stage name.
    pub stage: &'static str,
    /// Elapsed milliseconds.
    pub elapsed_ms: u128,
}

/// The result of one orchestrated turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The assistant reply; always present.
    pub reply: String,
    /// Classified intent of the incoming message.
    pub intent: Intent,
    /// Whether retrieved context made it into the prompt.
    pub used_retrieval: bool,
    /// Newly extracted lead fields, to be merged monotonically by the
    /// caller. `None` when qualification was skipped or failed.
    pub lead_delta: Option<LeadInfo>,
    /// Per-stage timings.
    pub timings: Vec<StageTiming>,
}

/// Mutable state threaded through the stages of one turn.
struct TurnState<'a> {
    agent: &'a Agent,
    incoming_text: &'a str,
    history: &'a [ConversationTurn],
    classified_intent: Intent,
    retrieved_context: Option<String>,
    reply_text: Option<String>,
    lead_delta: Option<LeadInfo>,
    timings: Vec<StageTiming>,
    deadline: Instant,
}

impl TurnState<'_> {
    fn record(&mut self, stage: &'static str, started: Instant) {
        self.timings.push(StageTiming {
            stage,
            elapsed_ms: started.elapsed().as_millis(),
        });
    }

    fn remaining_budget(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// The staged reply pipeline. Holds the LLM and vector adapters; all
/// persistence stays with the caller.
pub struct Orchestrator {
    llm: Arc<dyn LlmProvider>,
    vector: Arc<VectorIndex>,
    config: TurnConfig,
}

impl Orchestrator {
    /// Creates an orchestrator over explicitly constructed adapters.
    #[must_use]
    pub fn new(llm: Arc<dyn LlmProvider>, vector: Arc<VectorIndex>, config: TurnConfig) -> Self {
        Self {
            llm,
            vector,
            config,
        }
    }

    /// Runs one turn. Infallible by contract: every invocation yields
    /// exactly one assistant reply, degraded if dependencies are down.
    pub async fn respond(
        &self,
        agent: &Agent,
        history: &[ConversationTurn],
        incoming_text: &str,
    ) -> TurnOutcome {
        let mut state = TurnState {
            agent,
            incoming_text,
            history,
            classified_intent: Intent::Other,
            retrieved_context: None,
            reply_text: None,
            lead_delta: None,
            timings: Vec::with_capacity(5),
            deadline: Instant::now() + self.config.turn_budget,
        };

        // Stage 1: greeting short-circuit. No classification, no
        // retrieval, no LLM call for a brand-new session.
        let started = Instant::now();
        let greeted = Self::stage_greeting(&mut state);
        state.record("greeting", started);

        if !greeted {
            let started = Instant::now();
            state.classified_intent = intent::classify(state.incoming_text);
            state.record("intent", started);

            let started = Instant::now();
            state.retrieved_context = self.stage_retrieval(&state).await;
            state.record("retrieval", started);

            let started = Instant::now();
            let reply = self.stage_generation(&state).await;
            state.reply_text = Some(reply);
            state.record("generation", started);

            let started = Instant::now();
            state.lead_delta = self.stage_lead_qualification(&state).await;
            state.record("lead", started);
        }

        let outcome = TurnOutcome {
            reply: state.reply_text.unwrap_or_else(|| FALLBACK_REPLY.to_string()),
            intent: state.classified_intent,
            used_retrieval: state.retrieved_context.is_some(),
            lead_delta: state.lead_delta,
            timings: state.timings,
        };

        log_timings(agent, &outcome);

        outcome
    }

    /// Stage 1. Returns `true` when the greeting was emitted and the
    /// rest of the pipeline should be skipped.
    fn stage_greeting(state: &mut TurnState<'_>) -> bool {
        if !state.history.is_empty() {
            return false;
        }
        let Some(greeting) = &state.agent.greeting_message else {
            return false;
        };
        if greeting.trim().is_empty() {
            return false;
        }

        state.classified_intent = Intent::Greeting;
        state.reply_text = Some(greeting.clone());
        true
    }

    /// Stage 3. Any failure — count, embed, or search — degrades to
    /// `None` and the turn continues ungrounded.
    async fn stage_retrieval(&self, state: &TurnState<'_>) -> Option<String> {
        let namespace = &state.agent.index_namespace;

        match self.vector.count_for_agent(namespace).await {
            Ok(0) => {
                log::debug!("Agent {} has no indexed vectors; skipping retrieval", state.agent.id);
                return None;
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!("Vector count failed for agent {}: {e}", state.agent.id);
                return None;
            }
        }

        let query_vector = match with_retry(|| self.llm.embed(state.incoming_text)).await {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Query embedding failed for agent {}: {e}", state.agent.id);
                return None;
            }
        };

        let hits = match self
            .vector
            .search(&query_vector, self.config.retrieval_top_k, namespace)
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                log::warn!("Vector search failed for agent {}: {e}", state.agent.id);
                return None;
            }
        };

        let mut context = String::new();
        for hit in hits {
            if hit.score < self.config.retrieval_score_floor {
                continue;
            }
            if context.len() + hit.payload.text.len() > self.config.context_char_cap
                && !context.is_empty()
            {
                break;
            }
            if !context.is_empty() {
                context.push_str("\n---\n");
            }
            context.push_str(&hit.payload.text);
        }

        if context.is_empty() { None } else { Some(context) }
    }

    /// Stage 4. Emits the fixed fallback on any failure or when the
    /// turn budget is already spent.
    async fn stage_generation(&self, state: &TurnState<'_>) -> String {
        let remaining = state.remaining_budget();
        if remaining.is_zero() {
            log::warn!(
                "Turn budget exhausted before generation for agent {}; using fallback",
                state.agent.id
            );
            return FALLBACK_REPLY.to_string();
        }

        let system = prompt::build_system_prompt(state.agent, state.retrieved_context.as_deref());

        let mut messages = Vec::with_capacity(self.config.max_history + 2);
        messages.push(ChatMessage::system(system));
        let tail_start = state.history.len().saturating_sub(self.config.max_history);
        for turn in &state.history[tail_start..] {
            messages.push(ChatMessage::Structured {
                role: turn.role.to_string(),
                content: turn.content.clone(),
            });
        }
        messages.push(ChatMessage::user(state.incoming_text));

        let chat = with_retry(|| self.llm.chat(&messages, &self.config.chat_options));

        match tokio::time::timeout(remaining, chat).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                log::error!("Generation failed for agent {}: {e}", state.agent.id);
                FALLBACK_REPLY.to_string()
            }
            Err(_) => {
                log::warn!(
                    "Generation exceeded turn budget for agent {}; using fallback",
                    state.agent.id
                );
                FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Stage 5. Skipped below the transcript-length threshold; all
    /// failures are discarded for the turn.
    async fn stage_lead_qualification(&self, state: &TurnState<'_>) -> Option<LeadInfo> {
        let total_messages = state.history.len() + 1;
        if total_messages < self.config.lead_qualify_min_messages {
            return None;
        }

        let remaining = state.remaining_budget();
        if remaining.is_zero() {
            return None;
        }

        let extraction = prompt_lead(self.llm.as_ref(), state, remaining).await;
        match extraction {
            Some(lead) => Some(lead),
            None => {
                log::debug!(
                    "Lead qualification yielded nothing for agent {}",
                    state.agent.id
                );
                None
            }
        }
    }
}

async fn prompt_lead(
    llm: &dyn LlmProvider,
    state: &TurnState<'_>,
    remaining: Duration,
) -> Option<LeadInfo> {
    let extraction_prompt = lead::build_extraction_prompt(state.history, state.incoming_text);
    let messages = [ChatMessage::user(extraction_prompt)];
    let options = ChatOptions {
        max_tokens: 150,
        temperature: 0.0,
    };

    let reply = tokio::time::timeout(remaining, llm.chat(&messages, &options))
        .await
        .ok()?
        .ok()?;

    lead::parse_extraction_reply(&reply)
}

fn log_timings(agent: &Agent, outcome: &TurnOutcome) {
    let mut summary = String::new();
    for timing in &outcome.timings {
        let _ = write!(summary, " {}={}ms", timing.stage, timing.elapsed_ms);
    }
    log::info!(
        "Turn complete for agent {} intent={} retrieval={}{summary}",
        agent.id,
        outcome.intent,
        outcome.used_retrieval,
    );
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use salescraft_ai::LlmError;
    use salescraft_models::{Role, Tone};
    use salescraft_vector::VectorConfig;

    use super::*;

    /// Scripted provider: counts calls and serves canned outcomes.
    struct ScriptedLlm {
        chat_calls: AtomicUsize,
        embed_calls: AtomicUsize,
        chat_reply: Option<String>,
        lead_reply: Option<String>,
    }

    impl ScriptedLlm {
        fn answering(reply: &str) -> Self {
            Self {
                chat_calls: AtomicUsize::new(0),
                embed_calls: AtomicUsize::new(0),
                chat_reply: Some(reply.to_string()),
                lead_reply: None,
            }
        }

        const fn failing() -> Self {
            Self {
                chat_calls: AtomicUsize::new(0),
                embed_calls: AtomicUsize::new(0),
                chat_reply: None,
                lead_reply: None,
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            _options: &ChatOptions,
        ) -> Result<String, LlmError> {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);

            // Lead extraction turns are single-user-message prompts
            // starting with the extraction instruction.
            let is_extraction = messages.len() == 1
                && messages[0].content().starts_with("Extract customer contact");
            if is_extraction {
                return self.lead_reply.clone().ok_or(LlmError::Server {
                    message: "no lead scripted".to_string(),
                });
            }

            self.chat_reply.clone().ok_or(LlmError::Server {
                message: "scripted failure".to_string(),
            })
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
            self.embed_calls.fetch_add(1, Ordering::SeqCst);
            Err(LlmError::Transient {
                message: "embedding offline".to_string(),
            })
        }
    }

    fn unreachable_vector() -> Arc<VectorIndex> {
        Arc::new(VectorIndex::new(VectorConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: None,
            collection: "test".to_string(),
            dim: 4,
        }))
    }

    fn test_agent(greeting: Option<&str>) -> Agent {
        Agent {
            id: "a1".to_string(),
            owner_id: "u1".to_string(),
            name: "Alex".to_string(),
            company_name: "Acme".to_string(),
            company_description: "We sell widgets.".to_string(),
            tone: Tone::Friendly,
            language: "en".to_string(),
            greeting_message: greeting.map(String::from),
            sales_strategy: None,
            products: Vec::new(),
            index_namespace: "agent_a1".to_string(),
            is_active: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn fast_config() -> TurnConfig {
        TurnConfig {
            turn_budget: Duration::from_secs(5),
            ..TurnConfig::default()
        }
    }

    #[tokio::test]
    async fn empty_history_with_greeting_short_circuits() {
        let llm = Arc::new(ScriptedLlm::failing());
        let orchestrator = Orchestrator::new(
            Arc::clone(&llm) as Arc<dyn LlmProvider>,
            unreachable_vector(),
            fast_config(),
        );

        let agent = test_agent(Some("Welcome to Acme!"));
        let outcome = orchestrator.respond(&agent, &[], "hi").await;

        assert_eq!(outcome.reply, "Welcome to Acme!");
        assert_eq!(outcome.intent, Intent::Greeting);
        assert!(!outcome.used_retrieval);
        // Neither the chat model nor the embedder was touched.
        assert_eq!(llm.chat_calls.load(Ordering::SeqCst), 0);
        assert_eq!(llm.embed_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn retrieval_outage_degrades_but_still_replies() {
        let llm = Arc::new(ScriptedLlm::answering("We sell great widgets."));
        let orchestrator = Orchestrator::new(
            Arc::clone(&llm) as Arc<dyn LlmProvider>,
            unreachable_vector(),
            fast_config(),
        );

        let agent = test_agent(None);
        let outcome = orchestrator
            .respond(&agent, &[], "Tell me about your products")
            .await;

        assert_eq!(outcome.reply, "We sell great widgets.");
        assert!(!outcome.used_retrieval);
        assert_eq!(outcome.intent, Intent::ProductInquiry);
        // Vector count failed before any embedding was attempted.
        assert_eq!(llm.embed_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn llm_outage_yields_fallback_reply() {
        let llm = Arc::new(ScriptedLlm::failing());
        let orchestrator = Orchestrator::new(
            Arc::clone(&llm) as Arc<dyn LlmProvider>,
            unreachable_vector(),
            fast_config(),
        );

        let agent = test_agent(None);
        let outcome = orchestrator.respond(&agent, &[], "how much is shipping?").await;

        assert_eq!(outcome.reply, FALLBACK_REPLY);
        assert_eq!(outcome.intent, Intent::Pricing);
    }

    #[tokio::test]
    async fn lead_qualification_skipped_below_threshold() {
        let llm = Arc::new(ScriptedLlm::answering("Sure!"));
        let orchestrator = Orchestrator::new(
            Arc::clone(&llm) as Arc<dyn LlmProvider>,
            unreachable_vector(),
            fast_config(),
        );

        let agent = test_agent(None);
        let history = vec![
            ConversationTurn::now(Role::User, "hi"),
            ConversationTurn::now(Role::Assistant, "hello"),
            ConversationTurn::now(Role::User, "what do you sell?"),
        ];
        // 3 history turns + incoming = 4 messages, below the default 5.
        let outcome = orchestrator
            .respond(&agent, &history, "I'm Jane, jane@example.com, +1-555-1000")
            .await;

        assert!(outcome.lead_delta.is_none());
        // Exactly one chat call: generation only, no extraction.
        assert_eq!(llm.chat_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn lead_qualification_runs_at_threshold() {
        let llm = Arc::new(ScriptedLlm {
            chat_calls: AtomicUsize::new(0),
            embed_calls: AtomicUsize::new(0),
            chat_reply: Some("Thanks Jane!".to_string()),
            lead_reply: Some(
                r#"{"name": "Jane", "email": "jane@example.com", "phone": "+1-555-1000"}"#
                    .to_string(),
            ),
        });
        let orchestrator = Orchestrator::new(
            Arc::clone(&llm) as Arc<dyn LlmProvider>,
            unreachable_vector(),
            fast_config(),
        );

        let agent = test_agent(None);
        let history = vec![
            ConversationTurn::now(Role::User, "hi"),
            ConversationTurn::now(Role::Assistant, "hello"),
            ConversationTurn::now(Role::User, "what do you sell?"),
            ConversationTurn::now(Role::Assistant, "widgets"),
        ];
        // 4 history turns + incoming = 5 messages, at the threshold.
        let outcome = orchestrator
            .respond(&agent, &history, "I'm Jane, jane@example.com, +1-555-1000")
            .await;

        let lead = outcome.lead_delta.expect("lead should be extracted");
        assert_eq!(lead.name.as_deref(), Some("Jane"));
        assert_eq!(lead.email.as_deref(), Some("jane@example.com"));
        assert_eq!(lead.phone.as_deref(), Some("+1-555-1000"));
    }

    #[tokio::test]
    async fn every_stage_is_timed() {
        let llm = Arc::new(ScriptedLlm::answering("ok"));
        let orchestrator = Orchestrator::new(
            Arc::clone(&llm) as Arc<dyn LlmProvider>,
            unreachable_vector(),
            fast_config(),
        );

        let agent = test_agent(None);
        let outcome = orchestrator.respond(&agent, &[], "anything").await;

        let stages: Vec<&str> = outcome.timings.iter().map(|t| t.stage).collect();
        assert_eq!(
            stages,
            vec!["greeting", "intent", "retrieval", "generation", "lead"]
        );
    }
}
