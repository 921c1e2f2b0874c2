#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Core entity types for the salescraft platform.
//!
//! This crate defines the canonical data model shared across the entire
//! system: agents and their product catalogs, conversations with end users,
//! training-data lifecycle records, and orders. Storage, HTTP, and AI crates
//! all speak these types; none of them defines its own copies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

// ---------------------------------------------------------------------------
// Closed enums
// ---------------------------------------------------------------------------

/// Conversational tone an agent replies with.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tone {
    /// Warm, approachable, first-name-basis.
    #[default]
    Friendly,
    /// Polished business language.
    Professional,
    /// Relaxed, colloquial.
    Casual,
    /// Reserved and precise.
    Formal,
}

/// Stock availability for a product.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StockStatus {
    /// Available for immediate purchase.
    #[default]
    InStock,
    /// Available but running out.
    LowStock,
    /// Temporarily unavailable.
    OutOfStock,
    /// Not yet released; can be reserved.
    PreOrder,
    /// Permanently unavailable.
    Discontinued,
}

/// Kind of source material behind a training-data row.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrainingKind {
    /// Uploaded PDF document.
    Pdf,
    /// Fetched web page.
    Url,
    /// Question/answer pairs.
    Faq,
    /// Raw pasted text.
    #[default]
    Text,
}

/// Lifecycle status of a training-data row.
///
/// Transitions are monotonic: `Processing` may move to `Completed` or
/// `Failed`, and both of those are terminal.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TrainingStatus {
    /// Ingestion is queued or running.
    #[default]
    Processing,
    /// All chunks were embedded and indexed.
    Completed,
    /// Ingestion aborted; partial vectors were cleaned up.
    Failed,
}

impl TrainingStatus {
    /// Returns `true` if the row may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Processing, Self::Completed | Self::Failed)
        )
    }
}

/// Fulfilment status of an order.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    /// Placed, not yet acknowledged by the merchant.
    #[default]
    Pending,
    /// Acknowledged by the merchant.
    Confirmed,
    /// Being prepared.
    Processing,
    /// Packed and ready for carrier pickup.
    Packaged,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer.
    Delivered,
    /// Cancelled before delivery.
    Cancelled,
}

impl OrderStatus {
    /// Returns `true` if an order may move from `self` to `next`.
    ///
    /// Statuses advance along the fulfilment chain one step at a time;
    /// cancellation is allowed from any state that has not shipped.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::Processing | Self::Cancelled)
                | (Self::Processing, Self::Packaged | Self::Cancelled)
                | (Self::Packaged, Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Delivered)
        )
    }
}

/// Channel a conversation arrived through.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Channel {
    /// Hosted chat page.
    #[default]
    Web,
    /// Telegram bot bridge.
    Telegram,
    /// Embedded site widget.
    Embed,
}

/// Author of a conversation turn.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// The end user talking to the agent.
    User,
    /// The agent itself.
    Assistant,
}

/// Classified intent of an inbound user message.
///
/// The set is closed; classification is keyword-rule based and never calls
/// the LLM.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Intent {
    /// Salutations and openers.
    Greeting,
    /// Questions about the catalog.
    ProductInquiry,
    /// Cost and discount questions.
    Pricing,
    /// Stock and delivery questions.
    Availability,
    /// Help with an existing purchase.
    Support,
    /// Hesitation or pushback.
    Objection,
    /// Expressed readiness to buy.
    PurchaseIntent,
    /// User volunteering contact details.
    LeadCapture,
    /// Chit-chat unrelated to the business.
    Smalltalk,
    /// Everything else.
    Other,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// A configured conversational sales assistant owned by a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Opaque unique id.
    pub id: String,
    /// Tenant that owns this agent.
    pub owner_id: String,
    /// Human-facing agent name (e.g. "Alex").
    pub name: String,
    /// Merchant company name.
    pub company_name: String,
    /// Short company description used in the system prompt.
    pub company_description: String,
    /// Reply tone.
    pub tone: Tone,
    /// BCP-47 language tag the agent replies in.
    pub language: String,
    /// Fixed first-turn greeting. When set and the session is new, the
    /// greeting is emitted without any LLM call.
    pub greeting_message: Option<String>,
    /// Free-form selling guidance appended to the system prompt.
    pub sales_strategy: Option<String>,
    /// Configured catalog entries. Mixed plain names and structured
    /// summaries are both accepted.
    pub products: Vec<ProductEntry>,
    /// Stable vector-index filter key, derived once at creation and never
    /// reused after deletion.
    pub index_namespace: String,
    /// Soft-deactivation flag; inactive agents refuse public chat.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Derives the vector-index namespace for an agent id.
    #[must_use]
    pub fn index_namespace_for(id: &str) -> String {
        format!("agent_{id}")
    }
}

/// A catalog entry in an agent's configuration.
///
/// Merchants supply either a bare product name or a structured summary;
/// both shapes appear in the same list and the prompt renderer dispatches
/// on the variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductEntry {
    /// Just a product name.
    Name(String),
    /// Name plus optional details.
    Detailed(ProductSummary),
}

impl ProductEntry {
    /// Renders the entry as a single prompt line.
    #[must_use]
    pub fn display_line(&self) -> String {
        match self {
            Self::Name(name) => name.clone(),
            Self::Detailed(summary) => {
                let mut line = summary.name.clone();
                if let Some(price) = summary.price {
                    let currency = summary.currency.as_deref().unwrap_or("USD");
                    line.push_str(&format!(" ({price:.2} {currency})"));
                }
                if let Some(desc) = &summary.description
                    && !desc.is_empty()
                {
                    line.push_str(&format!(" - {desc}"));
                }
                line
            }
        }
    }
}

/// Structured product summary inside an agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    /// Product name.
    pub name: String,
    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unit price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// ISO-4217 currency code; `USD` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A full catalog product row owned by exactly one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Opaque unique id.
    pub id: String,
    /// Owning agent.
    pub agent_id: String,
    /// Product name.
    pub name: String,
    /// Short description.
    pub description: Option<String>,
    /// Long-form description shown on detail views.
    pub detailed_description: Option<String>,
    /// Unit price, non-negative.
    pub price: Option<f64>,
    /// ISO-4217 currency code.
    pub currency: String,
    /// Hosted image URL.
    pub image_url: Option<String>,
    /// Merchant-defined category label.
    pub category: Option<String>,
    /// Bullet-point feature list.
    pub features: Vec<String>,
    /// Free-form specification key/value pairs.
    pub specifications: BTreeMap<String, serde_json::Value>,
    /// Availability.
    pub stock_status: StockStatus,
    /// Merchant SKU.
    pub sku: Option<String>,
    /// Featured placement flag.
    pub is_featured: bool,
    /// Soft-deactivation flag.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// One turn in a conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who authored the turn.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Creates a turn stamped with the current time.
    #[must_use]
    pub fn now(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A single end-user session with one agent.
///
/// One row accumulates all turns of a session; messages are append-only and
/// the `(agent_id, session_id)` pair is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Opaque unique id.
    pub id: String,
    /// Owning agent.
    pub agent_id: String,
    /// Caller-supplied opaque session token.
    pub session_id: String,
    /// Channel the session arrived through.
    pub channel: Channel,
    /// Ordered transcript.
    pub messages: Vec<ConversationTurn>,
    /// Extracted lead data, merged monotonically across turns.
    pub lead_info: Option<LeadInfo>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Creates an empty conversation for a new session.
    #[must_use]
    pub fn new(agent_id: &str, session_id: &str, channel: Channel) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: agent_id.to_string(),
            session_id: session_id.to_string(),
            channel,
            messages: Vec::new(),
            lead_info: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Structured customer data extracted post-hoc from a transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadInfo {
    /// Customer name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Company the customer represents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// Stated budget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    /// Stated purchase timeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    /// Qualitative interest level (e.g. "high").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_level: Option<String>,
}

impl LeadInfo {
    /// Returns `true` if no field carries a non-empty value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [
            &self.name,
            &self.email,
            &self.phone,
            &self.company,
            &self.budget,
            &self.timeline,
            &self.interest_level,
        ]
        .into_iter()
        .all(|f| f.as_deref().is_none_or(|v| v.trim().is_empty()))
    }

    /// Merges `other` into `self` monotonically: a field is only written
    /// when it is currently empty and the incoming value is non-empty, so
    /// no existing data is ever lost to a later extraction.
    pub fn merge_from(&mut self, other: &Self) {
        merge_field(&mut self.name, &other.name);
        merge_field(&mut self.email, &other.email);
        merge_field(&mut self.phone, &other.phone);
        merge_field(&mut self.company, &other.company);
        merge_field(&mut self.budget, &other.budget);
        merge_field(&mut self.timeline, &other.timeline);
        merge_field(&mut self.interest_level, &other.interest_level);
    }
}

fn merge_field(existing: &mut Option<String>, incoming: &Option<String>) {
    let has_value = existing.as_deref().is_some_and(|v| !v.trim().is_empty());
    if !has_value
        && let Some(value) = incoming
        && !value.trim().is_empty()
    {
        *existing = Some(value.clone());
    }
}

// ---------------------------------------------------------------------------
// Training data
// ---------------------------------------------------------------------------

/// Persisted record of one ingestion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingData {
    /// Opaque unique id; doubles as the `source_id` on vector payloads.
    pub id: String,
    /// Owning agent.
    pub agent_id: String,
    /// What kind of material was ingested.
    pub kind: TrainingKind,
    /// Lifecycle status.
    pub status: TrainingStatus,
    /// Source details (filename, url, chunk count, error message).
    pub metadata: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl TrainingData {
    /// Creates a `processing` row for a fresh ingestion request.
    #[must_use]
    pub fn pending(agent_id: &str, kind: TrainingKind, metadata: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: agent_id.to_string(),
            kind,
            status: TrainingStatus::Processing,
            metadata,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// A line item on an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Catalog product id, when the item maps to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    /// Item name as shown to the customer.
    pub name: String,
    /// Quantity ordered.
    pub quantity: u32,
    /// Price per unit at order time.
    pub unit_price: f64,
}

/// One entry in an order's append-only status history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    /// Status entered.
    pub status: OrderStatus,
    /// When the transition happened.
    pub timestamp: DateTime<Utc>,
    /// Optional operator note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A customer order captured through an agent conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Opaque unique id.
    pub id: String,
    /// Agent the order came through.
    pub agent_id: String,
    /// Chat session that produced the order, when known. Links the order
    /// back to a conversation for funnel attribution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Globally unique `ORD-YYYY-NNNNNN` number.
    pub order_number: String,
    /// Customer name.
    pub customer_name: String,
    /// Customer email.
    pub customer_email: String,
    /// Customer phone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    /// Shipping address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<String>,
    /// Line items.
    pub items: Vec<OrderItem>,
    /// Order total.
    pub total_amount: f64,
    /// Current status.
    pub status: OrderStatus,
    /// Append-only status history, non-decreasing in timestamp.
    pub status_history: Vec<StatusChange>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Checks that a string matches the `ORD-YYYY-NNNNNN` order number format.
#[must_use]
pub fn is_valid_order_number(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 15
        && bytes.starts_with(b"ORD-")
        && bytes[4..8].iter().all(u8::is_ascii_digit)
        && bytes[8] == b'-'
        && bytes[9..15].iter().all(u8::is_ascii_digit)
}

// ---------------------------------------------------------------------------
// Chat messages (LLM boundary)
// ---------------------------------------------------------------------------

/// A prompt message handed to the LLM adapter.
///
/// Callers may pass a bare string (interpreted as a user turn) or an
/// explicit `{role, content}` pair; the adapter normalizes at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatMessage {
    /// Bare text, treated as a user turn.
    Plain(String),
    /// Explicit role and content.
    Structured {
        /// "system", "user", or "assistant".
        role: String,
        /// Message text.
        content: String,
    },
}

impl ChatMessage {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::Structured {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::Structured {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Structured {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }

    /// The effective role; plain strings are user turns.
    #[must_use]
    pub fn role(&self) -> &str {
        match self {
            Self::Plain(_) => "user",
            Self::Structured { role, .. } => role,
        }
    }

    /// The message text.
    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            Self::Plain(content) | Self::Structured { content, .. } => content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_allows_forward_chain() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Packaged));
        assert!(OrderStatus::Packaged.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn order_status_rejects_backwards_and_terminal_moves() {
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn training_status_is_monotonic() {
        assert!(TrainingStatus::Processing.can_transition_to(TrainingStatus::Completed));
        assert!(TrainingStatus::Processing.can_transition_to(TrainingStatus::Failed));
        assert!(!TrainingStatus::Completed.can_transition_to(TrainingStatus::Failed));
        assert!(!TrainingStatus::Failed.can_transition_to(TrainingStatus::Processing));
    }

    #[test]
    fn lead_merge_fills_empty_fields_only() {
        let mut existing = LeadInfo {
            name: Some("Jane".to_string()),
            email: None,
            ..LeadInfo::default()
        };
        let incoming = LeadInfo {
            name: Some("Janet".to_string()),
            email: Some("jane@example.com".to_string()),
            ..LeadInfo::default()
        };
        existing.merge_from(&incoming);
        assert_eq!(existing.name.as_deref(), Some("Jane"));
        assert_eq!(existing.email.as_deref(), Some("jane@example.com"));
    }

    #[test]
    fn lead_merge_never_clears_with_empty_incoming() {
        let mut existing = LeadInfo {
            phone: Some("+1-555-1000".to_string()),
            ..LeadInfo::default()
        };
        let incoming = LeadInfo {
            phone: Some(String::new()),
            ..LeadInfo::default()
        };
        existing.merge_from(&incoming);
        assert_eq!(existing.phone.as_deref(), Some("+1-555-1000"));
    }

    #[test]
    fn lead_whitespace_only_counts_as_empty() {
        let lead = LeadInfo {
            name: Some("   ".to_string()),
            ..LeadInfo::default()
        };
        assert!(lead.is_empty());
    }

    #[test]
    fn product_entry_deserializes_both_shapes() {
        let mixed: Vec<ProductEntry> = serde_json::from_str(
            r#"["Standing Desk", {"name": "Chair", "price": 249.0, "description": "Ergonomic"}]"#,
        )
        .unwrap();
        assert_eq!(mixed.len(), 2);
        assert_eq!(mixed[0].display_line(), "Standing Desk");
        assert_eq!(mixed[1].display_line(), "Chair (249.00 USD) - Ergonomic");
    }

    #[test]
    fn chat_message_plain_is_user_turn() {
        let msg: ChatMessage = serde_json::from_str(r#""hello there""#).unwrap();
        assert_eq!(msg.role(), "user");
        assert_eq!(msg.content(), "hello there");
    }

    #[test]
    fn chat_message_structured_keeps_role() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role": "assistant", "content": "hi"}"#).unwrap();
        assert_eq!(msg.role(), "assistant");
        assert_eq!(msg.content(), "hi");
    }

    #[test]
    fn order_number_format() {
        assert!(is_valid_order_number("ORD-2026-000001"));
        assert!(!is_valid_order_number("ORD-26-000001"));
        assert!(!is_valid_order_number("ORD-2026-1"));
        assert!(!is_valid_order_number("ord-2026-000001"));
    }

    #[test]
    fn index_namespace_is_stable() {
        assert_eq!(Agent::index_namespace_for("abc"), "agent_abc");
    }
}
