#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! API request and response types for the salescraft server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the entity types so the API contract can evolve independently of
//! storage. Responses use camelCase; requests accept the same.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use salescraft_models::{
    Agent, Channel, Conversation, ConversationTurn, LeadInfo, Order, OrderItem, OrderStatus,
    Product, ProductEntry, StatusChange, StockStatus, Tone, TrainingData, TrainingKind,
    TrainingStatus,
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// `GET /api/health` response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Always true when the process is serving.
    pub healthy: bool,
    /// Crate version.
    pub version: String,
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// `POST /api/agents` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgentRequest {
    /// Human-facing agent name.
    pub name: String,
    /// Merchant company name.
    pub company_name: String,
    /// Short company description.
    pub company_description: String,
    /// Reply tone; defaults to friendly.
    #[serde(default)]
    pub tone: Option<Tone>,
    /// BCP-47 language tag; defaults to `en`.
    #[serde(default)]
    pub language: Option<String>,
    /// Fixed first-turn greeting.
    #[serde(default)]
    pub greeting_message: Option<String>,
    /// Free-form selling guidance.
    #[serde(default)]
    pub sales_strategy: Option<String>,
    /// Catalog entries, plain names or structured summaries.
    #[serde(default)]
    pub products: Vec<ProductEntry>,
}

/// `PUT /api/agents/{id}` request body; omitted fields are unchanged.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAgentRequest {
    /// New agent name.
    #[serde(default)]
    pub name: Option<String>,
    /// New company name.
    #[serde(default)]
    pub company_name: Option<String>,
    /// New company description.
    #[serde(default)]
    pub company_description: Option<String>,
    /// New tone.
    #[serde(default)]
    pub tone: Option<Tone>,
    /// New language.
    #[serde(default)]
    pub language: Option<String>,
    /// New greeting.
    #[serde(default)]
    pub greeting_message: Option<String>,
    /// New selling guidance.
    #[serde(default)]
    pub sales_strategy: Option<String>,
    /// Replacement catalog entries.
    #[serde(default)]
    pub products: Option<Vec<ProductEntry>>,
    /// Activation toggle.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// An agent as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAgent {
    /// Agent id.
    pub id: String,
    /// Owning tenant.
    pub owner_id: String,
    /// Agent name.
    pub name: String,
    /// Company name.
    pub company_name: String,
    /// Company description.
    pub company_description: String,
    /// Reply tone.
    pub tone: Tone,
    /// Language tag.
    pub language: String,
    /// Greeting, when configured.
    pub greeting_message: Option<String>,
    /// Selling guidance, when configured.
    pub sales_strategy: Option<String>,
    /// Catalog entries.
    pub products: Vec<ProductEntry>,
    /// Vector-index namespace.
    pub index_namespace: String,
    /// Whether public chat is enabled.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<Agent> for ApiAgent {
    fn from(agent: Agent) -> Self {
        Self {
            id: agent.id,
            owner_id: agent.owner_id,
            name: agent.name,
            company_name: agent.company_name,
            company_description: agent.company_description,
            tone: agent.tone,
            language: agent.language,
            greeting_message: agent.greeting_message,
            sales_strategy: agent.sales_strategy,
            products: agent.products,
            index_namespace: agent.index_namespace,
            is_active: agent.is_active,
            created_at: agent.created_at,
            updated_at: agent.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// `POST /api/products` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    /// Owning agent.
    pub agent_id: String,
    /// Product name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: Option<String>,
    /// Long-form description.
    #[serde(default)]
    pub detailed_description: Option<String>,
    /// Unit price, non-negative.
    #[serde(default)]
    pub price: Option<f64>,
    /// ISO-4217 currency; defaults to USD.
    #[serde(default)]
    pub currency: Option<String>,
    /// Hosted image URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Category label.
    #[serde(default)]
    pub category: Option<String>,
    /// Feature bullets.
    #[serde(default)]
    pub features: Vec<String>,
    /// Specification map.
    #[serde(default)]
    pub specifications: BTreeMap<String, serde_json::Value>,
    /// Availability; defaults to in stock.
    #[serde(default)]
    pub stock_status: Option<StockStatus>,
    /// Merchant SKU.
    #[serde(default)]
    pub sku: Option<String>,
    /// Featured placement.
    #[serde(default)]
    pub is_featured: bool,
}

/// `PUT /api/products/{id}` request body; omitted fields are unchanged.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New long-form description.
    #[serde(default)]
    pub detailed_description: Option<String>,
    /// New price.
    #[serde(default)]
    pub price: Option<f64>,
    /// New currency.
    #[serde(default)]
    pub currency: Option<String>,
    /// New image URL.
    #[serde(default)]
    pub image_url: Option<String>,
    /// New category.
    #[serde(default)]
    pub category: Option<String>,
    /// Replacement feature bullets.
    #[serde(default)]
    pub features: Option<Vec<String>>,
    /// Replacement specification map.
    #[serde(default)]
    pub specifications: Option<BTreeMap<String, serde_json::Value>>,
    /// New availability.
    #[serde(default)]
    pub stock_status: Option<StockStatus>,
    /// New SKU.
    #[serde(default)]
    pub sku: Option<String>,
    /// Featured toggle.
    #[serde(default)]
    pub is_featured: Option<bool>,
    /// Activation toggle.
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// A product as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProduct {
    /// Product id.
    pub id: String,
    /// Owning agent.
    pub agent_id: String,
    /// Name.
    pub name: String,
    /// Short description.
    pub description: Option<String>,
    /// Long-form description.
    pub detailed_description: Option<String>,
    /// Unit price.
    pub price: Option<f64>,
    /// Currency code.
    pub currency: String,
    /// Image URL.
    pub image_url: Option<String>,
    /// Category label.
    pub category: Option<String>,
    /// Feature bullets.
    pub features: Vec<String>,
    /// Specification map.
    pub specifications: BTreeMap<String, serde_json::Value>,
    /// Availability.
    pub stock_status: StockStatus,
    /// SKU.
    pub sku: Option<String>,
    /// Featured placement.
    pub is_featured: bool,
    /// Active flag.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ApiProduct {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            agent_id: product.agent_id,
            name: product.name,
            description: product.description,
            detailed_description: product.detailed_description,
            price: product.price,
            currency: product.currency,
            image_url: product.image_url,
            category: product.category,
            features: product.features,
            specifications: product.specifications,
            stock_status: product.stock_status,
            sku: product.sku,
            is_featured: product.is_featured,
            is_active: product.is_active,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// `POST /api/products/upload-image` request body: base64 file content.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageRequest {
    /// Original filename; the extension is preserved.
    pub filename: String,
    /// Base64-encoded file bytes.
    pub data: String,
}

/// `POST /api/products/upload-image` response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadImageResponse {
    /// Public URL path of the stored image.
    pub url: String,
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

/// A question/answer pair in a training request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFaqItem {
    /// Question.
    pub question: String,
    /// Answer.
    pub answer: String,
}

/// `POST /api/training/pdf` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainPdfRequest {
    /// Target agent.
    pub agent_id: String,
    /// Original filename.
    pub filename: String,
    /// Base64-encoded PDF bytes.
    pub data: String,
}

/// `POST /api/training/url` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainUrlRequest {
    /// Target agent.
    pub agent_id: String,
    /// Page to fetch and ingest.
    pub url: String,
}

/// `POST /api/training/faq` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainFaqRequest {
    /// Target agent.
    pub agent_id: String,
    /// The pairs to ingest.
    pub items: Vec<ApiFaqItem>,
}

/// A training row as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTrainingData {
    /// Row id.
    pub id: String,
    /// Owning agent.
    pub agent_id: String,
    /// Source kind.
    #[serde(rename = "type")]
    pub kind: TrainingKind,
    /// Lifecycle status.
    pub status: TrainingStatus,
    /// Source metadata (filename, url, chunk count, error).
    pub metadata: serde_json::Value,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<TrainingData> for ApiTrainingData {
    fn from(row: TrainingData) -> Self {
        Self {
            id: row.id,
            agent_id: row.agent_id,
            kind: row.kind,
            status: row.status,
            metadata: row.metadata,
            created_at: row.created_at,
        }
    }
}

/// Query parameters for `DELETE /api/training/{agent_id}/data`.
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteTrainingParams {
    /// Row to delete.
    #[serde(alias = "trainingDataId")]
    pub training_data_id: String,
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// `POST /api/chat/{agent_id}/message` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user utterance.
    pub message: String,
    /// Session token; generated and returned when absent.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Originating channel; defaults to web.
    #[serde(default)]
    pub channel: Option<Channel>,
}

/// `POST /api/chat/{agent_id}/message` response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Assistant reply.
    pub reply: String,
    /// Session token for follow-up turns.
    pub session_id: String,
}

/// One transcript turn as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConversationTurn {
    /// Author role.
    pub role: String,
    /// Message text.
    pub content: String,
    /// When the turn was recorded.
    pub timestamp: DateTime<Utc>,
}

impl From<ConversationTurn> for ApiConversationTurn {
    fn from(turn: ConversationTurn) -> Self {
        Self {
            role: turn.role.to_string(),
            content: turn.content,
            timestamp: turn.timestamp,
        }
    }
}

/// A conversation as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConversation {
    /// Conversation id.
    pub id: String,
    /// Owning agent.
    pub agent_id: String,
    /// Session token.
    pub session_id: String,
    /// Originating channel.
    pub channel: Channel,
    /// Transcript.
    pub messages: Vec<ApiConversationTurn>,
    /// Extracted lead data.
    pub lead_info: Option<LeadInfo>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<Conversation> for ApiConversation {
    fn from(conversation: Conversation) -> Self {
        Self {
            id: conversation.id,
            agent_id: conversation.agent_id,
            session_id: conversation.session_id,
            channel: conversation.channel,
            messages: conversation
                .messages
                .into_iter()
                .map(ApiConversationTurn::from)
                .collect(),
            lead_info: conversation.lead_info,
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// `POST /api/conversational-builder/start` response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderStartResponse {
    /// Opaque dialogue token for follow-up turns.
    pub builder_session_id: String,
    /// Opening question.
    pub message: String,
}

/// `POST /api/conversational-builder/converse` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderConverseRequest {
    /// Dialogue token from `start`.
    pub builder_session_id: String,
    /// User reply.
    pub message: String,
}

/// `POST /api/conversational-builder/converse` response body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderConverseResponse {
    /// Next assistant prompt.
    pub message: String,
    /// Current phase after this turn.
    pub phase: String,
    /// Set on the turn that completes the dialogue.
    pub is_complete: bool,
    /// The new agent id, present only when complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

/// `POST /api/conversational-builder/upload-document` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderUploadRequest {
    /// Dialogue token from `start`.
    pub builder_session_id: String,
    /// Original filename.
    pub filename: String,
    /// Base64-encoded PDF bytes.
    pub data: String,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// A line item in an order request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOrderItemRequest {
    /// Catalog product id, when known.
    #[serde(default)]
    pub product_id: Option<String>,
    /// Item name.
    pub name: String,
    /// Quantity ordered.
    pub quantity: u32,
    /// Unit price.
    pub unit_price: f64,
}

impl From<ApiOrderItemRequest> for OrderItem {
    fn from(item: ApiOrderItemRequest) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name,
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

/// `POST /api/orders` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Agent the order came through.
    pub agent_id: String,
    /// Chat session that produced the order, when known.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Customer name.
    pub customer_name: String,
    /// Customer email.
    pub customer_email: String,
    /// Customer phone.
    #[serde(default)]
    pub customer_phone: Option<String>,
    /// Shipping address.
    #[serde(default)]
    pub shipping_address: Option<String>,
    /// Line items; must be non-empty.
    pub items: Vec<ApiOrderItemRequest>,
}

/// `PATCH /api/orders/{id}/status` request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusRequest {
    /// Target status.
    pub status: OrderStatus,
    /// Optional operator note recorded in the history.
    #[serde(default)]
    pub note: Option<String>,
}

/// One status-history entry as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatusChange {
    /// Status entered.
    pub status: OrderStatus,
    /// When.
    pub timestamp: DateTime<Utc>,
    /// Operator note.
    pub note: Option<String>,
}

impl From<StatusChange> for ApiStatusChange {
    fn from(change: StatusChange) -> Self {
        Self {
            status: change.status,
            timestamp: change.timestamp,
            note: change.note,
        }
    }
}

/// An order as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOrder {
    /// Order id.
    pub id: String,
    /// Agent the order came through.
    pub agent_id: String,
    /// Linked chat session.
    pub session_id: Option<String>,
    /// Public order number.
    pub order_number: String,
    /// Customer name.
    pub customer_name: String,
    /// Customer email.
    pub customer_email: String,
    /// Customer phone.
    pub customer_phone: Option<String>,
    /// Shipping address.
    pub shipping_address: Option<String>,
    /// Line items.
    pub items: Vec<OrderItem>,
    /// Order total.
    pub total_amount: f64,
    /// Current status.
    pub status: OrderStatus,
    /// Status history, oldest first.
    pub status_history: Vec<ApiStatusChange>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for ApiOrder {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            agent_id: order.agent_id,
            session_id: order.session_id,
            order_number: order.order_number,
            customer_name: order.customer_name,
            customer_email: order.customer_email,
            customer_phone: order.customer_phone,
            shipping_address: order.shipping_address,
            items: order.items,
            total_amount: order.total_amount,
            status: order.status,
            status_history: order
                .status_history
                .into_iter()
                .map(ApiStatusChange::from)
                .collect(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Analytics & listing
// ---------------------------------------------------------------------------

/// Query parameters shared by the analytics endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQueryParams {
    /// Narrow to one agent.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// Window start (ISO 8601); defaults to 30 days ago.
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    /// Window end (ISO 8601); defaults to now.
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

/// Pagination parameters accepted by list endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    /// Page size; defaults to 50.
    #[serde(default)]
    pub limit: Option<u32>,
    /// Opaque cursor from a previous page.
    #[serde(default)]
    pub cursor: Option<String>,
}
