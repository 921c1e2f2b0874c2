//! HTTP handler functions for the salescraft API.

use actix_web::{HttpResponse, http::StatusCode, web};
use base64::Engine as _;
use chrono::Utc;
use salescraft_documents::{DocumentSource, FaqItem};
use salescraft_ingest::IngestJob;
use salescraft_models::{
    Agent, Channel, Conversation, ConversationTurn, Order, OrderStatus, Product, Role,
    StatusChange, StockStatus, TrainingData, TrainingKind, Tone,
};
use salescraft_server_models::{
    AnalyticsQueryParams, ApiAgent, ApiConversation, ApiHealth, ApiOrder, ApiProduct,
    ApiTrainingData, BuilderConverseRequest, BuilderStartResponse, BuilderUploadRequest,
    ChatRequest, ChatResponse, CreateAgentRequest, CreateOrderRequest, CreateProductRequest,
    DeleteTrainingParams, ListParams, TrainFaqRequest, TrainPdfRequest, TrainUrlRequest,
    UpdateAgentRequest, UpdateOrderStatusRequest, UpdateProductRequest, UploadImageRequest,
    UploadImageResponse,
};
use salescraft_store::StoreError;
use serde::Serialize;

use crate::AppState;
use crate::auth::AuthedUser;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "success": true, "data": data }))
}

fn accepted<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Accepted().json(serde_json::json!({ "success": true, "data": data }))
}

fn fail(status: StatusCode, detail: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "success": false,
        "detail": detail,
    }))
}

fn store_error(context: &str, e: &StoreError) -> HttpResponse {
    match e {
        StoreError::InvalidTransition { from, to } => fail(
            StatusCode::CONFLICT,
            &format!("Invalid status transition: {from} -> {to}"),
        ),
        StoreError::Timeout => {
            log::error!("{context}: store operation timed out");
            fail(
                StatusCode::SERVICE_UNAVAILABLE,
                "Store temporarily unavailable; try again shortly",
            )
        }
        _ => {
            log::error!("{context}: {e}");
            fail(StatusCode::INTERNAL_SERVER_ERROR, context)
        }
    }
}

/// Fetches an agent and checks the caller owns it. `Err` carries the
/// ready-to-return response (404 on a miss, 403 on foreign ownership).
async fn owned_agent(
    state: &AppState,
    agent_id: &str,
    user_id: &str,
) -> Result<Agent, HttpResponse> {
    match salescraft_store::agents::get(state.db.as_ref(), agent_id).await {
        Ok(Some(agent)) if agent.owner_id == user_id => Ok(agent),
        Ok(Some(_)) => Err(fail(
            StatusCode::FORBIDDEN,
            "Agent belongs to another account",
        )),
        Ok(None) => Err(fail(StatusCode::NOT_FOUND, "Agent not found")),
        Err(e) => Err(store_error("Failed to load agent", &e)),
    }
}

fn decode_base64(data: &str) -> Result<Vec<u8>, HttpResponse> {
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|_| fail(StatusCode::BAD_REQUEST, "Invalid base64 payload"))
}

/// Decodes a `ListParams` cursor back into an offset. Cursors are
/// opaque to clients; an unreadable one restarts from the beginning.
fn cursor_offset(params: &ListParams) -> u32 {
    params
        .cursor
        .as_deref()
        .and_then(|c| c.parse().ok())
        .unwrap_or(0)
}

/// Applies limit/cursor pagination to an in-memory list and returns the
/// page plus the next cursor, if any.
fn paginate<T>(items: Vec<T>, params: &ListParams) -> (Vec<T>, Option<String>) {
    let limit = params.limit.unwrap_or(50).min(200) as usize;
    let offset = cursor_offset(params) as usize;

    let next_cursor = (items.len() > offset + limit).then(|| (offset + limit).to_string());
    let page: Vec<T> = items.into_iter().skip(offset).take(limit).collect();

    (page, next_cursor)
}

fn paged<T: Serialize>(page: Vec<T>, next_cursor: Option<String>) -> HttpResponse {
    ok(serde_json::json!({ "items": page, "nextCursor": next_cursor }))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// `POST /api/agents`
pub async fn create_agent(
    state: web::Data<AppState>,
    user: AuthedUser,
    body: web::Json<CreateAgentRequest>,
) -> HttpResponse {
    let body = body.into_inner();

    if body.name.trim().is_empty() || body.company_name.trim().is_empty() {
        return fail(StatusCode::BAD_REQUEST, "name and companyName are required");
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = Utc::now();
    let agent = Agent {
        index_namespace: Agent::index_namespace_for(&id),
        id,
        owner_id: user.user_id,
        name: body.name.trim().to_string(),
        company_name: body.company_name.trim().to_string(),
        company_description: body.company_description.trim().to_string(),
        tone: body.tone.unwrap_or(Tone::Friendly),
        language: body.language.unwrap_or_else(|| "en".to_string()),
        greeting_message: body.greeting_message,
        sales_strategy: body.sales_strategy,
        products: body.products,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    match salescraft_store::agents::insert(state.db.as_ref(), &agent).await {
        Ok(()) => ok(ApiAgent::from(agent)),
        Err(e) => store_error("Failed to create agent", &e),
    }
}

/// `GET /api/agents`
pub async fn list_agents(
    state: web::Data<AppState>,
    user: AuthedUser,
    params: web::Query<ListParams>,
) -> HttpResponse {
    match salescraft_store::agents::list_by_owner(state.db.as_ref(), &user.user_id).await {
        Ok(agents) => {
            let (page, next) = paginate(agents, &params);
            paged(
                page.into_iter().map(ApiAgent::from).collect::<Vec<_>>(),
                next,
            )
        }
        Err(e) => store_error("Failed to list agents", &e),
    }
}

/// `GET /api/agents/{id}` — public: the chat page fetches agent config
/// without credentials.
pub async fn get_agent(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match salescraft_store::agents::get(state.db.as_ref(), &path).await {
        Ok(Some(agent)) => ok(ApiAgent::from(agent)),
        Ok(None) => fail(StatusCode::NOT_FOUND, "Agent not found"),
        Err(e) => store_error("Failed to load agent", &e),
    }
}

/// `PUT /api/agents/{id}`
pub async fn update_agent(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<String>,
    body: web::Json<UpdateAgentRequest>,
) -> HttpResponse {
    let mut agent = match owned_agent(&state, &path, &user.user_id).await {
        Ok(agent) => agent,
        Err(resp) => return resp,
    };

    let body = body.into_inner();
    if let Some(name) = body.name {
        agent.name = name;
    }
    if let Some(company_name) = body.company_name {
        agent.company_name = company_name;
    }
    if let Some(company_description) = body.company_description {
        agent.company_description = company_description;
    }
    if let Some(tone) = body.tone {
        agent.tone = tone;
    }
    if let Some(language) = body.language {
        agent.language = language;
    }
    if let Some(greeting) = body.greeting_message {
        agent.greeting_message = Some(greeting);
    }
    if let Some(strategy) = body.sales_strategy {
        agent.sales_strategy = Some(strategy);
    }
    if let Some(products) = body.products {
        agent.products = products;
    }
    if let Some(is_active) = body.is_active {
        agent.is_active = is_active;
    }
    agent.updated_at = Utc::now();

    match salescraft_store::agents::update(state.db.as_ref(), &agent).await {
        Ok(true) => ok(ApiAgent::from(agent)),
        Ok(false) => fail(StatusCode::NOT_FOUND, "Agent not found"),
        Err(e) => store_error("Failed to update agent", &e),
    }
}

/// `DELETE /api/agents/{id}` — cascades to products, conversations,
/// training rows, orders, and every vector under the agent's namespace.
pub async fn delete_agent(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<String>,
) -> HttpResponse {
    let agent = match owned_agent(&state, &path, &user.user_id).await {
        Ok(agent) => agent,
        Err(resp) => return resp,
    };

    // Vectors first: if the index is down the rows survive and the
    // caller can retry, rather than orphaning vectors forever.
    if let Err(e) = state.vector.delete_by_agent(&agent.index_namespace).await {
        log::error!("Vector cleanup failed deleting agent {}: {e}", agent.id);
        return fail(
            StatusCode::SERVICE_UNAVAILABLE,
            "Vector index unavailable; try deleting again shortly",
        );
    }

    match salescraft_store::agents::delete(state.db.as_ref(), &agent.id).await {
        Ok(true) => ok(serde_json::json!({ "deleted": true })),
        Ok(false) => fail(StatusCode::NOT_FOUND, "Agent not found"),
        Err(e) => store_error("Failed to delete agent", &e),
    }
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

/// `POST /api/products`
pub async fn create_product(
    state: web::Data<AppState>,
    user: AuthedUser,
    body: web::Json<CreateProductRequest>,
) -> HttpResponse {
    let body = body.into_inner();

    if body.name.trim().is_empty() {
        return fail(StatusCode::BAD_REQUEST, "name is required");
    }
    if body.price.is_some_and(|p| p < 0.0 || !p.is_finite()) {
        return fail(StatusCode::BAD_REQUEST, "price must be non-negative");
    }

    if let Err(resp) = owned_agent(&state, &body.agent_id, &user.user_id).await {
        return resp;
    }

    let now = Utc::now();
    let product = Product {
        id: uuid::Uuid::new_v4().to_string(),
        agent_id: body.agent_id,
        name: body.name.trim().to_string(),
        description: body.description,
        detailed_description: body.detailed_description,
        price: body.price,
        currency: body.currency.unwrap_or_else(|| "USD".to_string()),
        image_url: body.image_url,
        category: body.category,
        features: body.features,
        specifications: body.specifications,
        stock_status: body.stock_status.unwrap_or(StockStatus::InStock),
        sku: body.sku,
        is_featured: body.is_featured,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    match salescraft_store::products::insert(state.db.as_ref(), &product).await {
        Ok(()) => ok(ApiProduct::from(product)),
        Err(e) => store_error("Failed to create product", &e),
    }
}

/// `GET /api/products/agent/{id}`
pub async fn list_products(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<String>,
    params: web::Query<ListParams>,
) -> HttpResponse {
    if let Err(resp) = owned_agent(&state, &path, &user.user_id).await {
        return resp;
    }

    match salescraft_store::products::list_by_agent(state.db.as_ref(), &path).await {
        Ok(products) => {
            let (page, next) = paginate(products, &params);
            paged(
                page.into_iter().map(ApiProduct::from).collect::<Vec<_>>(),
                next,
            )
        }
        Err(e) => store_error("Failed to list products", &e),
    }
}

/// Loads a product and checks ownership through its agent.
async fn owned_product(
    state: &AppState,
    product_id: &str,
    user_id: &str,
) -> Result<Product, HttpResponse> {
    let product = match salescraft_store::products::get(state.db.as_ref(), product_id).await {
        Ok(Some(product)) => product,
        Ok(None) => return Err(fail(StatusCode::NOT_FOUND, "Product not found")),
        Err(e) => return Err(store_error("Failed to load product", &e)),
    };

    owned_agent(state, &product.agent_id, user_id).await?;
    Ok(product)
}

/// `PUT /api/products/{id}`
pub async fn update_product(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<String>,
    body: web::Json<UpdateProductRequest>,
) -> HttpResponse {
    let mut product = match owned_product(&state, &path, &user.user_id).await {
        Ok(product) => product,
        Err(resp) => return resp,
    };

    let body = body.into_inner();
    if body.price.is_some_and(|p| p < 0.0 || !p.is_finite()) {
        return fail(StatusCode::BAD_REQUEST, "price must be non-negative");
    }

    if let Some(name) = body.name {
        product.name = name;
    }
    if let Some(description) = body.description {
        product.description = Some(description);
    }
    if let Some(detailed) = body.detailed_description {
        product.detailed_description = Some(detailed);
    }
    if let Some(price) = body.price {
        product.price = Some(price);
    }
    if let Some(currency) = body.currency {
        product.currency = currency;
    }
    if let Some(image_url) = body.image_url {
        product.image_url = Some(image_url);
    }
    if let Some(category) = body.category {
        product.category = Some(category);
    }
    if let Some(features) = body.features {
        product.features = features;
    }
    if let Some(specifications) = body.specifications {
        product.specifications = specifications;
    }
    if let Some(stock_status) = body.stock_status {
        product.stock_status = stock_status;
    }
    if let Some(sku) = body.sku {
        product.sku = Some(sku);
    }
    if let Some(is_featured) = body.is_featured {
        product.is_featured = is_featured;
    }
    if let Some(is_active) = body.is_active {
        product.is_active = is_active;
    }
    product.updated_at = Utc::now();

    match salescraft_store::products::update(state.db.as_ref(), &product).await {
        Ok(true) => ok(ApiProduct::from(product)),
        Ok(false) => fail(StatusCode::NOT_FOUND, "Product not found"),
        Err(e) => store_error("Failed to update product", &e),
    }
}

/// `DELETE /api/products/{id}`
pub async fn delete_product(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<String>,
) -> HttpResponse {
    if let Err(resp) = owned_product(&state, &path, &user.user_id).await {
        return resp;
    }

    match salescraft_store::products::delete(state.db.as_ref(), &path).await {
        Ok(true) => ok(serde_json::json!({ "deleted": true })),
        Ok(false) => fail(StatusCode::NOT_FOUND, "Product not found"),
        Err(e) => store_error("Failed to delete product", &e),
    }
}

/// Extensions accepted by the image upload endpoint.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// `POST /api/products/upload-image`
pub async fn upload_image(
    state: web::Data<AppState>,
    _user: AuthedUser,
    body: web::Json<UploadImageRequest>,
) -> HttpResponse {
    let body = body.into_inner();

    let extension = body
        .filename
        .rsplit('.')
        .next()
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return fail(
            StatusCode::BAD_REQUEST,
            "Unsupported image type; use png, jpg, jpeg, gif, or webp",
        );
    }

    let bytes = match decode_base64(&body.data) {
        Ok(bytes) => bytes,
        Err(resp) => return resp,
    };

    let stored_name = format!("{}.{extension}", uuid::Uuid::new_v4());
    let path = std::path::Path::new(&state.upload_dir).join(&stored_name);

    if let Err(e) = std::fs::write(&path, &bytes) {
        log::error!("Failed to store uploaded image: {e}");
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to store image");
    }

    ok(UploadImageResponse {
        url: format!("/uploads/{stored_name}"),
    })
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

/// Persists a `processing` training row and enqueues its ingestion job.
/// Returns 202: the work continues after this response.
async fn enqueue_training(
    state: &AppState,
    agent: &Agent,
    kind: TrainingKind,
    metadata: serde_json::Value,
    source: DocumentSource,
) -> HttpResponse {
    let row = TrainingData::pending(&agent.id, kind, metadata);

    if let Err(e) = salescraft_store::training::insert(state.db.as_ref(), &row).await {
        return store_error("Failed to create training row", &e);
    }

    let job = IngestJob {
        training_data_id: row.id.clone(),
        agent_id: agent.id.clone(),
        index_namespace: agent.index_namespace.clone(),
        source,
    };

    if let Err(e) = state.ingest.enqueue(job).await {
        log::error!("Failed to enqueue ingestion for row {}: {e}", row.id);
        return fail(
            StatusCode::SERVICE_UNAVAILABLE,
            "Ingestion queue unavailable",
        );
    }

    accepted(ApiTrainingData::from(row))
}

/// `POST /api/training/pdf`
pub async fn train_pdf(
    state: web::Data<AppState>,
    user: AuthedUser,
    body: web::Json<TrainPdfRequest>,
) -> HttpResponse {
    let body = body.into_inner();

    let agent = match owned_agent(&state, &body.agent_id, &user.user_id).await {
        Ok(agent) => agent,
        Err(resp) => return resp,
    };

    let bytes = match decode_base64(&body.data) {
        Ok(bytes) => bytes,
        Err(resp) => return resp,
    };
    if bytes.is_empty() {
        return fail(StatusCode::BAD_REQUEST, "Empty PDF payload");
    }

    enqueue_training(
        &state,
        &agent,
        TrainingKind::Pdf,
        serde_json::json!({ "filename": body.filename }),
        DocumentSource::Pdf {
            filename: body.filename.clone(),
            bytes,
        },
    )
    .await
}

/// `POST /api/training/url`
pub async fn train_url(
    state: web::Data<AppState>,
    user: AuthedUser,
    body: web::Json<TrainUrlRequest>,
) -> HttpResponse {
    let body = body.into_inner();

    if !body.url.starts_with("http://") && !body.url.starts_with("https://") {
        return fail(StatusCode::BAD_REQUEST, "url must be http(s)");
    }

    let agent = match owned_agent(&state, &body.agent_id, &user.user_id).await {
        Ok(agent) => agent,
        Err(resp) => return resp,
    };

    enqueue_training(
        &state,
        &agent,
        TrainingKind::Url,
        serde_json::json!({ "url": body.url }),
        DocumentSource::Url { url: body.url },
    )
    .await
}

/// `POST /api/training/faq`
pub async fn train_faq(
    state: web::Data<AppState>,
    user: AuthedUser,
    body: web::Json<TrainFaqRequest>,
) -> HttpResponse {
    let body = body.into_inner();

    if body.items.is_empty() {
        return fail(StatusCode::BAD_REQUEST, "items must be non-empty");
    }

    let agent = match owned_agent(&state, &body.agent_id, &user.user_id).await {
        Ok(agent) => agent,
        Err(resp) => return resp,
    };

    let items: Vec<FaqItem> = body
        .items
        .into_iter()
        .map(|item| FaqItem {
            question: item.question,
            answer: item.answer,
        })
        .collect();

    enqueue_training(
        &state,
        &agent,
        TrainingKind::Faq,
        serde_json::json!({ "faq_count": items.len() }),
        DocumentSource::Faq { items },
    )
    .await
}

/// `GET /api/training/{agent_id}/data`
pub async fn list_training(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<String>,
    params: web::Query<ListParams>,
) -> HttpResponse {
    if let Err(resp) = owned_agent(&state, &path, &user.user_id).await {
        return resp;
    }

    match salescraft_store::training::list_by_agent(state.db.as_ref(), &path).await {
        Ok(rows) => {
            let (page, next) = paginate(rows, &params);
            paged(
                page.into_iter()
                    .map(ApiTrainingData::from)
                    .collect::<Vec<_>>(),
                next,
            )
        }
        Err(e) => store_error("Failed to list training data", &e),
    }
}

/// `DELETE /api/training/{agent_id}/data?training_data_id=…`
pub async fn delete_training(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<String>,
    params: web::Query<DeleteTrainingParams>,
) -> HttpResponse {
    if let Err(resp) = owned_agent(&state, &path, &user.user_id).await {
        return resp;
    }

    let row = match salescraft_store::training::get(state.db.as_ref(), &params.training_data_id)
        .await
    {
        Ok(Some(row)) if row.agent_id == *path => row,
        Ok(Some(_) | None) => return fail(StatusCode::NOT_FOUND, "Training row not found"),
        Err(e) => return store_error("Failed to load training row", &e),
    };

    // Vectors first so a failed index delete never strands entries
    // behind a missing row.
    if let Err(e) = state.vector.delete_by_source(&row.id).await {
        log::error!("Vector cleanup failed deleting training row {}: {e}", row.id);
        return fail(
            StatusCode::SERVICE_UNAVAILABLE,
            "Vector index unavailable; try deleting again shortly",
        );
    }

    match salescraft_store::training::delete(state.db.as_ref(), &row.id).await {
        Ok(true) => ok(serde_json::json!({ "deleted": true })),
        Ok(false) => fail(StatusCode::NOT_FOUND, "Training row not found"),
        Err(e) => store_error("Failed to delete training row", &e),
    }
}

// ---------------------------------------------------------------------------
// Public chat
// ---------------------------------------------------------------------------

/// `POST /api/chat/{agent_id}/message` — public, no credentials.
///
/// Turns on one session are serialized through a per-session lock so
/// the append-only transcript keeps its order. A store failure after
/// the reply is generated degrades instead of failing: the reply still
/// goes out with an `x-persistence-degraded` header while a background
/// task retries the write.
pub async fn chat_message(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ChatRequest>,
) -> HttpResponse {
    let agent_id = path.into_inner();
    let body = body.into_inner();

    if body.message.trim().is_empty() {
        return fail(StatusCode::BAD_REQUEST, "message must be non-empty");
    }

    let agent = match salescraft_store::agents::get(state.db.as_ref(), &agent_id).await {
        Ok(Some(agent)) if agent.is_active => agent,
        Ok(Some(_) | None) => return fail(StatusCode::NOT_FOUND, "Agent not found or inactive"),
        Err(e) => return store_error("Failed to load agent", &e),
    };

    let session_id = body
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let lock = state.sessions.lock_for(&agent.id, &session_id).await;
    let _serialized = lock.lock().await;

    let mut conversation = match salescraft_store::conversations::get_by_session(
        state.db.as_ref(),
        &agent.id,
        &session_id,
    )
    .await
    {
        Ok(Some(conversation)) => conversation,
        Ok(None) => Conversation::new(
            &agent.id,
            &session_id,
            body.channel.unwrap_or(Channel::Web),
        ),
        Err(e) => return store_error("Failed to load conversation", &e),
    };

    let outcome = state
        .orchestrator
        .respond(&agent, &conversation.messages, &body.message)
        .await;

    conversation
        .messages
        .push(ConversationTurn::now(Role::User, body.message));
    conversation
        .messages
        .push(ConversationTurn::now(Role::Assistant, outcome.reply.clone()));

    if let Some(delta) = &outcome.lead_delta {
        let lead = conversation.lead_info.get_or_insert_with(Default::default);
        lead.merge_from(delta);
    }
    conversation.updated_at = Utc::now();

    let response_body = ChatResponse {
        reply: outcome.reply,
        session_id: session_id.clone(),
    };

    match salescraft_store::conversations::upsert(state.db.as_ref(), &conversation).await {
        Ok(()) => ok(response_body),
        Err(e) => {
            log::error!(
                "Transcript persistence failed for session {session_id}: {e}; retrying in background"
            );
            retry_persist(&state, conversation);

            HttpResponse::Ok()
                .insert_header(("x-persistence-degraded", "true"))
                .json(serde_json::json!({ "success": true, "data": response_body }))
        }
    }
}

/// Spawns a single delayed background retry for a failed transcript
/// write. The reply has already been delivered; this is best-effort.
fn retry_persist(state: &web::Data<AppState>, conversation: Conversation) {
    let db = std::sync::Arc::clone(&state.db);
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_secs(2)).await;
        if let Err(e) = salescraft_store::conversations::upsert(db.as_ref(), &conversation).await {
            log::error!(
                "Background transcript retry failed for session {}: {e}",
                conversation.session_id
            );
        }
    });
}

/// `GET /api/chat/{agent_id}/conversations` — owner-side transcript
/// listing.
pub async fn list_conversations(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<String>,
    params: web::Query<ListParams>,
) -> HttpResponse {
    if let Err(resp) = owned_agent(&state, &path, &user.user_id).await {
        return resp;
    }

    let limit = params.limit.unwrap_or(50).min(200);
    let offset = cursor_offset(&params);

    match salescraft_store::conversations::list_by_agent(state.db.as_ref(), &path, limit, offset)
        .await
    {
        Ok(conversations) => {
            let next_cursor =
                (conversations.len() as u32 == limit).then(|| (offset + limit).to_string());
            paged(
                conversations
                    .into_iter()
                    .map(ApiConversation::from)
                    .collect::<Vec<_>>(),
                next_cursor,
            )
        }
        Err(e) => store_error("Failed to list conversations", &e),
    }
}

// ---------------------------------------------------------------------------
// Conversational builder
// ---------------------------------------------------------------------------

/// `POST /api/conversational-builder/start`
pub async fn builder_start(state: web::Data<AppState>, user: AuthedUser) -> HttpResponse {
    match salescraft_builder::start(state.db.as_ref(), &user.user_id).await {
        Ok((builder_state, message)) => {
            let builder_session_id = state.builder_sessions.create(builder_state).await;
            ok(BuilderStartResponse {
                builder_session_id,
                message,
            })
        }
        Err(e) => {
            log::error!("Failed to start builder dialogue: {e}");
            fail(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to start builder dialogue",
            )
        }
    }
}

/// `POST /api/conversational-builder/converse`
pub async fn builder_converse(
    state: web::Data<AppState>,
    _user: AuthedUser,
    body: web::Json<BuilderConverseRequest>,
) -> HttpResponse {
    let body = body.into_inner();

    let Some(mut builder_state) = state.builder_sessions.take(&body.builder_session_id).await
    else {
        return fail(StatusCode::NOT_FOUND, "Unknown builder session");
    };

    let turn = salescraft_builder::converse(
        state.db.as_ref(),
        &state.ingest,
        &mut builder_state,
        &body.message,
    )
    .await;

    let phase = builder_state.phase.to_string();
    state
        .builder_sessions
        .put_back(&body.builder_session_id, builder_state)
        .await;

    match turn {
        Ok(turn) => ok(salescraft_server_models::BuilderConverseResponse {
            message: turn.reply,
            phase,
            is_complete: turn.is_complete,
            agent_id: turn.agent_id,
        }),
        Err(e) => {
            log::error!("Builder turn failed: {e}");
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Builder turn failed")
        }
    }
}

/// `POST /api/conversational-builder/upload-document`
pub async fn builder_upload(
    state: web::Data<AppState>,
    _user: AuthedUser,
    body: web::Json<BuilderUploadRequest>,
) -> HttpResponse {
    let body = body.into_inner();

    let bytes = match decode_base64(&body.data) {
        Ok(bytes) => bytes,
        Err(resp) => return resp,
    };

    let Some(mut builder_state) = state.builder_sessions.take(&body.builder_session_id).await
    else {
        return fail(StatusCode::NOT_FOUND, "Unknown builder session");
    };

    let attached = salescraft_builder::attach_document(
        state.db.as_ref(),
        &state.ingest,
        &mut builder_state,
        &body.filename,
        bytes,
    )
    .await;

    state
        .builder_sessions
        .put_back(&body.builder_session_id, builder_state)
        .await;

    match attached {
        Ok(training_data_id) => accepted(serde_json::json!({
            "trainingDataId": training_data_id
        })),
        Err(e) => {
            log::error!("Builder document upload failed: {e}");
            fail(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to ingest document",
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------------------

fn report_scope(user_id: &str, params: &AnalyticsQueryParams) -> salescraft_analytics::ReportScope {
    let to = params.to.unwrap_or_else(Utc::now);
    let from = params
        .from
        .unwrap_or_else(|| to - chrono::Duration::days(30));

    salescraft_analytics::ReportScope {
        owner_id: user_id.to_string(),
        agent_id: params.agent_id.clone(),
        from,
        to,
    }
}

/// `GET /api/analytics/funnel`
pub async fn analytics_funnel(
    state: web::Data<AppState>,
    user: AuthedUser,
    params: web::Query<AnalyticsQueryParams>,
) -> HttpResponse {
    let scope = report_scope(&user.user_id, &params);
    match salescraft_analytics::funnel(state.db.as_ref(), &scope).await {
        Ok(report) => ok(report),
        Err(e) => {
            log::error!("Funnel report failed: {e}");
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Funnel report failed")
        }
    }
}

/// `GET /api/analytics/peak-hours`
pub async fn analytics_peak_hours(
    state: web::Data<AppState>,
    user: AuthedUser,
    params: web::Query<AnalyticsQueryParams>,
) -> HttpResponse {
    let scope = report_scope(&user.user_id, &params);
    match salescraft_analytics::peak_hours(state.db.as_ref(), &scope).await {
        Ok(report) => ok(report),
        Err(e) => {
            log::error!("Peak-hours report failed: {e}");
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Peak-hours report failed")
        }
    }
}

/// `GET /api/analytics/trends`
pub async fn analytics_trends(
    state: web::Data<AppState>,
    user: AuthedUser,
    params: web::Query<AnalyticsQueryParams>,
) -> HttpResponse {
    let scope = report_scope(&user.user_id, &params);
    match salescraft_analytics::daily_trends(state.db.as_ref(), &scope).await {
        Ok(report) => ok(report),
        Err(e) => {
            log::error!("Trend report failed: {e}");
            fail(StatusCode::INTERNAL_SERVER_ERROR, "Trend report failed")
        }
    }
}

/// `GET /api/analytics/agents`
pub async fn analytics_agents(
    state: web::Data<AppState>,
    user: AuthedUser,
    params: web::Query<AnalyticsQueryParams>,
) -> HttpResponse {
    let scope = report_scope(&user.user_id, &params);
    match salescraft_analytics::agent_performance(state.db.as_ref(), &scope).await {
        Ok(report) => ok(report),
        Err(e) => {
            log::error!("Agent performance report failed: {e}");
            fail(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Agent performance report failed",
            )
        }
    }
}

/// `GET /api/analytics/leads` — conversations that captured lead data,
/// newest first.
pub async fn analytics_leads(
    state: web::Data<AppState>,
    user: AuthedUser,
    params: web::Query<AnalyticsQueryParams>,
) -> HttpResponse {
    let scope = report_scope(&user.user_id, &params);

    match salescraft_store::conversations::list_for_owner(
        state.db.as_ref(),
        &scope.owner_id,
        scope.agent_id.as_deref(),
        scope.from,
        scope.to,
    )
    .await
    {
        Ok(conversations) => {
            let mut leads: Vec<ApiConversation> = conversations
                .into_iter()
                .filter(|c| c.lead_info.as_ref().is_some_and(|l| !l.is_empty()))
                .map(ApiConversation::from)
                .collect();
            leads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            ok(leads)
        }
        Err(e) => store_error("Failed to list leads", &e),
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// `POST /api/orders` — public: placed from the chat widget.
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> HttpResponse {
    let body = body.into_inner();

    if body.items.is_empty() {
        return fail(StatusCode::BAD_REQUEST, "items must be non-empty");
    }
    if body.items.iter().any(|i| i.quantity == 0 || i.unit_price < 0.0) {
        return fail(
            StatusCode::BAD_REQUEST,
            "item quantities must be positive and prices non-negative",
        );
    }
    if body.customer_name.trim().is_empty() || body.customer_email.trim().is_empty() {
        return fail(
            StatusCode::BAD_REQUEST,
            "customerName and customerEmail are required",
        );
    }

    match salescraft_store::agents::get(state.db.as_ref(), &body.agent_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return fail(StatusCode::NOT_FOUND, "Agent not found"),
        Err(e) => return store_error("Failed to load agent", &e),
    }

    let order_number = match salescraft_store::orders::allocate_order_number(state.db.as_ref())
        .await
    {
        Ok(number) => number,
        Err(e) => return store_error("Failed to allocate order number", &e),
    };

    let items: Vec<salescraft_models::OrderItem> =
        body.items.into_iter().map(Into::into).collect();
    let total_amount = items
        .iter()
        .map(|i| f64::from(i.quantity) * i.unit_price)
        .sum();

    let now = Utc::now();
    let order = Order {
        id: uuid::Uuid::new_v4().to_string(),
        agent_id: body.agent_id,
        session_id: body.session_id,
        order_number,
        customer_name: body.customer_name.trim().to_string(),
        customer_email: body.customer_email.trim().to_string(),
        customer_phone: body.customer_phone,
        shipping_address: body.shipping_address,
        items,
        total_amount,
        status: OrderStatus::Pending,
        status_history: vec![StatusChange {
            status: OrderStatus::Pending,
            timestamp: now,
            note: None,
        }],
        created_at: now,
        updated_at: now,
    };

    match salescraft_store::orders::insert(state.db.as_ref(), &order).await {
        Ok(()) => ok(ApiOrder::from(order)),
        Err(e) => store_error("Failed to create order", &e),
    }
}

/// `GET /api/orders/track/{order_number}` — public tracking.
pub async fn track_order(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    if !salescraft_models::is_valid_order_number(&path) {
        return fail(StatusCode::BAD_REQUEST, "Malformed order number");
    }

    match salescraft_store::orders::get_by_order_number(state.db.as_ref(), &path).await {
        Ok(Some(order)) => ok(ApiOrder::from(order)),
        Ok(None) => fail(StatusCode::NOT_FOUND, "Order not found"),
        Err(e) => store_error("Failed to load order", &e),
    }
}

/// `GET /api/orders/agent/{agent_id}`
pub async fn list_orders(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<String>,
    params: web::Query<ListParams>,
) -> HttpResponse {
    if let Err(resp) = owned_agent(&state, &path, &user.user_id).await {
        return resp;
    }

    match salescraft_store::orders::list_by_agent(state.db.as_ref(), &path).await {
        Ok(orders) => {
            let (page, next) = paginate(orders, &params);
            paged(page.into_iter().map(ApiOrder::from).collect::<Vec<_>>(), next)
        }
        Err(e) => store_error("Failed to list orders", &e),
    }
}

/// `PATCH /api/orders/{id}/status`
pub async fn update_order_status(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<String>,
    body: web::Json<UpdateOrderStatusRequest>,
) -> HttpResponse {
    let order = match salescraft_store::orders::get(state.db.as_ref(), &path).await {
        Ok(Some(order)) => order,
        Ok(None) => return fail(StatusCode::NOT_FOUND, "Order not found"),
        Err(e) => return store_error("Failed to load order", &e),
    };

    if let Err(resp) = owned_agent(&state, &order.agent_id, &user.user_id).await {
        return resp;
    }

    let body = body.into_inner();
    match salescraft_store::orders::update_status(state.db.as_ref(), &order.id, body.status, body.note)
        .await
    {
        Ok(Some(updated)) => ok(ApiOrder::from(updated)),
        Ok(None) => fail(StatusCode::NOT_FOUND, "Order not found"),
        Err(e) => store_error("Failed to update order status", &e),
    }
}
