#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the salescraft platform.
//!
//! Wires the adapters together — store, vector index, LLM provider,
//! ingestion worker — into the HTTP surface: agent and product CRUD,
//! training intake, the public chat endpoint, the conversational
//! builder, analytics, and order tracking.
//!
//! Public chat and order tracking run under permissive CORS; every
//! other endpoint is restricted to the configured origins. Adapters are
//! constructed once at startup and passed through [`AppState`]; nothing
//! process-wide is mutable after that. On shutdown the ingestion queue
//! is dropped and the worker drains whatever was already enqueued
//! before the process exits.

pub mod auth;
pub mod config;
mod handlers;
pub mod sessions;

use std::path::Path;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use salescraft_ai::{LlmProvider, OpenAiProvider};
use salescraft_documents::ChunkingConfig;
use salescraft_ingest::{IngestContext, IngestQueue, start_worker};
use salescraft_orchestrator::Orchestrator;
use salescraft_vector::VectorIndex;
use switchy_database::Database;

use crate::auth::AuthVerifier;
use crate::config::ServerConfig;
use crate::sessions::{BuilderSessions, SessionLocks};

/// Queued-but-unstarted ingestions allowed before intake applies
/// backpressure.
const INGEST_QUEUE_CAPACITY: usize = 256;
/// Ingestions processed simultaneously.
const INGEST_CONCURRENCY: usize = 4;

/// Shared application state.
pub struct AppState {
    /// Relational store.
    pub db: Arc<dyn Database>,
    /// Vector index adapter.
    pub vector: Arc<VectorIndex>,
    /// Conversation orchestrator.
    pub orchestrator: Arc<Orchestrator>,
    /// Ingestion job queue.
    pub ingest: IngestQueue,
    /// Bearer-token verifier.
    pub auth: AuthVerifier,
    /// Per-session chat locks.
    pub sessions: SessionLocks,
    /// In-memory builder dialogues.
    pub builder_sessions: BuilderSessions,
    /// Directory uploaded images are written to.
    pub upload_dir: String,
}

/// Starts the salescraft API server and blocks until shutdown.
///
/// # Errors
///
/// Returns an error if configuration is missing, the store cannot be
/// opened, or the HTTP server fails to bind. Any of these should exit
/// the process non-zero.
#[allow(clippy::future_not_send, clippy::too_many_lines)]
pub async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env()?;

    log::info!("Opening store at {}...", config.store_path);
    let db: Arc<dyn Database> =
        Arc::from(salescraft_store::open_db(Path::new(&config.store_path)).await?);

    std::fs::create_dir_all(&config.upload_dir)?;

    let vector = Arc::new(VectorIndex::new(config.vector.clone()));
    let llm: Arc<dyn LlmProvider> = Arc::new(OpenAiProvider::new(config.llm.clone()));

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&llm),
        Arc::clone(&vector),
        config.turn.clone(),
    ));

    log::info!("Starting ingestion worker...");
    let ingest_ctx = Arc::new(IngestContext {
        db: Arc::clone(&db),
        vector: Arc::clone(&vector),
        llm: Arc::clone(&llm),
        chunking: ChunkingConfig::default(),
    });
    let (ingest_queue, ingest_worker) =
        start_worker(ingest_ctx, INGEST_QUEUE_CAPACITY, INGEST_CONCURRENCY);

    let auth = AuthVerifier::new(config.environment, config.auth_provider_url.clone());

    let state = web::Data::new(AppState {
        db,
        vector,
        orchestrator,
        ingest: ingest_queue,
        auth,
        sessions: SessionLocks::default(),
        builder_sessions: BuilderSessions::default(),
        upload_dir: config.upload_dir.clone(),
    });

    let bind_addr = config.bind_addr.clone();
    let port = config.port;
    let allowed_origins = config.cors_allowed_origins.clone();
    let upload_dir = config.upload_dir.clone();

    log::info!("Starting server on {bind_addr}:{port}");

    let server_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(server_state.clone())
            // Public chat and tracking: any origin may embed the widget.
            .service(
                web::scope("/api/chat")
                    .wrap(Cors::permissive())
                    .route(
                        "/{agent_id}/message",
                        web::post().to(handlers::chat_message),
                    )
                    .route(
                        "/{agent_id}/conversations",
                        web::get().to(handlers::list_conversations),
                    ),
            )
            .service(
                web::scope("/api/orders/track")
                    .wrap(Cors::permissive())
                    .route("/{order_number}", web::get().to(handlers::track_order)),
            )
            // Everything else: configured origins only.
            .service(
                web::scope("/api")
                    .wrap(restricted_cors(&allowed_origins))
                    .route("/health", web::get().to(handlers::health))
                    .route("/agents", web::post().to(handlers::create_agent))
                    .route("/agents", web::get().to(handlers::list_agents))
                    .route("/agents/{id}", web::get().to(handlers::get_agent))
                    .route("/agents/{id}", web::put().to(handlers::update_agent))
                    .route("/agents/{id}", web::delete().to(handlers::delete_agent))
                    .route("/products", web::post().to(handlers::create_product))
                    .route(
                        "/products/upload-image",
                        web::post().to(handlers::upload_image),
                    )
                    .route(
                        "/products/agent/{id}",
                        web::get().to(handlers::list_products),
                    )
                    .route("/products/{id}", web::put().to(handlers::update_product))
                    .route("/products/{id}", web::delete().to(handlers::delete_product))
                    .route("/training/pdf", web::post().to(handlers::train_pdf))
                    .route("/training/url", web::post().to(handlers::train_url))
                    .route("/training/faq", web::post().to(handlers::train_faq))
                    .route(
                        "/training/{agent_id}/data",
                        web::get().to(handlers::list_training),
                    )
                    .route(
                        "/training/{agent_id}/data",
                        web::delete().to(handlers::delete_training),
                    )
                    .route(
                        "/conversational-builder/start",
                        web::post().to(handlers::builder_start),
                    )
                    .route(
                        "/conversational-builder/converse",
                        web::post().to(handlers::builder_converse),
                    )
                    .route(
                        "/conversational-builder/upload-document",
                        web::post().to(handlers::builder_upload),
                    )
                    .route("/analytics/funnel", web::get().to(handlers::analytics_funnel))
                    .route(
                        "/analytics/peak-hours",
                        web::get().to(handlers::analytics_peak_hours),
                    )
                    .route("/analytics/trends", web::get().to(handlers::analytics_trends))
                    .route("/analytics/agents", web::get().to(handlers::analytics_agents))
                    .route("/analytics/leads", web::get().to(handlers::analytics_leads))
                    .route("/orders", web::post().to(handlers::create_order))
                    .route(
                        "/orders/agent/{agent_id}",
                        web::get().to(handlers::list_orders),
                    )
                    .route(
                        "/orders/{id}/status",
                        web::patch().to(handlers::update_order_status),
                    ),
            )
            // Serve uploaded product images
            .service(Files::new("/uploads", upload_dir.clone()))
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    // Every AppState clone is gone once the server stops; dropping ours
    // closes the queue so the worker can drain and exit.
    drop(state);
    log::info!("Server stopped; draining ingestion queue...");
    ingest_worker.join().await;

    Ok(())
}

/// CORS policy for authenticated endpoints: the configured origins, or
/// same-origin-only when none are configured.
fn restricted_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(["GET", "POST", "PUT", "PATCH", "DELETE"])
        .allow_any_header()
        .max_age(3600);

    for origin in allowed_origins {
        cors = cors.allowed_origin(origin);
    }

    cors
}
