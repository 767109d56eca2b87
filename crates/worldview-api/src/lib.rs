pub mod config;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use anyhow::Context;
use axum::{
    extract::Request,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use worldview_graph::{Pipeline, PromptTemplates};
use worldview_llm::create_client;
use worldview_persist::connect_store;

use crate::config::Config;
use crate::docs::ApiDoc;
use crate::handlers::{stream, ws};
use crate::routes::{health, threads};
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Agent
        .route("/api/agent/stream", get(stream::stream_agent))
        .route("/api/agent", post(stream::invoke_agent))
        .route("/ws", get(ws::ws_handler))
        // Threads
        .route("/api/threads", get(threads::list_threads))
        .route(
            "/api/threads/:thread_id",
            get(threads::get_thread).delete(threads::delete_thread),
        );

    // Compression skips text/event-stream by default
    api_routes
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
        .layer(axum_middleware::from_fn(middleware::logging::log_request))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.server.request_timeout_secs,
        )))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
            tracing::debug_span!(
                "request",
                method = %req.method(),
                path = %middleware::logging::log_path(req.uri()),
            )
        }))
        .with_state(state)
}

pub fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let mut cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any)
            .expose_headers([axum::http::HeaderName::from_static(
                stream::THREAD_ID_HEADER,
            )]);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors = cors.allow_origin(Any);
        } else {
            let origins: Vec<axum::http::HeaderValue> = config
                .cors
                .origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            cors = cors.allow_origin(origins);
        }

        cors
    } else {
        CorsLayer::permissive()
    }
}

/// Wire the LLM client, thread store, prompts and pipeline from config
pub async fn build_state(config: Config) -> anyhow::Result<AppState> {
    let provider = config
        .provider()
        .map_err(|e| anyhow::anyhow!("Failed to configure LLM provider: {}", e))?;
    tracing::info!(provider = ?provider.provider_type(), model = %config.llm.model, "Initializing LLM client");
    let llm_client = create_client(&provider)?;

    let store = connect_store(&config.store, config.mongodb_uri.as_deref())
        .await
        .context("Failed to open thread store")?;
    tracing::info!(backend = store.backend_name(), "Thread store ready");

    let prompts = PromptTemplates::from_files(
        config.agent.system_prompt_path.as_deref(),
        config.agent.user_prompt_path.as_deref(),
    )?;

    let pipeline = Pipeline::builder()
        .llm_client(llm_client)
        .llm_config(config.llm.clone().into())
        .prompts(prompts)
        .store(store)
        .config(config.agent.graph_config())
        .build()?;

    Ok(AppState::new(config, pipeline))
}

pub fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
