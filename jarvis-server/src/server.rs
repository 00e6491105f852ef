use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::{Html, IntoResponse},
    routing::{get, post},
};
use jarvis_rag::{Assistant, RagConfig, Settings};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::error::{ApiError, NO_MESSAGE};
use crate::questions::{FALLBACK_QUESTIONS, example_questions};

/// Shared application context, built once at start-up.
///
/// A state without an assistant is degraded: `/api/chat` answers 500 and
/// `/api/status` reports `error` until the process is restarted.
#[derive(Clone)]
pub struct AppState {
    assistant: Option<Arc<Assistant>>,
    pinecone_index: Option<String>,
    openai_model: String,
    docs_dir: PathBuf,
}

impl AppState {
    /// A state that answers questions with `assistant`.
    pub fn ready(assistant: Arc<Assistant>, docs_dir: impl Into<PathBuf>) -> Self {
        Self {
            pinecone_index: Some(assistant.index_name().to_string()),
            openai_model: assistant.model_name().to_string(),
            assistant: Some(assistant),
            docs_dir: docs_dir.into(),
        }
    }

    /// A state that cannot answer questions.
    pub fn degraded(
        pinecone_index: Option<String>,
        openai_model: impl Into<String>,
        docs_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            assistant: None,
            pinecone_index,
            openai_model: openai_model.into(),
            docs_dir: docs_dir.into(),
        }
    }

    /// Connect to the hosted services described by `settings`.
    ///
    /// A connection failure is logged and yields a degraded state.
    pub async fn connect(
        settings: &Settings,
        config: RagConfig,
        docs_dir: impl Into<PathBuf>,
    ) -> Self {
        match settings.assistant(config).await {
            Ok(assistant) => {
                info!(
                    index = assistant.index_name(),
                    model = assistant.model_name(),
                    "jarvis initialized"
                );
                Self::ready(Arc::new(assistant), docs_dir)
            }
            Err(e) => {
                error!(error = %e, "failed to initialize jarvis");
                Self::degraded(
                    Some(settings.pinecone_index_name.clone()),
                    settings.openai_model.clone(),
                    docs_dir,
                )
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.assistant.is_some()
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 5000 }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub sources: Vec<String>,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub pinecone_index: Option<String>,
    pub openai_model: String,
}

#[derive(Debug, Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<String>,
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/chat", post(chat))
        .route("/api/status", get(status))
        .route("/api/example-questions", get(questions))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind jarvis server to {}:{}", config.host, config.port))?;

    info!("jarvis listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn index() -> impl IntoResponse {
    Html(include_str!("../ui/index.html"))
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let assistant = state.assistant.as_ref().ok_or(ApiError::NotInitialized)?;

    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection, "rejected chat request body");
        ApiError::BadRequest(NO_MESSAGE.to_string())
    })?;

    let question = request.message.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest(NO_MESSAGE.to_string()));
    }

    let turn = assistant.ask(question).await?;
    Ok(Json(ChatResponse { message: turn.answer, sources: turn.sources, status: "success" }))
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        status: if state.is_ready() { "running" } else { "error" },
        pinecone_index: state.pinecone_index.clone(),
        openai_model: state.openai_model.clone(),
    })
}

async fn questions(State(state): State<AppState>) -> impl IntoResponse {
    let docs_dir = state.docs_dir.clone();
    let questions = tokio::task::spawn_blocking(move || example_questions(docs_dir))
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "example question lookup failed");
            FALLBACK_QUESTIONS.iter().map(|q| q.to_string()).collect()
        });
    Json(QuestionsResponse { questions })
}
