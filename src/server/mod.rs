//! HTTP API server.
//!
//! Thin JSON adapters over the session service, chunk indexer, and search
//! ranker. Handlers hold no logic beyond request/response mapping; the
//! components are constructed once at startup and shared.

use crate::context::AppContext;
use crate::error::FinnaError;
use crate::session::NewSession;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Build the application router.
pub fn router(context: Arc<AppContext>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/transcript", patch(append_transcript))
        .route("/sessions/{id}/complete", post(complete_session))
        .route("/sessions/{id}/upvote", post(upvote_session))
        .route("/search", post(search))
        .layer(cors)
        .with_state(context)
}

/// Bind and serve until shutdown.
pub async fn serve(host: &str, port: u16, context: Arc<AppContext>) -> anyhow::Result<()> {
    let app = router(context);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct CreateSessionResponse {
    session_id: String,
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: String,
    title: String,
    category: String,
    host_id: String,
    status: String,
    upvotes: u64,
    link: String,
    transcript: String,
}

#[derive(Serialize)]
struct SessionListResponse {
    sessions: Vec<SessionSummary>,
    total: usize,
}

#[derive(Serialize)]
struct SessionSummary {
    session_id: String,
    title: String,
    category: String,
    status: String,
    upvotes: u64,
    link: String,
}

#[derive(Deserialize)]
struct AppendTranscriptRequest {
    text: String,
}

#[derive(Serialize)]
struct StatusResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct UpvoteResponse {
    upvotes: u64,
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Serialize)]
struct SearchResponse {
    results: Vec<crate::search::SearchHit>,
}

/// Map a service error onto a status code and JSON error body.
fn error_response(error: FinnaError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match error {
        FinnaError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn create_session(
    State(context): State<Arc<AppContext>>,
    Json(req): Json<NewSession>,
) -> impl IntoResponse {
    match context.sessions.create(req).await {
        Ok(session_id) => Json(CreateSessionResponse { session_id }).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn get_session(
    State(context): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match context.sessions.get(&id).await {
        Ok(record) => Json(SessionResponse {
            session_id: id,
            title: record.title,
            category: record.category,
            host_id: record.host_id,
            status: record.status.to_string(),
            upvotes: record.upvotes,
            link: record.link,
            transcript: record.transcript,
        })
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn list_sessions(State(context): State<Arc<AppContext>>) -> impl IntoResponse {
    match context.sessions.list().await {
        Ok(sessions) => Json(SessionListResponse {
            total: sessions.len(),
            sessions: sessions
                .into_iter()
                .map(|(session_id, record)| SessionSummary {
                    session_id,
                    title: record.title,
                    category: record.category,
                    status: record.status.to_string(),
                    upvotes: record.upvotes,
                    link: record.link,
                })
                .collect(),
        })
        .into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn append_transcript(
    State(context): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Json(req): Json<AppendTranscriptRequest>,
) -> impl IntoResponse {
    match context.sessions.append_transcript(&id, &req.text).await {
        Ok(()) => Json(StatusResponse { status: "updated" }).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

/// Mark a session completed and kick off indexing in the background.
///
/// Indexing is fire-and-forget: the response does not wait for it, and an
/// indexing failure is never surfaced here.
async fn complete_session(
    State(context): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match context.sessions.complete(&id).await {
        Ok(()) => {
            let indexer = context.indexer.clone();
            tokio::spawn(async move {
                indexer.index(&id).await;
            });
            Json(StatusResponse { status: "success" }).into_response()
        }
        Err(e) => error_response(e).into_response(),
    }
}

async fn upvote_session(
    State(context): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match context.sessions.upvote(&id).await {
        Ok(upvotes) => Json(UpvoteResponse { upvotes }).into_response(),
        Err(e) => error_response(e).into_response(),
    }
}

async fn search(
    State(context): State<Arc<AppContext>>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    match context
        .ranker
        .search(&req.query, req.category.as_deref())
        .await
    {
        Ok(results) => Json(SearchResponse { results }).into_response(),
        Err(e) => {
            // Don't leak upstream details to search clients.
            tracing::error!("Search failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Search operation failed".to_string(),
                }),
            )
                .into_response()
        }
    }
}
