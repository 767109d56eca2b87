use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use worldview_persist::ThreadRecord;
use worldview_types::ChatMessage;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct ThreadResponse {
    pub thread_id: String,
    pub messages: Vec<ChatMessage>,
    pub turns: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ThreadRecord> for ThreadResponse {
    fn from(record: ThreadRecord) -> Self {
        Self {
            thread_id: record.thread_id,
            messages: record.messages,
            turns: record.turns,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThreadSummary {
    pub thread_id: String,
    pub message_count: usize,
    pub turns: u64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListThreadsQuery {
    /// Maximum number of threads (default 20, max 100)
    pub limit: Option<usize>,
}

/// List recently updated threads
#[utoipa::path(
    get,
    path = "/api/threads",
    params(ListThreadsQuery),
    responses(
        (status = 200, description = "Threads, newest first", body = [ThreadSummary])
    ),
    tag = "threads"
)]
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListThreadsQuery>,
) -> ApiResult<Json<Vec<ThreadSummary>>> {
    let limit = query.limit.unwrap_or(20).min(100);
    let records = state.store().list_threads(limit).await?;

    Ok(Json(
        records
            .into_iter()
            .map(|r| ThreadSummary {
                message_count: r.messages.len(),
                thread_id: r.thread_id,
                turns: r.turns,
                updated_at: r.updated_at,
            })
            .collect(),
    ))
}

/// Server-owned history of a thread
#[utoipa::path(
    get,
    path = "/api/threads/{thread_id}",
    params(
        ("thread_id" = String, Path, description = "Thread token")
    ),
    responses(
        (status = 200, description = "Thread found", body = ThreadResponse),
        (status = 400, description = "Invalid thread id"),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads"
)]
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadResponse>> {
    let record = state
        .store()
        .load(&thread_id)
        .await?
        .ok_or_else(|| ApiError::ThreadNotFound(thread_id.clone()))?;

    Ok(Json(record.into()))
}

/// Forget a thread's server-side history
#[utoipa::path(
    delete,
    path = "/api/threads/{thread_id}",
    params(
        ("thread_id" = String, Path, description = "Thread token")
    ),
    responses(
        (status = 204, description = "Thread deleted"),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads"
)]
pub async fn delete_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.store().delete(&thread_id).await? {
        tracing::info!(thread_id = %thread_id, "thread deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::ThreadNotFound(thread_id))
    }
}
