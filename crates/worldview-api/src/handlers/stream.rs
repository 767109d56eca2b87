use axum::{
    extract::{Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use worldview_types::{AgentEvent, StreamEvent, TurnInput};

use crate::{error::ApiResult, state::AppState};

pub const THREAD_ID_HEADER: &str = "x-thread-id";

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StreamQuery {
    /// User prompt
    pub input: Option<String>,
    /// Conversation token; generated when absent
    pub thread_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AgentRequest {
    pub input: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

/// Run one turn and stream snapshots as Server-Sent Events
///
/// Events: `update` (AgentEvent JSON), `error` (`{"message"}`), `done`.
#[utoipa::path(
    get,
    path = "/api/agent/stream",
    params(StreamQuery),
    responses(
        (status = 200, description = "Stream of update/error/done events", content_type = "text/event-stream"),
        (status = 400, description = "Empty input or invalid thread id")
    ),
    tag = "agent"
)]
pub async fn stream_agent(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreamQuery>,
) -> ApiResult<impl IntoResponse> {
    let input = TurnInput::new(query.input.unwrap_or_default(), query.thread_id)?;
    let thread_id = input.thread_id.clone();

    tracing::info!(thread_id = %thread_id, "opening agent stream");

    let receiver = state.pipeline.spawn_run(input);
    let sse = Sse::new(sse_events(receiver))
        .keep_alive(KeepAlive::new().interval(state.config.agent.keep_alive()));

    Ok(([(THREAD_ID_HEADER, thread_id)], sse))
}

/// Frame pipeline events until `done`; dropping this stream drops the
/// receiver, which aborts the turn.
fn sse_events(
    mut receiver: tokio::sync::mpsc::Receiver<StreamEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        while let Some(event) = receiver.recv().await {
            let terminal = event.is_terminal();
            yield Ok(to_sse_event(event));
            if terminal {
                break;
            }
        }
    }
}

pub(crate) fn to_sse_event(event: StreamEvent) -> Event {
    let name = event.event_name();
    match event {
        StreamEvent::Update(snapshot) => match Event::default().event(name).json_data(&snapshot) {
            Ok(event) => event,
            Err(e) => {
                tracing::error!("Failed to encode update: {}", e);
                Event::default()
                    .event("error")
                    .data(json!({ "message": "failed to encode update" }).to_string())
            }
        },
        StreamEvent::Error { message } => Event::default()
            .event(name)
            .data(json!({ "message": message }).to_string()),
        StreamEvent::Done => Event::default().event(name).data(""),
    }
}

/// Run one turn and return the final snapshot
#[utoipa::path(
    post,
    path = "/api/agent",
    request_body = AgentRequest,
    responses(
        (status = 200, description = "Final agent state", body = AgentEvent),
        (status = 400, description = "Empty input or invalid thread id"),
        (status = 500, description = "Agent turn failed")
    ),
    tag = "agent"
)]
pub async fn invoke_agent(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AgentRequest>,
) -> ApiResult<impl IntoResponse> {
    let input = TurnInput::new(request.input, request.thread_id)?;
    let thread_id = input.thread_id.clone();

    let snapshot: AgentEvent = state.pipeline.run(input).await?;

    Ok(([(THREAD_ID_HEADER, thread_id)], Json(snapshot)))
}
