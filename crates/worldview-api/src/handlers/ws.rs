use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use serde_json::json;
use std::sync::Arc;
use worldview_types::{StreamEvent, TurnInput};

use crate::{handlers::stream::AgentRequest, state::AppState};

/// WebSocket mirror of the SSE endpoint
///
/// Each text frame `{"input", "thread_id"?}` runs one turn; the socket stays
/// open for the next one.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    while let Some(frame) = socket.recv().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!("websocket receive failed: {}", e);
                break;
            }
        };

        let input = serde_json::from_str::<AgentRequest>(&text)
            .map_err(|e| format!("Invalid request: {}", e))
            .and_then(|req| TurnInput::new(req.input, req.thread_id).map_err(|e| e.to_string()));

        let input = match input {
            Ok(input) => input,
            Err(message) => {
                if send_text(&mut socket, error_frame(&message)).await.is_err() {
                    return;
                }
                continue;
            }
        };

        let thread_id = input.thread_id.clone();
        tracing::info!(thread_id = %thread_id, "websocket turn started");

        let mut receiver = state.pipeline.spawn_run(input);
        while let Some(event) = receiver.recv().await {
            // Returning drops the receiver, which aborts the turn
            if send_text(&mut socket, event_frame(event, &thread_id)).await.is_err() {
                return;
            }
        }
    }
}

fn event_frame(event: StreamEvent, thread_id: &str) -> String {
    match event {
        StreamEvent::Update(snapshot) => match serde_json::to_string(&snapshot) {
            Ok(frame) => frame,
            Err(e) => error_frame(&e.to_string()),
        },
        StreamEvent::Error { message } => error_frame(&message),
        StreamEvent::Done => json!({ "event": "done", "thread_id": thread_id }).to_string(),
    }
}

fn error_frame(message: &str) -> String {
    json!({ "event": "error", "message": message }).to_string()
}

async fn send_text(socket: &mut WebSocket, text: String) -> Result<(), axum::Error> {
    socket.send(Message::Text(text)).await
}
