mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
};
use serde_json::Value;
use tower::ServiceExt;
use worldview_api::build_router;
use worldview_types::{AgentEvent, ChatMessage, Role};

use common::{test_app, ScriptedClient};

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// (event, data) pairs of an SSE body, keep-alive comments dropped
fn sse_frames(body: &str) -> Vec<(String, String)> {
    body.split("\n\n")
        .filter_map(|block| {
            let mut event = None;
            let mut data = String::new();
            for line in block.lines() {
                if let Some(name) = line.strip_prefix("event:") {
                    event = Some(name.trim().to_string());
                } else if let Some(value) = line.strip_prefix("data:") {
                    data.push_str(value.strip_prefix(' ').unwrap_or(value));
                }
            }
            event.map(|e| (e, data))
        })
        .collect()
}

#[tokio::test]
async fn test_health() {
    let app = test_app(ScriptedClient::answering("ok"));
    let response = build_router(app.state).oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn test_stream_rejects_empty_input() {
    let app = test_app(ScriptedClient::answering("ok"));

    for uri in ["/api/agent/stream", "/api/agent/stream?input=%20%20"] {
        let response = build_router(app.state.clone()).oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("input must not be empty"));
    }
}

#[tokio::test]
async fn test_stream_rejects_invalid_thread_id() {
    let app = test_app(ScriptedClient::answering("ok"));
    let response = build_router(app.state)
        .oneshot(get("/api/agent/stream?input=hi&thread_id=..%2Fescape"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stream_updates_then_done_and_commit() {
    let app = test_app(ScriptedClient::answering("Here is a Worldview link."));
    let response = build_router(app.state.clone())
        .oneshot(get("/api/agent/stream?input=show%20wildfires&thread_id=thread-sse"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-thread-id"], "thread-sse");
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/event-stream"));

    let frames = sse_frames(&body_text(response).await);
    let (last_name, _) = frames.last().unwrap();
    assert_eq!(last_name, "done");
    assert_eq!(frames.iter().filter(|(e, _)| e == "done").count(), 1);
    assert!(frames.iter().all(|(e, _)| e != "error"));

    let updates: Vec<AgentEvent> = frames
        .iter()
        .filter(|(e, _)| e == "update")
        .map(|(_, data)| serde_json::from_str(data).unwrap())
        .collect();
    assert!(updates.len() >= 3);

    let last = updates.last().unwrap();
    assert_eq!(last.output, "Here is a Worldview link.");
    assert_eq!(last.messages[1], ChatMessage::human("show wildfires"));
    assert_eq!(last.messages.last().unwrap().role, Role::Ai);

    let record = app.store.load("thread-sse").await.unwrap().unwrap();
    assert_eq!(record.messages, last.messages);
}

#[tokio::test]
async fn test_stream_generates_thread_id() {
    let app = test_app(ScriptedClient::answering("ok"));
    let response = build_router(app.state)
        .oneshot(get("/api/agent/stream?input=hello"))
        .await
        .unwrap();

    let thread_id = response.headers()["x-thread-id"].to_str().unwrap().to_string();
    assert!(thread_id.starts_with("thread-"));
    body_text(response).await;
}

#[tokio::test]
async fn test_stream_failure_sends_error_then_done() {
    let app = test_app(ScriptedClient::failing());
    let response = build_router(app.state.clone())
        .oneshot(get("/api/agent/stream?input=hello&thread_id=thread-fail"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let frames = sse_frames(&body_text(response).await);
    let n = frames.len();
    assert_eq!(frames[n - 1].0, "done");
    assert_eq!(frames[n - 2].0, "error");
    let error: Value = serde_json::from_str(&frames[n - 2].1).unwrap();
    assert!(error["message"].as_str().unwrap().contains("upstream unavailable"));

    assert!(app.store.load("thread-fail").await.unwrap().is_none());
}

#[tokio::test]
async fn test_invoke_returns_final_state_and_thread_is_inspectable() {
    let app = test_app(ScriptedClient::answering("Dust over the Sahara."));
    let request = Request::builder()
        .method("POST")
        .uri("/api/agent")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"input":"dust storms","thread_id":"thread-post"}"#))
        .unwrap();

    let response = build_router(app.state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-thread-id"], "thread-post");
    let event: AgentEvent = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(event.output, "Dust over the Sahara.");

    let response = build_router(app.state.clone())
        .oneshot(get("/api/threads/thread-post"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let thread = body_json(response).await;
    assert_eq!(thread["turns"], 1);
    assert_eq!(
        thread["messages"].as_array().unwrap().len(),
        event.messages.len()
    );

    let response = build_router(app.state.clone())
        .oneshot(get("/api/threads?limit=5"))
        .await
        .unwrap();
    let listed = body_json(response).await;
    assert_eq!(listed[0]["thread_id"], "thread-post");
}

#[tokio::test]
async fn test_invoke_failure_is_500() {
    let app = test_app(ScriptedClient::failing());
    let request = Request::builder()
        .method("POST")
        .uri("/api/agent")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"input":"hello"}"#))
        .unwrap();

    let response = build_router(app.state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("upstream unavailable"));
}

#[tokio::test]
async fn test_thread_not_found_and_delete() {
    let app = test_app(ScriptedClient::answering("ok"));
    app.store
        .save("thread-del", vec![ChatMessage::human("hi")])
        .await
        .unwrap();

    let response = build_router(app.state.clone())
        .oneshot(get("/api/threads/thread-missing"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri("/api/threads/thread-del")
            .body(Body::empty())
            .unwrap()
    };
    let response = build_router(app.state.clone()).oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = build_router(app.state.clone()).oneshot(delete()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_thread_lookup_rejects_invalid_id() {
    let app = test_app(ScriptedClient::answering("ok"));
    let response = build_router(app.state)
        .oneshot(get("/api/threads/a..b"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_openapi_document_lists_agent_routes() {
    let app = test_app(ScriptedClient::answering("ok"));
    let response = build_router(app.state)
        .oneshot(get("/api/openapi.json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await;
    assert!(doc["paths"]["/api/agent/stream"].is_object());
    assert!(doc["paths"]["/api/threads/{thread_id}"].is_object());
}

#[tokio::test]
async fn test_concurrent_streams_keep_their_own_events() {
    let app = test_app(ScriptedClient::slow(5, std::time::Duration::from_millis(20)));
    let stream = |input: &str, thread: &str| {
        build_router(app.state.clone()).oneshot(get(&format!(
            "/api/agent/stream?input={}&thread_id={}",
            input, thread
        )))
    };

    let (fires, floods) = tokio::join!(
        stream("show%20fires", "thread-fires"),
        stream("show%20floods", "thread-floods"),
    );
    let (fires, floods) = tokio::join!(body_text(fires.unwrap()), body_text(floods.unwrap()));

    for (body, own, other, thread) in [
        (fires, "show fires", "show floods", "thread-fires"),
        (floods, "show floods", "show fires", "thread-floods"),
    ] {
        let frames = sse_frames(&body);
        assert_eq!(frames.last().unwrap().0, "done");
        let updates: Vec<AgentEvent> = frames
            .iter()
            .filter(|(e, _)| e == "update")
            .map(|(_, data)| serde_json::from_str(data).unwrap())
            .collect();

        assert!(updates
            .iter()
            .all(|u| u.messages.iter().all(|m| m.content != other)));
        let last = updates.last().unwrap();
        assert_eq!(last.messages[1], ChatMessage::human(own));

        let record = app.store.load(thread).await.unwrap().unwrap();
        assert_eq!(record.messages, last.messages);
    }
}
