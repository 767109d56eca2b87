use mockito::Matcher;
use worldview_client::{
    ChatMessage, ChatSession, ClientError, MemoryStorage, SessionStore, StreamClient, TurnStatus,
};

fn update(messages: serde_json::Value, output: &str) -> String {
    format!(
        "event: update\ndata: {}\n\n",
        serde_json::json!({ "messages": messages, "output": output, "images_output": [] })
    )
}

fn full_turn_body() -> String {
    let mut body = String::new();
    body.push_str(&update(serde_json::json!([]), ""));
    body.push_str(&update(
        serde_json::json!([{"role": "system", "content": "sys"}, {"role": "human", "content": "show fires"}]),
        "",
    ));
    body.push_str(&update(
        serde_json::json!([{"role": "system", "content": "sys"}, {"role": "human", "content": "show fires"}]),
        "Here",
    ));
    body.push_str(&update(
        serde_json::json!([
            {"role": "system", "content": "sys"},
            {"role": "human", "content": "show fires"},
            {"role": "ai", "content": "Here is the link."}
        ]),
        "Here is the link.",
    ));
    body.push_str("event: done\ndata: \n\n");
    body
}

#[tokio::test]
async fn test_stream_until_done() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/agent/stream")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("input".into(), "show fires".into()),
            Matcher::UrlEncoded("thread_id".into(), "thread-abc".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_header("x-thread-id", "thread-abc")
        .with_body(full_turn_body())
        .expect(1)
        .create_async()
        .await;

    let client = StreamClient::new(server.url()).unwrap();
    let mut handle = client.invoke("show fires", Some("thread-abc")).await.unwrap();
    let snapshot = handle.finished().await;

    assert_eq!(snapshot.status, TurnStatus::Done);
    assert!(snapshot.completed());
    assert_eq!(snapshot.thread_id.as_deref(), Some("thread-abc"));
    let latest = snapshot.latest.unwrap();
    assert_eq!(latest.output, "Here is the link.");
    assert_eq!(latest.messages.len(), 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_error_event_is_recorded() {
    let mut server = mockito::Server::new_async().await;
    let body = format!(
        "{}event: error\ndata: {{\"message\":\"turn timed out after 300s\"}}\n\nevent: done\ndata: \n\n",
        update(serde_json::json!([{"role": "human", "content": "x"}]), "")
    );
    server
        .mock("GET", "/api/agent/stream")
        .match_query(Matcher::Any)
        .with_header("content-type", "text/event-stream")
        .with_body(body)
        .create_async()
        .await;

    let client = StreamClient::new(server.url()).unwrap();
    let mut handle = client.invoke("x", None).await.unwrap();
    let snapshot = handle.finished().await;

    assert_eq!(snapshot.status, TurnStatus::Done);
    assert!(!snapshot.completed());
    assert_eq!(snapshot.error.as_deref(), Some("turn timed out after 300s"));
    assert!(snapshot.latest.is_some());
}

#[tokio::test]
async fn test_eof_without_done_closes_and_keeps_last_state() {
    let mut server = mockito::Server::new_async().await;
    let body = format!(
        "{}event: update\ndata: {{not json\n\n",
        update(serde_json::json!([{"role": "human", "content": "x"}]), "partial")
    );
    server
        .mock("GET", "/api/agent/stream")
        .match_query(Matcher::Any)
        .with_body(body)
        .create_async()
        .await;

    let client = StreamClient::new(server.url()).unwrap();
    let mut handle = client.invoke("x", None).await.unwrap();
    let snapshot = handle.finished().await;

    assert_eq!(snapshot.status, TurnStatus::Closed);
    assert!(snapshot.error.is_none());
    assert_eq!(snapshot.latest.unwrap().output, "partial");
}

#[tokio::test]
async fn test_rejected_request_closes_with_server_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/agent/stream")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"Invalid request: input must not be empty"}"#)
        .create_async()
        .await;

    let client = StreamClient::new(server.url()).unwrap();
    let mut handle = client.invoke("hello", None).await.unwrap();
    let snapshot = handle.finished().await;

    assert_eq!(snapshot.status, TurnStatus::Closed);
    assert!(snapshot.latest.is_none());
    assert!(snapshot.error.unwrap().contains("input must not be empty"));
}

#[tokio::test]
async fn test_unreachable_server_closes_silently() {
    let client = StreamClient::new("http://127.0.0.1:1").unwrap();
    let mut handle = client.invoke("hello", None).await.unwrap();
    let snapshot = handle.finished().await;

    assert_eq!(snapshot.status, TurnStatus::Closed);
    assert!(snapshot.latest.is_none());
}

#[tokio::test]
async fn test_blank_input_rejected_before_connecting() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/agent/stream")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let client = StreamClient::new(server.url()).unwrap();
    assert!(matches!(
        client.invoke("  \n", None).await,
        Err(ClientError::EmptyInput)
    ));
    assert!(matches!(
        client.invoke("hi", Some("bad/thread")).await,
        Err(ClientError::InvalidThreadId(_))
    ));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_session_replaces_history_on_done() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/agent/stream")
        .match_query(Matcher::Any)
        .with_body(full_turn_body())
        .create_async()
        .await;

    let store = SessionStore::new(MemoryStorage::new());
    let mut session = ChatSession::new(store, StreamClient::new(server.url()).unwrap()).unwrap();

    let handle = session.submit("show fires").await.unwrap();
    assert_eq!(session.history(), vec![ChatMessage::human("show fires")]);

    let snapshot = session.complete(handle).await.unwrap();
    assert!(snapshot.completed());
    assert_eq!(session.history(), snapshot.latest.unwrap().messages);
}

#[tokio::test]
async fn test_session_keeps_history_when_turn_fails() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/agent/stream")
        .match_query(Matcher::Any)
        .with_body(format!(
            "{}event: error\ndata: {{\"message\":\"boom\"}}\n\nevent: done\ndata: \n\n",
            update(serde_json::json!([]), "")
        ))
        .create_async()
        .await;

    let store = SessionStore::new(MemoryStorage::new());
    let mut session = ChatSession::new(store, StreamClient::new(server.url()).unwrap()).unwrap();

    let handle = session.submit("show fires").await.unwrap();
    let snapshot = session.complete(handle).await.unwrap();

    assert_eq!(snapshot.error.as_deref(), Some("boom"));
    assert_eq!(session.history(), vec![ChatMessage::human("show fires")]);
}

#[tokio::test]
async fn test_submit_rejects_blank_input_without_touching_history() {
    let store = SessionStore::new(MemoryStorage::new());
    let mut session =
        ChatSession::new(store, StreamClient::new("http://127.0.0.1:1").unwrap()).unwrap();

    assert!(matches!(session.submit("   ").await, Err(ClientError::EmptyInput)));
    assert!(session.history().is_empty());
}
