mod common;

use std::time::Duration;
use worldview_client::{ChatSession, MemoryStorage, SessionStore, StreamClient, TurnStatus};

use common::{serve, test_app, ScriptedClient};

#[tokio::test]
async fn test_client_history_matches_server_after_two_turns() {
    let app = test_app(ScriptedClient::answering("Here is a Worldview link."));
    let url = format!("http://{}", serve(&app).await);

    let store = SessionStore::new(MemoryStorage::new());
    let mut session = ChatSession::new(store, StreamClient::new(&url).unwrap()).unwrap();

    for prompt in ["show wildfires in California", "now show smoke"] {
        let handle = session.submit(prompt).await.unwrap();
        let snapshot = session.complete(handle).await.unwrap();
        assert!(snapshot.completed());
        assert_eq!(snapshot.thread_id.as_deref(), Some(session.thread_id()));
    }

    let server = app.store.load(session.thread_id()).await.unwrap().unwrap();
    assert_eq!(session.history(), server.messages);
    assert_eq!(server.messages.len(), 5);
    assert_eq!(server.turns, 2);
}

#[tokio::test]
async fn test_second_invoke_supersedes_first() {
    let app = test_app(ScriptedClient::slow(10, Duration::from_millis(50)));
    let url = format!("http://{}", serve(&app).await);
    let client = StreamClient::new(&url).unwrap();

    let mut first = client.invoke("first", Some("thread-one")).await.unwrap();
    assert!(first.changed().await);

    let mut second = client.invoke("second", Some("thread-two")).await.unwrap();

    // the first reader is stopped before invoke returns
    assert_eq!(first.status(), TurnStatus::Superseded);
    let before = first.snapshot();

    let done = second.finished().await;
    assert_eq!(done.status, TurnStatus::Done);
    assert_eq!(first.snapshot(), before);
    assert!(done
        .latest
        .unwrap()
        .messages
        .iter()
        .all(|m| m.content != "first"));
}

#[tokio::test]
async fn test_cancel_closes_stream_and_server_does_not_commit() {
    let app = test_app(ScriptedClient::slow(20, Duration::from_millis(50)));
    let url = format!("http://{}", serve(&app).await);
    let client = StreamClient::new(&url).unwrap();

    let mut handle = client.invoke("long answer", Some("thread-cancel")).await.unwrap();
    assert!(handle.changed().await);

    assert!(client.cancel().await);
    assert_eq!(handle.status(), TurnStatus::Cancelled);
    assert!(!client.cancel().await);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(app.store.load("thread-cancel").await.unwrap().is_none());
}

#[tokio::test]
async fn test_dropping_client_mid_turn_closes_stream() {
    let app = test_app(ScriptedClient::slow(20, Duration::from_millis(50)));
    let url = format!("http://{}", serve(&app).await);
    let client = StreamClient::new(&url).unwrap();

    let mut handle = client.invoke("long answer", Some("thread-drop")).await.unwrap();
    assert!(handle.changed().await);
    drop(client);

    // the marked status is published before the sender goes away
    assert_eq!(handle.finished().await.status, TurnStatus::Closed);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(app.store.load("thread-drop").await.unwrap().is_none());
}
