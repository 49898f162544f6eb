use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use edusign::{
    ServerConfig,
    config::CategoryConfig,
    core::{Classifier, FnClassifier, InputShape, Recognizer},
    routes,
    state::AppState,
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn letters_config() -> CategoryConfig {
    CategoryConfig {
        cooldown_frames: 0,
        ..CategoryConfig::preset("letters").unwrap()
    }
}

fn letter_labels() -> Vec<String> {
    vec!["a".to_string(), "b".to_string(), "c".to_string()]
}

/// Serve `letters` on an OS-assigned port with a classifier that answers the
/// label index stored in the first coordinate.
async fn start_server() -> (SocketAddr, Arc<AppState>) {
    let classifier = FnClassifier::index_encoded(InputShape::single(126), letter_labels(), 0.95);
    start_server_with(letters_config(), Arc::new(classifier)).await
}

async fn start_server_with(
    category: CategoryConfig,
    classifier: Arc<dyn Classifier>,
) -> (SocketAddr, Arc<AppState>) {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        models_dir: "./models".into(),
        categories: vec![category.clone()],
        onnx_num_threads: None,
        session_idle_timeout_seconds: 300,
        session_reap_interval_seconds: 60,
        cors_allowed_origins: vec!["*".to_string()],
    };
    let recognizer = Recognizer::with_classifier(category, classifier, None).unwrap();
    let app_state = AppState::with_recognizers(config, vec![recognizer]);
    let app = routes::create_router(app_state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, app_state)
}

async fn connect(addr: SocketAddr, query: &str) -> Client {
    let url = format!("ws://{addr}/ws/letters{query}");
    let (ws_stream, _) = connect_async(url).await.expect("Failed to connect");
    ws_stream
}

async fn next_json(client: &mut Client) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("Timed out waiting for a message")
            .expect("Connection closed")
            .expect("WebSocket error");
        match message {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("Expected text message, got {other:?}"),
        }
    }
}

async fn send_json(client: &mut Client, value: Value) {
    client
        .send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

fn frame(index: usize) -> Vec<f32> {
    let mut values = vec![0.5; 126];
    values[0] = index as f32;
    values
}

#[tokio::test]
async fn test_connected_message() {
    let (addr, _) = start_server().await;
    let mut client = connect(addr, "?session_id=learner-1").await;

    let connected = next_json(&mut client).await;
    assert_eq!(connected["type"], "connected");
    assert_eq!(connected["session_id"], "learner-1");
    assert_eq!(connected["category"], "letters");
    assert_eq!(connected["input_width"], 126);
    assert!(connected["sequence_length"].is_null());
    assert_eq!(connected["labels"], json!(["A", "B", "C"]));
}

#[tokio::test]
async fn test_generated_session_id() {
    let (addr, _) = start_server().await;
    let mut client = connect(addr, "").await;

    let connected = next_json(&mut client).await;
    let session_id = connected["session_id"].as_str().unwrap();
    assert!(uuid_like(session_id));
}

fn uuid_like(id: &str) -> bool {
    id.len() == 36 && id.chars().filter(|c| *c == '-').count() == 4
}

#[tokio::test]
async fn test_unknown_category_is_rejected() {
    let (addr, _) = start_server().await;
    let result = connect_async(format!("ws://{addr}/ws/shapes")).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_target_is_confirmed() {
    let (addr, _) = start_server().await;
    let mut client = connect(addr, "").await;
    next_json(&mut client).await;

    let mut statuses = Vec::new();
    let mut confirmed = None;
    for _ in 0..10 {
        send_json(
            &mut client,
            json!({ "type": "predict", "landmarks": frame(1), "target": "b" }),
        )
        .await;
        let event = next_json(&mut client).await;
        assert_eq!(event["type"], "prediction");
        statuses.push(event["status"].as_str().unwrap().to_string());

        if event["confirmed"] == true {
            confirmed = Some(event);
            break;
        }
    }

    assert_eq!(statuses[0], "unstable");
    let confirmed = confirmed.expect("target was never confirmed");
    assert_eq!(confirmed["success"], true);
    assert_eq!(confirmed["label"], "B");
    assert_eq!(confirmed["stable"], true);
    assert_eq!(confirmed["status"], "ok");
    assert!(confirmed["stableCount"].as_u64().unwrap() >= 2);
    assert!(confirmed["all_predictions"]["B"].as_f64().unwrap() > 0.9);
}

#[tokio::test]
async fn test_wrong_sign_is_never_confirmed() {
    let (addr, _) = start_server().await;
    let mut client = connect(addr, "").await;
    next_json(&mut client).await;

    for _ in 0..12 {
        send_json(
            &mut client,
            json!({ "type": "predict", "landmarks": frame(0), "target": "B" }),
        )
        .await;
        let event = next_json(&mut client).await;
        assert_ne!(event["confirmed"], true);
    }
}

#[tokio::test]
async fn test_malformed_message_gets_one_failed_prediction() {
    let (addr, _) = start_server().await;
    let mut client = connect(addr, "").await;
    next_json(&mut client).await;

    client
        .send(Message::Text("{\"type\":\"predict\",".into()))
        .await
        .unwrap();
    let event = next_json(&mut client).await;
    assert_eq!(event["type"], "prediction");
    assert_eq!(event["success"], false);
    assert_eq!(event["status"], "invalid_input");
    assert!(!event["error"].as_str().unwrap().is_empty());

    // The next reply belongs to the next request.
    send_json(&mut client, json!({ "type": "reset" })).await;
    let reply = next_json(&mut client).await;
    assert_eq!(reply["type"], "reset_response");
}

#[tokio::test]
async fn test_missing_landmarks() {
    let (addr, _) = start_server().await;
    let mut client = connect(addr, "").await;
    next_json(&mut client).await;

    send_json(&mut client, json!({ "type": "predict" })).await;
    let event = next_json(&mut client).await;
    assert_eq!(event["success"], false);
    assert_eq!(event["error"], "No landmarks provided");
    assert_eq!(event["status"], "invalid_input");
}

#[tokio::test]
async fn test_invalid_shape_keeps_connection_open() {
    let (addr, _) = start_server().await;
    let mut client = connect(addr, "").await;
    next_json(&mut client).await;

    send_json(&mut client, json!({ "type": "predict", "landmarks": [0.1, 0.2] })).await;
    let event = next_json(&mut client).await;
    assert_eq!(event["success"], false);
    assert_eq!(event["status"], "invalid_input");

    send_json(&mut client, json!({ "type": "predict", "landmarks": frame(0) })).await;
    let event = next_json(&mut client).await;
    assert_eq!(event["type"], "prediction");
    assert_eq!(event["status"], "unstable");
}

#[tokio::test]
async fn test_no_detection_is_success() {
    let (addr, _) = start_server().await;
    let mut client = connect(addr, "").await;
    next_json(&mut client).await;

    send_json(
        &mut client,
        json!({ "type": "predict", "landmarks": vec![0.0; 126] }),
    )
    .await;
    let event = next_json(&mut client).await;
    assert_eq!(event["success"], true);
    assert_eq!(event["status"], "no_detection");
    assert!(event.get("label").is_none());
}

#[tokio::test]
async fn test_reset_clears_progress() {
    let (addr, _) = start_server().await;
    let mut client = connect(addr, "").await;
    next_json(&mut client).await;

    for _ in 0..6 {
        send_json(&mut client, json!({ "type": "predict", "landmarks": frame(2) })).await;
        next_json(&mut client).await;
    }

    send_json(&mut client, json!({ "type": "reset" })).await;
    let reply = next_json(&mut client).await;
    assert_eq!(reply["type"], "reset_response");
    assert_eq!(reply["success"], true);

    send_json(&mut client, json!({ "type": "predict", "landmarks": frame(2) })).await;
    let event = next_json(&mut client).await;
    assert_eq!(event["status"], "unstable");
}

#[tokio::test]
async fn test_disconnect_removes_session() {
    let (addr, app_state) = start_server().await;
    let mut client = connect(addr, "?session_id=gone").await;
    next_json(&mut client).await;
    assert!(app_state.sessions().contains("gone"));

    client.close(None).await.unwrap();

    let mut removed = false;
    for _ in 0..50 {
        if !app_state.sessions().contains("gone") {
            removed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(removed);
}

#[tokio::test]
async fn test_reconnect_starts_fresh() {
    let (addr, app_state) = start_server().await;

    let mut first = connect(addr, "?session_id=same").await;
    next_json(&mut first).await;
    for _ in 0..6 {
        send_json(&mut first, json!({ "type": "predict", "landmarks": frame(1) })).await;
        next_json(&mut first).await;
    }

    let mut second = connect(addr, "?session_id=same").await;
    next_json(&mut second).await;
    send_json(&mut second, json!({ "type": "predict", "landmarks": frame(1) })).await;
    let event = next_json(&mut second).await;
    assert_eq!(event["status"], "unstable");

    // Closing the old connection leaves the new session in place.
    first.close(None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(app_state.sessions().contains("same"));
    send_json(&mut second, json!({ "type": "predict", "landmarks": frame(1) })).await;
    let event = next_json(&mut second).await;
    assert_eq!(event["status"], "unstable");
}

#[tokio::test]
async fn test_binary_frames_are_refused() {
    let (addr, _) = start_server().await;
    let mut client = connect(addr, "").await;
    next_json(&mut client).await;

    client
        .send(Message::Binary(vec![1, 2, 3].into()))
        .await
        .unwrap();
    let reply = next_json(&mut client).await;
    assert_eq!(reply["type"], "error");
}

#[tokio::test]
async fn test_classifier_failure_keeps_connection_open() {
    let mut category = letters_config();
    category.stability.enabled = false;
    // A first coordinate of 2 makes the model answer with the wrong width.
    let classifier = FnClassifier::new(InputShape::single(126), letter_labels(), |input| {
        match input.first() {
            Some(&first) if first == 2.0 => vec![1.0],
            _ => vec![0.9, 0.05, 0.05],
        }
    });
    let (addr, _) = start_server_with(category, Arc::new(classifier)).await;
    let mut client = connect(addr, "").await;
    next_json(&mut client).await;

    send_json(&mut client, json!({ "type": "predict", "landmarks": frame(2) })).await;
    let event = next_json(&mut client).await;
    assert_eq!(event["type"], "prediction");
    assert_eq!(event["success"], false);
    assert_eq!(event["status"], "classifier_error");
    assert!(!event["error"].as_str().unwrap().is_empty());

    send_json(&mut client, json!({ "type": "predict", "landmarks": frame(0) })).await;
    let event = next_json(&mut client).await;
    assert_eq!(event["type"], "prediction");
    assert_ne!(event["status"], "classifier_error");
}

#[tokio::test]
async fn test_replies_are_flushed_before_close() {
    let (addr, _) = start_server().await;
    let mut client = connect(addr, "").await;
    next_json(&mut client).await;

    send_json(&mut client, json!({ "type": "reset" })).await;
    client.close(None).await.unwrap();

    let mut reset_seen = false;
    while let Ok(Some(Ok(message))) =
        tokio::time::timeout(Duration::from_secs(5), client.next()).await
    {
        if let Message::Text(text) = message {
            let reply: Value = serde_json::from_str(text.as_str()).unwrap();
            reset_seen |= reply["type"] == "reset_response";
        }
    }
    assert!(reset_seen);
}
