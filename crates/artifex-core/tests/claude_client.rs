use std::time::Duration;

use artifex_core::ai::ARTIFACT_INSTRUCTION;
use artifex_core::{ClaudeClient, CompletionClient, CompletionError, Credential, Turn};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A raw HTTP request as seen by the responder.
struct CapturedRequest {
    head: String,
    body: Value,
}

impl CapturedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }
}

/// Accept one connection, answer with `status` and `body`, and hand back the request.
async fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<CapturedRequest>) {
    serve_raw(format!(
        "HTTP/1.1 {} Status\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    ))
    .await
}

/// Accept one connection and write `response` verbatim before closing it.
async fn serve_raw(response: String) -> (String, JoinHandle<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let header_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (key, value) = line.split_once(':')?;
                key.trim()
                    .eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending body");
            buf.extend_from_slice(&chunk[..n]);
        }

        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();

        CapturedRequest {
            head,
            body: serde_json::from_slice(&buf[header_end..header_end + content_length]).unwrap(),
        }
    });

    (base_url, handle)
}

fn client_for(base_url: &str) -> ClaudeClient {
    ClaudeClient::new(base_url, "claude-test", 4000, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn success_returns_first_text_and_sends_full_history() {
    let (base_url, server) = serve_once(
        200,
        r#"{"content":[{"type":"text","text":"```html\n<p>hi</p>\n```"},{"type":"text","text":"ignored"}]}"#,
    )
    .await;
    let history = vec![Turn::user("make a clock"), Turn::assistant("here is a clock")];

    let reply = client_for(&base_url)
        .submit(&history, "make it red", &Credential::new("k1"))
        .await
        .unwrap();
    assert_eq!(reply, "```html\n<p>hi</p>\n```");

    let request = server.await.unwrap();
    assert!(request.head.starts_with("POST /v1/messages "));
    assert_eq!(request.header("x-api-key"), Some("k1"));
    assert_eq!(request.header("anthropic-version"), Some("2023-06-01"));
    assert_eq!(request.body["model"], "claude-test");
    assert_eq!(request.body["max_tokens"], 4000);

    let messages = request.body["messages"].as_array().unwrap();
    let roles: Vec<&str> = messages.iter().map(|m| m["role"].as_str().unwrap()).collect();
    assert_eq!(roles, vec!["user", "assistant", "user", "user"]);
    assert_eq!(messages[2]["content"], "make it red");
    assert_eq!(messages[3]["content"], ARTIFACT_INSTRUCTION);
}

#[tokio::test]
async fn unauthorized_maps_to_authentication_error() {
    let (base_url, server) = serve_once(
        401,
        r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#,
    )
    .await;

    let err = client_for(&base_url)
        .submit(&[], "build a counter", &Credential::new("wrong"))
        .await
        .unwrap_err();
    server.await.unwrap();

    match err {
        CompletionError::Authentication { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("invalid x-api-key"));
        }
        other => panic!("expected authentication error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_error_maps_to_remote_error() {
    let (base_url, server) = serve_once(529, r#"{"type":"error","error":{"type":"overloaded_error"}}"#).await;

    let err = client_for(&base_url)
        .submit(&[], "build a counter", &Credential::new("k1"))
        .await
        .unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, CompletionError::Remote { status: 529, .. }));
}

#[tokio::test]
async fn truncated_error_body_is_reported_in_remote_error() {
    let (base_url, server) = serve_raw(
        "HTTP/1.1 502 Bad Gateway\r\ncontent-type: text/plain\r\ncontent-length: 100\r\nconnection: close\r\n\r\npartial".to_string(),
    )
    .await;

    let err = client_for(&base_url)
        .submit(&[], "build a counter", &Credential::new("k1"))
        .await
        .unwrap_err();
    server.await.unwrap();

    match err {
        CompletionError::Remote { status, body } => {
            assert_eq!(status, 502);
            assert!(body.contains("could not read error body"), "body was {body:?}");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_content_is_malformed() {
    let (base_url, server) = serve_once(200, r#"{"content":[]}"#).await;

    let err = client_for(&base_url)
        .submit(&[], "build a counter", &Credential::new("k1"))
        .await
        .unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, CompletionError::MalformedResponse(_)));
}

#[tokio::test]
async fn non_json_success_body_is_malformed() {
    let (base_url, server) = serve_once(200, "not json").await;

    let err = client_for(&base_url)
        .submit(&[], "build a counter", &Credential::new("k1"))
        .await
        .unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, CompletionError::MalformedResponse(_)));
}

#[tokio::test]
async fn refused_connection_maps_to_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = client_for(&base_url)
        .submit(&[], "build a counter", &Credential::new("k1"))
        .await
        .unwrap_err();

    assert!(matches!(err, CompletionError::Transport(_)));
}
