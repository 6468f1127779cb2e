//! Tests for the HTTP classification client against a local server

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tweet_triage::classifier::{ChatMessage, ClassificationService, MistralClient};
use tweet_triage::config::ServiceConfig;
use tweet_triage::TriageError;

fn service_config(endpoint: String, timeout_secs: u64) -> ServiceConfig {
    ServiceConfig {
        endpoint,
        model: "mistral-large-2411".to_string(),
        api_key: Some("test-key".to_string()),
        timeout_secs,
        max_retries: 0,
        retry_backoff_ms: 0,
    }
}

fn http_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Read one request: headers, then `Content-Length` bytes of body
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await.expect("read request");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Serve one canned response; the handle yields the request as received
async fn serve_once(response: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let request = read_request(&mut stream).await;
        stream.write_all(response.as_bytes()).await.expect("write response");
        stream.shutdown().await.expect("shutdown");
        request
    });

    (format!("http://{addr}/v1/chat/completions"), handle)
}

fn messages() -> Vec<ChatMessage> {
    vec![ChatMessage::system("consigne"), ChatMessage::user("Ma facture est incorrecte")]
}

#[test]
fn test_client_requires_api_key() {
    let mut config = service_config("http://127.0.0.1:9/v1/chat/completions".to_string(), 1);
    config.api_key = None;
    std::env::remove_var("MISTRAL_API_KEY");

    assert!(matches!(MistralClient::new(&config), Err(TriageError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_reply_content_is_returned() {
    let body = r#"{"choices":[{"message":{"role":"assistant","content":"Note : 85"}}]}"#;
    let (endpoint, server) = serve_once(http_response("200 OK", body)).await;
    let client = MistralClient::new(&service_config(endpoint, 5)).expect("client");

    let reply = client.complete(&messages()).await.expect("complete");
    assert_eq!(reply, "Note : 85");

    let request = server.await.expect("server task").to_lowercase();
    assert!(request.starts_with("post /v1/chat/completions"));
    assert!(request.contains("authorization: bearer test-key"));
    assert!(request.contains(r#""model":"mistral-large-2411""#));
}

#[tokio::test]
async fn test_timeout_is_service_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let _server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("accept");
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(stream);
    });

    let config = service_config(format!("http://{addr}/v1/chat/completions"), 1);
    let client = MistralClient::new(&config).expect("client");

    let err = client.complete(&messages()).await.unwrap_err();
    match err {
        TriageError::ClassificationService(message) => assert!(message.contains("timed out"), "{message}"),
        other => panic!("expected a service error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_status_is_service_error() {
    let (endpoint, _server) = serve_once(http_response("500 Internal Server Error", r#"{"message":"boom"}"#)).await;
    let client = MistralClient::new(&service_config(endpoint, 5)).expect("client");

    let err = client.complete(&messages()).await.unwrap_err();
    match err {
        TriageError::ClassificationService(message) => {
            assert!(message.contains("500"), "{message}");
            assert!(message.contains("boom"), "{message}");
        },
        other => panic!("expected a service error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_choices_is_service_error() {
    let (endpoint, _server) = serve_once(http_response("200 OK", r#"{"choices":[]}"#)).await;
    let client = MistralClient::new(&service_config(endpoint, 5)).expect("client");

    let err = client.complete(&messages()).await.unwrap_err();
    assert!(matches!(err, TriageError::ClassificationService(_)));
}
