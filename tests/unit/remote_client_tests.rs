/*!
 * Tests for the remote proxy client against a local one-shot HTTP server
 */

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use aisylum::builtin::{RewriterOptions, WriterOptions, WriterTone};
use aisylum::errors::ProviderError;
use aisylum::providers::{PromptRequest, RemoteBackend, RemoteProxyClient};

/// Request received by the test server
struct ReceivedRequest {
    request_line: String,
    body: serde_json::Value,
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(4).position(|window| window == b"\r\n\r\n").map(|pos| pos + 4)
}

/// Serve exactly one request with the given status and JSON body
async fn serve_once(status: u16, response_body: &'static str) -> (RemoteProxyClient, JoinHandle<ReceivedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];

        let header_end = loop {
            let read = socket.read(&mut chunk).await.unwrap();
            buffer.extend_from_slice(&chunk[..read]);
            if let Some(end) = find_header_end(&buffer) {
                break end;
            }
            if read == 0 {
                break buffer.len();
            }
        };

        let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buffer.len() < header_end + content_length {
            let read = socket.read(&mut chunk).await.unwrap();
            if read == 0 {
                break;
            }
            buffer.extend_from_slice(&chunk[..read]);
        }

        let response = format!(
            "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            response_body.len(),
            response_body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;

        let body = &buffer[header_end..];
        ReceivedRequest {
            request_line: head.lines().next().unwrap_or_default().to_string(),
            body: serde_json::from_slice(body).unwrap_or(serde_json::Value::Null),
        }
    });

    (RemoteProxyClient::new(base_url, Duration::from_secs(5)), handle)
}

/// Test that a prompt is posted with the proxy's field names
#[tokio::test]
async fn test_prompt_withSystemPrompt_shouldPostCamelCaseBody() {
    let (client, server) = serve_once(200, r#"{"response": "Hi there"}"#).await;

    let request = PromptRequest::new("Hello").system("You are Aisylum, a helpful assistant.");
    let answer = client.prompt(&request).await.unwrap();
    let received = server.await.unwrap();

    assert_eq!(answer, "Hi there");
    assert!(received.request_line.starts_with("POST /api/prompt "));
    assert_eq!(
        received.body,
        serde_json::json!({
            "systemPrompt": "You are Aisylum, a helpful assistant.",
            "prompt": "Hello"
        })
    );
}

/// Test the translator request without a source language
#[tokio::test]
async fn test_translate_withoutSource_shouldOmitSourceLanguage() {
    let (client, server) = serve_once(200, r#"{"response": "Hello"}"#).await;

    let answer = client.translate("Hola", None, "en").await.unwrap();
    let received = server.await.unwrap();

    assert_eq!(answer, "Hello");
    assert!(received.request_line.starts_with("POST /api/translator "));
    assert_eq!(received.body, serde_json::json!({"text": "Hola", "targetLanguage": "en"}));
}

/// Test the writer and rewriter option encoding
#[tokio::test]
async fn test_write_withOptions_shouldSendWireNames() {
    let (client, server) = serve_once(200, r#"{"response": "Dear team"}"#).await;

    let options = WriterOptions {
        tone: WriterTone::Formal,
        shared_context: Some("A quarterly update".to_string()),
        ..WriterOptions::default()
    };
    client.write("Announce the release", &options).await.unwrap();
    let received = server.await.unwrap();

    assert_eq!(
        received.body["options"],
        serde_json::json!({
            "tone": "formal",
            "format": "plain-text",
            "length": "medium",
            "sharedContext": "A quarterly update"
        })
    );

    let (client, server) = serve_once(200, r#"{"response": "ok"}"#).await;
    let options = RewriterOptions::default().with_language(Some("es".to_string()));
    client.rewrite("texto", &options).await.unwrap();
    let received = server.await.unwrap();
    assert_eq!(
        received.body["options"],
        serde_json::json!({"tone": "as-is", "format": "as-is", "length": "as-is", "language": "es"})
    );
}

/// Test that the detector answer is read from the language field
#[tokio::test]
async fn test_detect_language_shouldReadLanguageField() {
    let (client, server) = serve_once(200, r#"{"language": " Spanish\n"}"#).await;

    let language = client.detect_language("¿Dónde está la biblioteca?").await.unwrap();
    let received = server.await.unwrap();

    assert_eq!(language, "Spanish");
    assert!(received.request_line.starts_with("POST /api/language-detector "));
}

/// Test that an error status carries the proxy's error message
#[tokio::test]
async fn test_prompt_withServerError_shouldReturnApiError() {
    let (client, server) = serve_once(500, r#"{"error": "Failed to process prompt"}"#).await;

    let result = client.prompt(&PromptRequest::new("Hello")).await;
    server.await.unwrap();

    match result {
        Err(ProviderError::ApiError { status_code, message }) => {
            assert_eq!(status_code, 500);
            assert_eq!(message, "Failed to process prompt");
        }
        other => panic!("Expected an API error, got {:?}", other),
    }
}

/// Test that an unexpected success body is a parse error
#[tokio::test]
async fn test_summarize_withUnexpectedBody_shouldReturnParseError() {
    let (client, server) = serve_once(200, r#"{"answer": "missing response field"}"#).await;

    let result = client
        .summarize("Long text", &aisylum::builtin::SummarizerOptions::default())
        .await;
    server.await.unwrap();

    assert!(matches!(result, Err(ProviderError::ParseError(_))));
}

/// Test the health endpoint for both answers
#[tokio::test]
async fn test_health_withStatus_shouldCheckOk() {
    let (client, server) = serve_once(200, r#"{"status": "ok"}"#).await;
    assert!(client.health().await.is_ok());
    assert!(server.await.unwrap().request_line.starts_with("GET /api/health "));

    let (client, server) = serve_once(200, r#"{"status": "degraded"}"#).await;
    assert!(client.health().await.is_err());
    server.await.unwrap();
}

/// Test that an unreachable proxy is a connection error
#[tokio::test]
async fn test_prompt_withUnreachableProxy_shouldReturnConnectionError() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let client = RemoteProxyClient::new(format!("http://{}", address), Duration::from_secs(5));
    let result = client.prompt(&PromptRequest::new("Hello")).await;

    assert!(matches!(result, Err(ProviderError::ConnectionError(_))));
}
