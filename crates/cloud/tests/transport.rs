//! Retry and polling behaviour against a local HTTP stub.
//!
//! The stub answers each connection with the next canned response (the last
//! one repeats) and records the request line it saw.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use yieldmap_cloud::{ApiClient, ClientOptions, CloudError, PredictionStatus};

struct Stub {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl Stub {
    async fn serve(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let line = read_request_line(&mut socket).await;
                let n = {
                    let mut seen = seen.lock().unwrap();
                    seen.push(line);
                    seen.len() - 1
                };
                let (status, body) = responses[n.min(responses.len() - 1)];
                let reply = format!(
                    "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self { addr, requests }
    }

    fn client(&self, max_retries: u32, max_polls: u32) -> ApiClient {
        ApiClient::new(ClientOptions {
            base_url: format!("http://{}/api", self.addr),
            request_timeout: Duration::from_secs(5),
            max_retries,
            poll_interval: Duration::from_millis(1),
            max_polls,
        })
        .unwrap()
    }

    fn hits(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request_lines(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Read the request head and return its first line, e.g. `GET /api/health HTTP/1.1`.
async fn read_request_line(socket: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head)
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}

const PENDING: &str = r#"{"id": "p1", "status": "pending", "createdAt": "2024-05-01T10:00:00Z"}"#;
const PROCESSING: &str =
    r#"{"id": "p1", "status": "processing", "createdAt": "2024-05-01T10:00:00Z"}"#;
const FAILED: &str = r#"{"id": "p1", "status": "failed", "createdAt": "2024-05-01T10:00:00Z",
    "error": "model crashed"}"#;
const COMPLETED: &str = r#"{"id": "p1", "status": "completed", "createdAt": "2024-05-01T10:00:00Z",
    "predictionMap": "https://tiles.example.org/p1.png", "confidence": 0.87}"#;

#[tokio::test]
async fn server_errors_are_retried_until_exhausted() {
    let stub = Stub::serve(vec![(503, r#"{"detail": "model warming up"}"#)]).await;
    let err = stub.client(2, 1).health().await.unwrap_err();

    assert_eq!(stub.hits(), 3);
    match err {
        CloudError::Api { status, message } => {
            assert_eq!(status, 503);
            assert_eq!(message, "model warming up");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let stub = Stub::serve(vec![(404, r#"{"detail": "Scenario not found"}"#)]).await;
    let err = stub.client(3, 1).get_scenario("missing").await.unwrap_err();

    assert_eq!(stub.hits(), 1);
    assert!(err.is_not_found());
    assert_eq!(stub.request_lines()[0], "GET /api/scenarios/missing HTTP/1.1");
}

#[tokio::test]
async fn transient_failure_then_success() {
    let stub = Stub::serve(vec![(502, ""), (200, r#"{"status": "healthy"}"#)]).await;
    assert!(stub.client(1, 1).health().await.unwrap());
    assert_eq!(stub.hits(), 2);
}

#[tokio::test]
async fn polling_stops_on_failure() {
    let stub = Stub::serve(vec![(200, PENDING), (200, PROCESSING), (200, FAILED)]).await;
    let mut seen = Vec::new();
    let err = stub
        .client(0, 10)
        .wait_for_prediction_with("p1", |s| seen.push(s))
        .await
        .unwrap_err();

    match err {
        CloudError::PredictionFailed { id, reason } => {
            assert_eq!(id, "p1");
            assert_eq!(reason, "model crashed");
        }
        other => panic!("expected PredictionFailed, got {other:?}"),
    }
    assert_eq!(
        seen,
        [
            PredictionStatus::Pending,
            PredictionStatus::Processing,
            PredictionStatus::Failed
        ]
    );
    assert_eq!(stub.hits(), 3);
    assert!(stub
        .request_lines()
        .iter()
        .all(|l| l == "GET /api/predictions/p1 HTTP/1.1"));
}

#[tokio::test]
async fn polling_gives_up_after_max_polls() {
    let stub = Stub::serve(vec![(200, PENDING)]).await;
    let err = stub.client(0, 2).wait_for_prediction("p1").await.unwrap_err();

    assert!(
        matches!(err, CloudError::Timeout { ref id, polls: 2 } if id == "p1"),
        "got {err:?}"
    );
    assert_eq!(stub.hits(), 2);
}

#[tokio::test]
async fn polling_returns_completed_prediction() {
    let stub = Stub::serve(vec![(200, PENDING), (200, COMPLETED)]).await;
    let resp = stub.client(0, 5).wait_for_prediction("p1").await.unwrap();

    assert!(resp.is_completed());
    assert_eq!(resp.prediction_map.as_deref(), Some("https://tiles.example.org/p1.png"));
    assert_eq!(stub.hits(), 2);
}
