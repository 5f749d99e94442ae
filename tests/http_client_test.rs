//! HTTP client against a local canned-response server.

use bytes::Bytes;
use punch_console::engine::{HttpPunchService, PunchService, UploadPayload};
use punch_console::error::ServiceError;
use punch_console::model::{DetectionConfig, HEALTH_NOT_OK, HEALTH_ONLINE, HEALTH_UNREACHABLE};
use punch_console::orchestrator::{Session, SessionOptions};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Canned `(status, body)` per request path. Unknown paths get a 404.
type Routes = HashMap<&'static str, (u16, &'static str)>;

struct CannedServer {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    async fn start(routes: Routes) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let seen = requests.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = routes.clone();
                let seen = seen.clone();
                tokio::spawn(async move { serve_one(stream, &routes, &seen).await });
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    fn service(&self) -> HttpPunchService {
        HttpPunchService::new(&self.base_url, None).expect("client")
    }

    fn request_to(&self, path: &str) -> String {
        let prefix = format!(" {path} HTTP/1.1");
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.lines().next().is_some_and(|l| l.contains(&prefix)))
            .cloned()
            .unwrap_or_else(|| panic!("no request to {path}"))
    }
}

async fn serve_one(mut stream: TcpStream, routes: &Routes, seen: &Mutex<Vec<String>>) {
    let raw = read_request(&mut stream).await;
    let text = String::from_utf8_lossy(&raw).into_owned();
    let path = text
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();
    seen.lock().unwrap().push(text);

    let (status, body) = routes.get(path.as_str()).copied().unwrap_or((404, "{}"));
    let resp = format!(
        "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(resp.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Read headers plus a `content-length` or chunked body.
async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        if let Some(end) = find(&buf, b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let body_len = buf.len() - (end + 4);
            let content_length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok());
            let done = match content_length {
                Some(n) => body_len >= n,
                None if head.contains("transfer-encoding: chunked") => buf.ends_with(b"0\r\n\r\n"),
                None => true,
            };
            if done {
                return buf;
            }
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return buf,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn payload() -> UploadPayload {
    UploadPayload::new(
        "fight.mp4".into(),
        Bytes::from_static(b"fake-video-bytes"),
        &DetectionConfig::default(),
    )
}

#[tokio::test]
async fn upload_sends_file_part_and_one_text_field_per_setting() {
    let server = CannedServer::start(Routes::from([(
        "/upload",
        (200, r#"{"video_stats": {"counted_punches": 2, "punch_events": [{"hand": "left"}]}}"#),
    )]))
    .await;

    let result = server.service().upload(payload()).await.expect("upload");
    assert_eq!(result.events().len(), 1);

    let req = server.request_to("/upload");
    assert!(req.starts_with("POST /upload HTTP/1.1"));
    assert!(req.to_ascii_lowercase().contains("content-type: multipart/form-data; boundary="));
    assert!(req.contains(r#"name="file"; filename="fight.mp4""#));
    assert!(req.contains("fake-video-bytes"));
    for (name, value) in DetectionConfig::default().form_fields() {
        let part = format!("name=\"{name}\"\r\n\r\n{value}\r\n");
        assert!(req.contains(&part), "missing form field {name}");
    }
    assert!(req.contains("name=\"elbow_angle_threshold\"\r\n\r\n120\r\n"));
    assert!(find(req.as_bytes(), b"name=\"file\"") < find(req.as_bytes(), b"name=\"preset\""));
}

#[tokio::test]
async fn upload_error_status_maps_to_status_error() {
    let server = CannedServer::start(Routes::from([("/upload", (500, r#"{"detail": "boom"}"#))])).await;

    let err = server.service().upload(payload()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Status { status: 500, .. }));
    assert_eq!(err.to_string(), "Upload failed (HTTP 500)");
}

#[tokio::test]
async fn upload_with_non_json_body_is_a_decode_error() {
    let server = CannedServer::start(Routes::from([("/upload", (200, "<html>oops"))])).await;

    let err = server.service().upload(payload()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Decode(_)));
}

#[tokio::test]
async fn csv_export_returns_body_untouched() {
    let server = CannedServer::start(Routes::from([(
        "/upload-csv",
        (200, "frame,time_sec,hand\n3,0.1,left\n"),
    )]))
    .await;

    let body = server.service().upload_csv(payload()).await.expect("csv");
    assert_eq!(&body[..], b"frame,time_sec,hand\n3,0.1,left\n");
    assert!(server
        .request_to("/upload-csv")
        .contains(r#"name="file"; filename="fight.mp4""#));
}

#[tokio::test]
async fn csv_export_error_status_maps_to_status_error() {
    let server = CannedServer::start(Routes::from([("/upload-csv", (502, "bad gateway"))])).await;

    let err = server.service().upload_csv(payload()).await.unwrap_err();
    assert_eq!(err.to_string(), "CSV export failed (HTTP 502)");
}

async fn bootstrapped(routes: Routes) -> punch_console::orchestrator::SessionSnapshot {
    let server = CannedServer::start(routes).await;
    let dir = tempdir().expect("Failed to create temp dir");
    let session = Session::new(
        Arc::new(server.service()),
        SessionOptions {
            download_dir: dir.path().to_path_buf(),
            initial_config: DetectionConfig::default(),
        },
    );
    session.bootstrap().await;
    session.snapshot()
}

#[tokio::test]
async fn bootstrap_reads_health_and_preset_order() {
    let snap = bootstrapped(Routes::from([
        ("/health", (200, r#"{"status": "ok"}"#)),
        (
            "/settings-presets",
            (200, r#"{"preset_overrides": {"sparring": {}, "balanced": {}}}"#),
        ),
    ]))
    .await;
    assert!(snap.health.ok);
    assert_eq!(snap.health.text, HEALTH_ONLINE);
    assert_eq!(snap.presets.names(), ["sparring", "balanced"]);
}

#[tokio::test]
async fn health_error_status_is_unreachable() {
    let snap = bootstrapped(Routes::from([("/health", (503, r#"{"status": "ok"}"#))])).await;
    assert_eq!(snap.health.text, HEALTH_UNREACHABLE);
    assert_eq!(snap.presets.names(), ["balanced"]);
}

#[tokio::test]
async fn undecodable_health_body_is_unreachable() {
    let snap = bootstrapped(Routes::from([("/health", (200, "<html>"))])).await;
    assert_eq!(snap.health.text, HEALTH_UNREACHABLE);
}

#[tokio::test]
async fn non_object_health_body_is_non_ok() {
    let snap = bootstrapped(Routes::from([("/health", (200, r#""ok""#))])).await;
    assert!(!snap.health.ok);
    assert_eq!(snap.health.text, HEALTH_NOT_OK);
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let service = HttpPunchService::new(&format!("http://{addr}"), None).expect("client");
    let err = service.health().await.unwrap_err();
    assert!(matches!(err, ServiceError::Transport(_)));
}
