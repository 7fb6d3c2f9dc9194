use leaf_core::{
    ClientConfig, DetectionWorkflow, DiagnosisService, HttpDiagnosisClient, SelectedImage,
    SubmitError, WorkflowError, WorkflowPhase,
};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tempfile::TempDir;

/// Single-connection HTTP stub: reads one request, waits `hold`, replies.
fn spawn_stub(status: &str, body: &str, hold: Duration) -> (String, JoinHandle<String>) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    spawn_raw_stub(response, hold)
}

/// Like `spawn_stub`, but writes `response` verbatim and closes.
fn spawn_raw_stub(response: String, hold: Duration) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        thread::sleep(hold);
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
        String::from_utf8_lossy(&request).into_owned()
    });
    (format!("http://{addr}/plants/detect"), handle)
}

fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let length = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());
        match length {
            Some(len) if buf.len() >= end + 4 + len => break,
            Some(_) => continue,
            None if head.contains("transfer-encoding: chunked") => {
                if buf.ends_with(b"0\r\n\r\n") {
                    break;
                }
            }
            None => break,
        }
    }
    buf
}

fn leaf_image(name: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(name);
    std::fs::write(&path, b"\x89PNG\r\n\x1a\nnot-really-a-png").unwrap();
    (dir, path)
}

fn client_for(url: &str, timeout: Option<Duration>) -> HttpDiagnosisClient {
    let mut cfg = ClientConfig::with_endpoint(url).unwrap();
    cfg.timeout = timeout;
    HttpDiagnosisClient::new(cfg).unwrap()
}

#[test]
fn posts_single_multipart_file_part() {
    let (url, server) = spawn_stub(
        "200 OK",
        r#"{"disease":"Apple_scab","confidence":91.27,"description":"Olive spots","treatment":"Fungicide"}"#,
        Duration::ZERO,
    );
    let (_dir, path) = leaf_image("leaf.png");
    let client = client_for(&url, Some(Duration::from_secs(5)));

    let result = client.diagnose(&SelectedImage::from_path(&path)).unwrap();

    assert_eq!(result.disease, "Apple_scab");
    assert_eq!(result.confidence, 91.27);
    let request = server.join().unwrap();
    let lower = request.to_ascii_lowercase();
    assert!(request.starts_with("POST /plants/detect HTTP/1.1"));
    assert!(lower.contains("content-type: multipart/form-data; boundary="));
    assert!(lower.contains(r#"name="file"; filename="leaf.png""#));
    assert!(lower.contains("content-type: image/png"));
    assert!(request.contains("not-really-a-png"));
}

#[test]
fn workflow_renders_blight_result() {
    let (url, server) = spawn_stub(
        "200 OK",
        r#"{"disease":"Blight","confidence":87.3,"description":"Lesions on lower leaves","treatment":"Remove and destroy"}"#,
        Duration::ZERO,
    );
    let (_dir, path) = leaf_image("leaf.jpg");
    let client = client_for(&url, Some(Duration::from_secs(5)));
    let mut wf = DetectionWorkflow::new();
    wf.select_image(&path).unwrap();

    wf.submit(&client).unwrap();

    assert_eq!(wf.phase(), WorkflowPhase::ResultReady);
    let view = wf.view().unwrap();
    assert_eq!(view.disease, "Blight");
    assert_eq!(view.confidence, "87%");
    assert_eq!(view.description, "Lesions on lower leaves");
    assert_eq!(view.treatment, "Remove and destroy");
    server.join().unwrap();
}

#[test]
fn validation_error_message_is_surfaced() {
    let (url, server) = spawn_stub(
        "422 Unprocessable Entity",
        r#"{"detail":[{"msg":"file too large"}]}"#,
        Duration::ZERO,
    );
    let (_dir, path) = leaf_image("leaf.jpg");
    let client = client_for(&url, Some(Duration::from_secs(5)));
    let mut wf = DetectionWorkflow::new();
    wf.select_image(&path).unwrap();

    let err = wf.submit(&client).unwrap_err();

    assert_eq!(err.notice().message, "file too large");
    assert_eq!(wf.phase(), WorkflowPhase::Failed);
    server.join().unwrap();
}

#[test]
fn string_detail_is_surfaced() {
    let (url, server) = spawn_stub(
        "413 Payload Too Large",
        r#"{"detail":"File size too large. Max 10MB."}"#,
        Duration::ZERO,
    );
    let (_dir, path) = leaf_image("leaf.jpg");
    let client = client_for(&url, Some(Duration::from_secs(5)));

    let err = client.diagnose(&SelectedImage::from_path(&path)).unwrap_err();

    assert_eq!(err.user_message(), "File size too large. Max 10MB.");
    server.join().unwrap();
}

#[test]
fn server_error_without_detail_reports_status() {
    let (url, server) = spawn_stub(
        "500 Internal Server Error",
        r#"{"error":"boom"}"#,
        Duration::ZERO,
    );
    let (_dir, path) = leaf_image("leaf.jpg");
    let client = client_for(&url, Some(Duration::from_secs(5)));

    let err = client.diagnose(&SelectedImage::from_path(&path)).unwrap_err();

    assert_eq!(
        err,
        SubmitError::ServerError {
            status: 500,
            detail: None
        }
    );
    assert!(err.user_message().contains("500"));
    server.join().unwrap();
}

#[test]
fn truncated_error_body_still_reports_status() {
    let (url, server) = spawn_raw_stub(
        "HTTP/1.1 502 Bad Gateway\r\nContent-Length: 100\r\nConnection: close\r\n\r\nshort"
            .to_string(),
        Duration::ZERO,
    );
    let (_dir, path) = leaf_image("leaf.jpg");
    let client = client_for(&url, Some(Duration::from_secs(5)));

    let err = client.diagnose(&SelectedImage::from_path(&path)).unwrap_err();

    assert_eq!(
        err,
        SubmitError::ServerError {
            status: 502,
            detail: None
        }
    );
    assert_eq!(err.user_message(), "Server Error: Status 502.");
    server.join().unwrap();
}

#[test]
fn truncated_success_body_is_malformed() {
    let (url, server) = spawn_raw_stub(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 100\r\nConnection: close\r\n\r\n{\"disease\""
            .to_string(),
        Duration::ZERO,
    );
    let (_dir, path) = leaf_image("leaf.jpg");
    let client = client_for(&url, Some(Duration::from_secs(5)));

    let err = client.diagnose(&SelectedImage::from_path(&path)).unwrap_err();

    assert!(matches!(err, SubmitError::MalformedResponse(_)));
    server.join().unwrap();
}

#[test]
fn malformed_success_body_is_rejected() {
    let (url, server) = spawn_stub("200 OK", r#"{"label":"Blight"}"#, Duration::ZERO);
    let (_dir, path) = leaf_image("leaf.jpg");
    let client = client_for(&url, Some(Duration::from_secs(5)));

    let err = client.diagnose(&SelectedImage::from_path(&path)).unwrap_err();

    assert!(matches!(err, SubmitError::MalformedResponse(_)));
    server.join().unwrap();
}

#[test]
fn timeout_fails_with_network_notice_and_keeps_image() {
    let (url, server) = spawn_stub(
        "200 OK",
        r#"{"disease":"Blight","confidence":50}"#,
        Duration::from_secs(2),
    );
    let (_dir, path) = leaf_image("leaf.jpg");
    let client = client_for(&url, Some(Duration::from_millis(300)));
    let mut wf = DetectionWorkflow::new();
    wf.select_image(&path).unwrap();

    let err = wf.submit(&client).unwrap_err();

    assert_eq!(err, WorkflowError::Submit(SubmitError::NetworkUnreachable));
    assert_eq!(wf.phase(), WorkflowPhase::Failed);
    assert_eq!(
        wf.notice().unwrap().message,
        "Network Error: Could not reach server. Check IP and firewall."
    );
    assert_eq!(wf.image().unwrap().path(), path.as_path());
    server.join().unwrap();
}

#[test]
fn refused_connection_is_network_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let (_dir, path) = leaf_image("leaf.jpg");
    let client = client_for(
        &format!("http://{addr}/plants/detect"),
        Some(Duration::from_secs(2)),
    );

    let err = client.diagnose(&SelectedImage::from_path(&path)).unwrap_err();

    assert_eq!(err, SubmitError::NetworkUnreachable);
}

#[test]
fn unreadable_image_is_unknown_error() {
    let client = client_for("http://127.0.0.1:9/plants/detect", Some(Duration::from_secs(1)));
    let image = SelectedImage::from_path("/definitely/not/here/leaf.jpg");

    let err = client.diagnose(&image).unwrap_err();

    assert!(matches!(err, SubmitError::Unknown(_)));
    assert_eq!(err.user_message(), "Unknown Error. Check network configuration.");
}

#[test]
fn health_check_hits_origin_root() {
    let (url, server) = spawn_stub(
        "200 OK",
        r#"{"status":"ok","message":"Plant Disease API is running"}"#,
        Duration::ZERO,
    );
    let client = client_for(&url, Some(Duration::from_secs(5)));

    let health = client.check_health().unwrap();

    assert!(health.is_ok());
    assert_eq!(health.message, "Plant Disease API is running");
    let request = server.join().unwrap();
    assert!(request.starts_with("GET / HTTP/1.1"));
}
