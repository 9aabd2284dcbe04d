use interview_orchestrator::models::session::EvaluationState;
use interview_orchestrator::models::QaPair;
use interview_orchestrator::services::backend_gateway::{
    EVALUATION_ERROR, EVALUATION_FAILED, RESUME_UPLOAD_ERROR, RESUME_UPLOAD_FAILED,
};
use interview_orchestrator::services::BackendGateway;
use interview_orchestrator::{
    Config, EvaluationBackend, EvaluationRequest, GatewayError, HttpBackend, ResumeFile,
};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// 只应答一次的 HTTP 桩服务，返回 (base url, 收到的原始请求)
async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        request
    });

    (format!("http://{}", addr), server)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if request_complete(&buf) {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn request_complete(buf: &[u8]) -> bool {
    let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let body_len = buf.len() - (header_end + 4);

    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok());
    match content_length {
        Some(len) => body_len >= len,
        None if headers.contains("transfer-encoding: chunked") => buf.ends_with(b"0\r\n\r\n"),
        None => true,
    }
}

fn backend(base: String) -> HttpBackend {
    let config = Config {
        api_base: base,
        ..Config::default()
    };
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    HttpBackend::with_client(&config, client)
}

fn pdf() -> ResumeFile {
    ResumeFile::new("cv.pdf", "application/pdf", b"%PDF-1.4 resume".to_vec())
}

fn request() -> EvaluationRequest {
    EvaluationRequest {
        company_name: "Acme".to_string(),
        job_role: "Engineer".to_string(),
        qa: vec![QaPair {
            question: "Tell me about yourself.".to_string(),
            answer: "I build things.".to_string(),
        }],
    }
}

#[tokio::test]
async fn test_resume_score_posts_multipart_form() {
    let (base, server) = serve_once("200 OK", r#"{"score":7}"#).await;

    let result = backend(base)
        .score_resume(pdf(), "Engineer".to_string())
        .await
        .unwrap();
    assert_eq!(result, json!({ "score": 7 }));

    let raw = server.await.unwrap();
    let lower = raw.to_ascii_lowercase();
    assert!(raw.starts_with("POST /resume-score "), "{}", raw);
    assert!(lower.contains("content-type: multipart/form-data"));
    assert!(raw.contains(r#"name="resume""#));
    assert!(raw.contains(r#"filename="cv.pdf""#));
    assert!(raw.contains("%PDF-1.4 resume"));
    assert!(raw.contains(r#"name="role""#));
    assert!(raw.contains("Engineer"));
}

#[tokio::test]
async fn test_evaluate_posts_camel_case_json() {
    let (base, server) =
        serve_once("200 OK", r#"{"total_score": 88.6, "feedback": "Clear answers"}"#).await;

    let response = backend(base).evaluate(request()).await.unwrap();
    assert_eq!(response.authoritative_score(), Some(88));
    assert_eq!(response.feedback.as_deref(), Some("Clear answers"));

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /evaluate "), "{}", raw);
    assert!(raw.to_ascii_lowercase().contains("content-type: application/json"));
    assert!(raw.contains(r#""companyName":"Acme""#));
    assert!(raw.contains(r#""jobRole":"Engineer""#));
    assert!(raw.contains(r#""answer":"I build things.""#));
}

#[tokio::test]
async fn test_non_success_status_maps_to_failed_marker() {
    let (base, server) = serve_once("500 Internal Server Error", "boom").await;
    let err = backend(base).evaluate(request()).await.unwrap_err();
    server.await.unwrap();

    assert!(err.is_status());
    assert!(matches!(
        &err,
        GatewayError::Status { status: 500, body, .. } if body == "boom"
    ));

    let mut gateway = BackendGateway::new();
    let mut state = EvaluationState::default();
    gateway.begin(&mut state);
    assert_eq!(gateway.absorb_evaluation(&mut state, Err(err)), None);
    assert_eq!(state.backend_feedback.as_deref(), Some(EVALUATION_FAILED));

    let (base, server) = serve_once("400 Bad Request", "no file").await;
    let err = backend(base)
        .score_resume(pdf(), "Engineer".to_string())
        .await
        .unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, GatewayError::Status { status: 400, .. }));
    gateway.absorb_resume_score(&mut state, Err(err));
    assert_eq!(state.backend_feedback.as_deref(), Some(RESUME_UPLOAD_FAILED));
}

#[tokio::test]
async fn test_success_with_non_json_body_maps_to_error_marker() {
    let (base, server) = serve_once("200 OK", "not json").await;
    let err = backend(base).evaluate(request()).await.unwrap_err();
    server.await.unwrap();

    assert!(!err.is_status());
    assert!(matches!(err, GatewayError::Decode { .. }));

    let mut gateway = BackendGateway::new();
    let mut state = EvaluationState::default();
    gateway.absorb_evaluation(&mut state, Err(err));
    assert_eq!(state.backend_feedback.as_deref(), Some(EVALUATION_ERROR));

    let (base, server) = serve_once("200 OK", "<html></html>").await;
    let err = backend(base)
        .score_resume(pdf(), "Engineer".to_string())
        .await
        .unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, GatewayError::Decode { .. }));
    gateway.absorb_resume_score(&mut state, Err(err));
    assert_eq!(state.backend_feedback.as_deref(), Some(RESUME_UPLOAD_ERROR));
}

#[tokio::test]
async fn test_unreachable_backend_maps_to_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = backend(format!("http://{}", addr))
        .evaluate(request())
        .await
        .unwrap_err();

    assert!(!err.is_status());
    assert!(matches!(err, GatewayError::Transport { .. }));
}
