//! Integration tests for the docchat library.
//! These tests run a small document service in-process and talk to it over HTTP.

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use axum::extract::Multipart;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use docchat::chat::{ChatConfig, ChatSession, FALLBACK_REPLY};
    use docchat::{
        ChatRequest, DocumentQa, QaService, SelectedFile, UploadStatus, dedup_labels,
    };

    async fn spawn_service(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}/")
    }

    async fn upload(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
        while let Ok(Some(field)) = multipart.next_field().await {
            if field.name() != Some("file") {
                continue;
            }
            let Some(file_name) = field.file_name().map(str::to_string) else {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({"detail": "file part has no filename"})),
                );
            };
            let bytes = field.bytes().await.unwrap_or_default();
            return (
                StatusCode::OK,
                Json(json!({
                    "status": "success",
                    "chunks": bytes.len(),
                    "filename": file_name,
                })),
            );
        }
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "missing file field"})),
        )
    }

    /// Accepts only a `file` part named `report.pdf`.
    async fn upload_report(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
        while let Ok(Some(field)) = multipart.next_field().await {
            if field.name() != Some("file") {
                continue;
            }
            if field.file_name() != Some("report.pdf") {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"detail": format!("unexpected filename {:?}", field.file_name())})),
                );
            }
            let bytes = field.bytes().await.unwrap_or_default();
            if bytes.as_ref() != b"%PDF-1.7 test" {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"detail": "unexpected contents"})),
                );
            }
            return (
                StatusCode::OK,
                Json(json!({"status": "success", "chunks": bytes.len()})),
            );
        }
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "missing file field"})),
        )
    }

    async fn chat(Json(body): Json<Value>) -> Json<Value> {
        let question = body["question"].as_str().unwrap_or_default();
        Json(json!({
            "response": format!("You asked: **{question}**"),
            "source_docs": [
                {"source": "/data/uploads/report.pdf", "page": 0},
                {"source": "/data/uploads/report.pdf", "page": 0},
                {"source": "/data/uploads/report.pdf", "page": 4},
                {"page": 2},
            ],
        }))
    }

    async fn broken() -> (StatusCode, &'static str) {
        (StatusCode::INTERNAL_SERVER_ERROR, "vector store unavailable")
    }

    async fn slow_chat(Json(_): Json<Value>) -> Json<Value> {
        tokio::time::sleep(Duration::from_secs(2)).await;
        Json(json!({"response": "too late", "source_docs": []}))
    }

    fn healthy_service() -> Router {
        Router::new()
            .route("/upload/", post(upload))
            .route("/chat/", post(chat))
    }

    fn broken_service() -> Router {
        Router::new()
            .route("/upload/", post(broken))
            .route("/chat/", post(broken))
    }

    fn temp_document(suffix: &str, contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("docchat-")
            .suffix(suffix)
            .tempfile()
            .expect("create temp document");
        file.write_all(contents).expect("write temp document");
        file
    }

    /// An address nothing listens on.
    async fn closed_port_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind scratch listener");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn upload_sends_multipart_file() {
        let router = Router::new().route("/upload/", post(upload_report));
        let base_url = spawn_service(router).await;
        let client = DocumentQa::new(&base_url, Duration::from_secs(5)).unwrap();

        let file = SelectedFile::new("/tmp/report.pdf", b"%PDF-1.7 test".to_vec());
        let receipt = client.upload(&file).await.unwrap().unwrap();
        assert_eq!(receipt.status.as_deref(), Some("success"));
        assert_eq!(receipt.chunks, Some(13));
        assert!(receipt.error.is_none());

        let renamed = SelectedFile::new("/tmp/other.pdf", b"%PDF-1.7 test".to_vec());
        let err = client.upload(&renamed).await.unwrap_err();
        assert_eq!(err.status_code(), Some(400));
        assert!(err.to_string().contains("other.pdf"));
    }

    #[tokio::test]
    async fn chat_round_trip() {
        let base_url = spawn_service(healthy_service()).await;
        let client = DocumentQa::new(&base_url, Duration::from_secs(5)).unwrap();

        let response = client
            .chat(&ChatRequest::new("What is the budget?"))
            .await
            .unwrap();
        assert_eq!(response.response, "You asked: **What is the budget?**");
        assert_eq!(response.source_docs.len(), 4);
        assert_eq!(
            dedup_labels(&response.source_docs),
            vec![
                "report.pdf (Page 1)".to_string(),
                "report.pdf (Page 5)".to_string(),
                "Document (Page 3)".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn server_errors_surface_status_and_body() {
        let base_url = spawn_service(broken_service()).await;
        let client = DocumentQa::new(&base_url, Duration::from_secs(5)).unwrap();

        let err = client.chat(&ChatRequest::new("hello")).await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
        assert!(err.to_string().contains("vector store unavailable"));

        let file = SelectedFile::new("notes.docx", b"PK".to_vec());
        let err = client.upload(&file).await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_connection_error() {
        let base_url = closed_port_url().await;
        let client = DocumentQa::new(&base_url, Duration::from_secs(5)).unwrap();

        let err = client.chat(&ChatRequest::new("anyone there?")).await.unwrap_err();
        assert!(err.is_connection(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn slow_answers_time_out() {
        let router = Router::new().route("/chat/", post(slow_chat));
        let base_url = spawn_service(router).await;
        let client = DocumentQa::new(&base_url, Duration::from_millis(200)).unwrap();

        let err = client.chat(&ChatRequest::new("still there?")).await.unwrap_err();
        assert!(err.is_timeout(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn session_uploads_then_answers_with_sources() {
        let base_url = spawn_service(healthy_service()).await;
        let config = ChatConfig::new().with_base_url(base_url);
        let mut session = ChatSession::connect(&config).unwrap();
        assert_eq!(session.upload_status(), UploadStatus::Idle);

        let document = temp_document(".pdf", b"%PDF-1.7 quarterly report");
        let file = session.pick_file(document.path()).await.unwrap();
        let status = session.upload(file).await;
        assert_eq!(status, UploadStatus::Success);
        assert_eq!(status.display_text(), "File processed successfully!");
        assert_eq!(session.upload_receipt().and_then(|r| r.chunks), Some(25));

        let answer = session
            .send_message("Who wrote it?")
            .await
            .expect("question should be sent");
        assert_eq!(answer.content, "You asked: **Who wrote it?**");
        assert_eq!(dedup_labels(answer.sources()).len(), 3);

        let transcript = session.transcript();
        assert_eq!(transcript.len(), 3);
        assert!(transcript[1].is_user());
        assert_eq!(transcript[1].content, "Who wrote it?");
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn session_falls_back_when_service_fails() {
        let base_url = spawn_service(broken_service()).await;
        let config = ChatConfig::new().with_base_url(base_url);
        let mut session = ChatSession::connect(&config).unwrap();

        let document = temp_document(".docx", b"PK\x03\x04");
        let file = session.pick_file(document.path()).await.unwrap();
        assert_eq!(session.upload(file).await, UploadStatus::Failed);
        assert!(session.active_file().is_some());

        let answer = session.send_message("Anything?").await.unwrap();
        assert_eq!(answer.content, FALLBACK_REPLY);
        assert!(answer.sources().is_empty());

        let stats = session.stats();
        assert_eq!(stats.questions_sent, 1);
        assert_eq!(stats.questions_failed, 1);
        assert_eq!(stats.uploads_failed, 1);
        assert!(!stats.pending);
    }

    #[tokio::test]
    async fn session_refuses_unsupported_files() {
        let base_url = spawn_service(healthy_service()).await;
        let config = ChatConfig::new().with_base_url(base_url);
        let session = ChatSession::connect(&config).unwrap();

        let document = temp_document(".txt", b"plain text");
        let err = session.pick_file(document.path()).await.unwrap_err();
        assert!(err.is_unsupported_file());
        assert_eq!(session.upload_status(), UploadStatus::Idle);
        assert!(session.active_file().is_none());
    }
}
