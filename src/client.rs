use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, Response};
use url::Url;

use crate::error::{Error, Result};
use crate::types::{ChatRequest, ChatResponse, SelectedFile, UploadReceipt};

/// Where the document service listens unless configured otherwise.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/";
/// Answers can take a while: the service retrieves chunks and then calls a model.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const UPLOAD_PATH: &str = "upload/";
const CHAT_PATH: &str = "chat/";
const UPLOAD_FIELD: &str = "file";
const MAX_ERROR_BODY: usize = 512;

/// The two calls the chat session makes against the document service.
///
/// [`DocumentQa`] is the HTTP implementation; anything else implementing this
/// trait can stand in for it.
#[async_trait::async_trait]
pub trait QaService: Send + Sync {
    /// Uploads a document for indexing.
    ///
    /// Returns the parsed receipt if the response body was one.
    async fn upload(&self, file: &SelectedFile) -> Result<Option<UploadReceipt>>;

    /// Asks a question about the uploaded documents.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// HTTP client for the document Q&A service.
#[derive(Debug, Clone)]
pub struct DocumentQa {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl DocumentQa {
    /// Create a client for the service at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = parse_base_url(base_url)?;
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Create a client for the default local service.
    pub fn local() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Returns the base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("Request timed out: {}", e),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Turn a non-success response into an error, keeping a bounded amount of
    /// the body for diagnostics.
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        match response.text().await {
            Ok(body) => Error::api(status_code, truncate(body.trim(), MAX_ERROR_BODY)),
            Err(e) => Error::http_client(
                format!("Failed to read error response: {}", e),
                Some(Box::new(e)),
            ),
        }
    }
}

#[async_trait::async_trait]
impl QaService for DocumentQa {
    async fn upload(&self, file: &SelectedFile) -> Result<Option<UploadReceipt>> {
        let url = self.endpoint(UPLOAD_PATH)?;
        let part = Part::bytes(file.bytes().to_vec()).file_name(file.file_name().to_string());
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(url)
            .headers(Self::default_headers())
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        let body = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        Ok(UploadReceipt::from_body(&body))
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = self.endpoint(CHAT_PATH)?;

        let response = self
            .client
            .post(url)
            .headers(Self::default_headers())
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !response.status().is_success() {
            return Err(Self::process_error_response(response).await);
        }

        response.json::<ChatResponse>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

/// Parse a base URL, making sure relative joins land underneath it.
fn parse_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(
            "base URL must not be empty",
            Some("base_url".to_string()),
        ));
    }
    let mut url = Url::parse(trimmed)?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(Error::validation(
            format!("base URL must be an http(s) URL: {trimmed}"),
            Some("base_url".to_string()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
