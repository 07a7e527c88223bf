//! HTTP client for the study backend and the crate's error type.
//!
//! Every JSON endpoint wraps its payload in an envelope:
//! ```text
//! { "success": true, ...payload }
//! { "success": false, "error": "Subject XY101 not found in database" }
//! ```
//! A `success: false` body is a failure whatever the HTTP status says.

use bytes::Bytes;
use futures::Stream;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::http::{add_extra_headers, build_http_client};
use crate::model::{
    normalize_subject_code, ChatReply, ChatRequest, ExamScheduleRequest, ExamType, PdfRequest,
    PyqResponse, Resources, ResourcesReply, ScheduleReply, ScheduleRequest, SessionReply,
    SessionsReply, StudyContent, StudyContentRequest, Subject, SubjectsReply,
};
use crate::options::TransportOptions;
use crate::sessions::SessionRecord;
use crate::sse::{SSEResponseExt, SseEvent};

const FALLBACK_API_ERROR: &str = "An error occurred";

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Stream cancelled")]
    StreamCancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client for the study backend.
///
/// # Example
/// ```no_run
/// use futures::StreamExt;
/// use studykit::client::StudyClient;
/// use studykit::model::{ExamType, StudyContentRequest};
/// use studykit::options::TransportOptions;
///
/// # async fn run() -> Result<(), studykit::ClientError> {
/// let client = StudyClient::new(TransportOptions::from_env()?)?;
/// let request = StudyContentRequest::new("cs301", ExamType::Semester);
///
/// let events = client.stream_notes(&request).await?;
/// futures::pin_mut!(events);
/// while let Some(event) = events.next().await {
///     println!("{:?}", event?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StudyClient {
    http: reqwest::Client,
    options: TransportOptions,
}

impl StudyClient {
    pub fn new(options: TransportOptions) -> Result<Self, ClientError> {
        let http = build_http_client(&options)?;
        Ok(Self { http, options })
    }

    pub fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Fetch flashcards and the mind map for a subject.
    pub async fn generate_study_content(
        &self,
        request: &StudyContentRequest,
    ) -> Result<StudyContent, ClientError> {
        self.send_json(
            self.request(Method::POST, "/api/generate-study-content")
                .json(request),
        )
        .await
    }

    /// Previous-year questions for a subject, optionally for one exam type.
    pub async fn get_pyqs(
        &self,
        subject_code: &str,
        exam_type: Option<ExamType>,
    ) -> Result<PyqResponse, ClientError> {
        let mut query = vec![("subject_code", normalize_subject_code(subject_code))];
        if let Some(exam_type) = exam_type {
            query.push(("exam_type", exam_type.to_string()));
        }
        self.send_json(self.request(Method::GET, "/api/get-pyqs").query(&query))
            .await
    }

    /// Record a finished session. Returns the record as stored by the backend.
    pub async fn save_session(&self, record: &SessionRecord) -> Result<SessionRecord, ClientError> {
        let reply: SessionReply = self
            .send_json(self.request(Method::POST, "/api/save-session").json(record))
            .await?;
        Ok(reply.session)
    }

    pub async fn get_sessions(&self) -> Result<Vec<SessionRecord>, ClientError> {
        let reply: SessionsReply = self
            .send_json(self.request(Method::GET, "/api/get-sessions"))
            .await?;
        Ok(reply.sessions)
    }

    pub async fn get_resources(&self) -> Result<Resources, ClientError> {
        let reply: ResourcesReply = self
            .send_json(self.request(Method::GET, "/api/get-resources"))
            .await?;
        Ok(reply.resources)
    }

    pub async fn get_subjects(&self) -> Result<Vec<Subject>, ClientError> {
        let reply: SubjectsReply = self
            .send_json(self.request(Method::GET, "/api/subjects"))
            .await?;
        Ok(reply.subjects)
    }

    /// Non-streaming chat. Returns the assistant's full reply.
    pub async fn chat(&self, request: &ChatRequest) -> Result<String, ClientError> {
        let reply: ChatReply = self
            .send_json(self.request(Method::POST, "/api/chat").json(request))
            .await?;
        Ok(reply.response)
    }

    /// Non-streaming schedule for a single exam date.
    pub async fn create_schedule(&self, request: &ExamScheduleRequest) -> Result<String, ClientError> {
        let reply: ScheduleReply = self
            .send_json(self.request(Method::POST, "/api/create-schedule").json(request))
            .await?;
        Ok(reply.schedule)
    }

    /// Render notes to a PDF on the backend and return the document bytes.
    pub async fn download_pdf(&self, request: &PdfRequest) -> Result<Bytes, ClientError> {
        let response = self
            .request(Method::POST, "/api/download-pdf")
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/json"));

        if !status.is_success() || is_json {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::handle_error_response(status, &body));
        }

        Ok(response.bytes().await?)
    }

    /// Stream generated study notes. The first event is usually the subject name.
    pub async fn stream_notes(
        &self,
        request: &StudyContentRequest,
    ) -> Result<impl Stream<Item = Result<SseEvent, ClientError>> + Send, ClientError> {
        self.open_stream("/api/generate-notes/stream", request).await
    }

    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
    ) -> Result<impl Stream<Item = Result<SseEvent, ClientError>> + Send, ClientError> {
        self.open_stream("/api/chat/stream", request).await
    }

    pub async fn stream_schedule(
        &self,
        request: &ScheduleRequest,
    ) -> Result<impl Stream<Item = Result<SseEvent, ClientError>> + Send, ClientError> {
        self.open_stream("/api/create-schedule/stream", request).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let req = self.http.request(method, self.options.url(path));
        add_extra_headers(req, &self.options)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_envelope(status, &body)
    }

    async fn open_stream<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<impl Stream<Item = Result<SseEvent, ClientError>> + Send, ClientError> {
        debug!("Opening stream {}", path);
        let response = self
            .request(Method::POST, path)
            .header(ACCEPT, "text/event-stream")
            .json(body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::handle_error_response(status, &body));
        }

        Ok(response.sse_events())
    }

    /// Turn a failed response into an error, preferring the envelope's message.
    fn handle_error_response(status: StatusCode, body: &str) -> ClientError {
        match serde_json::from_str::<Value>(body) {
            Ok(value) if value.get("success").and_then(Value::as_bool) == Some(false) => {
                ClientError::Api(envelope_error(&value))
            }
            _ => ClientError::Status {
                status: status.as_u16(),
                body: body.to_string(),
            },
        }
    }
}

/// Decode a `{success, error?, ...payload}` envelope into the payload type.
pub fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ClientError> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) if status.is_success() => return Err(e.into()),
        Err(_) => {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: body.to_string(),
            })
        }
    };

    if value.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(ClientError::Api(envelope_error(&value)));
    }

    Ok(serde_json::from_value(value)?)
}

fn envelope_error(value: &Value) -> String {
    value
        .get("error")
        .and_then(Value::as_str)
        .filter(|e| !e.is_empty())
        .unwrap_or(FALLBACK_API_ERROR)
        .to_string()
}
