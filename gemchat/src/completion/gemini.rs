//! Gemini REST API backend.
//!
//! Streaming uses `:streamGenerateContent?alt=sse`: a worker task reads the
//! server-sent events, extracts the text of each chunk and forwards it over
//! a bounded channel. The returned [`FragmentStream`] is that channel's
//! receiver, so the simulator pulls fragments at its own pace.
//!
//! The non-streaming variant uses `:generateContent`.
//!
//! Each wait on the service is bounded by
//! [`GeminiSettings::request_timeout`], so a stalled connection ends in the
//! fallback text instead of a reply that never finishes.

use std::pin::pin;
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use url::Url;

use gemchat_proto::history::Role;

use super::{
    CompletionAdapter, CompletionError, CompletionRequest, EMPTY_REPLY_FALLBACK, FragmentStream,
};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Terminal fragment yielded when a stream fails.
pub const STREAM_FALLBACK: &str = "Error connecting to AI service.";

/// Reply returned when a non-streaming request fails.
pub const COMPLETE_FALLBACK: &str = "Oops! I hit a snag. Please try again in a moment.";

/// Default bound on each wait for the service.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Fragments buffered between the worker and the consumer.
const FRAGMENT_BUFFER: usize = 32;

/// Connection settings for [`GeminiAdapter`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeminiSettings {
    /// API key sent with every request.
    pub api_key: String,
    /// Model identifier, e.g. `gemini-3-flash-preview`.
    pub model: String,
    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta/`.
    pub base_url: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Longest wait on the service. Streams apply it to each chunk.
    pub request_timeout: Duration,
}

impl GeminiSettings {
    /// Settings with the default model, root and temperature.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.8,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Completion adapter talking to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiAdapter {
    client: Client,
    api_key: String,
    stream_url: Url,
    generate_url: Url,
    temperature: f32,
    request_timeout: Duration,
}

impl GeminiAdapter {
    /// Create an adapter from settings.
    ///
    /// # Errors
    ///
    /// Returns [`CompletionError::MissingApiKey`] for a blank key,
    /// [`CompletionError::InvalidBaseUrl`] for an unparsable root, and
    /// [`CompletionError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: GeminiSettings) -> Result<Self, CompletionError> {
        let api_key = settings.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(CompletionError::MissingApiKey);
        }

        let mut base = settings.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base)?;
        let model = settings.model.trim();
        let mut stream_url = base.join(&format!("models/{model}:streamGenerateContent"))?;
        stream_url.set_query(Some("alt=sse"));
        let generate_url = base.join(&format!("models/{model}:generateContent"))?;

        let client = Client::builder()
            .connect_timeout(settings.request_timeout.min(Duration::from_secs(10)))
            .build()?;

        Ok(Self {
            client,
            api_key,
            stream_url,
            generate_url,
            temperature: settings.temperature,
            request_timeout: settings.request_timeout,
        })
    }

    /// Endpoint used for streaming requests.
    #[must_use]
    pub const fn stream_url(&self) -> &Url {
        &self.stream_url
    }

    /// Endpoint used for non-streaming requests.
    #[must_use]
    pub const fn generate_url(&self) -> &Url {
        &self.generate_url
    }

    async fn post(
        &self,
        url: Url,
        body: &GenerateContentRequest,
    ) -> Result<Response, CompletionError> {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }

    /// Await `future`, failing with [`CompletionError::Timeout`] once the
    /// request timeout passes.
    async fn bounded<T>(&self, future: impl Future<Output = T>) -> Result<T, CompletionError> {
        tokio::time::timeout(self.request_timeout, future)
            .await
            .map_err(|_| CompletionError::Timeout(self.request_timeout))
    }

    async fn run_stream(
        &self,
        body: GenerateContentRequest,
        tx: &mpsc::Sender<String>,
    ) -> Result<usize, CompletionError> {
        let response = self
            .bounded(self.post(self.stream_url.clone(), &body))
            .await??;
        let mut events = pin!(response.bytes_stream().eventsource());
        let mut forwarded = 0;

        while let Some(event) = self.bounded(events.next()).await? {
            let event = event?;
            if event.data.trim().is_empty() {
                continue;
            }
            let text = chunk_text(&serde_json::from_str::<GenerateContentResponse>(&event.data)?);
            if text.is_empty() {
                continue;
            }
            if tx.send(text).await.is_err() {
                // Consumer went away; nothing left to deliver to.
                return Ok(forwarded);
            }
            forwarded += 1;
        }
        Ok(forwarded)
    }

    async fn generate(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = GenerateContentRequest::from_request(
            request,
            GenerationConfig {
                temperature: self.temperature,
                top_p: Some(0.95),
                top_k: Some(40),
                max_output_tokens: Some(1024),
            },
        );
        let parsed = self
            .bounded(async {
                let response = self.post(self.generate_url.clone(), &body).await?;
                Ok::<GenerateContentResponse, CompletionError>(response.json().await?)
            })
            .await??;
        Ok(chunk_text(&parsed))
    }
}

impl CompletionAdapter for GeminiAdapter {
    fn stream(&self, request: CompletionRequest) -> FragmentStream {
        let (tx, rx) = mpsc::channel(FRAGMENT_BUFFER);
        let body = GenerateContentRequest::from_request(
            &request,
            GenerationConfig {
                temperature: self.temperature,
                top_p: None,
                top_k: None,
                max_output_tokens: None,
            },
        );
        let adapter = self.clone();

        tokio::spawn(async move {
            match adapter.run_stream(body, &tx).await {
                Ok(fragments) => tracing::debug!(fragments, "gemini stream finished"),
                Err(err) => {
                    tracing::error!(error = %err, "gemini stream failed");
                    let _ = tx.send(STREAM_FALLBACK.to_string()).await;
                }
            }
        });

        futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|fragment| (fragment, rx))
        })
        .boxed()
    }

    async fn complete(&self, request: CompletionRequest) -> String {
        match self.generate(&request).await {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => {
                tracing::warn!("gemini returned no text");
                EMPTY_REPLY_FALLBACK.to_string()
            }
            Err(err) => {
                tracing::error!(error = %err, "gemini request failed");
                COMPLETE_FALLBACK.to_string()
            }
        }
    }
}

/// Turn a non-success response into [`CompletionError::Status`].
async fn check_status(response: Response) -> Result<Response, CompletionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "failed to read error body".to_string());
    Err(CompletionError::Status {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Extract a readable message from a Gemini error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body).map_or_else(
        |_| body.to_string(),
        |wrapper| {
            let message = wrapper.error.message.unwrap_or_else(|| body.to_string());
            match wrapper.error.status {
                Some(status) if !status.is_empty() => format!("{status}: {message}"),
                _ => message,
            }
        },
    )
}

/// Concatenated text of the first candidate's parts.
fn chunk_text(response: &GenerateContentResponse) -> String {
    response
        .candidates
        .as_deref()
        .and_then(<[Candidate]>::first)
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    fn from_request(request: &CompletionRequest, generation_config: GenerationConfig) -> Self {
        let mut contents: Vec<Content> = request
            .history
            .iter()
            .map(|turn| Content::text(Some(turn.role), &turn.text))
            .collect();
        contents.push(Content::text(Some(Role::User), &request.prompt));
        Self {
            contents,
            system_instruction: Content::text(None, &request.system_instruction),
            generation_config,
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<Role>, text: &str) -> Self {
        Self {
            role,
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}
