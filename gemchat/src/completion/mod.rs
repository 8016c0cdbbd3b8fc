//! Completion service abstraction for AI contacts.
//!
//! Defines the [`CompletionAdapter`] trait that every completion backend
//! must satisfy. Concrete implementations:
//! - [`gemini::GeminiAdapter`]: Gemini REST API over reqwest
//! - [`scripted::ScriptedAdapter`]: in-process fixed replies for tests and
//!   offline mode
//!
//! # Invariant
//!
//! Adapters never fail past their boundary. A backend fault becomes a
//! human-readable fallback fragment, and every fragment stream terminates.

pub mod gemini;
pub mod scripted;

use futures_util::stream::BoxStream;

use gemchat_proto::history::HistoryTurn;

/// System prompt used when an AI contact has no persona instruction.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a helpful assistant.";

/// Text used when a reply comes back with no text at all.
pub const EMPTY_REPLY_FALLBACK: &str = "I'm sorry, I couldn't process that.";

/// Lazy, finite sequence of reply fragments. Concatenated in order they
/// form the full reply.
pub type FragmentStream = BoxStream<'static, String>;

/// Everything a backend needs to produce one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Persona / system prompt.
    pub system_instruction: String,
    /// Prior turns, oldest first.
    pub history: Vec<HistoryTurn>,
    /// The user's new message.
    pub prompt: String,
}

impl CompletionRequest {
    /// Build a request, falling back to [`DEFAULT_SYSTEM_INSTRUCTION`]
    /// when no persona is given.
    pub fn new(
        system_instruction: Option<&str>,
        history: Vec<HistoryTurn>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            system_instruction: system_instruction
                .unwrap_or(DEFAULT_SYSTEM_INSTRUCTION)
                .to_owned(),
            history,
            prompt: prompt.into(),
        }
    }
}

/// Errors inside a completion backend.
///
/// These are logged and converted to fallback text by the adapter; only
/// construction errors reach callers.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// No API key was configured.
    #[error("missing API key for the completion service")]
    MissingApiKey,

    /// The configured base URL is not a valid URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service returned status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the body.
        message: String,
    },

    /// A response chunk was not valid JSON.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The event stream was cut or could not be framed.
    #[error("event stream failed: {0}")]
    EventStream(#[from] eventsource_stream::EventStreamError<reqwest::Error>),

    /// The service went quiet for longer than the request timeout.
    #[error("no response from the service within {0:?}")]
    Timeout(std::time::Duration),
}

/// Async completion backend for AI contacts.
///
/// Implementations are shared across lifecycles (`Arc<A>`) and called
/// concurrently for different conversations.
pub trait CompletionAdapter: Send + Sync + 'static {
    /// Stream the reply as incremental text fragments.
    ///
    /// The stream always terminates. On failure it yields one fallback
    /// fragment instead of an error.
    fn stream(&self, request: CompletionRequest) -> FragmentStream;

    /// Produce the whole reply at once, for when streaming is unavailable.
    ///
    /// Never fails; backend faults become fallback text.
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> impl std::future::Future<Output = String> + Send;
}
