//! Scripted completion adapter for testing and offline mode.
//!
//! [`ScriptedAdapter`] answers every request with the same fragment list,
//! optionally pausing between fragments to imitate a live stream, and
//! records every request so tests can inspect the history window.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use parking_lot::Mutex;

use super::{CompletionAdapter, CompletionRequest, FragmentStream};

/// In-process adapter with a fixed reply.
#[derive(Clone)]
pub struct ScriptedAdapter {
    /// Fragments yielded for every request.
    fragments: Arc<Vec<String>>,
    /// Pause before each fragment.
    fragment_delay: Duration,
    /// Every request received, in call order.
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl ScriptedAdapter {
    /// Create an adapter that replies with `fragments`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use gemchat::completion::scripted::ScriptedAdapter;
    ///
    /// let adapter = ScriptedAdapter::new(["Hi", " there", "!"]);
    /// ```
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: Arc::new(fragments.into_iter().map(Into::into).collect()),
            fragment_delay: Duration::ZERO,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// An adapter whose streams yield nothing.
    #[must_use]
    pub fn silent() -> Self {
        Self::new(Vec::<String>::new())
    }

    /// Reply used by the binary when no API key is configured.
    #[must_use]
    pub fn offline_demo() -> Self {
        Self::new([
            "I'm running in offline mode, ",
            "so I can't reach the AI service right now. ",
            "Set GEMINI_API_KEY to chat for real! \u{1f916}",
        ])
        .with_fragment_delay(Duration::from_millis(250))
    }

    /// Pause for `delay` before yielding each fragment.
    #[must_use]
    pub const fn with_fragment_delay(mut self, delay: Duration) -> Self {
        self.fragment_delay = delay;
        self
    }

    /// All requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

impl CompletionAdapter for ScriptedAdapter {
    fn stream(&self, request: CompletionRequest) -> FragmentStream {
        self.requests.lock().push(request);
        let delay = self.fragment_delay;
        let fragments: Vec<String> = self.fragments.as_ref().clone();
        futures_util::stream::iter(fragments)
            .then(move |fragment| async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                fragment
            })
            .boxed()
    }

    async fn complete(&self, request: CompletionRequest) -> String {
        self.requests.lock().push(request);
        self.fragments.concat()
    }
}
