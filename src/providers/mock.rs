/*!
 * Scripted assistant provider for selector and translator tests.
 *
 * Constructors pick the scripted behavior:
 * - `MockProvider::replying(text)` - Always succeeds with a fixed reply
 * - `MockProvider::echo()` - Replies with the prompt it received
 * - `MockProvider::failing()` - Every call returns an API error
 * - `MockProvider::failing_first(n)` - Fails `n` times, then succeeds
 * - `MockProvider::unconfigured()` - Reports missing credentials
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::ProviderError;
use crate::providers::Provider;

/// Prompt as received by the mock
#[derive(Debug, Clone)]
pub struct MockRequest {
    /// The prompt sent to the provider
    pub prompt: String,
    /// Requested temperature
    pub temperature: Option<f32>,
}

/// Scripted reply
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// The reply text
    pub text: String,
}

/// How the mock answers each call
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with this reply
    Reply(String),
    /// Replies with the prompt itself
    Echo,
    /// Every `fail_every`-th call fails, the others echo
    Intermittent { fail_every: usize },
    /// Fails the first `failures` requests, then replies
    FailFirst { failures: usize, reply: String },
    /// Every call fails
    Failing,
    /// Replies with an empty string
    Empty,
    /// Sleeps before replying
    Slow { delay_ms: u64, reply: String },
}

/// Mock provider for testing assistant-backed behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Whether credentials count as present
    configured: bool,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Prompts received, in order
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Configured mock with `behavior`
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            configured: true,
            request_count: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always replies with `text`
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(MockBehavior::Reply(text.into()))
    }

    /// Create a mock that echoes the prompt
    pub fn echo() -> Self {
        Self::new(MockBehavior::Echo)
    }

    /// Mock failing on every `fail_every`-th call
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    /// Create a mock that fails `failures` times before replying
    pub fn failing_first(failures: usize, reply: impl Into<String>) -> Self {
        Self::new(MockBehavior::FailFirst { failures, reply: reply.into() })
    }

    /// Mock whose every call fails
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Mock replying with empty text
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that reports missing credentials
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new(MockBehavior::Failing)
        }
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior.clone(),
            configured: self.configured,
            request_count: Arc::clone(&self.request_count),
            prompts: Arc::clone(&self.prompts),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = MockRequest;
    type Response = MockResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.prompt.clone());
        }

        match &self.behavior {
            MockBehavior::Reply(text) => Ok(MockResponse { text: text.clone() }),

            MockBehavior::Echo => Ok(MockResponse { text: request.prompt }),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Scripted failure on call #{}", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(MockResponse { text: request.prompt })
                }
            }

            MockBehavior::FailFirst { failures, reply } => {
                if count < *failures {
                    Err(ProviderError::ConnectionError(format!("Simulated failure #{}", count + 1)))
                } else {
                    Ok(MockResponse { text: reply.clone() })
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Scripted assistant failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(MockResponse { text: String::new() }),

            MockBehavior::Slow { delay_ms, reply } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(*delay_ms)).await;
                Ok(MockResponse { text: reply.clone() })
            }
        }
    }

    fn text_request(&self, prompt: &str, temperature: Option<f32>) -> MockRequest {
        MockRequest {
            prompt: prompt.to_string(),
            temperature,
        }
    }

    fn extract_text(response: &Self::Response) -> String {
        response.text.clone()
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}
