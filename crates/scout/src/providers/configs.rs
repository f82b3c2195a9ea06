use std::time::Duration;

/// Bounds for the rate-limit retry loop. A 429 response is retried with
/// exponential backoff until `max_retries` is exhausted, at which point
/// the call fails instead of blocking forever.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 6,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Connection and generation settings for an OpenAI-compatible
/// chat-completions endpoint. Defaults are computed by the caller
/// (see the CLI crate); this struct never reads the environment.
#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    /// Full chat-completions URL, e.g. `https://api.openai.com/v1/chat/completions`
    pub endpoint: String,
    /// Bearer token; may be empty for local endpoints
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: i32,
    pub retry: RetryConfig,
}

impl OpenAiProviderConfig {
    /// Config with the fixed generation parameters the agent runs with:
    /// a low temperature favoring determinism and a bounded output length.
    pub fn new<E, K, M>(endpoint: E, api_key: K, model: M) -> Self
    where
        E: Into<String>,
        K: Into<String>,
        M: Into<String>,
    {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.3,
            max_tokens: 4096,
            retry: RetryConfig::default(),
        }
    }
}
