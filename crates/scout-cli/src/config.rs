use std::env;
use tracing_subscriber::EnvFilter;

/// Directives applied when `RUST_LOG` is unset. Status lines and the
/// per-completion cost line are info events in the library, so they
/// must be visible in a default run.
const DEFAULT_LOG_FILTER: &str = "scout=info";

/// Where requests go and which model handles them when no flags are given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Defaults {
    pub endpoint: &'static str,
    pub model: &'static str,
}

/// Zero-config backend selection: a cloud endpoint when an API key is
/// present, otherwise a local OpenAI-compatible server (with the MLX
/// model build on macOS). Computed once at startup and injected into the
/// provider config; the core never reads the environment itself.
pub fn defaults(api_key_present: bool, macos: bool) -> Defaults {
    match (api_key_present, macos) {
        (true, _) => Defaults {
            endpoint: "https://api.openai.com/v1/chat/completions",
            model: "gpt-4.1-mini",
        },
        (false, true) => Defaults {
            endpoint: "http://localhost:1234/v1/chat/completions",
            model: "lmstudio-community/Qwen3-4B-MLX-8bit",
        },
        (false, false) => Defaults {
            endpoint: "http://localhost:1234/v1/chat/completions",
            model: "qwen/qwen3-4b",
        },
    }
}

/// Bearer token for the chat-completions endpoint. An empty token is
/// sent as-is; local endpoints ignore it.
pub fn api_key() -> String {
    env::var("OPENAI_API_KEY").unwrap_or_default()
}

/// `RUST_LOG` when set, otherwise the default directives.
pub fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into())
}
