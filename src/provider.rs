use std::time::Duration;

pub mod anthropic;
pub mod link_check;
pub mod model_map;
pub mod output_parse;

pub use anthropic::AnthropicClient;
pub use link_check::{HttpLinkVerifier, LinkProbe, LinkVerifier};
pub use model_map::resolve_anthropic_model;
pub use output_parse::{extract_json_object, parse_embedded};

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("missing api key; set `{env_var}`")]
    MissingApiKey { env_var: String },
    #[error("unsupported anthropic model `{0}`")]
    UnsupportedAnthropicModel(String),
    #[error("completion request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("completion request failed: {0}")]
    Transport(String),
    #[error("completion api returned http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("completion output parse failure: {reason}")]
    ParseFailure { reason: String },
}

impl ProviderError {
    /// Failures worth another attempt: timeouts, connection problems, rate
    /// limits, server errors, and completions that did not match the expected
    /// embedded schema.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Timeout { .. }
            | ProviderError::Transport(_)
            | ProviderError::ParseFailure { .. } => true,
            ProviderError::Http { status, .. } => *status == 429 || *status >= 500,
            ProviderError::MissingApiKey { .. } | ProviderError::UnsupportedAnthropicModel(_) => {
                false
            }
        }
    }
}

/// Text-completion collaborator used by the step executors.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError>;
}

pub(crate) fn transport_error(err: ureq::Transport, timeout: Duration) -> ProviderError {
    let message = err.to_string();
    if message.contains("timed out") {
        ProviderError::Timeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    } else {
        ProviderError::Transport(message)
    }
}
