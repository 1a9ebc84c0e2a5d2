use crate::provider::{
    resolve_anthropic_model, transport_error, CompletionClient, ProviderError,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Messages API client. Every request carries the configured deadline.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    agent: ureq::Agent,
    api_base: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<RequestMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    pub fn new(
        api_key: impl Into<String>,
        model: &str,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey {
                env_var: ANTHROPIC_API_KEY_ENV.to_string(),
            });
        }
        Ok(Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            api_base: DEFAULT_ANTHROPIC_API_BASE.to_string(),
            api_key,
            model: resolve_anthropic_model(model)?,
            timeout,
        })
    }

    pub fn from_env(model: &str, timeout: Duration) -> Result<Self, ProviderError> {
        let api_key = std::env::var(ANTHROPIC_API_KEY_ENV).unwrap_or_default();
        Self::new(api_key, model, timeout)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base.trim_end_matches('/'), path)
    }
}

impl CompletionClient for AnthropicClient {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, ProviderError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: vec![RequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = match self
            .agent
            .post(&self.endpoint("messages"))
            .set("x-api-key", &self.api_key)
            .set("anthropic-version", ANTHROPIC_VERSION)
            .send_json(&request)
        {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                return Err(ProviderError::Http {
                    status,
                    body: response.into_string().unwrap_or_default(),
                })
            }
            Err(ureq::Error::Transport(err)) => return Err(transport_error(err, self.timeout)),
        };

        let parsed: MessagesResponse =
            response
                .into_json()
                .map_err(|err| ProviderError::ParseFailure {
                    reason: format!("messages response is not valid json: {err}"),
                })?;
        collect_text(parsed)
    }
}

fn collect_text(response: MessagesResponse) -> Result<String, ProviderError> {
    let text = response
        .content
        .into_iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("\n");
    if text.trim().is_empty() {
        return Err(ProviderError::ParseFailure {
            reason: "messages response has no text content".to_string(),
        });
    }
    Ok(text)
}
