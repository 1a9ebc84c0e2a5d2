use crate::provider::ProviderError;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

pub fn resolve_anthropic_model(model: &str) -> Result<String, ProviderError> {
    match model.trim() {
        "sonnet" => Ok(DEFAULT_MODEL.to_string()),
        "opus" => Ok("claude-opus-4-20250514".to_string()),
        "haiku" => Ok("claude-3-5-haiku-20241022".to_string()),
        full if full.starts_with("claude-") && full.len() > "claude-".len() => {
            Ok(full.to_string())
        }
        other => Err(ProviderError::UnsupportedAnthropicModel(other.to_string())),
    }
}
