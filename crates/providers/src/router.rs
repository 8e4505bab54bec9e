//! Provider construction from configuration.
//!
//! Resolves the base URL for well-known provider names and builds the
//! matching OpenAI-compatible client.

use std::sync::Arc;
use std::time::Duration;

use simplechat_config::ProviderConfig;
use simplechat_core::error::ProviderError;
use simplechat_core::provider::Provider;
use tracing::info;

use crate::openai_compat::OpenAiCompatProvider;

/// Build the configured provider.
pub fn build_from_config(config: &ProviderConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let base_url = config
        .api_url
        .clone()
        .unwrap_or_else(|| default_base_url(&config.name));

    if config.api_key.is_none() && requires_api_key(&config.name) {
        return Err(ProviderError::NotConfigured(format!(
            "provider '{}' needs an API key (set SIMPLECHAT_API_KEY or provider.api_key)",
            config.name
        )));
    }

    info!(provider = %config.name, base_url = %base_url, model = %config.model, "Building provider");

    let provider = OpenAiCompatProvider::new(
        &config.name,
        base_url,
        config.api_key.clone().unwrap_or_default(),
        Duration::from_secs(config.timeout_secs),
    )?;

    Ok(Arc::new(provider))
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "anthropic" => "https://api.anthropic.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

/// Local servers run without credentials.
fn requires_api_key(provider_name: &str) -> bool {
    !matches!(provider_name, "ollama" | "vllm" | "llamacpp" | "llama.cpp")
}
