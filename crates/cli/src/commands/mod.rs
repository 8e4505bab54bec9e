pub mod chat;
pub mod config_cmd;
pub mod serve;

use simplechat_config::AppConfig;
use simplechat_gateway::SharedState;

/// Build the chat service, explaining how to set a key when that is what failed.
pub fn bootstrap(config: &AppConfig) -> Result<SharedState, Box<dyn std::error::Error>> {
    simplechat_gateway::bootstrap(config).map_err(|e| {
        if !config.has_api_key() {
            eprintln!();
            eprintln!("  ERROR: No API key configured!");
            eprintln!();
            eprintln!("  Set SIMPLECHAT_API_KEY (or OPENAI_API_KEY / OPENROUTER_API_KEY),");
            eprintln!("  or add provider.api_key to {}", AppConfig::config_dir().join("config.toml").display());
            eprintln!("  Local servers (provider.name = \"ollama\", \"vllm\", \"llamacpp\") need no key.");
            eprintln!();
        }
        e.into()
    })
}
