//! `simplechat config`: Show the effective configuration.

use simplechat_config::AppConfig;
use std::path::Path;

pub fn show(config: &AppConfig, explicit_path: Option<&Path>) {
    let path = explicit_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));

    println!("# {}", path.display());
    if !config.has_api_key() {
        println!("# warning: no API key set (SIMPLECHAT_API_KEY, OPENAI_API_KEY or OPENROUTER_API_KEY)");
    }
    println!("{}", config.to_redacted_toml());
}
