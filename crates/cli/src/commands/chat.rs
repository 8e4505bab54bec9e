//! `simplechat chat`: Console chat bot without the HTTP gateway.

use simplechat::CliRunner;
use simplechat_config::AppConfig;

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = super::bootstrap(&config)?;
    let runner = CliRunner::new(state.service.clone(), &config.application.name);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());

    tokio::select! {
        result = runner.run(stdin, tokio::io::stdout()) => result?,
        _ = tokio::signal::ctrl_c() => {
            println!();
            // A pending stdin read would otherwise hold the runtime open.
            std::process::exit(0);
        }
    }

    Ok(())
}
