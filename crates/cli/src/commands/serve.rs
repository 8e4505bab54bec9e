//! `simplechat serve`: Start the HTTP gateway.

use simplechat::CliRunner;
use simplechat_config::AppConfig;

pub async fn run(mut config: AppConfig, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let state = super::bootstrap(&config)?;
    let server = simplechat_gateway::start(&config, state.clone());
    tokio::pin!(server);

    if !config.application.cli {
        println!("SimpleChat gateway");
        println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
        println!("   Provider:  {} ({})", config.provider.name, config.provider.model);
        return server.await;
    }

    // The console bot runs next to the server; the server outlives it.
    let runner = CliRunner::new(state.service.clone(), &config.application.name);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = &mut server => return result,
        result = runner.run(stdin, tokio::io::stdout()) => {
            if let Err(e) = result {
                eprintln!("Console chat stopped: {e}");
            }
        }
    }

    server.await
}
