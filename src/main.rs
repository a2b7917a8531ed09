//! Triproute binary: HTTP server, one-shot queries, config template

use clap::Parser;
use triproute::cli::{Cli, Command, generate_config_template};
use triproute::config::Config;
use triproute::handlers::{self, AppState};
use triproute::orchestration::Strategy;
use triproute::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Config { output }) => {
            let template = generate_config_template();
            match output {
                Some(path) => {
                    std::fs::write(&path, template)?;
                    eprintln!("Configuration template written to {path}");
                }
                None => print!("{template}"),
            }
            Ok(())
        }
        Some(Command::Ask {
            query,
            strategy,
            json,
        }) => ask(&cli.config, &query, &strategy, json).await,
        Some(Command::Serve) | None => serve(&cli.config).await,
    }
}

async fn ask(
    config_path: &str,
    query: &str,
    strategy: &str,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let strategy: Strategy = strategy.parse()?;
    let config = Config::from_file(config_path)?;
    telemetry::init(&config.observability.log_level);

    let snapshot_dir = config.ledger.snapshot_dir.clone();
    let state = AppState::new(config)?;

    let outcome = state.orchestrator().respond_with(query, strategy).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("[{}] {}", outcome.pattern(), outcome.answer());
        println!("{}", state.collector().summary());
    }
    state.collector().flush_sinks();

    if let Some(dir) = snapshot_dir {
        let path = state.collector().save_snapshot(dir)?;
        eprintln!("Metrics snapshot saved to {}", path.display());
    }

    Ok(())
}

async fn serve(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_file(config_path)?;
    telemetry::init(&config.observability.log_level);

    let addr = config.server.socket_addr()?;

    let state = AppState::new(config)?;
    for handle in state.orchestrator().context().registry().handles() {
        tracing::info!(
            role = %handle.role(),
            name = %handle.name(),
            model = %handle.model(),
            base_url = %handle.base_url(),
            "Model configured"
        );
    }

    let app = handlers::router(state.clone());

    tracing::info!("Starting Triproute server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(calls = state.collector().len(), "Server stopped");
    state.collector().flush_sinks();
    if let Some(dir) = &state.config().ledger.snapshot_dir {
        match state.collector().save_snapshot(dir) {
            Ok(path) => tracing::info!(path = %path.display(), "Final metrics snapshot saved"),
            Err(e) => tracing::error!(error = %e, "Failed to save final metrics snapshot"),
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
