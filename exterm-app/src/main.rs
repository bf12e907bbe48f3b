use anyhow::{Context, Result};
use exterm_app::bootstrap;
use exterm_app::{Config, Repl};
use exterm_executor::ShellState;
use exterm_interfaces::TerminalInterface;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config_path = Config::default_path();
    let mut config = Config::load(&config_path)?;
    config.apply_env_overrides();
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;
    tracing::info!("Using model {} at {}", config.model, config.base_url);

    let cache = bootstrap::open_cache(&config)?;
    let oracle = bootstrap::build_oracle(&config);
    let state = ShellState::from_process().context("Failed to read the working directory")?;
    let terminal = Arc::new(TerminalInterface::new());

    let engine = bootstrap::build_engine(
        &config,
        oracle,
        cache,
        bootstrap::system_shell(),
        terminal.clone(),
        state,
    );

    Repl::new(engine, terminal).run().await;
    Ok(())
}
