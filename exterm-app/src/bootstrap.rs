use crate::config::Config;
use anyhow::{Context, Result};
use exterm_cache::ResponseCache;
use exterm_core::{
    CommandDispatcher, CommandRunner, LlmOracle, Oracle, RepairEngine, TurnEngine, SYSTEM_PROMPT,
};
use exterm_executor::{ShellRunner, ShellState, SystemShell};
use exterm_interfaces::Interface;
use exterm_memory::ContextStore;
use exterm_providers::OpenAICompatibleProvider;
use std::sync::Arc;

/// Open the response cache and run startup maintenance. Failure here is
/// fatal: the shell does not run without its cache.
pub fn open_cache(config: &Config) -> Result<Arc<ResponseCache>> {
    let cache = ResponseCache::open(&config.cache_path)
        .with_context(|| format!("Failed to open cache at {}", config.cache_path.display()))?;

    let evicted = cache
        .evict_older_than(config.cache_retention())
        .context("Failed to evict stale cache entries")?;
    tracing::info!(
        "Evicted {} cache entries older than {} days",
        evicted,
        config.cache_retention_days
    );

    Ok(Arc::new(cache))
}

pub fn build_oracle(config: &Config) -> Arc<dyn Oracle> {
    let api_key = config.api_key();
    if api_key.is_none() {
        tracing::warn!("{} is not set; sending requests without a key", config.api_key_env);
    }

    let provider =
        OpenAICompatibleProvider::new(config.base_url.clone(), api_key, config.model.clone())
            .with_max_retries(config.max_retries);

    Arc::new(LlmOracle::new(Arc::new(provider), config.temperature))
}

/// Wire the engine from its collaborators.
pub fn build_engine(
    config: &Config,
    oracle: Arc<dyn Oracle>,
    cache: Arc<ResponseCache>,
    shell: Arc<dyn ShellRunner>,
    ui: Arc<dyn Interface>,
    state: ShellState,
) -> TurnEngine {
    let runner = CommandRunner::new(shell, ui.clone());
    let repair = RepairEngine::new(oracle.clone(), ui)
        .with_max_attempts(config.max_repair_attempts)
        .with_context_budget(config.context_budget_bytes);

    TurnEngine::new(
        oracle,
        cache,
        CommandDispatcher::new(runner, repair),
        ContextStore::new(SYSTEM_PROMPT),
        state,
    )
    .with_context_budget(config.context_budget_bytes)
}

pub fn system_shell() -> Arc<dyn ShellRunner> {
    Arc::new(SystemShell::new())
}
