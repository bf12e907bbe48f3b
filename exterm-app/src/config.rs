use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "./exterminal.yaml";
pub const CONFIG_PATH_ENV: &str = "EXTERM_CONFIG";
pub const ENDPOINT_ENV: &str = "EXTERM_LLM_ENDPOINT";
pub const MODEL_ENV: &str = "EXTERM_LLM_MODEL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub temperature: f32,
    pub max_retries: u32,
    pub cache_path: PathBuf,
    pub cache_retention_days: u64,
    pub context_budget_bytes: usize,
    pub max_repair_attempts: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-2024-08-06".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.0,
            max_retries: 2,
            cache_path: PathBuf::from("./data/response_cache.db"),
            cache_retention_days: 30,
            context_budget_bytes: 10_000,
            max_repair_attempts: 3,
        }
    }
}

impl Config {
    /// Path from `EXTERM_CONFIG`, falling back to `./exterminal.yaml`.
    pub fn default_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Read `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(MODEL_ENV).ok(),
        );
    }

    pub fn apply_overrides(&mut self, endpoint: Option<String>, model: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.base_url = endpoint;
        }
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.model = model;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            anyhow::bail!("base_url cannot be empty");
        }
        if self.model.trim().is_empty() {
            anyhow::bail!("model cannot be empty");
        }
        if self.context_budget_bytes == 0 {
            anyhow::bail!("context_budget_bytes must be greater than zero");
        }
        if self.cache_retention_days == 0 {
            anyhow::bail!("cache_retention_days must be greater than zero");
        }
        if self.max_repair_attempts == 0 {
            anyhow::bail!("max_repair_attempts must be greater than zero");
        }
        Ok(())
    }

    pub fn cache_retention(&self) -> Duration {
        Duration::from_secs(self.cache_retention_days.saturating_mul(24 * 60 * 60))
    }

    /// The API key, if the configured variable is set. Local servers often
    /// need none.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}
