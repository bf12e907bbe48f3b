use crate::decision::Decision;
use crate::dispatcher::{CommandDispatcher, DispatchReport};
use crate::input::TurnInput;
use crate::oracle::{Oracle, OracleError, OracleRequest};
use exterm_cache::{CacheError, ResponseCache};
use exterm_executor::{EnvironmentSnapshot, ShellState};
use exterm_memory::{ContextStore, DEFAULT_CONTEXT_BUDGET};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("Response cache failed: {0}")]
    Cache(#[from] CacheError),
    #[error("Nothing to do: the input is empty")]
    EmptyInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    Cache,
    Oracle,
}

#[derive(Debug)]
pub struct TurnReport {
    pub source: DecisionSource,
    pub decision: Decision,
    pub dispatch: DispatchReport,
}

/// Runs one user turn end to end: environment refresh, transcript update,
/// cache lookup or oracle call, then dispatch.
pub struct TurnEngine {
    oracle: Arc<dyn Oracle>,
    cache: Arc<ResponseCache>,
    dispatcher: CommandDispatcher,
    context: ContextStore,
    shell: ShellState,
    context_budget: usize,
}

impl TurnEngine {
    pub fn new(
        oracle: Arc<dyn Oracle>,
        cache: Arc<ResponseCache>,
        dispatcher: CommandDispatcher,
        context: ContextStore,
        shell: ShellState,
    ) -> Self {
        Self {
            oracle,
            cache,
            dispatcher,
            context,
            shell,
            context_budget: DEFAULT_CONTEXT_BUDGET,
        }
    }

    pub fn with_context_budget(mut self, budget: usize) -> Self {
        self.context_budget = budget;
        self
    }

    pub async fn handle_turn(&mut self, raw_input: &str) -> Result<TurnReport, EngineError> {
        let input = TurnInput::parse(raw_input);
        if input.is_empty() {
            return Err(EngineError::EmptyInput);
        }

        let snapshot = EnvironmentSnapshot::capture(self.shell.cwd());
        debug!("{}", snapshot.to_concise_string());
        self.context
            .set_environment(&snapshot.directory, &snapshot.files);

        self.context.append_user(input.text.clone());
        self.context.trim_to_budget(self.context_budget);

        let key = input.cache_key();
        let cached = if input.bypass_cache {
            info!("Cache bypassed for: {}", key);
            None
        } else {
            self.lookup(&key)?
        };

        let (source, decision) = match cached {
            Some(decision) => (DecisionSource::Cache, decision),
            None => {
                let request = OracleRequest {
                    transcript: self.context.messages(),
                    world_model: self.context.world_model(),
                    user_input: &input.text,
                };
                let decision = self.oracle.decide(&request).await?;
                self.cache.put(&key, &decision)?;
                (DecisionSource::Oracle, decision)
            }
        };

        info!(
            "Decision from {:?} with {} directives",
            source,
            decision.directives.len()
        );
        if !decision.rationale.is_empty() {
            debug!("Rationale: {}", decision.rationale);
        }

        self.context.merge_world_model(&decision.world_model_delta);
        let dispatch = self
            .dispatcher
            .dispatch(decision.directives.clone(), &mut self.context, &mut self.shell)
            .await;

        Ok(TurnReport {
            source,
            decision,
            dispatch,
        })
    }

    fn lookup(&self, key: &str) -> Result<Option<Decision>, EngineError> {
        match self.cache.get::<Decision>(key) {
            Ok(hit) => Ok(hit),
            Err(CacheError::Serialization(e)) => {
                warn!("Ignoring unreadable cache entry for {:?}: {}", key, e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Back to the system instruction alone with an empty world model.
    pub fn reset(&mut self) {
        self.context.reset();
    }

    pub fn context(&self) -> &ContextStore {
        &self.context
    }

    pub fn shell(&self) -> &ShellState {
        &self.shell
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}
