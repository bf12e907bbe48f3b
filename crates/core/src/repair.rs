use crate::directive::Directive;
use crate::dispatcher::DirectiveState;
use crate::oracle::{Oracle, OracleError, RepairRequest};
use crate::runner::{skipped_entry, CommandFailure, CommandOutcome, CommandRunner};
use exterm_executor::ShellState;
use exterm_interfaces::Interface;
use exterm_memory::{ContextStore, DEFAULT_CONTEXT_BUDGET};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_MAX_REPAIR_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum RepairError {
    #[error("Repair declined for `{}`: {}", .0.command, .0.error)]
    Declined(CommandFailure),
    #[error("Cannot fix the command: {0}")]
    Unrecoverable(String),
    #[error(
        "Gave up on `{}` after {attempts} repair attempts: {}",
        .failure.command,
        .failure.error
    )]
    Exhausted {
        attempts: usize,
        failure: CommandFailure,
    },
    #[error("Repair patch is invalid: {0}")]
    InvalidPatch(String),
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

impl RepairError {
    /// The last command failure behind this error, where there is one.
    pub fn failure(&self) -> Option<&CommandFailure> {
        match self {
            RepairError::Declined(failure) | RepairError::Exhausted { failure, .. } => {
                Some(failure)
            }
            _ => None,
        }
    }
}

/// A patch that ran. `directives` replaces the in-flight list.
#[derive(Debug, Clone, PartialEq)]
pub struct RepairOutcome {
    pub directives: Vec<Directive>,
    pub state: DirectiveState,
}

/// Drives the consent, patch, and re-run cycle for one failed directive.
pub struct RepairEngine {
    oracle: Arc<dyn Oracle>,
    ui: Arc<dyn Interface>,
    max_attempts: usize,
    context_budget: usize,
}

impl RepairEngine {
    pub fn new(oracle: Arc<dyn Oracle>, ui: Arc<dyn Interface>) -> Self {
        Self {
            oracle,
            ui,
            max_attempts: DEFAULT_MAX_REPAIR_ATTEMPTS,
            context_budget: DEFAULT_CONTEXT_BUDGET,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Upper bound, in bytes, on the transcript entry sent with a repair.
    pub fn with_context_budget(mut self, budget: usize) -> Self {
        self.context_budget = budget;
        self
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Repair the directive at `index` of `directives`. Every attempt is
    /// gated on the user's consent.
    pub async fn repair(
        &self,
        runner: &CommandRunner,
        failure: CommandFailure,
        directives: &[Directive],
        index: usize,
        context: &mut ContextStore,
        state: &mut ShellState,
    ) -> Result<RepairOutcome, RepairError> {
        let mut failure = failure;
        let mut directives = directives.to_vec();

        for attempt in 1..=self.max_attempts {
            if !self.consent().await {
                info!("Repair of `{}` declined", failure.command);
                return Err(RepairError::Declined(failure));
            }

            self.ui.show_status("Auto fixing the error...").await;
            info!(
                "Repair attempt {}/{} for `{}`",
                attempt, self.max_attempts, failure.command
            );

            let request = RepairRequest {
                last_entry: context.last().truncated(self.context_budget),
                failing_command: failure.command.clone(),
                error: failure.error.clone(),
                directives: directives.clone(),
                index,
            };
            let patch = self.oracle.repair(&request).await?;

            let replacement = patch.directives.get(index).cloned().ok_or_else(|| {
                RepairError::InvalidPatch(format!(
                    "{} directives returned, none at index {}",
                    patch.directives.len(),
                    index
                ))
            })?;
            context.merge_world_model(&patch.world_model_delta);

            let command = match &replacement {
                Directive::Answer { text } => {
                    self.ui.send_output(text).await;
                    context.append_assistant(format!("ANSWER: {}", text));
                    return Err(RepairError::Unrecoverable(text.clone()));
                }
                Directive::NoInfo => {
                    return Err(RepairError::Unrecoverable(
                        "not enough information to fix the command".to_string(),
                    ));
                }
                Directive::ExecuteConfirm { cmd } => {
                    if !runner.confirm(cmd).await {
                        context.append_assistant(skipped_entry(cmd));
                        return Ok(RepairOutcome {
                            directives: patch.directives,
                            state: DirectiveState::Skipped,
                        });
                    }
                    cmd.clone()
                }
                Directive::Execute { cmd } => cmd.clone(),
            };

            match runner.run(&command, context, state).await {
                CommandOutcome::Succeeded(_) => {
                    return Ok(RepairOutcome {
                        directives: patch.directives,
                        state: DirectiveState::Succeeded,
                    });
                }
                CommandOutcome::DirectoryChangeFailed(_) => {
                    return Ok(RepairOutcome {
                        directives: patch.directives,
                        state: DirectiveState::Failed,
                    });
                }
                CommandOutcome::Failed(next) => {
                    warn!("Patched command `{}` failed again", next.command);
                    failure = next;
                    directives = patch.directives;
                }
            }
        }

        Err(RepairError::Exhausted {
            attempts: self.max_attempts,
            failure,
        })
    }

    async fn consent(&self) -> bool {
        let answer = self
            .ui
            .ask("An error occurred while running the command. Would you like to auto fix it?")
            .await;

        matches!(answer, Some(a) if a.trim().to_lowercase().starts_with('y'))
    }
}
