use crate::directive::Directive;
use crate::repair::{RepairEngine, RepairError};
use crate::runner::{skipped_entry, CommandOutcome, CommandRunner};
use exterm_executor::ShellState;
use exterm_memory::ContextStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

pub const NOINFO_MESSAGE: &str = "There is not enough information to execute the command. \
     Please resend the command with more information or a different command.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

/// The in-flight directive list. A successful repair swaps the whole
/// backing list while the dispatcher keeps its position.
#[derive(Debug, Clone, Default)]
pub struct DirectivePlan {
    directives: Vec<Directive>,
}

impl DirectivePlan {
    pub fn new(directives: Vec<Directive>) -> Self {
        Self { directives }
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Directive> {
        self.directives.get(index)
    }

    pub fn replace(&mut self, directives: Vec<Directive>) {
        self.directives = directives;
    }

    pub fn as_slice(&self) -> &[Directive] {
        &self.directives
    }

    pub fn into_inner(self) -> Vec<Directive> {
        self.directives
    }
}

/// What happened to the directive at `index`.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveRecord {
    pub index: usize,
    pub directive: Directive,
    pub state: DirectiveState,
    /// The directive came from a repair patch.
    pub repaired: bool,
}

#[derive(Debug)]
pub struct DispatchReport {
    pub records: Vec<DirectiveRecord>,
    /// The final in-flight list, including any spliced patch.
    pub directives: Vec<Directive>,
    /// Why processing stopped early, if it did.
    pub halted: Option<RepairError>,
}

impl DispatchReport {
    pub fn completed(&self) -> bool {
        self.halted.is_none()
    }

    pub fn state(&self, index: usize) -> DirectiveState {
        self.records
            .iter()
            .find(|r| r.index == index)
            .map(|r| r.state)
            .unwrap_or(DirectiveState::Pending)
    }
}

pub struct CommandDispatcher {
    runner: CommandRunner,
    repair: RepairEngine,
}

impl CommandDispatcher {
    pub fn new(runner: CommandRunner, repair: RepairEngine) -> Self {
        Self { runner, repair }
    }

    /// Process `directives` strictly in order. The index is re-checked
    /// against the plan on every step because repair may replace it.
    pub async fn dispatch(
        &self,
        directives: Vec<Directive>,
        context: &mut ContextStore,
        state: &mut ShellState,
    ) -> DispatchReport {
        let ui = self.runner.ui().clone();
        let mut plan = DirectivePlan::new(directives);
        let mut records = Vec::new();
        let mut halted = None;
        let mut index = 0;

        while let Some(directive) = plan.get(index).cloned() {
            debug!("[{}] {:?}: {}", index, DirectiveState::Running, directive);

            let command = match &directive {
                Directive::Answer { text } => {
                    ui.send_output(text).await;
                    context.append_assistant(format!("ANSWER: {}", text));
                    records.push(record(index, directive, DirectiveState::Succeeded, false));
                    index += 1;
                    continue;
                }
                Directive::NoInfo => {
                    ui.send_output(NOINFO_MESSAGE).await;
                    context.append_assistant("NOINFO");
                    records.push(record(index, directive, DirectiveState::Succeeded, false));
                    index += 1;
                    continue;
                }
                Directive::ExecuteConfirm { cmd } => cmd.clone(),
                Directive::Execute { cmd } => cmd.clone(),
            };

            if matches!(directive, Directive::ExecuteConfirm { .. })
                && !self.runner.confirm(&command).await
            {
                info!("Skipped `{}`", command);
                context.append_assistant(skipped_entry(&command));
                records.push(record(index, directive, DirectiveState::Skipped, false));
                index += 1;
                continue;
            }

            let failure = match self.runner.run(&command, context, state).await {
                CommandOutcome::Succeeded(_) => {
                    records.push(record(index, directive, DirectiveState::Succeeded, false));
                    index += 1;
                    continue;
                }
                CommandOutcome::DirectoryChangeFailed(_) => {
                    records.push(record(index, directive, DirectiveState::Failed, false));
                    index += 1;
                    continue;
                }
                CommandOutcome::Failed(failure) => failure,
            };

            match self
                .repair
                .repair(&self.runner, failure.clone(), plan.as_slice(), index, context, state)
                .await
            {
                Ok(outcome) => {
                    plan.replace(outcome.directives);
                    let patched = plan.get(index).cloned().unwrap_or(directive);
                    records.push(record(index, patched, outcome.state, true));
                }
                Err(e) => {
                    error!("Halting dispatch at index {}: {}", index, e);
                    let last = e.failure().unwrap_or(&failure);
                    context.append_assistant(format!(
                        "FAILED: {}\nERROR: {}",
                        last.command, last.error
                    ));
                    ui.show_error(&e.to_string()).await;
                    records.push(record(index, directive, DirectiveState::Failed, false));
                    halted = Some(e);
                    break;
                }
            }

            index += 1;
        }

        DispatchReport {
            records,
            directives: plan.into_inner(),
            halted,
        }
    }
}

fn record(
    index: usize,
    directive: Directive,
    state: DirectiveState,
    repaired: bool,
) -> DirectiveRecord {
    DirectiveRecord {
        index,
        directive,
        state,
        repaired,
    }
}
