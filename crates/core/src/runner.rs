use exterm_executor::{parse_directory_change, ShellRunner, ShellState};
use exterm_interfaces::Interface;
use exterm_memory::ContextStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Output recorded when a command succeeds without printing anything.
pub const EMPTY_OUTPUT_MESSAGE: &str = "Command executed successfully.";

/// A command that exited non-zero, with the text the user and the oracle
/// see for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    pub command: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Recorded output.
    Succeeded(String),
    /// A `cd` that could not be applied. Reported, never repaired.
    DirectoryChangeFailed(String),
    Failed(CommandFailure),
}

pub fn command_entry(command: &str, output: &str) -> String {
    format!("COMMAND: {}\nOUTPUT: {}", command, output)
}

/// Runs one command line on behalf of the dispatcher and the repair
/// engine, and records successful results in the transcript.
pub struct CommandRunner {
    shell: Arc<dyn ShellRunner>,
    ui: Arc<dyn Interface>,
}

impl CommandRunner {
    pub fn new(shell: Arc<dyn ShellRunner>, ui: Arc<dyn Interface>) -> Self {
        Self { shell, ui }
    }

    pub async fn run(
        &self,
        command: &str,
        context: &mut ContextStore,
        state: &mut ShellState,
    ) -> CommandOutcome {
        self.ui
            .show_status(&format!("Running command: {}", command))
            .await;

        if let Some(target) = parse_directory_change(command) {
            return self.change_directory(command, &target, context, state).await;
        }

        let output = match self.shell.run(command, state.cwd()).await {
            Ok(output) => output,
            Err(e) => {
                warn!("Could not run `{}`: {}", command, e);
                let failure = CommandFailure {
                    command: command.to_string(),
                    error: e.to_string(),
                };
                self.ui.show_error(&failure.error).await;
                return CommandOutcome::Failed(failure);
            }
        };

        if !output.success() {
            let failure = CommandFailure {
                command: command.to_string(),
                error: output.error_text(),
            };
            info!("Command `{}` failed: {:?}", command, output.exit_code);
            self.ui.show_error(&failure.error).await;
            return CommandOutcome::Failed(failure);
        }

        let text = if output.stdout.trim().is_empty() {
            EMPTY_OUTPUT_MESSAGE.to_string()
        } else {
            output.stdout
        };
        debug!("Command `{}` produced {} bytes", command, text.len());

        self.ui.send_output(text.trim_end()).await;
        context.append_assistant(command_entry(command, &text));
        CommandOutcome::Succeeded(text)
    }

    async fn change_directory(
        &self,
        command: &str,
        target: &str,
        context: &mut ContextStore,
        state: &mut ShellState,
    ) -> CommandOutcome {
        match state.change_directory(target) {
            Ok(path) => {
                let text = format!("Changed directory to {}", path.display());
                self.ui.send_output(&text).await;
                context.append_assistant(command_entry(command, &text));
                CommandOutcome::Succeeded(text)
            }
            Err(e) => {
                let text = e.to_string();
                self.ui.show_error(&text).await;
                context.append_assistant(command_entry(command, &text));
                CommandOutcome::DirectoryChangeFailed(text)
            }
        }
    }

    /// Ask before running a confirm-gated command. Only an explicit answer
    /// starting with `n`, or end of input, declines.
    pub async fn confirm(&self, command: &str) -> bool {
        let answer = self
            .ui
            .ask(&format!("Would you like to run the command: {}?", command))
            .await;

        match answer {
            None => false,
            Some(answer) => !answer.trim().to_lowercase().starts_with('n'),
        }
    }

    pub fn ui(&self) -> &Arc<dyn Interface> {
        &self.ui
    }
}

pub fn skipped_entry(command: &str) -> String {
    format!("SKIPPED: {}", command)
}
