//! Scripted doubles for the oracle, shell and interactive surface.

#![allow(dead_code, clippy::unwrap_used)]

use async_trait::async_trait;
use exterm_cache::ResponseCache;
use exterm_core::*;
use exterm_executor::{CommandOutput, ExecutorError, ShellRunner, ShellState};
use exterm_interfaces::Interface;
use exterm_memory::{ContextStore, DEFAULT_CONTEXT_BUDGET};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Replies with queued decisions and records what it was asked.
#[derive(Default)]
pub struct ScriptedOracle {
    decisions: Mutex<VecDeque<Result<Decision, OracleError>>>,
    patches: Mutex<VecDeque<Result<Decision, OracleError>>>,
    pub decide_inputs: Mutex<Vec<String>>,
    pub repair_requests: Mutex<Vec<RepairRequest>>,
}

impl ScriptedOracle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_decision(&self, directives: Vec<Directive>) {
        self.decisions
            .lock()
            .unwrap()
            .push_back(Ok(Decision::new(directives)));
    }

    pub fn push_decision_result(&self, result: Result<Decision, OracleError>) {
        self.decisions.lock().unwrap().push_back(result);
    }

    pub fn push_patch(&self, directives: Vec<Directive>) {
        self.patches
            .lock()
            .unwrap()
            .push_back(Ok(Decision::new(directives)));
    }

    pub fn decide_calls(&self) -> usize {
        self.decide_inputs.lock().unwrap().len()
    }

    pub fn repair_calls(&self) -> usize {
        self.repair_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn decide(&self, request: &OracleRequest<'_>) -> Result<Decision, OracleError> {
        self.decide_inputs
            .lock()
            .unwrap()
            .push(request.user_input.to_string());
        self.decisions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(OracleError::EmptyResponse))
    }

    async fn repair(&self, request: &RepairRequest) -> Result<Decision, OracleError> {
        self.repair_requests.lock().unwrap().push(request.clone());
        self.patches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(OracleError::EmptyResponse))
    }
}

/// Records every command and answers with queued outputs. An unscripted
/// command succeeds with empty stdout.
#[derive(Default)]
pub struct ScriptedShell {
    outputs: Mutex<VecDeque<CommandOutput>>,
    pub commands: Mutex<Vec<String>>,
}

impl ScriptedShell {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_success(&self, stdout: &str) {
        self.outputs.lock().unwrap().push_back(CommandOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: Some(0),
        });
    }

    pub fn push_failure(&self, code: i32, stderr: &str) {
        self.outputs.lock().unwrap().push_back(CommandOutput {
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code: Some(code),
        });
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl ShellRunner for ScriptedShell {
    async fn run(&self, command: &str, _cwd: &Path) -> Result<CommandOutput, ExecutorError> {
        self.commands.lock().unwrap().push(command.to_string());
        Ok(self
            .outputs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(CommandOutput {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: Some(0),
            }))
    }
}

/// Answers questions from a queue and records everything shown. Running
/// out of answers behaves like end of input.
#[derive(Default)]
pub struct ScriptedInterface {
    answers: Mutex<VecDeque<String>>,
    pub questions: Mutex<Vec<String>>,
    pub outputs: Mutex<Vec<String>>,
    pub statuses: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl ScriptedInterface {
    pub fn answering(answers: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            ..Default::default()
        })
    }

    pub fn outputs(&self) -> Vec<String> {
        self.outputs.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Interface for ScriptedInterface {
    async fn receive_input(&self, prompt: &str) -> Option<String> {
        self.questions.lock().unwrap().push(prompt.to_string());
        self.answers.lock().unwrap().pop_front()
    }

    async fn send_output(&self, message: &str) {
        self.outputs.lock().unwrap().push(message.to_string());
    }

    async fn show_status(&self, status: &str) {
        self.statuses.lock().unwrap().push(status.to_string());
    }

    async fn show_error(&self, error: &str) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

pub struct Harness {
    pub oracle: Arc<ScriptedOracle>,
    pub shell: Arc<ScriptedShell>,
    pub ui: Arc<ScriptedInterface>,
    pub cwd: tempfile::TempDir,
}

impl Harness {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            oracle: ScriptedOracle::new(),
            shell: ScriptedShell::new(),
            ui: ScriptedInterface::answering(answers),
            cwd: tempfile::tempdir().unwrap(),
        }
    }

    pub fn dispatcher(&self) -> CommandDispatcher {
        self.dispatcher_with_repair_budget(DEFAULT_CONTEXT_BUDGET)
    }

    pub fn dispatcher_with_repair_budget(&self, budget: usize) -> CommandDispatcher {
        let runner = CommandRunner::new(self.shell.clone(), self.ui.clone());
        let repair =
            RepairEngine::new(self.oracle.clone(), self.ui.clone()).with_context_budget(budget);
        CommandDispatcher::new(runner, repair)
    }

    pub fn shell_state(&self) -> ShellState {
        ShellState::new(self.cwd.path())
    }

    pub fn engine(&self) -> TurnEngine {
        self.engine_with_cache(Arc::new(ResponseCache::in_memory().unwrap()))
    }

    pub fn engine_with_cache(&self, cache: Arc<ResponseCache>) -> TurnEngine {
        TurnEngine::new(
            self.oracle.clone(),
            cache,
            self.dispatcher(),
            ContextStore::new(SYSTEM_PROMPT),
            self.shell_state(),
        )
    }
}

/// Transcript entry contents after the system instruction.
pub fn entries(context: &ContextStore) -> Vec<String> {
    context.messages()[1..]
        .iter()
        .map(|m| m.content.clone())
        .collect()
}
