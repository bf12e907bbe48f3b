use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Failed to spawn shell: {0}")]
    Spawn(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Captured result of one shell command. Streams are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Text describing a failure: stderr when present, otherwise the
    /// exit status.
    pub fn error_text(&self) -> String {
        let stderr = self.stderr.trim_end();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        match self.exit_code {
            Some(code) => format!("command exited with status {}", code),
            None => "command terminated by signal".to_string(),
        }
    }
}

/// The subprocess boundary.
#[async_trait]
pub trait ShellRunner: Send + Sync {
    /// Run `command` with the platform shell inside `cwd`, inheriting the
    /// process environment.
    async fn run(&self, command: &str, cwd: &Path) -> Result<CommandOutput, ExecutorError>;
}

/// Runs commands through `sh -c` (or `cmd /C` on Windows).
#[derive(Debug, Default, Clone)]
pub struct SystemShell;

impl SystemShell {
    pub fn new() -> Self {
        Self
    }

    fn command(command: &str) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        }
        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

#[async_trait]
impl ShellRunner for SystemShell {
    async fn run(&self, command: &str, cwd: &Path) -> Result<CommandOutput, ExecutorError> {
        tracing::info!("Executing command in {:?}: {}", cwd, command);

        let output = Self::command(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| ExecutorError::Spawn(e.to_string()))?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        };

        tracing::debug!("Command exited with {:?}", result.exit_code);
        Ok(result)
    }
}
