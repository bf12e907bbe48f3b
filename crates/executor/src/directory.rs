use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryChangeError {
    #[error("cd: no such directory: {0}")]
    NotFound(String),
    #[error("cd: not a directory: {0}")]
    NotADirectory(String),
    #[error("cd: cannot access {0}: {1}")]
    Inaccessible(String, String),
    #[error("cd: HOME not set")]
    NoHome,
    #[error("cd: no previous directory")]
    NoPrevious,
}

/// Shell state that outlives a single subprocess. Child processes cannot
/// change the parent's directory, so directory changes are applied here and
/// every command is spawned inside `cwd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellState {
    cwd: PathBuf,
    previous: Option<PathBuf>,
}

impl ShellState {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            previous: None,
        }
    }

    /// Start from the process working directory.
    pub fn from_process() -> io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Apply a `cd` to `target`. An empty target or `~` means `$HOME`,
    /// `-` means the previous directory.
    pub fn change_directory(&mut self, target: &str) -> Result<&Path, DirectoryChangeError> {
        let requested = self.resolve(target)?;

        let resolved = std::fs::canonicalize(&requested).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DirectoryChangeError::NotFound(target.to_string()),
            _ => DirectoryChangeError::Inaccessible(target.to_string(), e.to_string()),
        })?;

        if !resolved.is_dir() {
            return Err(DirectoryChangeError::NotADirectory(target.to_string()));
        }

        tracing::info!("Changing directory: {:?} -> {:?}", self.cwd, resolved);
        self.previous = Some(std::mem::replace(&mut self.cwd, resolved));
        Ok(&self.cwd)
    }

    fn resolve(&self, target: &str) -> Result<PathBuf, DirectoryChangeError> {
        if target == "-" {
            return self.previous.clone().ok_or(DirectoryChangeError::NoPrevious);
        }
        if target.is_empty() || target == "~" {
            return home_dir();
        }
        if let Some(rest) = target.strip_prefix("~/") {
            return Ok(home_dir()?.join(rest));
        }
        Ok(self.cwd.join(target))
    }
}

fn home_dir() -> Result<PathBuf, DirectoryChangeError> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .ok_or(DirectoryChangeError::NoHome)
}

const SHELL_OPERATORS: &[&str] = &["&&", "||", ";", "|", ">", "<", "`", "$(", "\n"];

/// If `command` is a plain `cd`, return its target (empty for a bare `cd`).
///
/// Compound command lines such as `cd src && make` are left to the
/// subprocess, where the directory change only lasts for that line.
pub fn parse_directory_change(command: &str) -> Option<String> {
    let trimmed = command.trim();
    let rest = trimmed.strip_prefix("cd")?;

    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    if SHELL_OPERATORS.iter().any(|op| rest.contains(op)) {
        return None;
    }

    Some(unquote(rest.trim()).to_string())
}

fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}
