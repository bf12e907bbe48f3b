use serde::{Deserialize, Serialize};
use std::path::Path;

/// What the oracle is told about the shell at the start of every turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub timestamp: i64,
    pub directory: String,
    pub files: Vec<String>,
}

impl EnvironmentSnapshot {
    /// Capture `cwd` and its sorted entry names. An unreadable directory
    /// yields an empty listing rather than an error.
    pub fn capture(cwd: &Path) -> Self {
        let mut files: Vec<String> = match std::fs::read_dir(cwd) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().to_string())
                .collect(),
            Err(e) => {
                tracing::warn!("Failed to list {:?}: {}", cwd, e);
                Vec::new()
            }
        };
        files.sort();

        Self {
            timestamp: chrono::Utc::now().timestamp(),
            directory: cwd.to_string_lossy().to_string(),
            files,
        }
    }

    pub fn to_concise_string(&self) -> String {
        format!("Directory: {}\nFiles: {}", self.directory, self.files.len())
    }
}
