pub mod directory;
pub mod environment;
pub mod shell;

pub use directory::{parse_directory_change, DirectoryChangeError, ShellState};
pub use environment::EnvironmentSnapshot;
pub use shell::{CommandOutput, ExecutorError, ShellRunner, SystemShell};
