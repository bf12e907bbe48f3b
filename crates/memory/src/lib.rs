pub mod context_store;
pub mod types;

pub use context_store::{ContextStore, DEFAULT_CONTEXT_BUDGET};
pub use types::*;
