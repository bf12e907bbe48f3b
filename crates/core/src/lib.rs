//! Exterminal core: turns oracle decisions into ordered shell side effects
//! and repairs failing commands in flight.

pub mod decision;
pub mod directive;
pub mod dispatcher;
pub mod engine;
pub mod input;
pub mod oracle;
pub mod prompt;
pub mod repair;
pub mod runner;

pub use decision::Decision;
pub use directive::{Directive, DirectiveParseError};
pub use dispatcher::{
    CommandDispatcher, DirectivePlan, DirectiveRecord, DirectiveState, DispatchReport,
    NOINFO_MESSAGE,
};
pub use engine::{DecisionSource, EngineError, TurnEngine, TurnReport};
pub use input::{TurnInput, NO_CACHE_TOKEN};
pub use oracle::{LlmOracle, Oracle, OracleError, OracleRequest, RepairRequest};
pub use prompt::SYSTEM_PROMPT;
pub use repair::{RepairEngine, RepairError, RepairOutcome, DEFAULT_MAX_REPAIR_ATTEMPTS};
pub use runner::{CommandFailure, CommandOutcome, CommandRunner, EMPTY_OUTPUT_MESSAGE};
