use crate::oracle::RepairRequest;

/// Transcript element 0.
pub const SYSTEM_PROMPT: &str = r#"You are Exterminal, a terminal that executes human-readable requests on a Linux shell.
Read the user's request, reason about it, and reply with the shell commands that carry it out.
If you lack information you can first run a command that gathers it.

Every command is a string starting with exactly one of these tags:
"EXECUTE: <shell command>"               run the command
"EXECUTE AND CONFIRM: <shell command>"   ask the user first; use for anything destructive or far-reaching
"ANSWER: <text>"                         answer a question directly
"NOINFO"                                 the request does not contain enough information

Only emit commands for the current request; assume earlier commands already ran.
Reply with a single JSON object:
{
    "thoughts": "how you interpret the request and plan to carry it out",
    "world_model": {"key": "value"},
    "commands": ["EXECUTE: ...", "ANSWER: ..."]
}
Only put facts worth remembering in "world_model"."#;

/// Prefix of the message carrying the world model to the oracle.
pub const WORLD_MODEL_HEADER: &str = "WORLD_MODEL:";

pub fn world_model_message(rendered: &str) -> String {
    format!("{}\n{}", WORLD_MODEL_HEADER, rendered)
}

pub fn repair_instructions(request: &RepairRequest) -> String {
    let commands: Vec<String> = request
        .directives
        .iter()
        .enumerate()
        .map(|(i, d)| format!("{}. {}", i, d))
        .collect();

    format!(
        "The command `{cmd}` (index {index}) failed with this error:\n{error}\n\n\
         The full command list was:\n{list}\n\n\
         Return the same JSON object format with a complete replacement \"commands\" list. \
         Commands before index {index} already ran and must stay unchanged; \
         only index {index} and the commands after it may change. \
         If the failure cannot be fixed, put an \"ANSWER: <explanation>\" at index {index}.",
        cmd = request.failing_command,
        index = request.index,
        error = request.error.trim_end(),
        list = commands.join("\n"),
    )
}
