//! Interactive loop: reserved inputs first, everything else is a turn.

use exterm_core::{TurnEngine, TurnInput};
use exterm_interfaces::{Interface, TerminalInterface};
use std::sync::Arc;

const PROMPT: &str = "> ";

const HELP_TEXT: &str = "Exterminal is a smart terminal that can execute human-readable commands.\n\
You can type any command and Exterminal will try to execute it for you.\n\
Reserved inputs:\n  \
exit, e   leave Exterminal\n  \
clear, c  clear the screen and forget the conversation\n  \
help, h   show this message\n  \
world, w  show the world model and transcript\n\
Add --no-cache to a request to skip the response cache for that turn.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Exit,
    Clear,
    Help,
    World,
    Empty,
    Turn(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => ReplCommand::Empty,
            "exit" | "e" => ReplCommand::Exit,
            "clear" | "c" => ReplCommand::Clear,
            "help" | "h" => ReplCommand::Help,
            "world" | "w" => ReplCommand::World,
            other if TurnInput::parse(other).is_empty() => ReplCommand::Empty,
            other => ReplCommand::Turn(other.to_string()),
        }
    }
}

pub struct Repl {
    engine: TurnEngine,
    terminal: Arc<TerminalInterface>,
}

impl Repl {
    pub fn new(engine: TurnEngine, terminal: Arc<TerminalInterface>) -> Self {
        Self { engine, terminal }
    }

    pub async fn run(&mut self) {
        self.terminal.clear_screen().await;
        self.terminal.show_status("Welcome to Exterminal!").await;
        self.terminal
            .show_status("Type any command to execute it, 'help' for help or 'exit' to exit.")
            .await;

        while let Some(line) = self.terminal.receive_input(PROMPT).await {
            match ReplCommand::parse(&line) {
                ReplCommand::Empty => continue,
                ReplCommand::Exit => break,
                ReplCommand::Clear => {
                    self.terminal.clear_screen().await;
                    self.engine.reset();
                }
                ReplCommand::Help => self.terminal.send_output(HELP_TEXT).await,
                ReplCommand::World => self.show_world().await,
                ReplCommand::Turn(text) => {
                    if let Err(e) = self.engine.handle_turn(&text).await {
                        tracing::error!("Turn failed: {}", e);
                        self.terminal.show_error(&e.to_string()).await;
                    }
                }
            }
        }

        self.terminal.show_status("Exiting Exterminal...").await;
    }

    async fn show_world(&self) {
        let context = self.engine.context();
        self.terminal
            .send_output(&format!("World model:\n{}", context.render_world_model()))
            .await;

        let transcript: Vec<String> = context
            .messages()
            .iter()
            .skip(1)
            .map(|m| format!("[{}] {}", m.role.as_str(), m.content))
            .collect();
        self.terminal
            .send_output(&format!(
                "Transcript ({} bytes):\n{}",
                context.serialized_size(),
                transcript.join("\n")
            ))
            .await;
    }
}
