use crate::traits::Interface;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin};
use tokio::sync::Mutex;

const BLUE: &str = "\x1b[38;5;33m";
const PINK: &str = "\x1b[38;5;205m";
const RED: &str = "\x1b[38;5;196m";
const RESET: &str = "\x1b[0m";

/// Line-oriented stdin/stdout surface.
pub struct TerminalInterface {
    reader: Mutex<BufReader<Stdin>>,
}

impl TerminalInterface {
    pub fn new() -> Self {
        Self {
            reader: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }

    async fn write(&self, text: &str) {
        let mut stdout = tokio::io::stdout();
        let _ = stdout.write_all(text.as_bytes()).await;
        let _ = stdout.flush().await;
    }

    pub async fn clear_screen(&self) {
        self.write("\x1b[2J\x1b[1;1H").await;
    }
}

impl Default for TerminalInterface {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interface for TerminalInterface {
    async fn receive_input(&self, prompt: &str) -> Option<String> {
        self.write(&format!("{BLUE}{prompt}{RESET}")).await;

        let mut line = String::new();
        let mut reader = self.reader.lock().await;
        match reader.read_line(&mut line).await {
            Ok(0) => None, // EOF
            Ok(_) => Some(line.trim().to_string()),
            Err(_) => None,
        }
    }

    async fn send_output(&self, message: &str) {
        self.write(&format!("{PINK}{message}{RESET}\n")).await;
    }

    async fn show_status(&self, status: &str) {
        self.write(&format!("{BLUE}{status}{RESET}\n")).await;
    }

    async fn show_error(&self, error: &str) {
        self.write(&format!("{RED}Error:{RESET} {error}\n")).await;
    }
}
