use async_trait::async_trait;

/// The interactive surface the engine talks to.
///
/// Reads block until the user answers; there is no timeout.
#[async_trait]
pub trait Interface: Send + Sync {
    /// Show `prompt` and read one line. `None` on end of input.
    async fn receive_input(&self, prompt: &str) -> Option<String>;
    async fn send_output(&self, message: &str);
    async fn show_status(&self, status: &str);
    async fn show_error(&self, error: &str);

    /// Ask a question and return the raw answer. The caller decides how to
    /// read it.
    async fn ask(&self, question: &str) -> Option<String> {
        self.receive_input(&format!("{} (y/n) ", question)).await
    }
}
