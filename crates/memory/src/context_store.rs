use crate::types::*;
use serde_json::Value;

/// Default cap on the cumulative transcript size, in bytes.
pub const DEFAULT_CONTEXT_BUDGET: usize = 10_000;

/// Rolling conversational state: the transcript sent to the oracle and the
/// world model merged from its decisions.
///
/// Index 0 of the transcript is always the system instruction. Trimming and
/// resetting never remove it.
#[derive(Debug, Clone)]
pub struct ContextStore {
    system_prompt: String,
    messages: Vec<Message>,
    world_model: WorldModel,
}

impl ContextStore {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            messages: vec![Message::new(Role::System, system_prompt.clone())],
            system_prompt,
            world_model: WorldModel::new(),
        }
    }

    pub fn append_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message::new(Role::User, text));
    }

    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(Message::new(Role::Assistant, text));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Most recent transcript entry. Never empty since the system
    /// instruction is always present.
    pub fn last(&self) -> &Message {
        // messages[0] is the system instruction and is never removed
        &self.messages[self.messages.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.len() <= 1
    }

    pub fn serialized_size(&self) -> usize {
        self.messages.iter().map(Message::size).sum()
    }

    /// Evict the oldest non-system entries until the transcript fits in
    /// `max_bytes` or only the system instruction remains. Returns the
    /// number of entries removed.
    pub fn trim_to_budget(&mut self, max_bytes: usize) -> usize {
        let mut total = self.serialized_size();
        let mut removed = 0;

        while total > max_bytes && self.messages.len() > 1 {
            let evicted = self.messages.remove(1);
            total -= evicted.size();
            removed += 1;
        }

        if removed > 0 {
            tracing::info!(
                "Trimmed {} transcript entries to fit budget of {} bytes",
                removed,
                max_bytes
            );
        }

        removed
    }

    /// Restore the transcript to the system instruction alone and drop the
    /// world model.
    pub fn reset(&mut self) {
        self.messages = vec![Message::new(Role::System, self.system_prompt.clone())];
        self.world_model.clear();
        tracing::debug!("Context reset");
    }

    pub fn world_model(&self) -> &WorldModel {
        &self.world_model
    }

    /// Shallow merge: keys in `delta` overwrite, keys absent are untouched.
    pub fn merge_world_model(&mut self, delta: &WorldModel) {
        for (key, value) in delta {
            self.world_model.insert(key.clone(), value.clone());
        }
        if !delta.is_empty() {
            tracing::debug!("Merged {} world-model keys", delta.len());
        }
    }

    /// Refresh the keys the shell injects every turn.
    pub fn set_environment(&mut self, directory: &str, files: &[String]) {
        self.world_model
            .insert(DIRECTORY_KEY.to_string(), Value::String(directory.to_string()));
        self.world_model.insert(
            FILES_KEY.to_string(),
            Value::Array(files.iter().cloned().map(Value::String).collect()),
        );
    }

    pub fn render_world_model(&self) -> String {
        serde_json::to_string_pretty(&self.world_model).unwrap_or_else(|_| "{}".to_string())
    }
}
