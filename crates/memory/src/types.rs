use serde::{Deserialize, Serialize};

/// Auxiliary key-value state the oracle reads alongside the transcript.
pub type WorldModel = serde_json::Map<String, serde_json::Value>;

/// World-model key holding the current working directory.
pub const DIRECTORY_KEY: &str = "directory";
/// World-model key holding the entries of the current working directory.
pub const FILES_KEY: &str = "files";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Bytes this entry contributes to the transcript budget.
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// A copy whose content keeps at most `max_bytes` leading bytes, cut on
    /// a char boundary.
    pub fn truncated(&self, max_bytes: usize) -> Self {
        let mut end = max_bytes.min(self.content.len());
        while !self.content.is_char_boundary(end) {
            end -= 1;
        }
        Self {
            role: self.role,
            content: self.content[..end].to_string(),
            timestamp: self.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), r#""assistant""#);
        let role: Role = serde_json::from_str(r#""system""#).unwrap();
        assert_eq!(role, Role::System);
    }

    #[test]
    fn test_invalid_role_rejected() {
        let result: Result<Role, _> = serde_json::from_str(r#""tool""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_message_size_counts_content_bytes() {
        let msg = Message::new(Role::User, "héllo");
        assert_eq!(msg.size(), 6);
    }

    #[test]
    fn test_truncated_respects_char_boundaries() {
        let msg = Message::new(Role::Assistant, "héllo world");
        assert_eq!(msg.truncated(2).content, "h");
        assert_eq!(msg.truncated(3).content, "hé");
        assert_eq!(msg.truncated(100), msg);
        assert_eq!(msg.truncated(0).content, "");
    }
}
