use exterm_cache::normalize_key;

/// Token that forces a fresh oracle call for one turn.
pub const NO_CACHE_TOKEN: &str = "--no-cache";

/// One line of user input with its modifiers stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnInput {
    pub text: String,
    pub bypass_cache: bool,
}

impl TurnInput {
    pub fn parse(raw: &str) -> Self {
        let bypass_cache = raw.split_whitespace().any(|token| token == NO_CACHE_TOKEN);

        let text = if bypass_cache {
            raw.split_whitespace()
                .filter(|token| *token != NO_CACHE_TOKEN)
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            raw.trim().to_string()
        };

        Self { text, bypass_cache }
    }

    pub fn cache_key(&self) -> String {
        normalize_key(&self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
