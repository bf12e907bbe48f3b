pub mod openai_compatible;
pub mod traits;

pub use openai_compatible::OpenAICompatibleProvider;
pub use traits::{GenerateOptions, GenerateResponse, LLMProvider, Message, ProviderError};
