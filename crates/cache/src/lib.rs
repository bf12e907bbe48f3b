pub mod response_cache;

pub use response_cache::{normalize_key, CacheError, ResponseCache, DEFAULT_RETENTION};
