// Data held between refreshes of the dashboard.
// Normalized series are never stored; only raw upstream responses are cached.
pub mod response_cache;

pub use response_cache::{CacheStats, ResponseCache};
