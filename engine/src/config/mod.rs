pub mod settings;

pub use settings::{ApiKeyName, ApiKeys, EngineSettings};
