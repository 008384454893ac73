use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    JsonError {
        #[from]
        source: serde_json::Error,
    },

    #[error("Invalid URL: {source}")]
    InvalidUrl {
        #[from]
        source: url::ParseError,
    },

    // Chart cannot be drawn from a mapping result (unknown format, no points...)
    #[error("Chart unavailable: {0}")]
    ChartUnavailable(String),

    #[error("Internal processing error: {0}")]
    ProcessingError(String),

    // Catch-all for anyhow errors when direct conversion is suitable
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

impl EngineError {
    /// Short label used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::ConfigError(_) => "config",
            EngineError::IoError { .. } => "io",
            EngineError::JsonError { .. } => "json",
            EngineError::InvalidUrl { .. } => "invalid_url",
            EngineError::ChartUnavailable(_) => "chart_unavailable",
            EngineError::ProcessingError(_) => "processing",
            EngineError::AnyhowError(_) => "internal",
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
