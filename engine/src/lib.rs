// Engine library root: OHLC normalization plus the widget data pipeline
// (provider routing, response caching, chart projection).

pub mod chart;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod ohlc;
pub mod providers;
pub mod services;

pub use error::{EngineError, EngineResult};
pub use ohlc::{detect_data_format, has_chartable_ohlc_data, has_valid_ohlc_data, map_to_ohlc};
