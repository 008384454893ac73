//! OHLC normalization for heterogeneous finance API payloads.
//!
//! [`map_to_ohlc`] classifies a raw JSON response (see [`detect`]), hands it to
//! the mapper for that provider and always returns a [`MappingResult`]: mapping
//! failures are reported through `message`, never raised to the caller.

pub mod alpha_vantage;
pub mod detect;
pub mod finnhub;
pub mod groww;
pub mod numeric;
pub mod twelve_data;

use serde_json::Value;
use shared::models::{MappingResult, OhlcDataPoint, SourceFormat};
use thiserror::Error;

pub use alpha_vantage::AlphaVantageMapper;
pub use detect::detect_data_format;
pub use finnhub::FinnhubMapper;
pub use groww::GrowwMapper;
pub use twelve_data::TwelveDataMapper;

pub const UNKNOWN_FORMAT_MESSAGE: &str = "Unable to detect OHLC data format. Response does not match Alpha Vantage, Twelve Data, Finnhub, or Groww formats.";
pub const NO_DATA_MESSAGE: &str = "No OHLC data found in the response.";

/// Structural problems found while walking a payload whose signature matched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    #[error("{context} is not an object")]
    NotAnObject { context: String },

    #[error("invalid timestamp at {context}")]
    InvalidTimestamp { context: String },

    #[error("quote for '{symbol}' is not a string")]
    QuoteNotText { symbol: String },

    #[error("malformed quote segment '{segment}'")]
    MalformedQuote { segment: String },
}

/// Symbol and interval, for the providers that report them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesMetadata {
    pub symbol: Option<String>,
    pub interval: Option<String>,
}

/// One implementation per provider shape.
///
/// `map` may assume the response already matched the provider's signature, but
/// must not assume anything below the top level.
pub trait OhlcMapper: Send + Sync {
    fn format(&self) -> SourceFormat;

    fn metadata(&self, _response: &Value) -> SeriesMetadata {
        SeriesMetadata::default()
    }

    /// Points in chronological order (oldest first).
    fn map(&self, response: &Value) -> Result<Vec<OhlcDataPoint>, MappingError>;
}

/// Mapper for a detected format; `None` for `Unknown`.
pub fn mapper_for(format: SourceFormat) -> Option<&'static dyn OhlcMapper> {
    match format {
        SourceFormat::AlphaVantage => Some(&AlphaVantageMapper),
        SourceFormat::TwelveData => Some(&TwelveDataMapper),
        SourceFormat::Finnhub => Some(&FinnhubMapper),
        SourceFormat::Groww => Some(&GrowwMapper),
        SourceFormat::Unknown => None,
    }
}

/// Normalize any supported provider response into OHLC points.
pub fn map_to_ohlc(response: &Value) -> MappingResult {
    let format = detect_data_format(response);
    let Some(mapper) = mapper_for(format) else {
        tracing::debug!("Response matched no known OHLC format");
        return MappingResult {
            format,
            data: Vec::new(),
            symbol: None,
            interval: None,
            message: Some(UNKNOWN_FORMAT_MESSAGE.to_string()),
        };
    };

    let SeriesMetadata { symbol, interval } = mapper.metadata(response);

    match mapper.map(response) {
        Ok(data) if data.is_empty() => {
            tracing::debug!(%format, "Format detected but no OHLC points extracted");
            MappingResult {
                format,
                data,
                symbol,
                interval,
                message: Some(NO_DATA_MESSAGE.to_string()),
            }
        }
        Ok(data) => {
            tracing::debug!(%format, points = data.len(), "Mapped response to OHLC");
            MappingResult {
                format,
                data,
                symbol,
                interval,
                message: None,
            }
        }
        Err(e) => {
            tracing::warn!(%format, error = %e, "Failed to map OHLC data");
            MappingResult {
                format,
                data: Vec::new(),
                symbol,
                interval,
                message: Some(format!("Error mapping {} data: {}", format, e)),
            }
        }
    }
}

/// Shallow check: the response matches one of the known signatures.
///
/// A matching response can still map to zero points; see
/// [`has_chartable_ohlc_data`] for the stricter check.
pub fn has_valid_ohlc_data(response: &Value) -> bool {
    detect_data_format(response).is_known()
}

/// The response matches a known signature and yields at least one point that
/// can be placed on a time axis. Gates chart mode in the widget form.
pub fn has_chartable_ohlc_data(response: &Value) -> bool {
    has_valid_ohlc_data(response)
        && map_to_ohlc(response)
            .data
            .iter()
            .any(|point| point.timestamp.to_millis().is_some())
}
