// Alpha Vantage TIME_SERIES_* responses
//
// {
//   "Meta Data": { "2. Symbol": "IBM", "4. Interval": "5min", ... },
//   "Time Series (5min)": {
//     "2024-01-05 16:00:00": { "1. open": "160.99", ..., "5. volume": "420917" },
//     ...
//   }
// }
//
// Entries arrive newest first.
use serde_json::Value;
use shared::models::{OhlcDataPoint, SourceFormat, Timestamp};

use super::detect::{ALPHA_VANTAGE_META_KEY, ALPHA_VANTAGE_SERIES_KEYS};
use super::{numeric, MappingError, OhlcMapper, SeriesMetadata};

pub struct AlphaVantageMapper;

impl AlphaVantageMapper {
    /// First series key in document order.
    fn series_key(response: &Value) -> Option<&str> {
        response.as_object()?.keys().map(String::as_str).find(|key| {
            ALPHA_VANTAGE_SERIES_KEYS.contains(key) || key.starts_with("Time Series")
        })
    }
}

impl OhlcMapper for AlphaVantageMapper {
    fn format(&self) -> SourceFormat {
        SourceFormat::AlphaVantage
    }

    fn metadata(&self, response: &Value) -> SeriesMetadata {
        let meta = response.get(ALPHA_VANTAGE_META_KEY);
        let text = |key: &str| {
            meta.and_then(|m| m.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        SeriesMetadata {
            symbol: text("2. Symbol"),
            interval: text("4. Interval"),
        }
    }

    fn map(&self, response: &Value) -> Result<Vec<OhlcDataPoint>, MappingError> {
        let Some(key) = Self::series_key(response) else {
            return Ok(Vec::new());
        };
        let series = response[key]
            .as_object()
            .ok_or_else(|| MappingError::NotAnObject { context: format!("'{}'", key) })?;

        let mut data: Vec<OhlcDataPoint> = series
            .iter()
            .map(|(timestamp, bar)| OhlcDataPoint {
                timestamp: Timestamp::Text(timestamp.clone()),
                open: numeric::price(bar.get("1. open")),
                high: numeric::price(bar.get("2. high")),
                low: numeric::price(bar.get("3. low")),
                close: numeric::price(bar.get("4. close")),
                volume: numeric::volume(bar.get("5. volume")),
            })
            .collect();

        data.reverse();
        Ok(data)
    }
}
