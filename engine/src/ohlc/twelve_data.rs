// Twelve Data /time_series responses
//
// { "meta": { "symbol": "AAPL", "interval": "1day", ... },
//   "values": [ { "datetime": "2024-01-05", "open": "181.99", ..., "volume": "62303300" }, ... ] }
//
// Values arrive newest first.
use serde_json::Value;
use shared::models::{OhlcDataPoint, SourceFormat, Timestamp};

use super::{numeric, MappingError, OhlcMapper, SeriesMetadata};

pub struct TwelveDataMapper;

// Text datetimes pass through; numeric ones are Unix seconds
fn datetime_of(bar: &Value) -> Option<Timestamp> {
    match bar.get("datetime")? {
        Value::String(text) => Some(Timestamp::Text(text.clone())),
        number @ Value::Number(_) => numeric::unix_seconds(number).map(Timestamp::Unix),
        _ => None,
    }
}

impl OhlcMapper for TwelveDataMapper {
    fn format(&self) -> SourceFormat {
        SourceFormat::TwelveData
    }

    fn metadata(&self, response: &Value) -> SeriesMetadata {
        let meta = response.get("meta");
        let text = |key: &str| {
            meta.and_then(|m| m.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        SeriesMetadata {
            symbol: text("symbol"),
            interval: text("interval"),
        }
    }

    fn map(&self, response: &Value) -> Result<Vec<OhlcDataPoint>, MappingError> {
        let Some(values) = response.get("values").and_then(Value::as_array) else {
            return Ok(Vec::new());
        };

        let mut data = Vec::with_capacity(values.len());
        for (index, bar) in values.iter().enumerate() {
            if !bar.is_object() {
                return Err(MappingError::NotAnObject {
                    context: format!("values[{}]", index),
                });
            }
            // A bar without a usable datetime is dropped; the rest of the series survives
            let Some(timestamp) = datetime_of(bar) else {
                tracing::warn!(index, datetime = ?bar.get("datetime"), "Skipping Twelve Data bar without a usable datetime");
                continue;
            };
            data.push(OhlcDataPoint {
                timestamp,
                open: numeric::price(bar.get("open")),
                high: numeric::price(bar.get("high")),
                low: numeric::price(bar.get("low")),
                close: numeric::price(bar.get("close")),
                volume: numeric::volume(bar.get("volume")),
            });
        }

        data.reverse();
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ohlc::{self, fixtures};
    use serde_json::json;

    #[test]
    fn test_maps_values_oldest_first() {
        let data = TwelveDataMapper.map(&fixtures::twelve_data()).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].timestamp, Timestamp::from("2024-01-04"));
        assert_eq!(data[0].open, 182.14999);
        assert_eq!(data[0].volume, 71983600.0);
        assert_eq!(data[1].close, 181.17999);
    }

    #[test]
    fn test_numeric_fields_may_be_numbers() {
        let response = json!({
            "meta": {},
            "values": [ { "datetime": "2024-01-05 10:00:00", "open": 1.5, "high": 2, "low": 1, "close": "1.75" } ]
        });
        let data = TwelveDataMapper.map(&response).unwrap();
        assert_eq!((data[0].open, data[0].high, data[0].close), (1.5, 2.0, 1.75));
        assert_eq!(data[0].volume, 0.0);
    }

    #[test]
    fn test_metadata_only_keeps_strings() {
        let meta = TwelveDataMapper.metadata(&json!({ "meta": { "symbol": "EUR/USD", "interval": 5 }, "values": [] }));
        assert_eq!(meta.symbol.as_deref(), Some("EUR/USD"));
        assert_eq!(meta.interval, None);

        assert_eq!(TwelveDataMapper.metadata(&json!({ "meta": "x", "values": [] })), SeriesMetadata::default());
    }

    #[test]
    fn test_non_object_entry_is_error() {
        let not_object = json!({ "meta": {}, "values": [ "2024-01-05" ] });
        assert_eq!(
            TwelveDataMapper.map(&not_object).unwrap_err(),
            MappingError::NotAnObject { context: "values[0]".to_string() }
        );
    }

    #[test]
    fn test_bar_without_datetime_is_skipped() {
        let response = json!({
            "meta": { "symbol": "AAPL" },
            "values": [
                { "datetime": "2024-01-05", "open": "181.99", "high": "182.76", "low": "180.17", "close": "181.18" },
                { "datetime": null, "open": "182.15", "high": "183.09", "low": "180.88", "close": "181.91" },
                { "open": "183.00", "high": "184.00", "low": "182.00", "close": "183.50" },
                { "datetime": "2024-01-03", "open": "184.22", "high": "185.88", "low": "183.43", "close": "184.25" }
            ]
        });
        let data = TwelveDataMapper.map(&response).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].timestamp, Timestamp::from("2024-01-03"));
        assert_eq!(data[1].timestamp, Timestamp::from("2024-01-05"));

        let result = ohlc::map_to_ohlc(&response);
        assert_eq!(result.data.len(), 2);
        assert_eq!(result.message, None);
        assert_eq!(result.symbol.as_deref(), Some("AAPL"));
    }

    #[test]
    fn test_all_bars_without_datetime_means_no_data() {
        let result = ohlc::map_to_ohlc(&json!({ "meta": {}, "values": [ { "open": "1" } ] }));
        assert!(result.data.is_empty());
        assert_eq!(result.message.as_deref(), Some(ohlc::NO_DATA_MESSAGE));
    }

    #[test]
    fn test_numeric_datetime_is_unix_seconds() {
        let response = json!({
            "meta": {},
            "values": [ { "datetime": 1704412800.0, "close": "1" }, { "datetime": 1704326400, "close": "2" } ]
        });
        let data = TwelveDataMapper.map(&response).unwrap();
        assert_eq!(data[0].timestamp, Timestamp::Unix(1704326400));
        assert_eq!(data[1].timestamp, Timestamp::Unix(1704412800));
    }
}
