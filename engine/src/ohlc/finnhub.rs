// Finnhub /stock/candle responses
//
// { "c": [..], "h": [..], "l": [..], "o": [..], "t": [..], "v": [..], "s": "ok" }
//
// Parallel arrays, already oldest first. `t` holds Unix seconds.
use serde_json::Value;
use shared::models::{OhlcDataPoint, SourceFormat, Timestamp};

use super::{numeric, MappingError, OhlcMapper};

pub struct FinnhubMapper;

fn column<'a>(response: &'a Value, key: &str) -> &'a [Value] {
    response
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn unix_seconds(value: &Value, index: usize) -> Result<Timestamp, MappingError> {
    numeric::unix_seconds(value)
        .map(Timestamp::Unix)
        .ok_or_else(|| MappingError::InvalidTimestamp {
            context: format!("t[{}]", index),
        })
}

impl OhlcMapper for FinnhubMapper {
    fn format(&self) -> SourceFormat {
        SourceFormat::Finnhub
    }

    /// Zips the arrays by index. Arrays of unequal length are truncated to the
    /// shortest of `c`, `h`, `l`, `o` and `t`; a short or missing `v` only
    /// zeroes the volume of the points it does not cover.
    fn map(&self, response: &Value) -> Result<Vec<OhlcDataPoint>, MappingError> {
        let close = column(response, "c");
        let high = column(response, "h");
        let low = column(response, "l");
        let open = column(response, "o");
        let time = column(response, "t");
        let volume = column(response, "v");

        let lengths = [close.len(), high.len(), low.len(), open.len(), time.len()];
        let len = lengths.iter().copied().min().unwrap_or(0);
        let longest = lengths.iter().copied().max().unwrap_or(0);
        if len < longest {
            tracing::warn!(longest, usable = len, "Finnhub arrays differ in length, truncating");
        }

        (0..len)
            .map(|i| {
                Ok(OhlcDataPoint {
                    timestamp: unix_seconds(&time[i], i)?,
                    open: numeric::price(open.get(i)),
                    high: numeric::price(high.get(i)),
                    low: numeric::price(low.get(i)),
                    close: numeric::price(close.get(i)),
                    volume: numeric::volume(volume.get(i)),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ohlc::fixtures;
    use serde_json::json;

    #[test]
    fn test_zips_arrays_by_index() {
        let response = fixtures::finnhub();
        let data = FinnhubMapper.map(&response).unwrap();
        assert_eq!(data.len(), 3);
        for (i, point) in data.iter().enumerate() {
            assert_eq!(point.timestamp, Timestamp::Unix(response["t"][i].as_i64().unwrap()));
            assert_eq!(point.open, response["o"][i].as_f64().unwrap());
            assert_eq!(point.high, response["h"][i].as_f64().unwrap());
            assert_eq!(point.low, response["l"][i].as_f64().unwrap());
            assert_eq!(point.close, response["c"][i].as_f64().unwrap());
            assert_eq!(point.volume, response["v"][i].as_f64().unwrap());
        }
    }

    #[test]
    fn test_mismatched_lengths_truncate_to_shortest() {
        let response = json!({
            "c": [1.0, 2.0, 3.0],
            "h": [1.5, 2.5],
            "l": [0.5, 1.5, 2.5],
            "o": [1.0, 2.0, 3.0],
            "t": [100, 200, 300],
            "v": [10]
        });
        let data = FinnhubMapper.map(&response).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].volume, 10.0);
        assert_eq!(data[1].volume, 0.0);
    }

    #[test]
    fn test_volume_is_optional() {
        let response = json!({ "c": [1.0], "h": [1.0], "l": [1.0], "o": [1.0], "t": [1700000000] });
        let data = FinnhubMapper.map(&response).unwrap();
        assert_eq!(data[0].volume, 0.0);
    }

    #[test]
    fn test_no_data_response_is_empty() {
        let response = json!({ "c": [], "h": [], "l": [], "o": [], "t": [], "s": "no_data" });
        assert!(FinnhubMapper.map(&response).unwrap().is_empty());
    }

    #[test]
    fn test_non_numeric_time_is_an_error() {
        let response = json!({ "c": [1.0], "h": [1.0], "l": [1.0], "o": [1.0], "t": ["yesterday"] });
        assert_eq!(
            FinnhubMapper.map(&response).unwrap_err(),
            MappingError::InvalidTimestamp { context: "t[0]".to_string() }
        );
    }
}
