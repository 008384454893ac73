use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The provider shapes the normalizer knows how to read.
///
/// `Unknown` is assigned to anything that matches none of the signatures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    AlphaVantage,
    TwelveData,
    Finnhub,
    Groww,
    Unknown,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::AlphaVantage => "alpha-vantage",
            SourceFormat::TwelveData => "twelve-data",
            SourceFormat::Finnhub => "finnhub",
            SourceFormat::Groww => "groww",
            SourceFormat::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, SourceFormat::Unknown)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time marker of an OHLC record.
///
/// Providers disagree on the representation: Alpha Vantage and Twelve Data send
/// date strings, Finnhub sends Unix seconds and Groww has no time axis at all
/// (the symbol name is stored as text instead). Consumers branch on the variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Timestamp {
    Unix(i64),
    Text(String),
}

// Date layouts seen in provider payloads, tried in order after RFC 3339.
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

impl Timestamp {
    /// Position on a millisecond time axis, if the value can be placed on one.
    ///
    /// Unix seconds are scaled by 1000. Text is read as RFC 3339, then as a naive
    /// date-time or a bare date in UTC. Anything else (e.g. a Groww symbol
    /// placeholder) has no position and yields `None`.
    pub fn to_millis(&self) -> Option<i64> {
        match self {
            Timestamp::Unix(secs) => secs.checked_mul(1000),
            Timestamp::Text(text) => {
                let text = text.trim();
                if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                    return Some(dt.timestamp_millis());
                }
                for format in DATETIME_FORMATS {
                    if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                        return Some(naive.and_utc().timestamp_millis());
                    }
                }
                NaiveDate::parse_from_str(text, DATE_FORMAT)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc().timestamp_millis())
            }
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Unix(secs) => write!(f, "{}", secs),
            Timestamp::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for Timestamp {
    fn from(text: &str) -> Self {
        Timestamp::Text(text.to_string())
    }
}

impl From<i64> for Timestamp {
    fn from(secs: i64) -> Self {
        Timestamp::Unix(secs)
    }
}

/// One normalized OHLC record.
///
/// Prices that failed to parse are `f64::NAN` (written as JSON `null`); the mapper
/// never aborts because of a single garbled field. Use [`OhlcDataPoint::is_complete`]
/// to tell clean records from degraded ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OhlcDataPoint {
    pub timestamp: Timestamp,
    #[serde(deserialize_with = "price_or_nan")]
    pub open: f64,
    #[serde(deserialize_with = "price_or_nan")]
    pub high: f64,
    #[serde(deserialize_with = "price_or_nan")]
    pub low: f64,
    #[serde(deserialize_with = "price_or_nan")]
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl OhlcDataPoint {
    pub fn new(timestamp: impl Into<Timestamp>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// True when all four prices parsed to finite numbers.
    pub fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite())
    }
}

// Numbers compare bitwise: a NaN price equals itself.
impl PartialEq for OhlcDataPoint {
    fn eq(&self, other: &Self) -> bool {
        let bits = |p: &OhlcDataPoint| {
            [p.open, p.high, p.low, p.close, p.volume].map(f64::to_bits)
        };
        self.timestamp == other.timestamp && bits(self) == bits(other)
    }
}

// serde_json writes NaN as null; read it back the same way.
fn price_or_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Output of one normalization call.
///
/// `message` is present exactly when `data` is empty or `format` is `Unknown`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MappingResult {
    pub format: SourceFormat,
    pub data: Vec<OhlcDataPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MappingResult {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_format_serializes_kebab_case() {
        assert_eq!(serde_json::to_string(&SourceFormat::AlphaVantage).unwrap(), "\"alpha-vantage\"");
        assert_eq!(serde_json::to_string(&SourceFormat::Unknown).unwrap(), "\"unknown\"");
        assert_eq!(SourceFormat::TwelveData.to_string(), "twelve-data");
    }

    #[test]
    fn test_timestamp_keeps_both_representations() {
        let unix: Timestamp = serde_json::from_str("1700000000").unwrap();
        let text: Timestamp = serde_json::from_str("\"2024-01-02 16:00:00\"").unwrap();
        assert_eq!(unix, Timestamp::Unix(1_700_000_000));
        assert_eq!(text, Timestamp::Text("2024-01-02 16:00:00".to_string()));
    }

    #[test]
    fn test_timestamp_to_millis() {
        assert_eq!(Timestamp::Unix(1_700_000_000).to_millis(), Some(1_700_000_000_000));
        assert_eq!(Timestamp::from("1970-01-02").to_millis(), Some(86_400_000));
        assert_eq!(Timestamp::from("1970-01-01 00:01:00").to_millis(), Some(60_000));
        assert_eq!(Timestamp::from("1970-01-01T00:00:01Z").to_millis(), Some(1_000));
        assert_eq!(Timestamp::from("RELIANCE").to_millis(), None);
    }

    #[test]
    fn test_nan_price_is_written_as_null_and_read_back() {
        let point = OhlcDataPoint::new("2024-01-02", f64::NAN, 2.0, 1.0, 1.5, 10.0);
        assert!(!point.is_complete());

        let json = serde_json::to_value(&point).unwrap();
        assert!(json["open"].is_null());

        let back: OhlcDataPoint = serde_json::from_value(json).unwrap();
        assert!(back.open.is_nan());
        assert_eq!(back.close, 1.5);
    }

    #[test]
    fn test_mapping_result_omits_absent_metadata() {
        let result = MappingResult {
            format: SourceFormat::Finnhub,
            data: vec![OhlcDataPoint::new(1_700_000_000, 1.0, 2.0, 0.5, 1.5, 0.0)],
            symbol: None,
            interval: None,
            message: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("symbol").is_none());
        assert!(json.get("message").is_none());
        assert_eq!(json["data"][0]["timestamp"], 1_700_000_000);
    }

    #[test]
    fn test_degraded_points_compare_equal_to_themselves() {
        let point = OhlcDataPoint::new("2024-01-02", f64::NAN, 2.0, 1.0, 1.5, 0.0);
        assert_eq!(point, point.clone());
        assert_ne!(point, OhlcDataPoint::new("2024-01-02", 1.0, 2.0, 1.0, 1.5, 0.0));
        assert_ne!(point, OhlcDataPoint::new("2024-01-03", f64::NAN, 2.0, 1.0, 1.5, 0.0));
    }
}
