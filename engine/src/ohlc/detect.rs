// Structural format detection.
//
// None of the providers tags its payloads, so a response is classified by the
// keys it carries. Each signature is a predicate over the generic JSON value;
// the table is checked in order and the first hit wins.
use serde_json::{Map, Value};
use shared::models::SourceFormat;

/// Series keys Alpha Vantage uses across its intraday, daily, weekly and monthly endpoints.
pub const ALPHA_VANTAGE_SERIES_KEYS: [&str; 8] = [
    "Time Series (1min)",
    "Time Series (5min)",
    "Time Series (15min)",
    "Time Series (30min)",
    "Time Series (60min)",
    "Time Series (Daily)",
    "Weekly Time Series",
    "Monthly Time Series",
];

pub const ALPHA_VANTAGE_META_KEY: &str = "Meta Data";

type Signature = fn(&Map<String, Value>) -> bool;

const SIGNATURES: [(SourceFormat, Signature); 4] = [
    (SourceFormat::AlphaVantage, is_alpha_vantage),
    (SourceFormat::TwelveData, is_twelve_data),
    (SourceFormat::Finnhub, is_finnhub),
    (SourceFormat::Groww, is_groww),
];

/// Classify a response. Non-objects (null, scalars, arrays) are always `Unknown`.
pub fn detect_data_format(response: &Value) -> SourceFormat {
    let Value::Object(object) = response else {
        return SourceFormat::Unknown;
    };

    SIGNATURES
        .iter()
        .find(|(_, matches)| matches(object))
        .map(|(format, _)| *format)
        .unwrap_or(SourceFormat::Unknown)
}

fn is_alpha_vantage(object: &Map<String, Value>) -> bool {
    object.contains_key(ALPHA_VANTAGE_META_KEY)
        && ALPHA_VANTAGE_SERIES_KEYS.iter().any(|key| object.contains_key(*key))
}

fn is_twelve_data(object: &Map<String, Value>) -> bool {
    object.contains_key("meta") && object.get("values").is_some_and(Value::is_array)
}

fn is_finnhub(object: &Map<String, Value>) -> bool {
    ["c", "h", "l", "o", "t"]
        .iter()
        .all(|key| object.get(*key).is_some_and(Value::is_array))
}

fn is_groww(object: &Map<String, Value>) -> bool {
    if object.get("status").and_then(Value::as_str) != Some("SUCCESS") {
        return false;
    }
    // Only the first entry is sniffed; malformed later entries surface as mapping errors
    let first_quote = object
        .get("payload")
        .and_then(Value::as_object)
        .and_then(|payload| payload.values().next())
        .and_then(Value::as_str);

    match first_quote {
        Some(quote) => ["open:", "high:", "low:", "close:"]
            .iter()
            .all(|marker| quote.contains(marker)),
        None => false,
    }
}
