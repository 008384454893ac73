// Groww quote responses
//
// { "status": "SUCCESS",
//   "payload": { "RELIANCE": "{open: 2890.5,high: 2915,low: 2880.1,close: 2901.35}", ... } }
//
// Each quote is a brace-wrapped `key: value` list embedded in a string. Groww
// gives no time axis, so the payload key (the symbol) stands in as the
// point's timestamp.
use std::collections::HashMap;

use serde_json::Value;
use shared::models::{OhlcDataPoint, SourceFormat, Timestamp};

use super::{numeric, MappingError, OhlcMapper};

pub struct GrowwMapper;

/// Parse `"{open: 100,high: 110,low: 95,close: 105}"` into a key → value map.
///
/// Braces are stripped, segments split on `,` and each segment on its first
/// `:`. Empty segments are skipped. A segment without a colon is an error; a
/// value that is not a number is kept as NaN.
pub fn parse_quote_literal(literal: &str) -> Result<HashMap<String, f64>, MappingError> {
    let cleaned: String = literal.chars().filter(|c| *c != '{' && *c != '}').collect();

    let mut fields = HashMap::new();
    for segment in cleaned.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (key, value) = segment.split_once(':').ok_or_else(|| MappingError::MalformedQuote {
            segment: segment.to_string(),
        })?;
        fields.insert(key.trim().to_string(), numeric::parse_float_prefix(value.trim()));
    }
    Ok(fields)
}

impl OhlcMapper for GrowwMapper {
    fn format(&self) -> SourceFormat {
        SourceFormat::Groww
    }

    fn map(&self, response: &Value) -> Result<Vec<OhlcDataPoint>, MappingError> {
        let Some(payload) = response.get("payload").and_then(Value::as_object) else {
            return Ok(Vec::new());
        };

        payload
            .iter()
            .map(|(symbol, quote)| {
                let literal = quote.as_str().ok_or_else(|| MappingError::QuoteNotText {
                    symbol: symbol.clone(),
                })?;
                let fields = parse_quote_literal(literal)?;
                // Missing or unreadable prices fall back to 0
                let get = |key: &str| fields.get(key).copied().filter(|v| !v.is_nan()).unwrap_or(0.0);

                Ok(OhlcDataPoint {
                    timestamp: Timestamp::Text(symbol.clone()),
                    open: get("open"),
                    high: get("high"),
                    low: get("low"),
                    close: get("close"),
                    volume: 0.0,
                })
            })
            .collect()
    }
}
