// JSON field helpers for card and table widgets.
// These work on the raw API response; the OHLC normalizer lives in the engine.
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::widget::{DisplayMode, FieldType};

/// Resolve a dot path like `"quote.c"` or `"values.0.close"` against a response.
pub fn value_by_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |current, key| match current {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key.parse::<usize>().ok().and_then(|idx| items.get(idx)),
        _ => None,
    })
}

pub fn field_type_of(value: &Value) -> FieldType {
    match value {
        Value::Null => FieldType::Null,
        Value::Bool(_) => FieldType::Boolean,
        Value::Number(_) => FieldType::Number,
        Value::String(_) => FieldType::String,
        Value::Array(_) => FieldType::Array,
        Value::Object(_) => FieldType::Object,
    }
}

/// One selectable field of a response, as listed by the field picker.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedField {
    pub path: String,
    pub value: Value, // primitives verbatim; containers as a short preview
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub is_nested_array: bool,
}

/// List every field of a response. Objects are listed and then recursed into;
/// arrays are listed with an item count and not descended.
pub fn flatten_fields(root: &Value) -> Vec<FlattenedField> {
    let mut fields = Vec::new();
    match root {
        Value::Object(map) => {
            for (key, value) in map {
                collect_field(key.clone(), value, &mut fields);
            }
        }
        Value::Array(items) => {
            for (idx, value) in items.iter().enumerate() {
                collect_field(idx.to_string(), value, &mut fields);
            }
        }
        _ => {}
    }
    fields
}

fn collect_field(path: String, value: &Value, fields: &mut Vec<FlattenedField>) {
    match value {
        Value::Array(items) => {
            let preview = if items.is_empty() {
                "[]".to_string()
            } else {
                format!("[{} items]", items.len())
            };
            fields.push(FlattenedField {
                path,
                value: Value::String(preview),
                field_type: FieldType::Array,
                is_nested_array: items.first().is_some_and(has_array_member),
            });
        }
        Value::Object(map) => {
            fields.push(FlattenedField {
                path: path.clone(),
                value: Value::String("{...}".to_string()),
                field_type: FieldType::Object,
                is_nested_array: false,
            });
            for (key, child) in map {
                collect_field(format!("{}.{}", path, key), child, fields);
            }
        }
        primitive => fields.push(FlattenedField {
            path,
            value: primitive.clone(),
            field_type: field_type_of(primitive),
            is_nested_array: false,
        }),
    }
}

fn has_array_member(item: &Value) -> bool {
    item.as_object()
        .is_some_and(|map| map.values().any(Value::is_array))
}

/// Fields offered for a display mode.
///
/// Card mode offers primitives. Table mode first offers arrays; once an array is
/// chosen (`array_path`) it offers the fields of that array's first item. Chart
/// mode has no field selection.
pub fn fields_for_mode(root: &Value, mode: DisplayMode, array_path: Option<&str>) -> Vec<FlattenedField> {
    match (mode, array_path) {
        (DisplayMode::Card, _) => flatten_fields(root)
            .into_iter()
            .filter(|f| !matches!(f.field_type, FieldType::Array | FieldType::Object))
            .collect(),
        (DisplayMode::Table, None) => flatten_fields(root)
            .into_iter()
            .filter(|f| f.field_type == FieldType::Array)
            .collect(),
        (DisplayMode::Table, Some(path)) => match value_by_path(root, path) {
            Some(Value::Array(items)) => match items.first() {
                Some(first @ Value::Object(_)) => flatten_fields(first),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        },
        (DisplayMode::Chart, _) => Vec::new(),
    }
}

/// Rank fields against a search term, best match first.
///
/// Both the path and the value preview are matched; fields matching neither are
/// dropped. An empty term returns the fields unchanged.
pub fn search_fields(fields: Vec<FlattenedField>, term: &str) -> Vec<FlattenedField> {
    let term = term.trim();
    if term.is_empty() {
        return fields;
    }

    let matcher = SkimMatcherV2::default().ignore_case();
    let mut scored: Vec<(i64, FlattenedField)> = fields
        .into_iter()
        .filter_map(|field| {
            let preview = match &field.value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let score = matcher
                .fuzzy_match(&field.path, term)
                .max(matcher.fuzzy_match(&preview, term))?;
            Some((score, field))
        })
        .collect();

    // Stable sort keeps response order among equal scores
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, field)| field).collect()
}

/// Rows for a table widget.
///
/// Reads the array at `array_path` (or the response itself when it is an array).
/// When items carry nested arrays, every nested item becomes its own row merged
/// with the parent's flattened scalar fields.
pub fn extract_table_rows(root: &Value, array_path: Option<&str>) -> Vec<Value> {
    if let Some(Value::Array(items)) = array_path.and_then(|path| value_by_path(root, path)) {
        let needs_flattening = items.iter().any(has_array_member);
        return if needs_flattening {
            flatten_nested_array(items)
        } else {
            items.clone()
        };
    }

    match root {
        Value::Array(items) => items.clone(),
        _ => Vec::new(),
    }
}

/// Flatten nested objects into dot-notation keys. Arrays are kept as JSON text.
pub fn flatten_object(value: &Value, prefix: &str) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into(value, prefix, &mut out);
    out
}

fn flatten_into(value: &Value, prefix: &str, out: &mut Map<String, Value>) {
    let Value::Object(map) = value else {
        return;
    };
    for (key, child) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match child {
            Value::Array(_) => {
                out.insert(path, Value::String(child.to_string()));
            }
            Value::Object(_) => flatten_into(child, &path, out),
            other => {
                out.insert(path, other.clone());
            }
        }
    }
}

fn flatten_nested_array(items: &[Value]) -> Vec<Value> {
    let mut rows = Vec::new();

    for item in items {
        let Value::Object(map) = item else {
            rows.push(item.clone());
            continue;
        };

        let mut nested: Vec<(&String, &Vec<Value>)> = Vec::new();
        let mut parent_fields = Map::new();
        for (key, value) in map {
            match value {
                Value::Array(values) if !values.is_empty() => nested.push((key, values)),
                // Empty arrays contribute nothing
                Value::Array(_) => {}
                Value::Object(_) => parent_fields.extend(flatten_object(value, key)),
                other => {
                    parent_fields.insert(key.clone(), other.clone());
                }
            }
        }

        if nested.is_empty() {
            rows.push(Value::Object(parent_fields));
            continue;
        }

        for (key, values) in nested {
            for nested_item in values {
                let mut row = parent_fields.clone();
                match nested_item {
                    Value::Object(_) => row.extend(flatten_object(nested_item, "")),
                    primitive => {
                        row.insert(key.clone(), primitive.clone());
                    }
                }
                rows.push(Value::Object(row));
            }
        }
    }

    rows
}

/// Human-readable cell text for a card or table value.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "N/A".to_string(),
        Value::Bool(true) => "Yes".to_string(),
        Value::Bool(false) => "No".to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) => format_number(f),
            None => n.to_string(),
        },
        Value::String(s) => s.clone(),
        container => container.to_string(),
    }
}

// en-US style: thousands separators, at most three fraction digits.
fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let rounded = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && (int_part != "0" || !frac_part.is_empty()) { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{}", sign, grouped, frac_part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quote_response() -> Value {
        json!({
            "symbol": "AAPL",
            "quote": { "c": 189.5, "h": 190.1, "pc": null },
            "profile": { "name": "Apple Inc", "listed": true },
            "history": [ { "close": 1.0 }, { "close": 2.0 } ]
        })
    }

    #[test]
    fn test_value_by_path() {
        let response = quote_response();
        assert_eq!(value_by_path(&response, "quote.c"), Some(&json!(189.5)));
        assert_eq!(value_by_path(&response, "history.1.close"), Some(&json!(2.0)));
        assert_eq!(value_by_path(&response, "quote.missing"), None);
        assert_eq!(value_by_path(&response, "symbol.deeper"), None);
    }

    #[test]
    fn test_flatten_fields_lists_objects_and_recurses() {
        let fields = flatten_fields(&quote_response());
        let paths: Vec<&str> = fields.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["symbol", "quote", "quote.c", "quote.h", "quote.pc", "profile", "profile.name", "profile.listed", "history"]
        );

        let history = fields.iter().find(|f| f.path == "history").unwrap();
        assert_eq!(history.field_type, FieldType::Array);
        assert_eq!(history.value, json!("[2 items]"));
        assert!(!history.is_nested_array);

        let pc = fields.iter().find(|f| f.path == "quote.pc").unwrap();
        assert_eq!(pc.field_type, FieldType::Null);
    }

    #[test]
    fn test_fields_for_mode() {
        let response = quote_response();

        let card = fields_for_mode(&response, DisplayMode::Card, None);
        assert!(card.iter().all(|f| !matches!(f.field_type, FieldType::Array | FieldType::Object)));
        assert_eq!(card.len(), 6);

        let arrays = fields_for_mode(&response, DisplayMode::Table, None);
        assert_eq!(arrays.len(), 1);
        assert_eq!(arrays[0].path, "history");

        let columns = fields_for_mode(&response, DisplayMode::Table, Some("history"));
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].path, "close");

        assert!(fields_for_mode(&response, DisplayMode::Chart, None).is_empty());
    }

    #[test]
    fn test_search_fields_ranks_and_filters() {
        let fields = flatten_fields(&quote_response());
        let found = search_fields(fields.clone(), "name");
        assert_eq!(found[0].path, "profile.name");
        assert!(found.iter().all(|f| f.path != "quote.h"));

        assert_eq!(search_fields(fields.clone(), "  ").len(), fields.len());
    }

    #[test]
    fn test_extract_table_rows_plain_array() {
        let rows = extract_table_rows(&quote_response(), Some("history"));
        assert_eq!(rows, vec![json!({ "close": 1.0 }), json!({ "close": 2.0 })]);

        let root_array = json!([1, 2, 3]);
        assert_eq!(extract_table_rows(&root_array, None).len(), 3);
        assert!(extract_table_rows(&json!({ "a": 1 }), None).is_empty());
    }

    #[test]
    fn test_extract_table_rows_fans_out_nested_arrays() {
        let response = json!({
            "sectors": [
                {
                    "name": "Energy",
                    "meta": { "region": "IN" },
                    "stocks": [ { "ticker": "RELIANCE", "px": { "last": 2900 } }, { "ticker": "ONGC" } ],
                    "tags": []
                },
                { "name": "Empty" }
            ]
        });

        let rows = extract_table_rows(&response, Some("sectors"));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["name"], "Energy");
        assert_eq!(rows[0]["meta.region"], "IN");
        assert_eq!(rows[0]["ticker"], "RELIANCE");
        assert_eq!(rows[0]["px.last"], 2900);
        assert_eq!(rows[1]["ticker"], "ONGC");
        assert_eq!(rows[2], json!({ "name": "Empty" }));
    }

    #[test]
    fn test_flatten_object_keeps_arrays_as_text() {
        let flat = flatten_object(&json!({ "a": { "b": 1, "c": [1, 2] } }), "");
        assert_eq!(flat["a.b"], 1);
        assert_eq!(flat["a.c"], "[1,2]");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&Value::Null), "N/A");
        assert_eq!(format_value(&json!(true)), "Yes");
        assert_eq!(format_value(&json!(1234567)), "1,234,567");
        assert_eq!(format_value(&json!(1234.5)), "1,234.5");
        assert_eq!(format_value(&json!(-0.12345)), "-0.123");
        assert_eq!(format_value(&json!("text")), "text");
        assert_eq!(format_value(&json!([1, 2])), "[1,2]");
    }
}
