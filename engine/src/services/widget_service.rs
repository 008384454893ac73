// Widget refresh: route the widget's URL, reuse a cached response when fresh,
// otherwise fetch through the configured ResponseSource, then render the view
// for the widget's display mode.
use serde::Serialize;
use serde_json::Value;
use shared::utils::{extract_table_rows, format_value, value_by_path};
use shared::widget::{DisplayMode, FieldType, SelectedField, WidgetConfig};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::chart::ChartSeries;
use crate::config::{ApiKeys, EngineSettings};
use crate::data::{CacheStats, ResponseCache};
use crate::error::{EngineError, EngineResult};
use crate::ohlc;
use crate::providers::{self, RoutedRequest};

/// Quote endpoint used for widgets that only name a symbol.
pub const DEFAULT_QUOTE_URL: &str = "https://finnhub.io/api/v1/quote?symbol=";

/// Where raw responses come from. The HTTP client lives outside the engine.
pub trait ResponseSource: Send + Sync {
    fn fetch(&self, request: &RoutedRequest) -> EngineResult<Value>;
}

/// Canned responses keyed by the URL the user typed; used for offline runs.
pub struct JsonFileSource {
    responses: HashMap<String, Value>,
}

impl JsonFileSource {
    pub fn new(responses: HashMap<String, Value>) -> Self {
        Self { responses }
    }

    /// Read a JSON object of `{ "<url>": <response>, ... }`.
    pub fn from_file(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let responses: HashMap<String, Value> = serde_json::from_str(&text)?;
        Ok(Self::new(responses))
    }
}

impl ResponseSource for JsonFileSource {
    fn fetch(&self, request: &RoutedRequest) -> EngineResult<Value> {
        self.responses
            .get(&request.requested_url)
            .cloned()
            .ok_or_else(|| EngineError::ProcessingError(providers::describe_http_status(404)))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CardField {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WidgetView {
    Card {
        fields: Vec<CardField>,
    },
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Chart {
        #[serde(skip_serializing_if = "Option::is_none")]
        symbol: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        interval: Option<String>,
        series: ChartSeries,
    },
    // Chart placeholder; the widget stays configured and retries next refresh
    Unavailable {
        message: String,
    },
}

pub struct WidgetService {
    api_keys: ApiKeys,
    cache: ResponseCache,
    source: Arc<dyn ResponseSource>,
}

impl WidgetService {
    pub fn new(settings: &EngineSettings, source: Arc<dyn ResponseSource>) -> Self {
        WidgetService {
            api_keys: settings.api_keys.clone(),
            cache: ResponseCache::new(settings.cache_ttl()),
            source,
        }
    }

    pub fn request_url(widget: &WidgetConfig) -> String {
        match &widget.custom_api_url {
            Some(url) if !url.trim().is_empty() => url.trim().to_string(),
            _ => format!("{}{}", DEFAULT_QUOTE_URL, widget.symbol.to_uppercase()),
        }
    }

    /// Raw response for `url`, served from the cache while fresh.
    pub fn fetch(&self, url: &str) -> EngineResult<Value> {
        if let Some(cached) = self.cache.get(url) {
            tracing::debug!(url, "Serving response from cache");
            return Ok(cached);
        }

        let request = providers::route_request(url, &self.api_keys)?;
        tracing::info!(url, provider = request.provider.unwrap_or("custom"), "Fetching upstream response");
        let response = self.source.fetch(&request)?;
        self.cache.insert(url, response.clone());
        Ok(response)
    }

    /// Fetch and render one widget.
    pub fn refresh(&self, widget: &WidgetConfig) -> EngineResult<WidgetView> {
        let url = Self::request_url(widget);
        let response = self.fetch(&url)?;
        Ok(Self::render(widget, &response))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Build the view of `response` for the widget's display mode.
    pub fn render(widget: &WidgetConfig, response: &Value) -> WidgetView {
        match widget.display_mode {
            DisplayMode::Card => WidgetView::Card {
                fields: widget
                    .selected_fields
                    .iter()
                    .map(|field| CardField {
                        label: field.label.clone(),
                        value: value_by_path(response, &field.path)
                            .map(format_value)
                            .unwrap_or_else(|| format_value(&Value::Null)),
                    })
                    .collect(),
            },
            DisplayMode::Table => render_table(&widget.selected_fields, response),
            DisplayMode::Chart => {
                let result = ohlc::map_to_ohlc(response);
                match ChartSeries::from_result(&result, widget.effective_chart_type()) {
                    Ok(series) => WidgetView::Chart {
                        symbol: result.symbol,
                        interval: result.interval,
                        series,
                    },
                    Err(EngineError::ChartUnavailable(message)) => WidgetView::Unavailable { message },
                    Err(e) => WidgetView::Unavailable { message: e.to_string() },
                }
            }
        }
    }
}

fn render_table(selected: &[SelectedField], response: &Value) -> WidgetView {
    let array_path = selected
        .iter()
        .find(|f| f.field_type == FieldType::Array)
        .map(|f| f.path.as_str())
        .or_else(|| selected.iter().find_map(|f| f.array_path.as_deref()));
    let columns: Vec<&SelectedField> = selected
        .iter()
        .filter(|f| f.field_type != FieldType::Array)
        .collect();

    let rows = extract_table_rows(response, array_path)
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| {
                    // Fanned-out rows carry dotted keys verbatim
                    let cell = row.get(&column.path).or_else(|| value_by_path(row, &column.path));
                    cell.map(format_value).unwrap_or_else(|| format_value(&Value::Null))
                })
                .collect()
        })
        .collect();

    WidgetView::Table {
        columns: columns.iter().map(|c| c.label.clone()).collect(),
        rows,
    }
}
