// Widget configuration as stored by the dashboard.
// Only configuration lives here: fetched payloads and normalized series are
// rebuilt on every refresh and never stored.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JSON type of a field picked from an API response.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Null,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Card,
    Table,
    Chart,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Candlestick,
    Linear,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedField {
    pub path: String, // Dot path into the response, e.g. "quote.c"
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    // Table mode: the array the column belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_path: Option<String>,
}

/// Grid placement (react-grid-layout style units).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GridLayout {
    pub i: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_api_url: Option<String>,
    pub refresh_rate: u64, // seconds
    #[serde(default)]
    pub selected_fields: Vec<SelectedField>,
    #[serde(default)]
    pub display_mode: DisplayMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<GridLayout>,
}

impl WidgetConfig {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, refresh_rate: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            symbol: symbol.into(),
            custom_api_url: None,
            refresh_rate,
            selected_fields: Vec::new(),
            display_mode: DisplayMode::default(),
            chart_type: None,
            layout: None,
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.custom_api_url = Some(url.into());
        self
    }

    /// Switch to chart mode with the given chart type.
    pub fn as_chart(mut self, chart_type: ChartType) -> Self {
        self.display_mode = DisplayMode::Chart;
        self.chart_type = Some(chart_type);
        self
    }

    /// Chart type to render with; candlestick when none was chosen.
    pub fn effective_chart_type(&self) -> ChartType {
        self.chart_type.unwrap_or_default()
    }
}
