// Chart projection of a normalized series.
// Turns a MappingResult into the x/y points a candlestick or line chart plots.
use serde::Serialize;
use serde_json::Value;
use shared::models::{MappingResult, OhlcDataPoint};
use shared::widget::{ChartType, DisplayMode};

use crate::error::{EngineError, EngineResult};
use crate::ohlc;

const NO_TIME_AXIS_MESSAGE: &str = "None of the OHLC points has a timestamp that can be placed on a time axis.";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CandlePoint {
    pub x: i64, // epoch millis
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LinePoint {
    pub x: i64,
    pub y: f64, // close price
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "points", rename_all = "lowercase")]
pub enum ChartSeries {
    Candlestick(Vec<CandlePoint>),
    Linear(Vec<LinePoint>),
}

impl ChartSeries {
    /// Build the series for `chart_type`.
    ///
    /// Fails with `ChartUnavailable` (carrying the mapping message) when the result
    /// has no points. Points whose timestamp has no position on a time axis are
    /// skipped.
    pub fn from_result(result: &MappingResult, chart_type: ChartType) -> EngineResult<Self> {
        if !result.format.is_known() || result.data.is_empty() {
            let reason = result
                .message
                .clone()
                .unwrap_or_else(|| ohlc::NO_DATA_MESSAGE.to_string());
            return Err(EngineError::ChartUnavailable(reason));
        }

        let placed: Vec<(i64, &OhlcDataPoint)> = result
            .data
            .iter()
            .filter_map(|point| point.timestamp.to_millis().map(|x| (x, point)))
            .collect();

        if placed.is_empty() {
            return Err(EngineError::ChartUnavailable(NO_TIME_AXIS_MESSAGE.to_string()));
        }
        if placed.len() < result.data.len() {
            tracing::debug!(
                skipped = result.data.len() - placed.len(),
                "Skipping OHLC points without a usable timestamp"
            );
        }

        let series = match chart_type {
            ChartType::Candlestick => ChartSeries::Candlestick(
                placed
                    .into_iter()
                    .map(|(x, p)| CandlePoint { x, o: p.open, h: p.high, l: p.low, c: p.close })
                    .collect(),
            ),
            ChartType::Linear => ChartSeries::Linear(
                placed
                    .into_iter()
                    .map(|(x, p)| LinePoint { x, y: p.close })
                    .collect(),
            ),
        };
        Ok(series)
    }

    pub fn len(&self) -> usize {
        match self {
            ChartSeries::Candlestick(points) => points.len(),
            ChartSeries::Linear(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Normalize a raw response and project it for a chart in one step.
pub fn chart_from_response(response: &Value, chart_type: ChartType) -> EngineResult<ChartSeries> {
    ChartSeries::from_result(&ohlc::map_to_ohlc(response), chart_type)
}

/// Display modes the widget form should offer for a response.
///
/// Card and table work with any JSON; chart mode needs at least one OHLC point
/// that can be placed on a time axis.
pub fn available_display_modes(response: &Value) -> Vec<DisplayMode> {
    let mut modes = vec![DisplayMode::Card, DisplayMode::Table];
    if ohlc::has_chartable_ohlc_data(response) {
        modes.push(DisplayMode::Chart);
    }
    modes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ohlc::fixtures;
    use serde_json::json;

    #[test]
    fn test_finnhub_seconds_become_millis() {
        let series = chart_from_response(&fixtures::finnhub(), ChartType::Candlestick).unwrap();
        let ChartSeries::Candlestick(points) = series else {
            panic!("expected candlestick series");
        };
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], CandlePoint { x: 1_569_297_600_000, o: 221.03, h: 222.49, l: 217.19, c: 217.68 });
    }

    #[test]
    fn test_linear_series_plots_close() {
        let series = chart_from_response(&fixtures::twelve_data(), ChartType::Linear).unwrap();
        let ChartSeries::Linear(points) = series else {
            panic!("expected linear series");
        };
        assert_eq!(points.len(), 2);
        assert_eq!(points[1].y, 181.17999);
        assert!(points[0].x < points[1].x);
    }

    #[test]
    fn test_unknown_response_has_no_chart() {
        let err = chart_from_response(&json!({ "price": 1 }), ChartType::Linear).unwrap_err();
        match err {
            EngineError::ChartUnavailable(reason) => assert_eq!(reason, ohlc::UNKNOWN_FORMAT_MESSAGE),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_groww_symbols_cannot_be_placed_on_time_axis() {
        let err = chart_from_response(&fixtures::groww(), ChartType::Candlestick).unwrap_err();
        assert_eq!(err.kind(), "chart_unavailable");
    }

    #[test]
    fn test_series_serializes_with_type_tag() {
        let series = ChartSeries::Linear(vec![LinePoint { x: 1000, y: 2.5 }]);
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json, json!({ "type": "linear", "points": [ { "x": 1000, "y": 2.5 } ] }));
    }

    #[test]
    fn test_available_display_modes() {
        assert_eq!(
            available_display_modes(&fixtures::alpha_vantage()),
            vec![DisplayMode::Card, DisplayMode::Table, DisplayMode::Chart]
        );
        assert_eq!(
            available_display_modes(&json!({ "meta": {}, "values": [] })),
            vec![DisplayMode::Card, DisplayMode::Table]
        );
        assert_eq!(available_display_modes(&fixtures::groww()).len(), 2);

        // Chart mode is offered exactly when a chart can be built
        for (_, response) in fixtures::all_known() {
            let offered = available_display_modes(&response).contains(&DisplayMode::Chart);
            assert_eq!(offered, chart_from_response(&response, ChartType::Linear).is_ok());
        }
    }
}
