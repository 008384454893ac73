pub mod widget_service;

pub use widget_service::{CardField, JsonFileSource, ResponseSource, WidgetService, WidgetView};
