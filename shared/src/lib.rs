pub mod models;
pub mod utils;
pub mod widget;

// Data types shared by the engine and any front end that renders widgets.
// No I/O happens in this crate.
pub use models::{MappingResult, OhlcDataPoint, SourceFormat, Timestamp};
pub use widget::{ChartType, DisplayMode, FieldType, WidgetConfig};
