pub mod error;
pub mod load;
pub mod query;
pub mod report;
pub mod session;
pub mod structs;

// Re-export public API
pub use error::{ClimateError, Result};
pub use load::{print_report, read_records, write_json, write_parquet, write_report, write_report_text};
pub use query::Extreme;
pub use report::{ClimateAnalyzer, Query, Report, ReportKind};
pub use session::Session;
pub use structs::{Month, OutputFormat, Record, ReportConfig, SimpleLogger, TemperatureUnit};
