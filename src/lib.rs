// District-level compliance reports built from a violations log and an
// object registry.
//
// The engine (`reports::build_report`) is a pure function of two record
// collections and a `ReportConfig`; loading files and rendering the result
// live in `loader` and `output`.

pub mod district;
pub mod errors;
pub mod filter;
pub mod loader;
pub mod mapping;
pub mod output;
pub mod reports;
pub mod settings;
pub mod types;
pub mod util;

pub use errors::{ReportError, SettingsError};
pub use reports::build_report;
pub use types::{
    CellValue, DataSourceMode, DateRange, FieldKey, FieldMapping, Record, ReportConfig,
    ReportResult, ReportRow, SelectionMode,
};
