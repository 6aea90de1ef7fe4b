use thiserror::Error;

/// Configuration problems detected before any record is scanned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("required fields are not mapped: {}", .labels.join(", "))]
    MissingFields { labels: Vec<String> },
    #[error("the {period} period starts after it ends")]
    InvertedPeriod { period: &'static str },
    #[error("at most {max} object types can be selected, got {selected}")]
    TooManyTypes { selected: usize, max: usize },
}

/// Problems turning settings files and command-line flags into a report config.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("{period} period is missing; pass it as DD.MM.YYYY-DD.MM.YYYY")]
    MissingPeriod { period: &'static str },
    #[error("invalid {period} period '{value}', expected DD.MM.YYYY-DD.MM.YYYY")]
    InvalidPeriod { period: &'static str, value: String },
    #[error("invalid mapping override '{value}': {message}")]
    InvalidOverride { value: String, message: String },
    #[error("column '{header}' for field '{field}' is not present in the {source_kind} file")]
    UnknownHeader {
        field: String,
        header: String,
        source_kind: &'static str,
    },
    #[error("failed to read settings file '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed settings file")]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Report(#[from] ReportError),
}
