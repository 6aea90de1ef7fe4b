use crate::types::{DataSourceMode, ReportConfig, SelectionMode};
use crate::util::normalize_key;
use std::collections::HashSet;

const OATI_TOKEN: &str = "оати";
const CAFAP_TOKEN: &str = "цафап";

/// Which source system(s) a data-source cell mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceCategory {
    Unknown,
    Oati,
    Cafap,
    Both,
}

pub fn categorize_data_source(text: &str) -> DataSourceCategory {
    let normalized = normalize_key(text);
    match (normalized.contains(OATI_TOKEN), normalized.contains(CAFAP_TOKEN)) {
        (true, true) => DataSourceCategory::Both,
        (true, false) => DataSourceCategory::Oati,
        (false, true) => DataSourceCategory::Cafap,
        (false, false) => DataSourceCategory::Unknown,
    }
}

/// Allow-list gate over one categorical field.
#[derive(Debug, Clone)]
pub struct SelectionGate {
    mode: SelectionMode,
    allowed: HashSet<String>,
}

impl SelectionGate {
    pub fn new(mode: SelectionMode, selection: &[String]) -> Self {
        let allowed = selection
            .iter()
            .map(|value| normalize_key(value))
            .filter(|value| !value.is_empty())
            .collect();
        Self { mode, allowed }
    }

    /// Custom mode with at least one usable selected value.
    pub fn is_restrictive(&self) -> bool {
        self.mode == SelectionMode::Custom && !self.allowed.is_empty()
    }

    /// An empty value only passes in "all" mode: under a custom selection it
    /// cannot be shown to match.
    pub fn allows(&self, value: &str) -> bool {
        let normalized = normalize_key(value);
        if normalized.is_empty() {
            return self.mode == SelectionMode::All;
        }
        if !self.is_restrictive() {
            return true;
        }
        self.allowed.contains(&normalized)
    }
}

/// The three per-record gates of a report run.
#[derive(Debug, Clone)]
pub struct RecordFilter {
    pub types: SelectionGate,
    pub violations: SelectionGate,
    data_source_mode: DataSourceMode,
}

impl RecordFilter {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            types: SelectionGate::new(config.type_mode, &config.selected_types),
            violations: SelectionGate::new(config.violation_mode, &config.selected_violations),
            data_source_mode: config.data_source_mode,
        }
    }

    pub fn allow_type(&self, value: &str) -> bool {
        self.types.allows(value)
    }

    pub fn allow_violation(&self, value: &str) -> bool {
        self.violations.allows(value)
    }

    /// `value` is `None` when the data-source column is not mapped.
    pub fn allow_data_source(&self, value: Option<&str>) -> bool {
        let Some(text) = value else {
            return true;
        };
        match (categorize_data_source(text), self.data_source_mode) {
            (_, DataSourceMode::All) => true,
            (DataSourceCategory::Oati, DataSourceMode::Oati) => true,
            (DataSourceCategory::Cafap, DataSourceMode::Cafap) => true,
            _ => false,
        }
    }
}
