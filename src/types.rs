use crate::errors::ReportError;
use crate::mapping::{missing_required, OBJECT_FIELDS, VIOLATION_FIELDS};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Upper bound on custom-selected object types per report.
pub const MAX_SELECTED_TYPES: usize = 3;

/// A single spreadsheet cell as handed over by the I/O layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

/// One source row keyed by its raw column header.
pub type Record = HashMap<String, CellValue>;

/// Logical fields the engine reads from either record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    Id,
    Status,
    ViolationName,
    InspectionResult,
    ObjectType,
    ObjectName,
    InspectionDate,
    District,
    DataSource,
}

impl FieldKey {
    pub const ALL: [FieldKey; 9] = [
        FieldKey::Id,
        FieldKey::Status,
        FieldKey::ViolationName,
        FieldKey::InspectionResult,
        FieldKey::ObjectType,
        FieldKey::ObjectName,
        FieldKey::InspectionDate,
        FieldKey::District,
        FieldKey::DataSource,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Id => "id",
            FieldKey::Status => "status",
            FieldKey::ViolationName => "violationName",
            FieldKey::InspectionResult => "inspectionResult",
            FieldKey::ObjectType => "objectType",
            FieldKey::ObjectName => "objectName",
            FieldKey::InspectionDate => "inspectionDate",
            FieldKey::District => "district",
            FieldKey::DataSource => "dataSource",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FieldKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown field key '{}'", wanted))
    }
}

/// Static description of a logical field and the headers it is usually found under.
#[derive(Debug, Clone, Copy)]
pub struct FieldDefinition {
    pub key: FieldKey,
    pub label: &'static str,
    pub candidates: &'static [&'static str],
    pub optional: bool,
}

/// Logical field -> chosen column header. An empty header means "unmapped".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping(BTreeMap<FieldKey, String>);

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mapped header, or `None` if the field is unmapped.
    pub fn get(&self, key: FieldKey) -> Option<&str> {
        self.0
            .get(&key)
            .map(String::as_str)
            .filter(|header| !header.is_empty())
    }

    pub fn set(&mut self, key: FieldKey, header: impl Into<String>) {
        self.0.insert(key, header.into());
    }

    pub fn contains_key(&self, key: FieldKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(FieldKey, String)> for FieldMapping {
    fn from_iter<I: IntoIterator<Item = (FieldKey, String)>>(iter: I) -> Self {
        FieldMapping(iter.into_iter().collect())
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, value: NaiveDate) -> bool {
        self.start <= value && value <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    All,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceMode {
    #[default]
    All,
    Oati,
    Cafap,
}

impl FromStr for DataSourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(DataSourceMode::All),
            "oati" | "оати" => Ok(DataSourceMode::Oati),
            "cafap" | "цафап" => Ok(DataSourceMode::Cafap),
            other => Err(format!(
                "unknown data source '{}', expected one of: all, oati, cafap",
                other
            )),
        }
    }
}

/// Everything a single report run needs besides the records themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub violation_mapping: FieldMapping,
    pub object_mapping: FieldMapping,
    pub current_period: DateRange,
    pub previous_period: DateRange,
    pub type_mode: SelectionMode,
    pub selected_types: Vec<String>,
    pub violation_mode: SelectionMode,
    pub selected_violations: Vec<String>,
    pub data_source_mode: DataSourceMode,
}

impl ReportConfig {
    /// Config with both filters set to "all" and every data source included.
    pub fn new(
        violation_mapping: FieldMapping,
        object_mapping: FieldMapping,
        current_period: DateRange,
        previous_period: DateRange,
    ) -> Self {
        Self {
            violation_mapping,
            object_mapping,
            current_period,
            previous_period,
            type_mode: SelectionMode::All,
            selected_types: Vec::new(),
            violation_mode: SelectionMode::All,
            selected_violations: Vec::new(),
            data_source_mode: DataSourceMode::All,
        }
    }

    /// Rejects configurations the engine must never run with.
    pub fn validate(&self) -> Result<(), ReportError> {
        let mut labels = missing_required(&self.violation_mapping, VIOLATION_FIELDS);
        labels.extend(missing_required(&self.object_mapping, OBJECT_FIELDS));
        if !labels.is_empty() {
            return Err(ReportError::MissingFields { labels });
        }
        if !self.current_period.is_valid() {
            return Err(ReportError::InvertedPeriod { period: "current" });
        }
        if !self.previous_period.is_valid() {
            return Err(ReportError::InvertedPeriod { period: "previous" });
        }
        if self.type_mode == SelectionMode::Custom && self.selected_types.len() > MAX_SELECTED_TYPES {
            return Err(ReportError::TooManyTypes {
                selected: self.selected_types.len(),
                max: MAX_SELECTED_TYPES,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub label: String,
    pub total_objects: usize,
    pub inspected_objects: usize,
    pub inspected_percent: f64,
    pub violation_percent: f64,
    pub total_violations: usize,
    pub current_violations: usize,
    pub previous_control: usize,
    pub resolved: usize,
    pub on_control: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportResult {
    pub rows: Vec<ReportRow>,
    pub total_row: ReportRow,
}
