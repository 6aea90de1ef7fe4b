use crate::types::{CellValue, Record};
use csv::ReaderBuilder;
use serde_json::Value;
use std::error::Error;
use std::path::Path;
use tracing::{info, warn};

/// Headers and non-blank rows of one source file.
#[derive(Debug, Clone, Default)]
pub struct LoadedSheet {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub blank_rows: usize,
}

/// Load a CSV or JSON file, picked by extension.
pub fn load_records(path: &Path) -> Result<(LoadedSheet, LoadReport), Box<dyn Error>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    let (sheet, report) = match extension.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        other => {
            return Err(format!(
                "unsupported file type '{}' for {}: expected .csv or .json",
                other,
                path.display()
            )
            .into())
        }
    };
    info!(
        path = %path.display(),
        rows = report.total_rows,
        kept = report.kept_rows,
        "loaded records"
    );
    if report.blank_rows > 0 {
        warn!(path = %path.display(), blank = report.blank_rows, "skipped blank rows");
    }
    Ok((sheet, report))
}

pub fn load_csv(path: &Path) -> Result<(LoadedSheet, LoadReport), Box<dyn Error>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
            h.trim().to_string()
        })
        .collect();

    let mut report = LoadReport::default();
    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        report.total_rows += 1;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(header, value)| {
                let value = value.trim();
                let cell = if value.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(value.to_string())
                };
                (header.clone(), cell)
            })
            .collect();
        push_unless_blank(&mut records, &mut report, record);
    }
    Ok((LoadedSheet { headers, records }, report))
}

/// A JSON array of flat objects; numbers stay numeric so serial dates survive.
pub fn load_json(path: &Path) -> Result<(LoadedSheet, LoadReport), Box<dyn Error>> {
    let text = std::fs::read_to_string(path)?;
    let rows: Vec<serde_json::Map<String, Value>> = serde_json::from_str(&text)?;

    let mut headers: Vec<String> = Vec::new();
    let mut report = LoadReport::default();
    let mut records = Vec::new();
    for row in rows {
        report.total_rows += 1;
        let mut record = Record::new();
        for (key, value) in row {
            let header = key.trim().to_string();
            if !headers.contains(&header) {
                headers.push(header.clone());
            }
            record.insert(header, json_cell(value));
        }
        push_unless_blank(&mut records, &mut report, record);
    }
    Ok((LoadedSheet { headers, records }, report))
}

fn json_cell(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::String(s) if s.trim().is_empty() => CellValue::Empty,
        Value::String(s) => CellValue::Text(s.trim().to_string()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => n.as_f64().map(CellValue::Float).unwrap_or_default(),
        },
        other => CellValue::Text(other.to_string()),
    }
}

fn push_unless_blank(records: &mut Vec<Record>, report: &mut LoadReport, record: Record) {
    if record.values().all(|v| *v == CellValue::Empty) {
        report.blank_rows += 1;
        return;
    }
    report.kept_rows += 1;
    records.push(record);
}
