use crate::types::{
    DataSourceMode, FieldDefinition, FieldMapping, ReportConfig, ReportResult, ReportRow,
    SelectionMode,
};
use crate::util::{format_display_date, format_integer, format_percent};
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

pub const COLUMN_COUNT: usize = 10;
const DEFAULT_TOTAL_HEADER: &str = "Всего ОДХ";
const HEADER_NUMBERS: [&str; COLUMN_COUNT] = ["1", "2", "3", "4", "4.1", "4.2", "5", "6", "6.1", "6.2"];

/// Header of the "total objects" column, which names the selected types.
pub fn build_total_header(mode: SelectionMode, selected_types: &[String]) -> String {
    if mode != SelectionMode::Custom || selected_types.is_empty() {
        return DEFAULT_TOTAL_HEADER.to_string();
    }
    if let [only] = selected_types {
        return format!("Всего {}", only);
    }
    format!("Всего ({})", selected_types.join(", "))
}

pub fn describe_data_source(mode: DataSourceMode) -> &'static str {
    match mode {
        DataSourceMode::Oati => "накопленные только ОАТИ",
        DataSourceMode::Cafap => "накопленные только ЦАФАП",
        DataSourceMode::All => "выявленные ОАТИ и ЦАФАП",
    }
}

pub fn build_table_headers(config: &ReportConfig) -> Vec<String> {
    let period = &config.current_period;
    vec![
        "Округ".to_string(),
        build_total_header(config.type_mode, &config.selected_types),
        format!(
            "Проверено ОДХ с {} по {}",
            format_display_date(period.start),
            format_display_date(period.end)
        ),
        "% проверенных объектов от общего количества ОДХ".to_string(),
        "% объектов с нарушениями".to_string(),
        "Всего нарушений".to_string(),
        "Нарушения, выявленные за отчётный период".to_string(),
        "Нарушения, на контроле с предыдущей проверки".to_string(),
        "Устранено нарушений".to_string(),
        "Нарушения на контроле".to_string(),
    ]
}

pub fn build_title(config: &ReportConfig) -> String {
    let period = &config.current_period;
    format!(
        "Нарушения на ОДХ (отчёт за {}–{}), {}",
        format_display_date(period.start),
        format_display_date(period.end),
        describe_data_source(config.data_source_mode)
    )
}

/// Column numbering row; columns past the template get plain ordinals.
pub fn header_numbers(column_count: usize) -> Vec<String> {
    (0..column_count)
        .map(|i| match HEADER_NUMBERS.get(i) {
            Some(n) => n.to_string(),
            None => (i + 1).to_string(),
        })
        .collect()
}

/// Display strings for the ten table columns.
pub fn format_row(row: &ReportRow) -> Vec<String> {
    vec![
        row.label.clone(),
        format_integer(row.total_objects),
        format_integer(row.inspected_objects),
        format_percent(row.inspected_percent),
        format_percent(row.violation_percent),
        format_integer(row.total_violations),
        format_integer(row.current_violations),
        format_integer(row.previous_control),
        format_integer(row.resolved),
        format_integer(row.on_control),
    ]
}

/// One cell of the exported grid. Percentages are stored as fractions.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetCell {
    Blank,
    Text(String),
    Count(usize),
    Percent(f64),
}

impl fmt::Display for SheetCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetCell::Blank => Ok(()),
            SheetCell::Text(s) => f.write_str(s),
            SheetCell::Count(n) => write!(f, "{}", n),
            SheetCell::Percent(fraction) => write!(f, "{:.1}%", fraction * 100.0),
        }
    }
}

fn sheet_row(row: &ReportRow) -> Vec<SheetCell> {
    vec![
        SheetCell::Text(row.label.clone()),
        SheetCell::Count(row.total_objects),
        SheetCell::Count(row.inspected_objects),
        SheetCell::Percent(row.inspected_percent / 100.0),
        SheetCell::Percent(row.violation_percent / 100.0),
        SheetCell::Count(row.total_violations),
        SheetCell::Count(row.current_violations),
        SheetCell::Count(row.previous_control),
        SheetCell::Count(row.resolved),
        SheetCell::Count(row.on_control),
    ]
}

/// Title, blank line, numbering, headers, district rows and the total row.
pub fn build_sheet_grid(result: &ReportResult, config: &ReportConfig) -> Vec<Vec<SheetCell>> {
    let mut grid = vec![
        vec![SheetCell::Text(build_title(config))],
        vec![],
        header_numbers(COLUMN_COUNT).into_iter().map(SheetCell::Text).collect(),
        build_table_headers(config).into_iter().map(SheetCell::Text).collect(),
    ];
    grid.extend(result.rows.iter().map(sheet_row));
    grid.push(sheet_row(&result.total_row));
    grid
}

/// Write the grid as a rectangular CSV, padding short rows with empty cells.
pub fn write_sheet_csv(path: &Path, grid: &[Vec<SheetCell>]) -> Result<(), Box<dyn Error>> {
    let width = grid.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let mut wtr = csv::Writer::from_path(path)?;
    for row in grid {
        let mut cells: Vec<String> = row.iter().map(ToString::to_string).collect();
        cells.resize(width, String::new());
        wtr.write_record(&cells)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn render_report(result: &ReportResult, config: &ReportConfig) -> String {
    let mut builder = Builder::default();
    builder.push_record(build_table_headers(config));
    for row in result.rows.iter().chain(std::iter::once(&result.total_row)) {
        builder.push_record(format_row(row));
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn preview_report(result: &ReportResult, config: &ReportConfig) {
    println!("{}", build_title(config));
    println!();
    if result.rows.is_empty() {
        println!("(no rows)\n");
    }
    println!("{}\n", render_report(result, config));
}

#[derive(Debug, Clone, Tabled)]
pub struct MappingRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Label")]
    pub label: String,
    #[tabled(rename = "Column")]
    pub column: String,
    #[tabled(rename = "Required")]
    pub required: String,
}

pub fn mapping_rows(mapping: &FieldMapping, definitions: &[FieldDefinition]) -> Vec<MappingRow> {
    definitions
        .iter()
        .map(|def| MappingRow {
            field: def.key.to_string(),
            label: def.label.to_string(),
            column: mapping.get(def.key).unwrap_or("—").to_string(),
            required: if def.optional { "no" } else { "yes" }.to_string(),
        })
        .collect()
}

pub fn preview_mapping(title: &str, mapping: &FieldMapping, definitions: &[FieldDefinition]) {
    println!("{}\n", title);
    let table = Table::new(mapping_rows(mapping, definitions))
        .with(Style::markdown())
        .to_string();
    println!("{}\n", table);
}
