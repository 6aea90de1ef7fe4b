use chrono::NaiveDate;
use district_report::loader::load_records;
use district_report::output::{build_sheet_grid, SheetCell};
use district_report::settings::Settings;
use district_report::{
    build_report, CellValue, DataSourceMode, DateRange, FieldKey, FieldMapping, Record,
    ReportConfig, ReportError, SelectionMode,
};
use std::io::Write;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn rec(pairs: &[(&str, CellValue)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn mapping(pairs: &[(FieldKey, &str)]) -> FieldMapping {
    pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
}

fn config() -> ReportConfig {
    let violation_mapping = mapping(&[
        (FieldKey::Id, "ID"),
        (FieldKey::Status, "Статус"),
        (FieldKey::ViolationName, "Нарушение"),
        (FieldKey::InspectionResult, "Результат"),
        (FieldKey::ObjectType, "Тип"),
        (FieldKey::ObjectName, "Объект"),
        (FieldKey::InspectionDate, "Дата"),
        (FieldKey::District, "Округ"),
    ]);
    let object_mapping = mapping(&[
        (FieldKey::ObjectType, "Тип объекта"),
        (FieldKey::ObjectName, "Наименование"),
        (FieldKey::District, "Округ"),
    ]);
    ReportConfig::new(
        violation_mapping,
        object_mapping,
        DateRange::new(d(2024, 4, 1), d(2024, 4, 30)),
        DateRange::new(d(2024, 3, 1), d(2024, 3, 31)),
    )
}

struct V<'a> {
    id: &'a str,
    status: &'a str,
    name: &'a str,
    object: &'a str,
    date: NaiveDate,
    district: &'a str,
}

impl V<'_> {
    fn record(&self) -> Record {
        rec(&[
            ("ID", self.id.into()),
            ("Статус", self.status.into()),
            ("Нарушение", self.name.into()),
            ("Результат", "Нарушение выявлено".into()),
            ("Тип", "ОДХ".into()),
            ("Объект", self.object.into()),
            ("Дата", self.date.into()),
            ("Округ", self.district.into()),
        ])
    }
}

fn violation(id: &str, status: &str, object: &str, date: NaiveDate, district: &str) -> Record {
    V {
        id,
        status,
        name: "Неубранный снег",
        object,
        date,
        district,
    }
    .record()
}

fn object(kind: &str, name: &str, district: &str) -> Record {
    rec(&[
        ("Тип объекта", kind.into()),
        ("Наименование", name.into()),
        ("Округ", district.into()),
    ])
}

const CONTROL: &str = "На контроле инспектора ОАТИ";
const FULL_CENTRAL: &str = "Центральный административный округ";

fn sample() -> (Vec<Record>, Vec<Record>) {
    let violations = vec![
        violation("A1", CONTROL, "Объект А", d(2024, 4, 10), FULL_CENTRAL),
        violation("B1", "Снят с контроля", "Объект Б", d(2024, 4, 11), "ЦАО"),
        violation("A0", CONTROL, "Объект А", d(2024, 3, 5), "ЦАО"),
    ];
    let objects = vec![
        object("ОДХ", "Объект А", FULL_CENTRAL),
        object("ОДХ", "Объект Б", "ЦАО"),
    ];
    (violations, objects)
}

#[test]
fn basic_report_merges_district_spellings() {
    let (violations, objects) = sample();
    let report = build_report(&violations, &objects, &config()).unwrap();

    assert_eq!(report.rows.len(), 1);
    let row = &report.rows[0];
    assert_eq!(row.label, "ЦАО");
    assert_eq!(row.total_objects, 2);
    assert_eq!(row.inspected_objects, 2);
    assert_eq!(row.inspected_percent, 100.0);
    assert_eq!(row.violation_percent, 100.0);
    assert_eq!(row.total_violations, 3);
    assert_eq!(row.current_violations, 2);
    assert_eq!(row.previous_control, 1);
    assert_eq!(row.resolved, 1);
    assert_eq!(row.on_control, 1);

    assert_eq!(report.total_row.label, "ИТОГО");
    assert_eq!(report.total_row.total_objects, 2);
    assert_eq!(report.total_row.total_violations, 3);
}

#[test]
fn repeated_runs_are_identical() {
    let (violations, objects) = sample();
    let cfg = config();
    let first = build_report(&violations, &objects, &cfg).unwrap();
    let second = build_report(&violations, &objects, &cfg).unwrap();
    assert_eq!(first, second);
}

#[test]
fn period_boundaries_are_inclusive() {
    let violations = vec![
        violation("S", CONTROL, "Объект А", d(2024, 4, 1), "ЦАО"),
        violation("E", CONTROL, "Объект А", d(2024, 4, 30), "ЦАО"),
        violation("P", CONTROL, "Объект А", d(2024, 3, 31), "ЦАО"),
        violation("X", CONTROL, "Объект А", d(2024, 5, 1), "ЦАО"),
    ];
    let objects = vec![object("ОДХ", "Объект А", "ЦАО")];
    let report = build_report(&violations, &objects, &config()).unwrap();
    let row = &report.rows[0];
    assert_eq!(row.current_violations, 2);
    assert_eq!(row.previous_control, 1);
    assert_eq!(row.total_violations, 3);
}

#[test]
fn overlapping_periods_count_an_id_once_in_total() {
    let mut cfg = config();
    cfg.previous_period = DateRange::new(d(2024, 3, 15), d(2024, 4, 15));
    let violations = vec![violation("A1", CONTROL, "Объект А", d(2024, 4, 10), "ЦАО")];
    let objects = vec![object("ОДХ", "Объект А", "ЦАО")];
    let row = build_report(&violations, &objects, &cfg).unwrap().rows.remove(0);
    assert_eq!(row.current_violations, 1);
    assert_eq!(row.previous_control, 1);
    assert_eq!(row.total_violations, 1);
}

#[test]
fn total_row_is_a_union_across_districts() {
    let violations = vec![
        violation("A1", CONTROL, "Объект А", d(2024, 4, 10), "ЦАО"),
        violation("A1", CONTROL, "Объект А", d(2024, 4, 10), "САО"),
    ];
    let objects = vec![
        object("ОДХ", "Объект А", "ЦАО"),
        object("ОДХ", "Объект А", "Северный административный округ"),
    ];
    let report = build_report(&violations, &objects, &config()).unwrap();
    let labels: Vec<&str> = report.rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["САО", "ЦАО"]);

    let summed: usize = report.rows.iter().map(|r| r.current_violations).sum();
    assert_eq!(summed, 2);
    let total = &report.total_row;
    assert_eq!(total.current_violations, 1);
    assert_eq!(total.total_objects, 1);
    assert_eq!(total.inspected_objects, 1);
    assert_eq!(total.inspected_percent, 100.0);
}

#[test]
fn unparseable_dates_are_excluded_silently() {
    let mut bad = violation("A1", CONTROL, "Объект А", d(2024, 4, 10), "ЦАО");
    bad.insert("Дата".to_string(), "когда-то".into());
    let mut serial = violation("A2", CONTROL, "Объект А", d(2024, 4, 10), "ЦАО");
    serial.insert("Дата".to_string(), CellValue::Int(45392));
    let objects = vec![object("ОДХ", "Объект А", "ЦАО")];
    let report = build_report(&[bad, serial], &objects, &config()).unwrap();
    assert_eq!(report.rows[0].current_violations, 1);
}

#[test]
fn type_filter_applies_to_objects_and_violations() {
    let mut cfg = config();
    cfg.type_mode = SelectionMode::Custom;
    cfg.selected_types = vec!["Дворы".to_string()];
    let mut yard = violation("Y1", CONTROL, "Двор 1", d(2024, 4, 3), "ЦАО");
    yard.insert("Тип".to_string(), "дворы".into());
    let road = violation("R1", CONTROL, "Объект А", d(2024, 4, 3), "ЦАО");
    let mut blank = violation("N1", CONTROL, "Двор 2", d(2024, 4, 3), "ЦАО");
    blank.insert("Тип".to_string(), "".into());
    let objects = vec![
        object("Дворы", "Двор 1", "ЦАО"),
        object("ОДХ", "Объект А", "ЦАО"),
        object("", "Двор 2", "ЦАО"),
    ];
    let report = build_report(&[yard, road, blank], &objects, &cfg).unwrap();
    let row = &report.rows[0];
    assert_eq!(row.total_objects, 1);
    assert_eq!(row.current_violations, 1);
}

#[test]
fn more_than_three_types_is_a_config_error() {
    let mut cfg = config();
    cfg.type_mode = SelectionMode::Custom;
    cfg.selected_types = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
    let err = build_report(&[], &[], &cfg).unwrap_err();
    assert_eq!(err, ReportError::TooManyTypes { selected: 4, max: 3 });
}

#[test]
fn inverted_period_is_a_config_error() {
    let mut cfg = config();
    cfg.current_period = DateRange::new(d(2024, 4, 30), d(2024, 4, 1));
    let err = build_report(&[], &[], &cfg).unwrap_err();
    assert_eq!(err, ReportError::InvertedPeriod { period: "current" });
}

#[test]
fn missing_fields_are_all_named() {
    let mut cfg = config();
    cfg.violation_mapping = mapping(&[(FieldKey::Id, "ID")]);
    let err = build_report(&[], &[], &cfg).unwrap_err();
    let message = err.to_string();
    for label in ["Статус нарушения", "Наименование нарушения", "Дата обследования", "Округ"] {
        assert!(message.contains(label), "{message}");
    }
    assert!(!message.contains("Результат обследования"));
}

#[test]
fn violation_selection_restricts_counted_objects() {
    let mut cfg = config();
    cfg.violation_mode = SelectionMode::Custom;
    cfg.selected_violations = vec!["Яма".to_string()];
    let pothole = V {
        id: "P1",
        status: CONTROL,
        name: "Яма",
        object: "Объект А",
        date: d(2024, 4, 2),
        district: "ЦАО",
    }
    .record();
    let snow = violation("S1", CONTROL, "Объект Б", d(2024, 4, 2), "ЦАО");
    let objects = vec![
        object("ОДХ", "Объект А", "ЦАО"),
        object("ОДХ", "Объект Б", "ЦАО"),
    ];
    let row = build_report(&[pothole, snow], &objects, &cfg)
        .unwrap()
        .rows
        .remove(0);
    assert_eq!(row.total_objects, 1);
    assert_eq!(row.current_violations, 1);
}

#[test]
fn violation_selection_without_matches_leaves_objects_alone() {
    let mut cfg = config();
    cfg.violation_mode = SelectionMode::Custom;
    cfg.selected_violations = vec!["Граффити".to_string()];
    let (violations, objects) = sample();
    let row = build_report(&violations, &objects, &cfg).unwrap().rows.remove(0);
    assert_eq!(row.total_objects, 2);
    assert_eq!(row.current_violations, 0);
}

#[test]
fn data_source_mode_filters_violations() {
    let mut cfg = config();
    cfg.violation_mapping.set(FieldKey::DataSource, "Источник");
    let mut oati = violation("O1", CONTROL, "Объект А", d(2024, 4, 2), "ЦАО");
    oati.insert("Источник".to_string(), "ОАТИ".into());
    let mut cafap = violation("C1", CONTROL, "Объект А", d(2024, 4, 2), "ЦАО");
    cafap.insert("Источник".to_string(), "ЦАФАП".into());
    let unknown = violation("U1", CONTROL, "Объект А", d(2024, 4, 2), "ЦАО");
    let violations = vec![oati, cafap, unknown];
    let objects = vec![object("ОДХ", "Объект А", "ЦАО")];

    let all = build_report(&violations, &objects, &cfg).unwrap();
    assert_eq!(all.total_row.current_violations, 3);

    cfg.data_source_mode = DataSourceMode::Oati;
    let only_oati = build_report(&violations, &objects, &cfg).unwrap();
    assert_eq!(only_oati.total_row.current_violations, 1);
}

#[test]
fn csv_files_flow_through_settings_into_a_grid() {
    let mut violations = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(
        violations,
        "ID,Статус нарушения,Наименование нарушения,Тип объекта,Наименование объекта,Дата обследования,Округ\n\
         A1,На устранении,Яма,ОДХ,Объект А,10.04.2024,Центральный административный округ\n\
         A0,На устранении,Яма,ОДХ,Объект А,2024-03-05,ЦАО\n"
    )
    .unwrap();
    let mut objects = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(
        objects,
        "Вид объекта,Наименование объекта,Округ\nОДХ,Объект А,ЦАО\nОДХ,Объект Б,цао\n"
    )
    .unwrap();

    let (vsheet, _) = load_records(violations.path()).unwrap();
    let (osheet, _) = load_records(objects.path()).unwrap();
    let settings = Settings::parse(
        "[current]\nstart = \"01.04.2024\"\nend = \"30.04.2024\"\n\
         [previous]\nstart = \"01.03.2024\"\nend = \"31.03.2024\"\n",
    )
    .unwrap();
    let cfg = settings.into_config(&vsheet.headers, &osheet.headers).unwrap();
    let report = build_report(&vsheet.records, &osheet.records, &cfg).unwrap();

    assert_eq!(report.rows.len(), 1);
    let row = &report.rows[0];
    assert_eq!(row.label, "ЦАО");
    assert_eq!(row.total_objects, 2);
    assert_eq!(row.inspected_percent, 50.0);
    assert_eq!(row.total_violations, 2);

    let grid = build_sheet_grid(&report, &cfg);
    assert_eq!(grid[4][0], SheetCell::Text("ЦАО".to_string()));
    assert_eq!(grid[4][3], SheetCell::Percent(0.5));
    assert_eq!(grid.last().unwrap()[0], SheetCell::Text("ИТОГО".to_string()));
}
