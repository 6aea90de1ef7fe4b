use crate::district::{prefer_candidate, DistrictLookup};
use crate::errors::ReportError;
use crate::filter::RecordFilter;
use crate::types::{FieldKey, Record, ReportConfig, ReportResult, ReportRow, SelectionMode};
use crate::util::{compute_percent, field_date, field_text, normalize_key};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

pub const TOTAL_LABEL: &str = "ИТОГО";

/// Statuses meaning the violation is still open and being watched.
pub const CONTROL_STATUSES: [&str; 2] = ["на устранении", "на контроле инспектора оати"];
pub const RESOLVED_STATUS: &str = "снят с контроля";
pub const INSPECTION_RESULT_VIOLATION: &str = "нарушение выявлено";

/// Identifier sets collected for one district during a run.
///
/// Counters are derived from set sizes so duplicate source rows never count twice.
#[derive(Debug, Default, Clone)]
struct DistrictEntry {
    label: String,
    total_objects: HashSet<String>,
    inspected_objects: HashSet<String>,
    objects_with_violations: HashSet<String>,
    current_violation_ids: HashSet<String>,
    previous_control_ids: HashSet<String>,
    resolved_ids: HashSet<String>,
    control_ids: HashSet<String>,
}

impl DistrictEntry {
    fn with_label(label: String) -> Self {
        Self {
            label,
            ..Self::default()
        }
    }

    fn absorb(&mut self, other: &DistrictEntry) {
        let pairs = [
            (&mut self.total_objects, &other.total_objects),
            (&mut self.inspected_objects, &other.inspected_objects),
            (&mut self.objects_with_violations, &other.objects_with_violations),
            (&mut self.current_violation_ids, &other.current_violation_ids),
            (&mut self.previous_control_ids, &other.previous_control_ids),
            (&mut self.resolved_ids, &other.resolved_ids),
            (&mut self.control_ids, &other.control_ids),
        ];
        for (mine, theirs) in pairs {
            mine.extend(theirs.iter().cloned());
        }
    }

    fn to_row(&self) -> ReportRow {
        let total_objects = self.total_objects.len();
        let inspected_objects = self.inspected_objects.len();
        let total_violations = self
            .current_violation_ids
            .union(&self.previous_control_ids)
            .count();
        ReportRow {
            label: self.label.clone(),
            total_objects,
            inspected_objects,
            inspected_percent: compute_percent(inspected_objects, total_objects),
            violation_percent: compute_percent(self.objects_with_violations.len(), inspected_objects),
            total_violations,
            current_violations: self.current_violation_ids.len(),
            previous_control: self.previous_control_ids.len(),
            resolved: self.resolved_ids.len(),
            on_control: self.control_ids.len(),
        }
    }
}

struct Buckets<'a> {
    lookup: &'a DistrictLookup,
    entries: HashMap<String, DistrictEntry>,
}

impl<'a> Buckets<'a> {
    fn new(lookup: &'a DistrictLookup) -> Self {
        Self {
            lookup,
            entries: HashMap::new(),
        }
    }

    fn entry(&mut self, raw_district: &str) -> &mut DistrictEntry {
        let (key, label) = self.lookup.resolve(raw_district);
        let entry = self
            .entries
            .entry(key)
            .or_insert_with(|| DistrictEntry::with_label(label.clone()));
        if prefer_candidate(&entry.label, &label) {
            entry.label = label;
        }
        entry
    }

    fn into_sorted(self) -> Vec<DistrictEntry> {
        let mut entries: Vec<DistrictEntry> = self.entries.into_values().collect();
        entries.sort_by(|a, b| {
            a.label
                .to_lowercase()
                .cmp(&b.label.to_lowercase())
                .then_with(|| a.label.cmp(&b.label))
        });
        entries
    }
}

/// Normalized names of objects that have at least one violation passing the
/// data-source and violation-name gates.
fn objects_with_selected_violations(
    violations: &[Record],
    config: &ReportConfig,
    filter: &RecordFilter,
) -> HashSet<String> {
    let mapping = &config.violation_mapping;
    let name_column = mapping.get(FieldKey::ViolationName);
    let object_column = mapping.get(FieldKey::ObjectName);
    let source_column = mapping.get(FieldKey::DataSource);
    let mut names = HashSet::new();
    if name_column.is_none() || object_column.is_none() {
        return names;
    }
    for record in violations {
        let source = source_column.map(|_| field_text(record, source_column));
        if !filter.allow_data_source(source.as_deref()) {
            continue;
        }
        let violation_name = field_text(record, name_column);
        if violation_name.is_empty() || !filter.allow_violation(&violation_name) {
            continue;
        }
        let object_name = field_text(record, object_column);
        if !object_name.is_empty() {
            names.insert(normalize_key(&object_name));
        }
    }
    names
}

/// Aggregate violation and object records into per-district rows plus a total row.
///
/// The config is validated first; nothing is scanned if it is rejected.
/// Records with unusable values are skipped rather than reported.
pub fn build_report(
    violations: &[Record],
    objects: &[Record],
    config: &ReportConfig,
) -> Result<ReportResult, ReportError> {
    config.validate()?;

    let filter = RecordFilter::new(config);
    let vmap = &config.violation_mapping;
    let omap = &config.object_mapping;

    let lookup = DistrictLookup::build(
        objects,
        omap.get(FieldKey::District),
        violations,
        vmap.get(FieldKey::District),
    );
    let mut buckets = Buckets::new(&lookup);

    let allowed_objects =
        if config.violation_mode == SelectionMode::Custom && !config.selected_violations.is_empty() {
            objects_with_selected_violations(violations, config, &filter)
        } else {
            HashSet::new()
        };

    for record in objects {
        let object_type = field_text(record, omap.get(FieldKey::ObjectType));
        if !filter.allow_type(&object_type) {
            continue;
        }
        let object_name = field_text(record, omap.get(FieldKey::ObjectName));
        if object_name.is_empty() {
            continue;
        }
        if !allowed_objects.is_empty() && !allowed_objects.contains(&normalize_key(&object_name)) {
            continue;
        }
        let district = field_text(record, omap.get(FieldKey::District));
        buckets.entry(&district).total_objects.insert(object_name);
    }

    let source_column = vmap.get(FieldKey::DataSource);
    let result_column = vmap.get(FieldKey::InspectionResult);
    let mut undated = 0usize;

    for record in violations {
        let source = source_column.map(|_| field_text(record, source_column));
        if !filter.allow_data_source(source.as_deref()) {
            continue;
        }
        if !filter.allow_type(&field_text(record, vmap.get(FieldKey::ObjectType))) {
            continue;
        }
        if !filter.allow_violation(&field_text(record, vmap.get(FieldKey::ViolationName))) {
            continue;
        }
        let Some(inspected_on) = field_date(record, vmap.get(FieldKey::InspectionDate)) else {
            undated += 1;
            continue;
        };

        let object_name = field_text(record, vmap.get(FieldKey::ObjectName));
        let violation_id = field_text(record, vmap.get(FieldKey::Id));
        let status = normalize_key(&field_text(record, vmap.get(FieldKey::Status)));
        let under_control = CONTROL_STATUSES.contains(&status.as_str());
        let violation_detected = result_column.is_some()
            && normalize_key(&field_text(record, result_column)) == INSPECTION_RESULT_VIOLATION;

        let entry = buckets.entry(&field_text(record, vmap.get(FieldKey::District)));

        if config.current_period.contains(inspected_on) {
            if !object_name.is_empty() {
                entry.inspected_objects.insert(object_name.clone());
                if violation_detected {
                    entry.objects_with_violations.insert(object_name.clone());
                }
            }
            if !violation_id.is_empty() {
                entry.current_violation_ids.insert(violation_id.clone());
                if status == RESOLVED_STATUS {
                    entry.resolved_ids.insert(violation_id.clone());
                }
                if under_control {
                    entry.control_ids.insert(violation_id.clone());
                }
            }
        }

        if config.previous_period.contains(inspected_on) && under_control && !violation_id.is_empty() {
            entry.previous_control_ids.insert(violation_id);
        }
    }

    let entries = buckets.into_sorted();
    let mut total = DistrictEntry::with_label(TOTAL_LABEL.to_string());
    let rows: Vec<ReportRow> = entries
        .iter()
        .map(|entry| {
            total.absorb(entry);
            entry.to_row()
        })
        .collect();

    debug!(
        districts = rows.len(),
        skipped_undated = undated,
        "aggregated {} violation and {} object records",
        violations.len(),
        objects.len()
    );

    Ok(ReportResult {
        rows,
        total_row: total.to_row(),
    })
}

/// Distinct non-empty values of a column, compared case-insensitively.
///
/// The first spelling seen is kept, and values come back in first-seen order.
pub fn collect_unique_values(records: &[Record], column: Option<&str>) -> Vec<String> {
    if column.is_none() {
        return Vec::new();
    }
    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for record in records {
        let value = field_text(record, column);
        let key = normalize_key(&value);
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        values.push(value);
    }
    values
}

/// Distinct parseable dates of a column, ascending.
pub fn extract_unique_dates(records: &[Record], column: Option<&str>) -> Vec<NaiveDate> {
    if column.is_none() {
        return Vec::new();
    }
    records
        .iter()
        .filter_map(|record| field_date(record, column))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
