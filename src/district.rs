// District name canonicalization.
//
// Source sheets spell districts as full official names, abbreviations or
// anything in between. Every spelling of one district resolves to the same
// bucket key, and each bucket gets one display label shared by both the
// violation and the object records.

use crate::types::Record;
use crate::util::{field_text, normalize_key};
use once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

pub const FALLBACK_KEY: &str = "без округа";
pub const FALLBACK_LABEL: &str = "Без округа";

const DISTRICTS: &[(&str, &str)] = &[
    ("центральный административный округ", "ЦАО"),
    ("северный административный округ", "САО"),
    ("северо-восточный административный округ", "СВАО"),
    ("восточный административный округ", "ВАО"),
    ("юго-восточный административный округ", "ЮВАО"),
    ("южный административный округ", "ЮАО"),
    ("юго-западный административный округ", "ЮЗАО"),
    ("западный административный округ", "ЗАО"),
    ("северо-западный административный округ", "СЗАО"),
    ("зеленоградский административный округ", "ЗелАО"),
    ("новомосковский административный округ", "НАО"),
    ("троицкий административный округ", "ТАО"),
    ("троицкий и новомосковский административный округ", "ТиНАО"),
];

/// Lower-cased full name -> canonical abbreviation.
static FULL_NAMES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| DISTRICTS.iter().copied().collect());

static ABBREVIATION_KEYS: Lazy<HashSet<String>> =
    Lazy::new(|| DISTRICTS.iter().map(|(_, abbr)| normalize_key(abbr)).collect());

fn is_abbreviation(text: &str) -> bool {
    ABBREVIATION_KEYS.contains(&normalize_key(text))
}

/// Stable grouping key for a raw district name; `""` for blank input.
pub fn normalize_district_key(text: &str) -> String {
    let normalized = normalize_key(text);
    if normalized.is_empty() || ABBREVIATION_KEYS.contains(&normalized) {
        return normalized;
    }
    match FULL_NAMES.get(normalized.as_str()) {
        Some(abbr) => normalize_key(abbr),
        None => normalized,
    }
}

/// Label shown for a raw district name.
pub fn display_label(text: &str) -> String {
    let normalized = normalize_key(text);
    if ABBREVIATION_KEYS.contains(&normalized) {
        return text.trim().to_string();
    }
    if let Some(abbr) = FULL_NAMES.get(normalized.as_str()) {
        return abbr.to_string();
    }
    let trimmed = text.trim();
    if trimmed.is_empty() {
        FALLBACK_LABEL.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Bucket key, with blank names collected under the fallback bucket.
pub fn bucket_key(text: &str) -> String {
    let key = normalize_district_key(text);
    if key.is_empty() {
        FALLBACK_KEY.to_string()
    } else {
        key
    }
}

/// Whether `candidate` should replace `current` as a bucket's label.
///
/// Recognized abbreviations beat anything else, then shorter labels win.
/// Equal-length labels fall back to code point order so that two spellings
/// settle on the same label whichever is seen first.
pub fn prefer_candidate(current: &str, candidate: &str) -> bool {
    if candidate.is_empty() || candidate == current {
        return false;
    }
    if current.is_empty() {
        return true;
    }
    match (is_abbreviation(candidate), is_abbreviation(current)) {
        (true, false) => return true,
        (false, true) => return false,
        _ => {}
    }
    match candidate.chars().count().cmp(&current.chars().count()) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => candidate < current,
    }
}

/// Canonical label per bucket key, built once per report run.
#[derive(Debug, Clone, Default)]
pub struct DistrictLookup {
    labels: HashMap<String, String>,
}

impl DistrictLookup {
    /// Scan the district column of both collections.
    pub fn build(
        objects: &[Record],
        object_column: Option<&str>,
        violations: &[Record],
        violation_column: Option<&str>,
    ) -> Self {
        let mut lookup = Self::default();
        for (records, column) in [(objects, object_column), (violations, violation_column)] {
            if column.is_none() {
                continue;
            }
            for record in records {
                lookup.register(&field_text(record, column));
            }
        }
        lookup
    }

    pub fn register(&mut self, raw: &str) {
        let key = bucket_key(raw);
        let candidate = display_label(raw);
        match self.labels.get_mut(&key) {
            Some(current) => {
                if prefer_candidate(current, &candidate) {
                    *current = candidate;
                }
            }
            None => {
                self.labels.insert(key, candidate);
            }
        }
    }

    /// Bucket key and display label for a raw district name.
    pub fn resolve(&self, raw: &str) -> (String, String) {
        let key = bucket_key(raw);
        let label = self
            .labels
            .get(&key)
            .cloned()
            .unwrap_or_else(|| display_label(raw));
        (key, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellValue;

    fn record(column: &str, value: &str) -> Record {
        let mut r = Record::new();
        r.insert(column.to_string(), CellValue::from(value));
        r
    }

    #[test]
    fn full_names_and_abbreviations_share_a_key() {
        assert_eq!(normalize_district_key("Центральный административный округ"), "цао");
        assert_eq!(normalize_district_key("  ЦАО "), "цао");
        assert_eq!(normalize_district_key("цао"), "цао");
        assert_eq!(normalize_district_key("Район Арбат"), "район арбат");
        assert_eq!(normalize_district_key("   "), "");
        assert_eq!(bucket_key(""), FALLBACK_KEY);
    }

    #[test]
    fn display_labels() {
        assert_eq!(display_label("ЮЗАО "), "ЮЗАО");
        assert_eq!(display_label("юзао"), "юзао");
        assert_eq!(display_label("ЗЕЛЕНОГРАДСКИЙ административный округ"), "ЗелАО");
        assert_eq!(display_label(" Район Арбат "), "Район Арбат");
        assert_eq!(display_label(""), FALLBACK_LABEL);
    }

    #[test]
    fn abbreviations_beat_other_spellings() {
        assert!(prefer_candidate("Центральный округ", "ЦАО"));
        assert!(!prefer_candidate("ЦАО", "Центр"));
        assert!(prefer_candidate("", "ЦАО"));
        assert!(!prefer_candidate("ЦАО", ""));
        assert!(!prefer_candidate("ЦАО", "ЦАО"));
    }

    #[test]
    fn shorter_label_wins_between_equals() {
        assert!(prefer_candidate("Округ Один", "Округ 1"));
        assert!(!prefer_candidate("Округ 1", "Округ Один"));
        // Same length: the outcome must not depend on which came first.
        assert_ne!(prefer_candidate("цао", "ЦАО"), prefer_candidate("ЦАО", "цао"));
    }

    #[test]
    fn lookup_converges_on_the_abbreviation() {
        let objects = vec![record("Округ", "Центральный административный округ")];
        let violations = vec![record("District", "ЦАО")];
        let lookup = DistrictLookup::build(&objects, Some("Округ"), &violations, Some("District"));
        assert_eq!(lookup.labels.len(), 1);
        assert_eq!(
            lookup.resolve("Центральный административный округ"),
            ("цао".to_string(), "ЦАО".to_string())
        );
        assert_eq!(lookup.resolve("цао"), ("цао".to_string(), "ЦАО".to_string()));
    }

    #[test]
    fn lookup_is_order_independent_for_two_spellings() {
        let a = record("Округ", "цао");
        let b = record("Округ", "ЦАО");
        let forward = DistrictLookup::build(&[a.clone(), b.clone()], Some("Округ"), &[], None);
        let backward = DistrictLookup::build(&[b, a], Some("Округ"), &[], None);
        assert_eq!(forward.resolve("цао"), backward.resolve("цао"));
        assert_eq!(forward.resolve("цао").1, "ЦАО");
    }

    #[test]
    fn blank_districts_use_the_fallback_bucket() {
        let objects = vec![record("Округ", "  "), Record::new()];
        let lookup = DistrictLookup::build(&objects, Some("Округ"), &[], None);
        assert_eq!(
            lookup.resolve(""),
            (FALLBACK_KEY.to_string(), FALLBACK_LABEL.to_string())
        );
    }

    #[test]
    fn unmapped_column_registers_nothing() {
        let objects = vec![record("Округ", "ЦАО")];
        let lookup = DistrictLookup::build(&objects, None, &[], None);
        assert!(lookup.labels.is_empty());
        assert_eq!(lookup.resolve("ЦАО").1, "ЦАО");
    }
}
