use crate::types::{FieldDefinition, FieldKey, FieldMapping};
use crate::util::normalize_key;
use std::collections::HashMap;

pub const VIOLATION_FIELDS: &[FieldDefinition] = &[
    FieldDefinition {
        key: FieldKey::Id,
        label: "Идентификатор нарушения",
        candidates: &["идентификатор", "id", "uid"],
        optional: false,
    },
    FieldDefinition {
        key: FieldKey::Status,
        label: "Статус нарушения",
        candidates: &["статус нарушения", "статус"],
        optional: false,
    },
    FieldDefinition {
        key: FieldKey::ViolationName,
        label: "Наименование нарушения",
        candidates: &["наименование нарушения", "нарушение"],
        optional: false,
    },
    FieldDefinition {
        key: FieldKey::InspectionResult,
        label: "Результат обследования",
        candidates: &["результат обследования", "результат осмотра", "результат проверки"],
        optional: true,
    },
    FieldDefinition {
        key: FieldKey::ObjectType,
        label: "Тип объекта",
        candidates: &["тип объекта", "тип объекта контроля"],
        optional: false,
    },
    FieldDefinition {
        key: FieldKey::ObjectName,
        label: "Наименование объекта",
        candidates: &["наименование объекта", "наименование объекта контроля"],
        optional: false,
    },
    FieldDefinition {
        key: FieldKey::InspectionDate,
        label: "Дата обследования",
        candidates: &["дата обследования", "дата осмотра", "дата контроля"],
        optional: false,
    },
    FieldDefinition {
        key: FieldKey::District,
        label: "Округ",
        candidates: &["округ", "административный округ", "округ объекта"],
        optional: false,
    },
    FieldDefinition {
        key: FieldKey::DataSource,
        label: "Источник данных",
        candidates: &["источник данных"],
        optional: true,
    },
];

pub const OBJECT_FIELDS: &[FieldDefinition] = &[
    FieldDefinition {
        key: FieldKey::ObjectType,
        label: "Вид объекта",
        candidates: &["вид объекта", "тип объекта", "тип объекта контроля"],
        optional: false,
    },
    FieldDefinition {
        key: FieldKey::ObjectName,
        label: "Наименование объекта",
        candidates: &["наименование объекта", "наименование объекта контроля"],
        optional: false,
    },
    FieldDefinition {
        key: FieldKey::District,
        label: "Округ",
        candidates: &["округ", "административный округ", "округ объекта"],
        optional: false,
    },
];

/// Guess a header for every definition; the first candidate that matches wins.
///
/// Fields without a match are present in the mapping with an empty header, so
/// the operator can see what still needs to be assigned.
pub fn auto_map_columns(headers: &[String], definitions: &[FieldDefinition]) -> FieldMapping {
    let mut by_key: HashMap<String, &str> = HashMap::new();
    for header in headers.iter().filter(|h| !h.trim().is_empty()) {
        // Later duplicates win, same as rebuilding the lookup column by column.
        by_key.insert(normalize_key(header), header.as_str());
    }

    definitions
        .iter()
        .map(|def| {
            let matched = def
                .candidates
                .iter()
                .find_map(|candidate| by_key.get(&normalize_key(candidate)).copied())
                .unwrap_or("");
            (def.key, matched.to_string())
        })
        .collect()
}

/// Labels of required definitions that have no header assigned.
pub fn missing_required(mapping: &FieldMapping, definitions: &[FieldDefinition]) -> Vec<String> {
    definitions
        .iter()
        .filter(|def| !def.optional && mapping.get(def.key).is_none())
        .map(|def| def.label.to_string())
        .collect()
}

pub fn find_definition(definitions: &[FieldDefinition], key: FieldKey) -> Option<&FieldDefinition> {
    definitions.iter().find(|def| def.key == key)
}
