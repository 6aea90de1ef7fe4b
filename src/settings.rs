// Report settings: an optional TOML file plus command-line overrides,
// resolved against the headers of the loaded files into a `ReportConfig`.
//
// Example file:
//
//     data_source = "oati"
//     types = ["ОДХ"]
//
//     [current]
//     start = "01.04.2024"
//     end = "30.04.2024"
//
//     [previous]
//     start = "01.03.2024"
//     end = "31.03.2024"
//
//     [violation_mapping]
//     inspectionResult = "Результат"

use crate::errors::SettingsError;
use crate::mapping::{auto_map_columns, find_definition, OBJECT_FIELDS, VIOLATION_FIELDS};
use crate::types::{
    DataSourceMode, DateRange, FieldDefinition, FieldKey, FieldMapping, ReportConfig,
    SelectionMode,
};
use crate::util::{normalize_key, parse_display_date};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PeriodSettings {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub current: Option<PeriodSettings>,
    pub previous: Option<PeriodSettings>,
    pub type_mode: Option<SelectionMode>,
    pub types: Vec<String>,
    pub violation_mode: Option<SelectionMode>,
    pub violations: Vec<String>,
    pub data_source: Option<DataSourceMode>,
    pub violation_mapping: BTreeMap<FieldKey, String>,
    pub object_mapping: BTreeMap<FieldKey, String>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(text)?)
    }

    /// Auto-mapped fields for both files with the overrides applied on top.
    pub fn resolve_mappings(
        &self,
        violation_headers: &[String],
        object_headers: &[String],
    ) -> Result<(FieldMapping, FieldMapping), SettingsError> {
        let violation_mapping = resolve_mapping(
            violation_headers,
            VIOLATION_FIELDS,
            &self.violation_mapping,
            "violations",
        )?;
        let object_mapping =
            resolve_mapping(object_headers, OBJECT_FIELDS, &self.object_mapping, "objects")?;
        Ok((violation_mapping, object_mapping))
    }

    /// Build the report config for files with the given headers.
    ///
    /// Auto-mapping runs first; file and command-line overrides replace its guesses.
    pub fn into_config(
        self,
        violation_headers: &[String],
        object_headers: &[String],
    ) -> Result<ReportConfig, SettingsError> {
        let (violation_mapping, object_mapping) =
            self.resolve_mappings(violation_headers, object_headers)?;
        let current_period = period_from(self.current.as_ref(), "current")?;
        let previous_period = period_from(self.previous.as_ref(), "previous")?;

        let config = ReportConfig {
            violation_mapping,
            object_mapping,
            current_period,
            previous_period,
            type_mode: self.type_mode.unwrap_or_else(|| implied_mode(&self.types)),
            selected_types: self.types,
            violation_mode: self
                .violation_mode
                .unwrap_or_else(|| implied_mode(&self.violations)),
            selected_violations: self.violations,
            data_source_mode: self.data_source.unwrap_or_default(),
        };
        config.validate()?;
        debug!(?config, "resolved report config");
        Ok(config)
    }
}

fn implied_mode(selection: &[String]) -> SelectionMode {
    if selection.is_empty() {
        SelectionMode::All
    } else {
        SelectionMode::Custom
    }
}

fn period_from(
    settings: Option<&PeriodSettings>,
    period: &'static str,
) -> Result<DateRange, SettingsError> {
    let settings = settings.ok_or(SettingsError::MissingPeriod { period })?;
    let invalid = || SettingsError::InvalidPeriod {
        period,
        value: format!("{}-{}", settings.start, settings.end),
    };
    let start = parse_display_date(&settings.start).ok_or_else(invalid)?;
    let end = parse_display_date(&settings.end).ok_or_else(invalid)?;
    Ok(DateRange::new(start, end))
}

/// Split `DD.MM.YYYY-DD.MM.YYYY` into its two ends.
pub fn parse_period_text(text: &str, period: &'static str) -> Result<PeriodSettings, SettingsError> {
    let invalid = || SettingsError::InvalidPeriod {
        period,
        value: text.to_string(),
    };
    let (start, end) = text.split_once('-').ok_or_else(invalid)?;
    let settings = PeriodSettings {
        start: start.trim().to_string(),
        end: end.trim().to_string(),
    };
    // Fail on the flag itself rather than later while building the config.
    period_from(Some(&settings), period)?;
    Ok(settings)
}

/// Parse a `fieldKey=Header` override; an empty header unmaps the field.
pub fn parse_override(text: &str) -> Result<(FieldKey, String), SettingsError> {
    let (key, header) = text.split_once('=').ok_or_else(|| SettingsError::InvalidOverride {
        value: text.to_string(),
        message: "expected fieldKey=Header".to_string(),
    })?;
    let key = key.parse::<FieldKey>().map_err(|message| SettingsError::InvalidOverride {
        value: text.to_string(),
        message,
    })?;
    Ok((key, header.trim().to_string()))
}

fn resolve_mapping(
    headers: &[String],
    definitions: &[FieldDefinition],
    overrides: &BTreeMap<FieldKey, String>,
    source_kind: &'static str,
) -> Result<FieldMapping, SettingsError> {
    let mut mapping = auto_map_columns(headers, definitions);
    for (key, wanted) in overrides {
        if find_definition(definitions, *key).is_none() {
            return Err(SettingsError::InvalidOverride {
                value: format!("{}={}", key, wanted),
                message: format!("field does not apply to the {} file", source_kind),
            });
        }
        if wanted.trim().is_empty() {
            mapping.set(*key, "");
            continue;
        }
        let wanted_key = normalize_key(wanted);
        let header = headers
            .iter()
            .find(|h| h.as_str() == wanted)
            .or_else(|| headers.iter().find(|h| normalize_key(h) == wanted_key))
            .ok_or_else(|| SettingsError::UnknownHeader {
                field: key.to_string(),
                header: wanted.clone(),
                source_kind,
            })?;
        mapping.set(*key, header.clone());
    }
    Ok(mapping)
}
