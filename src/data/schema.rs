use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Null sentinel used by the bundled datasets.
pub const DEFAULT_NULL_SENTINEL: &str = "NA";

/// Date layout used by the bundled datasets (`2017-08-25`).
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// FieldType – declared semantic type of a column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Number,
    NullableNumber,
    Date,
    Text,
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Declared column types for one dataset.
///
/// Columns absent from `columns` are carried through as text.
///
/// JSON form:
/// ```json
/// {
///   "columns": { "cost": "number", "mid": "date", "pcgdp": "nullable_number" },
///   "null_sentinel": "NA",
///   "date_format": "%Y-%m-%d",
///   "sort_by": "label"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: BTreeMap<String, FieldType>,
    #[serde(default = "default_null_sentinel")]
    pub null_sentinel: String,
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Numeric column to stable-sort the loaded records by, ascending.
    #[serde(default)]
    pub sort_by: Option<String>,
}

fn default_null_sentinel() -> String {
    DEFAULT_NULL_SENTINEL.to_string()
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            columns: BTreeMap::new(),
            null_sentinel: default_null_sentinel(),
            date_format: default_date_format(),
            sort_by: None,
        }
    }
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column declaration.
    pub fn column(mut self, name: &str, ty: FieldType) -> Self {
        self.columns.insert(name.to_string(), ty);
        self
    }

    pub fn sorted_by(mut self, column: &str) -> Self {
        self.sort_by = Some(column.to_string());
        self
    }

    pub fn field_type(&self, column: &str) -> Option<FieldType> {
        self.columns.get(column).copied()
    }

    /// Verify every declared column exists in `headers`, and that the sort
    /// column is one of them with a numeric type.
    pub fn check_headers(&self, headers: &[String]) -> Result<(), ParseError> {
        let missing = |column: &String| ParseError::MissingColumn {
            column: column.clone(),
        };
        for column in self.columns.keys() {
            if !headers.contains(column) {
                return Err(missing(column));
            }
        }
        if let Some(column) = &self.sort_by {
            if !headers.contains(column) {
                return Err(missing(column));
            }
            match self.field_type(column) {
                Some(FieldType::Number | FieldType::NullableNumber) => {}
                _ => {
                    return Err(ParseError::NonNumericSortColumn {
                        column: column.clone(),
                    })
                }
            }
        }
        Ok(())
    }

    /// Read a schema from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading schema {}", path.display()))?;
        serde_json::from_str(&text).context("parsing schema JSON")
    }
}

// ---------------------------------------------------------------------------
// Presets for the bundled datasets
// ---------------------------------------------------------------------------

/// Flag columns of the leaders dataset that select a country group.
pub const COUNTRY_GROUPS: &[&str] = &["oecd", "eu27", "brics", "gs20"];

/// `experiment_data.csv`: one accuracy measurement per trial.
pub fn experiment_schema() -> Schema {
    Schema::new()
        .column("trial", FieldType::Number)
        .column("accuracy", FieldType::Number)
}

/// `disaster_costs.csv`: billion-dollar disasters with their mid date.
pub fn disaster_schema() -> Schema {
    Schema::new()
        .column("cost", FieldType::Number)
        .column("year", FieldType::Number)
        .column("mid", FieldType::Date)
}

/// `leaderlist.csv`: heads of government with 0/1 country-group flags.
pub fn leader_schema() -> Schema {
    let mut schema = Schema::new()
        .column("start_year", FieldType::Number)
        .column("end_year", FieldType::Number)
        .column("start_age", FieldType::Number)
        .column("end_age", FieldType::Number)
        .column("duration", FieldType::Number)
        .column("label", FieldType::Number)
        .column("pcgdp", FieldType::NullableNumber)
        .sorted_by("label");
    for group in COUNTRY_GROUPS {
        schema = schema.column(group, FieldType::Number);
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_column_is_reported() {
        let headers = vec!["trial".to_string()];
        let err = experiment_schema().check_headers(&headers).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingColumn {
                column: "accuracy".into()
            }
        );
    }

    #[test]
    fn json_defaults_fill_sentinel_and_format() {
        let schema: Schema =
            serde_json::from_str(r#"{"columns":{"pcgdp":"nullable_number"}}"#).unwrap();
        assert_eq!(schema.null_sentinel, "NA");
        assert_eq!(schema.date_format, "%Y-%m-%d");
        assert_eq!(schema.field_type("pcgdp"), Some(FieldType::NullableNumber));
        assert_eq!(schema.sort_by, None);
    }

    #[test]
    fn sort_column_must_exist_and_be_numeric() {
        let headers = vec!["label".to_string(), "leader".to_string()];

        let typo = Schema::new()
            .column("label", FieldType::Number)
            .sorted_by("labl");
        assert_eq!(
            typo.check_headers(&headers),
            Err(ParseError::MissingColumn {
                column: "labl".into()
            })
        );

        let undeclared = Schema::new().sorted_by("label");
        assert_eq!(
            undeclared.check_headers(&headers),
            Err(ParseError::NonNumericSortColumn {
                column: "label".into()
            })
        );

        let text = Schema::new()
            .column("leader", FieldType::Text)
            .sorted_by("leader");
        assert!(matches!(
            text.check_headers(&headers),
            Err(ParseError::NonNumericSortColumn { .. })
        ));

        let nullable = Schema::new()
            .column("label", FieldType::NullableNumber)
            .sorted_by("label");
        assert_eq!(nullable.check_headers(&headers), Ok(()));
    }

    #[test]
    fn leader_preset_declares_country_groups() {
        let schema = leader_schema();
        assert_eq!(schema.sort_by.as_deref(), Some("label"));
        for group in COUNTRY_GROUPS {
            assert_eq!(schema.field_type(group), Some(FieldType::Number));
        }
    }
}
