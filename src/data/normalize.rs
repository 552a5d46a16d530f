use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::model::{RawRow, RawTable, Record, Value};
use super::schema::{FieldType, Schema};
use crate::error::ParseError;

// ---------------------------------------------------------------------------
// Raw rows → Records
// ---------------------------------------------------------------------------

/// Check the header against the schema, then normalize every row.
///
/// Applies the schema's `sort_by` ordering after all rows parsed.
pub fn normalize_table(table: &RawTable, schema: &Schema) -> Result<Vec<Record>, ParseError> {
    schema.check_headers(&table.headers)?;
    let mut records = normalize(&table.rows, schema)?;
    if let Some(column) = &schema.sort_by {
        sort_by_number(&mut records, column);
    }
    log::debug!(
        "normalized {} rows ({} declared columns)",
        records.len(),
        schema.columns.len()
    );
    Ok(records)
}

/// Coerce each row's declared columns to their semantic type.
///
/// Output preserves input order. The first malformed cell aborts the whole
/// load; nothing is defaulted.
pub fn normalize(rows: &[RawRow], schema: &Schema) -> Result<Vec<Record>, ParseError> {
    rows.iter()
        .enumerate()
        .map(|(row, raw)| normalize_row(row, raw, schema))
        .collect()
}

fn normalize_row(row: usize, raw: &RawRow, schema: &Schema) -> Result<Record, ParseError> {
    let mut fields = BTreeMap::new();

    for (column, ty) in &schema.columns {
        let cell = raw.get(column).ok_or_else(|| ParseError::MissingField {
            row,
            column: column.clone(),
        })?;
        fields.insert(column.clone(), parse_cell(row, column, cell, *ty, schema)?);
    }

    for (column, cell) in raw {
        if !schema.columns.contains_key(column) {
            fields.insert(column.clone(), Value::Text(cell.clone()));
        }
    }

    Ok(Record::new(row, fields))
}

fn parse_cell(
    row: usize,
    column: &str,
    cell: &str,
    ty: FieldType,
    schema: &Schema,
) -> Result<Value, ParseError> {
    match ty {
        FieldType::Text => Ok(Value::Text(cell.to_string())),
        FieldType::Number => parse_number(row, column, cell).map(Value::Number),
        FieldType::NullableNumber => {
            if cell.trim() == schema.null_sentinel {
                Ok(Value::Missing)
            } else {
                parse_number(row, column, cell).map(Value::Number)
            }
        }
        FieldType::Date => parse_date(row, column, cell, &schema.date_format).map(Value::Date),
    }
}

fn parse_number(row: usize, column: &str, cell: &str) -> Result<f64, ParseError> {
    match cell.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::NotANumber {
            row,
            column: column.to_string(),
            value: cell.to_string(),
        }),
    }
}

fn parse_date(row: usize, column: &str, cell: &str, format: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(cell.trim(), format).map_err(|_| ParseError::BadDate {
        row,
        column: column.to_string(),
        value: cell.to_string(),
        format: format.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Records → Records (already typed input)
// ---------------------------------------------------------------------------

/// Re-normalize records that may already be typed.
///
/// Correctly typed values are kept as they are; text left in a declared
/// column is parsed the same way raw cells are. Running this on the output
/// of [`normalize`] returns an identical sequence.
pub fn normalize_records(records: &[Record], schema: &Schema) -> Result<Vec<Record>, ParseError> {
    records
        .iter()
        .map(|record| {
            let mut fields = record.fields.clone();
            for (column, ty) in &schema.columns {
                let value = fields.get(column).ok_or_else(|| ParseError::MissingField {
                    row: record.row,
                    column: column.clone(),
                })?;
                let typed = retype(record.row, column, value, *ty, schema)?;
                fields.insert(column.clone(), typed);
            }
            Ok(Record::new(record.row, fields))
        })
        .collect()
}

fn retype(
    row: usize,
    column: &str,
    value: &Value,
    ty: FieldType,
    schema: &Schema,
) -> Result<Value, ParseError> {
    match (ty, value) {
        (_, Value::Text(cell)) => parse_cell(row, column, cell, ty, schema),
        (FieldType::Number | FieldType::NullableNumber, Value::Number(v)) if v.is_finite() => {
            Ok(value.clone())
        }
        (FieldType::NullableNumber, Value::Missing) => Ok(Value::Missing),
        (FieldType::Date, Value::Date(_)) => Ok(value.clone()),
        (FieldType::Date, other) => Err(ParseError::BadDate {
            row,
            column: column.to_string(),
            value: other.to_string(),
            format: schema.date_format.clone(),
        }),
        (FieldType::Text, other) => Ok(Value::Text(other.to_string())),
        (_, other) => Err(ParseError::NotANumber {
            row,
            column: column.to_string(),
            value: other.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Stable ascending sort by a numeric column; records without a number last.
pub fn sort_by_number(records: &mut [Record], column: &str) {
    records.sort_by(|a, b| match (a.number(column), b.number(column)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{disaster_schema, leader_schema};

    fn raw(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn numeric_column_rejects_text() {
        let schema = Schema::new().column("accuracy", FieldType::Number);
        let err = normalize(&[raw(&[("accuracy", "abc")])], &schema).unwrap_err();
        assert_eq!(
            err,
            ParseError::NotANumber {
                row: 0,
                column: "accuracy".into(),
                value: "abc".into()
            }
        );
    }

    #[test]
    fn sentinel_only_allowed_in_nullable_columns() {
        let schema = Schema::new()
            .column("pcgdp", FieldType::NullableNumber)
            .column("duration", FieldType::Number);

        let ok = normalize(&[raw(&[("pcgdp", "NA"), ("duration", "4")])], &schema).unwrap();
        assert_eq!(ok[0].get("pcgdp"), Some(&Value::Missing));
        assert_eq!(ok[0].number("duration"), Some(4.0));

        let err = normalize(&[raw(&[("pcgdp", "1.5"), ("duration", "NA")])], &schema);
        assert!(matches!(err, Err(ParseError::NotANumber { ref column, .. }) if column == "duration"));

        let err = normalize(&[raw(&[("pcgdp", "n/a"), ("duration", "1")])], &schema);
        assert!(matches!(err, Err(ParseError::NotANumber { ref column, .. }) if column == "pcgdp"));
    }

    #[test]
    fn dates_use_the_fixed_format() {
        let schema = disaster_schema();
        let row = raw(&[("cost", "1.5"), ("year", "2005"), ("mid", "2005-08-29"), ("name", "Katrina")]);
        let records = normalize(&[row], &schema).unwrap();
        assert_eq!(records[0].date("mid"), NaiveDate::from_ymd_opt(2005, 8, 29));
        assert_eq!(records[0].text("name"), Some("Katrina"));

        let bad = raw(&[("cost", "1.5"), ("year", "2005"), ("mid", "08/29/2005")]);
        assert!(matches!(
            normalize(&[bad], &schema),
            Err(ParseError::BadDate { .. })
        ));
    }

    #[test]
    fn missing_declared_field_fails() {
        let schema = Schema::new().column("cost", FieldType::Number);
        let err = normalize(&[raw(&[("year", "2000")])], &schema).unwrap_err();
        assert_eq!(
            err,
            ParseError::MissingField {
                row: 0,
                column: "cost".into()
            }
        );
    }

    #[test]
    fn whitespace_and_nan_handling() {
        let schema = Schema::new().column("v", FieldType::Number);
        let ok = normalize(&[raw(&[("v", " 0.25 ")])], &schema).unwrap();
        assert_eq!(ok[0].number("v"), Some(0.25));
        assert!(normalize(&[raw(&[("v", "NaN")])], &schema).is_err());
    }

    #[test]
    fn normalization_is_idempotent() {
        let schema = disaster_schema();
        let rows = vec![
            raw(&[("cost", "3"), ("year", "2001"), ("mid", "2001-06-10"), ("category", "flooding")]),
            raw(&[("cost", "7.2"), ("year", "2002"), ("mid", "2002-01-01"), ("category", "drought")]),
        ];
        let once = normalize(&rows, &schema).unwrap();
        let twice = normalize_records(&once, &schema).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_records_parses_leftover_text() {
        let schema = Schema::new().column("cost", FieldType::Number);
        let mut fields = BTreeMap::new();
        fields.insert("cost".to_string(), Value::Text("12".into()));
        let out = normalize_records(&[Record::new(3, fields)], &schema).unwrap();
        assert_eq!(out[0].number("cost"), Some(12.0));
        assert_eq!(out[0].row, 3);
    }

    #[test]
    fn table_sorts_by_label_with_missing_last() {
        let schema = Schema::new()
            .column("label", FieldType::NullableNumber)
            .sorted_by("label");
        let table = RawTable {
            headers: vec!["label".into(), "leader".into()],
            rows: vec![
                raw(&[("label", "1"), ("leader", "b")]),
                raw(&[("label", "NA"), ("leader", "x")]),
                raw(&[("label", "0"), ("leader", "a")]),
                raw(&[("label", "1"), ("leader", "c")]),
            ],
        };
        let records = normalize_table(&table, &schema).unwrap();
        let leaders: Vec<_> = records.iter().map(|r| r.text("leader").unwrap()).collect();
        assert_eq!(leaders, vec!["a", "b", "c", "x"]);
    }

    #[test]
    fn table_header_checked_before_rows() {
        let table = RawTable {
            headers: vec!["leader".into()],
            rows: vec![],
        };
        assert!(matches!(
            normalize_table(&table, &leader_schema()),
            Err(ParseError::MissingColumn { .. })
        ));
    }

    #[test]
    fn unusable_sort_column_fails_instead_of_leaving_rows_unsorted() {
        let table = RawTable {
            headers: vec!["label".into(), "leader".into()],
            rows: vec![
                raw(&[("label", "1"), ("leader", "b")]),
                raw(&[("label", "0"), ("leader", "a")]),
            ],
        };

        let typo = Schema::new()
            .column("label", FieldType::Number)
            .sorted_by("labl");
        assert!(matches!(
            normalize_table(&table, &typo),
            Err(ParseError::MissingColumn { ref column }) if column == "labl"
        ));

        let undeclared = Schema::new().sorted_by("label");
        assert!(matches!(
            normalize_table(&table, &undeclared),
            Err(ParseError::NonNumericSortColumn { .. })
        ));
    }
}
