use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use super::model::{Record, Value};
use crate::error::GroupingError;

// ---------------------------------------------------------------------------
// GroupKey
// ---------------------------------------------------------------------------

/// A value records are partitioned by.  Ordered so aggregates come back
/// sorted (trials ascending, years ascending, labels alphabetical).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Int(i64),
    Text(String),
    Date(NaiveDate),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Int(i) => write!(f, "{i}"),
            GroupKey::Text(s) => write!(f, "{s}"),
            GroupKey::Date(d) => write!(f, "{d}"),
        }
    }
}

impl From<i64> for GroupKey {
    fn from(v: i64) -> Self {
        GroupKey::Int(v)
    }
}

impl From<&str> for GroupKey {
    fn from(v: &str) -> Self {
        GroupKey::Text(v.to_string())
    }
}

/// Grouping function that reads `column` as the key.
///
/// Numbers must be integral (years, trial numbers); text and dates are used
/// as they are.  Absent and missing values fail.
pub fn key_by(column: &str) -> impl Fn(&Record) -> Result<GroupKey, GroupingError> + '_ {
    move |record| match record.get(column) {
        Some(Value::Number(v)) => {
            if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
                Ok(GroupKey::Int(*v as i64))
            } else {
                Err(GroupingError::NonIntegralKey {
                    row: record.row,
                    column: column.to_string(),
                    value: *v,
                })
            }
        }
        Some(Value::Text(s)) => Ok(GroupKey::Text(s.clone())),
        Some(Value::Date(d)) => Ok(GroupKey::Date(*d)),
        Some(Value::Missing) | None => Err(GroupingError::MissingKey {
            row: record.row,
            column: column.to_string(),
        }),
    }
}

/// Value extractor that reads `column` as a number; missing values yield `None`.
pub fn value_of(column: &str) -> impl Fn(&Record) -> Option<f64> + '_ {
    move |record| record.number(column)
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

/// Decimal places used for display-oriented means.
pub const MEAN_PRECISION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Arithmetic mean rounded to `precision` decimal places.
    Mean { precision: u32 },
    Max,
    Min,
    Sum,
    Count,
}

impl Reducer {
    pub fn mean() -> Self {
        Reducer::Mean {
            precision: MEAN_PRECISION,
        }
    }

    /// Reduce a group's values.  `None` for an empty group, so callers can
    /// drop the group instead of storing NaN.
    pub fn reduce(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let out = match self {
            Reducer::Mean { precision } => {
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                round_to(mean, *precision)
            }
            Reducer::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Reducer::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Reducer::Sum => values.iter().sum(),
            Reducer::Count => values.len() as f64,
        };
        Some(out)
    }
}

fn round_to(v: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (v * scale).round() / scale
}

// ---------------------------------------------------------------------------
// Grouping and aggregation
// ---------------------------------------------------------------------------

/// Partition `records` by `key`.  Every record lands in exactly one group;
/// within a group records keep their input order.
pub fn group_by<'a, I, K>(
    records: I,
    key: K,
) -> Result<BTreeMap<GroupKey, Vec<&'a Record>>, GroupingError>
where
    I: IntoIterator<Item = &'a Record>,
    K: Fn(&Record) -> Result<GroupKey, GroupingError>,
{
    let mut groups: BTreeMap<GroupKey, Vec<&Record>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)?).or_default().push(record);
    }
    Ok(groups)
}

/// Group, then reduce each group's present values.
///
/// Groups with no present values are left out of the result.  Always a full
/// recompute over `records`.
pub fn aggregate<'a, I, K, V>(
    records: I,
    key: K,
    value: V,
    reducer: Reducer,
) -> Result<BTreeMap<GroupKey, f64>, GroupingError>
where
    I: IntoIterator<Item = &'a Record>,
    K: Fn(&Record) -> Result<GroupKey, GroupingError>,
    V: Fn(&Record) -> Option<f64>,
{
    let mut values: BTreeMap<GroupKey, Vec<f64>> = BTreeMap::new();
    let mut seen = 0usize;
    for record in records {
        seen += 1;
        let group = values.entry(key(record)?).or_default();
        if let Some(v) = value(record) {
            group.push(v);
        }
    }

    let out: BTreeMap<GroupKey, f64> = values
        .into_iter()
        .filter_map(|(k, vs)| reducer.reduce(&vs).map(|agg| (k, agg)))
        .collect();
    log::trace!("{reducer:?} over {seen} records -> {} groups", out.len());
    Ok(out)
}

/// Column-name shorthand for [`aggregate`].
pub fn rollup<'a, I>(
    records: I,
    key_column: &str,
    value_column: &str,
    reducer: Reducer,
) -> Result<BTreeMap<GroupKey, f64>, GroupingError>
where
    I: IntoIterator<Item = &'a Record>,
{
    aggregate(records, key_by(key_column), value_of(value_column), reducer)
}

/// Number of records per value of `column`.
pub fn count_by<'a, I>(records: I, column: &str) -> Result<BTreeMap<GroupKey, usize>, GroupingError>
where
    I: IntoIterator<Item = &'a Record>,
{
    Ok(group_by(records, key_by(column))?
        .into_iter()
        .map(|(k, group)| (k, group.len()))
        .collect())
}

/// `(min, max)` of the present values; `None` when there are none.
pub fn extent<'a, I, V>(records: I, value: V) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = &'a Record>,
    V: Fn(&Record) -> Option<f64>,
{
    records
        .into_iter()
        .filter_map(value)
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Records whose value equals the maximum of their group, in input order.
///
/// Every tied record is returned.
pub fn records_at_group_max<'a, I, K, V>(
    records: I,
    key: K,
    value: V,
) -> Result<Vec<&'a Record>, GroupingError>
where
    I: IntoIterator<Item = &'a Record>,
    K: Fn(&Record) -> Result<GroupKey, GroupingError>,
    V: Fn(&Record) -> Option<f64>,
{
    let records: Vec<&Record> = records.into_iter().collect();
    let maxima = aggregate(records.iter().copied(), &key, &value, Reducer::Max)?;
    let mut out = Vec::new();
    for record in records {
        let group = key(record)?;
        if let (Some(v), Some(max)) = (value(record), maxima.get(&group)) {
            if v == *max {
                out.push(record);
            }
        }
    }
    Ok(out)
}
