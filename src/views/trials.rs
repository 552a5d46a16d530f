use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::aggregate::{GroupKey, Reducer, group_by, key_by, rollup};
use crate::data::model::Record;
use crate::error::GroupingError;

pub const TRIAL: &str = "trial";
pub const ACCURACY: &str = "accuracy";

/// One measurement dot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialPoint {
    pub trial: GroupKey,
    pub accuracy: f64,
}

/// Derived data for the accuracy-per-trial scatterplot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialAccuracy {
    /// Distinct trials, ascending (band-scale domain).
    pub trials: Vec<GroupKey>,
    /// Mean accuracy per trial, two decimals.
    pub mean_accuracy: BTreeMap<GroupKey, f64>,
    pub points: Vec<TrialPoint>,
}

impl TrialAccuracy {
    /// Axis label for a trial ("Trial 3").
    pub fn label(trial: &GroupKey) -> String {
        format!("Trial {trial}")
    }
}

/// Stateless: every call recomputes from `records`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrialAccuracyView;

impl TrialAccuracyView {
    pub fn derive(&self, records: &[Record]) -> Result<TrialAccuracy, GroupingError> {
        let key = key_by(TRIAL);
        let trials: Vec<GroupKey> = group_by(records, &key)?.into_keys().collect();
        let mean_accuracy = rollup(records, TRIAL, ACCURACY, Reducer::mean())?;

        let mut points = Vec::with_capacity(records.len());
        for record in records {
            if let Some(accuracy) = record.number(ACCURACY) {
                points.push(TrialPoint {
                    trial: key(record)?,
                    accuracy,
                });
            }
        }

        Ok(TrialAccuracy {
            trials,
            mean_accuracy,
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;

    fn measurement(row: usize, trial: f64, accuracy: f64) -> Record {
        Record::new(
            row,
            [
                (TRIAL.to_string(), Value::Number(trial)),
                (ACCURACY.to_string(), Value::Number(accuracy)),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn means_per_trial_sorted() {
        let records = vec![
            measurement(0, 2.0, 0.4),
            measurement(1, 1.0, 0.5),
            measurement(2, 1.0, 0.7),
            measurement(3, 1.0, 0.9),
            measurement(4, 2.0, 0.6),
        ];
        let derived = TrialAccuracyView.derive(&records).unwrap();
        assert_eq!(derived.trials, vec![GroupKey::Int(1), GroupKey::Int(2)]);
        assert_eq!(derived.mean_accuracy[&GroupKey::Int(1)], 0.70);
        assert_eq!(derived.mean_accuracy[&GroupKey::Int(2)], 0.50);
        assert_eq!(derived.points.len(), 5);
        assert_eq!(TrialAccuracy::label(&derived.trials[0]), "Trial 1");
    }
}
