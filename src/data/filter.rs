use std::sync::Arc;

use serde::Serialize;

use super::model::Record;
use crate::error::GroupingError;

// ---------------------------------------------------------------------------
// Selection – ordered set of active keys
// ---------------------------------------------------------------------------

/// Whether a selection restricts anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    /// No key selected: every record passes.
    Empty,
    /// At least one key selected: only matching records pass.
    NonEmpty,
}

/// User-toggled filter keys in toggle order.  A key appears at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Selection<K = String> {
    keys: Vec<K>,
}

impl<K> Default for Selection<K> {
    fn default() -> Self {
        Self { keys: Vec::new() }
    }
}

impl<K: Clone + PartialEq> Selection<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from keys, dropping repeats (first occurrence wins).
    pub fn from_keys<I: IntoIterator<Item = K>>(keys: I) -> Self {
        let mut selection = Self::new();
        for key in keys {
            if !selection.contains(&key) {
                selection.keys.push(key);
            }
        }
        selection
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    pub fn state(&self) -> SelectionState {
        if self.keys.is_empty() {
            SelectionState::Empty
        } else {
            SelectionState::NonEmpty
        }
    }

    /// New selection with `key` flipped: removed if present, appended if not.
    pub fn toggled(&self, key: K) -> Self {
        let mut next = self.clone();
        next.toggle(key);
        next
    }

    /// Flip `key` in place and return the resulting selection.
    pub fn toggle(&mut self, key: K) -> &Self {
        match self.keys.iter().position(|k| *k == key) {
            Some(idx) => {
                self.keys.remove(idx);
            }
            None => self.keys.push(key),
        }
        self
    }

    /// Records whose key(s) intersect the selection, in input order.
    ///
    /// `classifier` yields zero, one or many keys per record (return an
    /// `Option` for single-valued keys, a `Vec` for multi-valued ones).  An
    /// empty selection passes everything through unchanged.
    pub fn apply<'a, R, C, I>(&self, records: R, classifier: C) -> Vec<&'a Record>
    where
        R: IntoIterator<Item = &'a Record>,
        C: Fn(&Record) -> I,
        I: IntoIterator<Item = K>,
    {
        if self.is_empty() {
            return records.into_iter().collect();
        }
        records
            .into_iter()
            .filter(|&record| classifier(record).into_iter().any(|k| self.contains(&k)))
            .collect()
    }
}

/// Classifier reading a text column as the record's single key.
pub fn text_key(column: &str) -> impl Fn(&Record) -> Option<String> + '_ {
    move |record| record.text(column).map(str::to_string)
}

// ---------------------------------------------------------------------------
// Filter – a selection bound to one dataset
// ---------------------------------------------------------------------------

/// Selection state for one view over a shared, read-only record set.
#[derive(Debug, Clone)]
pub struct Filter<K = String> {
    records: Arc<[Record]>,
    selection: Selection<K>,
}

impl<K: Clone + PartialEq + std::fmt::Debug> Filter<K> {
    pub fn new(records: Arc<[Record]>) -> Self {
        Self {
            records,
            selection: Selection::new(),
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn selection(&self) -> &Selection<K> {
        &self.selection
    }

    pub fn toggle(&mut self, key: K) -> &Selection<K> {
        log::debug!("toggle {key:?}");
        self.selection.toggle(key)
    }

    /// Install a selection made elsewhere (another view's toggle).
    pub fn replace(&mut self, selection: Selection<K>) {
        self.selection = selection;
    }

    pub fn apply<C, I>(&self, classifier: C) -> Vec<&Record>
    where
        C: Fn(&Record) -> I,
        I: IntoIterator<Item = K>,
    {
        self.selection.apply(self.records.iter(), classifier)
    }
}

// ---------------------------------------------------------------------------
// Column predicates
// ---------------------------------------------------------------------------

/// Records whose 0/1 flag `column` is set (country-group membership).
pub fn filter_by_flag<'a, R>(records: R, column: &str) -> Result<Vec<&'a Record>, GroupingError>
where
    R: IntoIterator<Item = &'a Record>,
{
    let mut out = Vec::new();
    for record in records {
        let flag = record.number(column).ok_or_else(|| GroupingError::MissingKey {
            row: record.row,
            column: column.to_string(),
        })?;
        if flag == 1.0 {
            out.push(record);
        }
    }
    Ok(out)
}

/// Records with a present numeric value in `column`.
pub fn drop_missing<'a, R>(records: R, column: &str) -> Vec<&'a Record>
where
    R: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter(|record| record.number(column).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Value;

    fn rec(row: usize, category: &str) -> Record {
        Record::new(
            row,
            [("category".to_string(), Value::Text(category.to_string()))]
                .into_iter()
                .collect(),
        )
    }

    fn sample() -> Vec<Record> {
        vec![rec(0, "X"), rec(1, "Y"), rec(2, "X"), rec(3, "Z")]
    }

    fn rows(records: &[&Record]) -> Vec<usize> {
        records.iter().map(|r| r.row).collect()
    }

    #[test]
    fn empty_selection_passes_everything() {
        let records = sample();
        let out = Selection::new().apply(&records, text_key("category"));
        assert_eq!(rows(&out), vec![0, 1, 2, 3]);
    }

    #[test]
    fn toggle_round_trip_returns_to_empty() {
        let records = sample();
        let mut selection = Selection::new();
        assert_eq!(selection.toggle("A".to_string()).state(), SelectionState::NonEmpty);
        assert_eq!(selection.toggle("A".to_string()).state(), SelectionState::Empty);
        assert!(selection.is_empty());
        assert_eq!(selection.apply(&records, text_key("category")).len(), 4);
    }

    #[test]
    fn restriction_keeps_relative_order() {
        let records = sample();
        let selection = Selection::new().toggled("X".to_string());
        let out = selection.apply(&records, text_key("category"));
        assert_eq!(rows(&out), vec![0, 2]);
    }

    #[test]
    fn toggle_appends_and_removes_in_place() {
        let s = Selection::from_keys(["a", "b", "a", "c"]);
        assert_eq!(s.keys(), &["a", "b", "c"]);
        let s = s.toggled("b");
        assert_eq!(s.keys(), &["a", "c"]);
        let s = s.toggled("b");
        assert_eq!(s.keys(), &["a", "c", "b"]);
    }

    #[test]
    fn multi_valued_classifier_matches_any_key() {
        let records = sample();
        let selection = Selection::from_keys(["tag-2".to_string()]);
        let out = selection.apply(&records, |r| {
            if r.row % 2 == 0 {
                vec!["tag-1".to_string(), "tag-2".to_string()]
            } else {
                vec!["tag-3".to_string()]
            }
        });
        assert_eq!(rows(&out), vec![0, 2]);
    }

    #[test]
    fn records_without_key_drop_out_when_restrictive() {
        let mut records = sample();
        records.push(Record::new(4, Default::default()));
        let selection = Selection::from_keys(["Z".to_string()]);
        assert_eq!(rows(&selection.apply(&records, text_key("category"))), vec![3]);
        assert_eq!(Selection::new().apply(&records, text_key("category")).len(), 5);
    }

    #[test]
    fn filter_holds_shared_records() {
        let shared: Arc<[Record]> = sample().into();
        let mut filter = Filter::new(shared.clone());
        filter.toggle("Y".to_string());
        assert_eq!(rows(&filter.apply(text_key("category"))), vec![1]);

        filter.replace(Selection::new());
        assert_eq!(filter.apply(text_key("category")).len(), shared.len());
    }

    #[test]
    fn flag_and_missing_predicates() {
        let mk = |row, flag: f64, gdp: Value| {
            Record::new(
                row,
                [
                    ("oecd".to_string(), Value::Number(flag)),
                    ("pcgdp".to_string(), gdp),
                ]
                .into_iter()
                .collect(),
            )
        };
        let records = vec![
            mk(0, 1.0, Value::Number(10.0)),
            mk(1, 0.0, Value::Number(20.0)),
            mk(2, 1.0, Value::Missing),
        ];
        let oecd = filter_by_flag(&records, "oecd").unwrap();
        assert_eq!(rows(&oecd), vec![0, 2]);
        assert_eq!(rows(&drop_missing(oecd, "pcgdp")), vec![0]);
        assert!(matches!(
            filter_by_flag(&records, "brics"),
            Err(GroupingError::MissingKey { .. })
        ));
    }
}
