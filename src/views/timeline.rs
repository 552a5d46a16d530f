use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::aggregate::{
    GroupKey, Reducer, count_by, extent, group_by, key_by, records_at_group_max, rollup, value_of,
};
use crate::data::dispatch::{SelectionBus, SelectionTopic};
use crate::data::filter::{Filter, Selection, text_key};
use crate::data::model::Record;
use crate::error::GroupingError;

pub const YEAR: &str = "year";
pub const COST: &str = "cost";
pub const MID: &str = "mid";
pub const NAME: &str = "name";
pub const CATEGORY: &str = "category";

// ---------------------------------------------------------------------------
// Derived output
// ---------------------------------------------------------------------------

/// One semicircle mark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisasterMark {
    pub row: usize,
    pub name: String,
    pub category: String,
    /// `None` when the cost cell is missing.
    pub cost: Option<f64>,
    pub date: Option<NaiveDate>,
}

impl DisasterMark {
    fn from_record(record: &Record) -> Self {
        Self {
            row: record.row,
            name: record.text(NAME).unwrap_or_default().to_string(),
            category: record.text(CATEGORY).unwrap_or_default().to_string(),
            cost: record.number(COST),
            date: record.date(MID),
        }
    }
}

/// All marks of one timeline row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearRow {
    pub year: GroupKey,
    pub disasters: Vec<DisasterMark>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    /// Visible disasters grouped by year, ascending.
    pub rows: Vec<YearRow>,
    /// Highest visible cost per year.
    pub max_cost_by_year: BTreeMap<GroupKey, f64>,
    /// Visible disasters that reach their year's highest cost.
    pub max_labels: Vec<DisasterMark>,
    /// Cost range over the whole dataset (radius scale domain).
    pub cost_extent: Option<(f64, f64)>,
    /// Legend entries with their disaster counts.
    pub legend: BTreeMap<GroupKey, usize>,
    pub selected: Selection,
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Disaster-cost timeline with a click-to-filter category legend.
///
/// Legend clicks are announced on [`SelectionTopic::Categories`] so other
/// views can follow the same category filter.
#[derive(Debug)]
pub struct DisasterTimelineView {
    categories: Filter,
    bus: SelectionBus,
}

impl DisasterTimelineView {
    pub fn new(records: Arc<[Record]>) -> Self {
        Self {
            categories: Filter::new(records),
            bus: SelectionBus::new(),
        }
    }

    pub fn subscribe<F>(&mut self, topic: SelectionTopic, callback: F)
    where
        F: FnMut(&Selection) + 'static,
    {
        self.bus.subscribe(topic, callback);
    }

    pub fn selection(&self) -> &Selection {
        self.categories.selection()
    }

    /// Legend click.
    pub fn toggle_category(&mut self, category: &str) -> &Selection {
        let selection = self.categories.toggle(category.to_string());
        self.bus.publish(SelectionTopic::Categories, selection);
        selection
    }

    /// Adopt a category selection made elsewhere; nothing is published.
    pub fn set_categories(&mut self, selection: Selection) {
        self.categories.replace(selection);
    }

    pub fn derive(&self) -> Result<Timeline, GroupingError> {
        let all = self.categories.records();
        let visible = self.categories.apply(text_key(CATEGORY));

        let rows = group_by(visible.iter().copied(), key_by(YEAR))?
            .into_iter()
            .map(|(year, group)| YearRow {
                year,
                disasters: group.into_iter().map(DisasterMark::from_record).collect(),
            })
            .collect();

        let max_cost_by_year = rollup(visible.iter().copied(), YEAR, COST, Reducer::Max)?;
        let max_labels =
            records_at_group_max(visible.iter().copied(), key_by(YEAR), value_of(COST))?
                .into_iter()
                .map(DisasterMark::from_record)
                .collect();

        Ok(Timeline {
            rows,
            max_cost_by_year,
            max_labels,
            cost_extent: extent(all, value_of(COST)),
            legend: count_by(all, CATEGORY)?,
            selected: self.selection().clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::data::model::Value;

    fn disaster(row: usize, year: f64, cost: f64, name: &str, category: &str) -> Record {
        Record::new(
            row,
            [
                (YEAR.to_string(), Value::Number(year)),
                (COST.to_string(), Value::Number(cost)),
                (NAME.to_string(), Value::Text(name.to_string())),
                (CATEGORY.to_string(), Value::Text(category.to_string())),
            ]
            .into_iter()
            .collect(),
        )
    }

    fn view() -> DisasterTimelineView {
        let records: Arc<[Record]> = vec![
            disaster(0, 1980.0, 2.0, "Heat wave", "drought-wildfire"),
            disaster(1, 1980.0, 5.5, "Hurricane Allen", "tropical-cyclone"),
            disaster(2, 1981.0, 1.2, "Freeze", "winter-storm"),
            disaster(3, 1981.0, 0.9, "Floods", "flooding"),
        ]
        .into();
        DisasterTimelineView::new(records)
    }

    #[test]
    fn unfiltered_rows_and_maxima() {
        let timeline = view().derive().unwrap();
        assert_eq!(timeline.rows.len(), 2);
        assert_eq!(timeline.rows[0].year, GroupKey::Int(1980));
        assert_eq!(timeline.max_cost_by_year[&GroupKey::Int(1980)], 5.5);
        let labels: Vec<&str> = timeline.max_labels.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(labels, vec!["Hurricane Allen", "Freeze"]);
        assert_eq!(timeline.cost_extent, Some((0.9, 5.5)));
        assert_eq!(timeline.legend.len(), 4);
    }

    #[test]
    fn legend_filter_recomputes_maxima_but_not_extent() {
        let mut view = view();
        view.toggle_category("flooding");
        view.toggle_category("drought-wildfire");
        let timeline = view.derive().unwrap();

        assert_eq!(timeline.max_cost_by_year[&GroupKey::Int(1980)], 2.0);
        assert_eq!(timeline.max_cost_by_year[&GroupKey::Int(1981)], 0.9);
        assert_eq!(timeline.cost_extent, Some((0.9, 5.5)));
        assert_eq!(timeline.selected.keys(), &["flooding", "drought-wildfire"]);

        view.toggle_category("flooding");
        view.toggle_category("drought-wildfire");
        assert_eq!(view.derive().unwrap().rows.iter().map(|r| r.disasters.len()).sum::<usize>(), 4);
    }

    #[test]
    fn legend_click_is_mirrored_by_a_subscribed_view() {
        let mut source = view();
        let follower = Rc::new(RefCell::new(view()));
        let target = follower.clone();
        source.subscribe(SelectionTopic::Categories, move |s| {
            target.borrow_mut().set_categories(s.clone())
        });

        source.toggle_category("winter-storm");
        let expected = source.derive().unwrap();
        let mirrored = follower.borrow().derive().unwrap();
        assert_eq!(mirrored, expected);
        assert_eq!(mirrored.selected.keys(), &["winter-storm"]);
        assert_eq!(mirrored.max_cost_by_year.len(), 1);

        source.toggle_category("winter-storm");
        assert!(follower.borrow().selection().is_empty());
    }

    #[test]
    fn missing_cost_stays_absent_on_the_mark() {
        let mut record = disaster(7, 1990.0, 0.0, "Unknown storm", "severe-storm");
        record.fields.insert(COST.to_string(), Value::Missing);
        let records: Arc<[Record]> = vec![record, disaster(8, 1990.0, 3.0, "Hail", "severe-storm")].into();

        let timeline = DisasterTimelineView::new(records).derive().unwrap();
        let marks = &timeline.rows[0].disasters;
        assert_eq!(marks[0].cost, None);
        assert_eq!(marks[1].cost, Some(3.0));
        assert_eq!(timeline.max_labels[0].name, "Hail");
    }
}
