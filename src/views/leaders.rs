use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::data::aggregate::{GroupKey, count_by, extent, value_of};
use crate::data::dispatch::{SelectionBus, SelectionTopic};
use crate::data::filter::{Selection, drop_missing, filter_by_flag};
use crate::data::model::Record;
use crate::data::schema::COUNTRY_GROUPS;
use crate::error::GroupingError;

pub const LEADER: &str = "leader";
pub const COUNTRY: &str = "country";
pub const GENDER: &str = "gender";
pub const PCGDP: &str = "pcgdp";
pub const START_AGE: &str = "start_age";
pub const END_AGE: &str = "end_age";
pub const START_YEAR: &str = "start_year";
pub const END_YEAR: &str = "end_year";
pub const LABEL: &str = "label";

/// Country group shown on first render.
pub const DEFAULT_COUNTRY_GROUP: &str = "oecd";

/// Which chart a leader click came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Lexis,
    Scatter,
}

/// Emphasis of a lexis arrow: a user selection wins over the dataset label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Emphasis {
    Selected,
    Highlighted,
    Plain,
}

// ---------------------------------------------------------------------------
// Derived output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexisArrow {
    pub leader: String,
    pub country: String,
    pub start_year: Option<f64>,
    pub end_year: Option<f64>,
    pub start_age: Option<f64>,
    pub end_age: Option<f64>,
    pub emphasis: Emphasis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub leader: String,
    pub pcgdp: f64,
    pub start_age: Option<f64>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub country_group: String,
    /// Leaders of the active country group, in dataset order.
    pub leaders: usize,
    pub lexis: Vec<LexisArrow>,
    /// Leaders with a known GDP per capita.
    pub scatter: Vec<ScatterPoint>,
    pub pcgdp_extent: Option<(f64, f64)>,
    pub start_age_extent: Option<(f64, f64)>,
    /// Bar chart: leaders per gender.
    pub by_gender: BTreeMap<GroupKey, usize>,
    pub selected: Selection,
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Bar chart, lexis chart and scatterplot over one leaders dataset.
///
/// The lexis chart and the scatterplot share one leader selection: a click
/// in either updates it and announces it on the bus topic of the other.
#[derive(Debug)]
pub struct LeaderDashboard {
    records: Arc<[Record]>,
    country_group: String,
    selected: Selection,
    bus: SelectionBus,
}

impl LeaderDashboard {
    pub fn new(records: Arc<[Record]>) -> Self {
        Self {
            records,
            country_group: DEFAULT_COUNTRY_GROUP.to_string(),
            selected: Selection::new(),
            bus: SelectionBus::new(),
        }
    }

    pub fn country_group(&self) -> &str {
        &self.country_group
    }

    pub fn selection(&self) -> &Selection {
        &self.selected
    }

    /// Register a re-render hook for one side's selection updates.
    pub fn subscribe<F>(&mut self, topic: SelectionTopic, callback: F)
    where
        F: FnMut(&Selection) + 'static,
    {
        self.bus.subscribe(topic, callback);
    }

    /// Country selector change.  Unknown groups are ignored with a warning
    /// and leave the current group active.
    pub fn set_country_group(&mut self, group: &str) -> bool {
        if !COUNTRY_GROUPS.contains(&group) {
            log::warn!("unknown country group '{group}'");
            return false;
        }
        log::debug!("country group {} -> {group}", self.country_group);
        self.country_group = group.to_string();
        true
    }

    /// Click on a leader in one chart; the other chart is notified.
    pub fn toggle_leader(&mut self, side: Side, leader: &str) -> &Selection {
        self.selected.toggle(leader.to_string());
        let topic = match side {
            Side::Lexis => SelectionTopic::ScatterLeaders,
            Side::Scatter => SelectionTopic::LexisLeaders,
        };
        self.bus.publish(topic, &self.selected);
        &self.selected
    }

    pub fn derive(&self) -> Result<Dashboard, GroupingError> {
        let visible = filter_by_flag(self.records.iter(), &self.country_group)?;

        let lexis = visible
            .iter()
            .map(|r| {
                let leader = r.text(LEADER).unwrap_or_default().to_string();
                let emphasis = if self.selected.contains(&leader) {
                    Emphasis::Selected
                } else if r.number(LABEL) == Some(1.0) {
                    Emphasis::Highlighted
                } else {
                    Emphasis::Plain
                };
                LexisArrow {
                    country: r.text(COUNTRY).unwrap_or_default().to_string(),
                    start_year: r.number(START_YEAR),
                    end_year: r.number(END_YEAR),
                    start_age: r.number(START_AGE),
                    end_age: r.number(END_AGE),
                    leader,
                    emphasis,
                }
            })
            .collect();

        let with_gdp = drop_missing(visible.iter().copied(), PCGDP);
        let scatter = with_gdp
            .iter()
            .filter_map(|r| {
                let leader = r.text(LEADER).unwrap_or_default().to_string();
                Some(ScatterPoint {
                    pcgdp: r.number(PCGDP)?,
                    start_age: r.number(START_AGE),
                    selected: self.selected.contains(&leader),
                    leader,
                })
            })
            .collect();

        Ok(Dashboard {
            country_group: self.country_group.clone(),
            leaders: visible.len(),
            lexis,
            scatter,
            pcgdp_extent: extent(with_gdp.iter().copied(), value_of(PCGDP)),
            start_age_extent: extent(visible.iter().copied(), value_of(START_AGE)),
            by_gender: count_by(visible.iter().copied(), GENDER)?,
            selected: self.selected.clone(),
        })
    }
}
