use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use vis_data::data::aggregate::{Reducer, rollup};
use vis_data::data::loader::load_records;
use vis_data::data::schema::{self, Schema};
use vis_data::views::{DisasterTimelineView, LeaderDashboard, Side, TrialAccuracyView};
use vis_data::Record;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Preset {
    Experiment,
    Disasters,
    Leaders,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReducerArg {
    Mean,
    Max,
    Min,
    Sum,
    Count,
}

impl From<ReducerArg> for Reducer {
    fn from(arg: ReducerArg) -> Self {
        match arg {
            ReducerArg::Mean => Reducer::mean(),
            ReducerArg::Max => Reducer::Max,
            ReducerArg::Min => Reducer::Min,
            ReducerArg::Sum => Reducer::Sum,
            ReducerArg::Count => Reducer::Count,
        }
    }
}

/// Load a chart dataset and print what its view would render.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Dataset file (.csv, .json or .parquet).
    file: PathBuf,

    /// Built-in dataset layout and view.
    #[arg(long, value_enum)]
    preset: Option<Preset>,

    /// JSON schema file; overrides the preset's column types.
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Ad-hoc aggregation: key column.
    #[arg(long, requires = "value")]
    group_by: Option<String>,

    /// Ad-hoc aggregation: value column.
    #[arg(long, requires = "group_by")]
    value: Option<String>,

    #[arg(long, value_enum, default_value = "mean")]
    reducer: ReducerArg,

    /// Leaders dataset: country group flag column.
    #[arg(long)]
    country_group: Option<String>,

    /// Categories (timeline) or leaders (dashboard) to select, in order.
    #[arg(long = "select")]
    select: Vec<String>,

    /// Pretty-print JSON instead of one compact line.
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let schema = match (&cli.schema, cli.preset) {
        (Some(path), _) => Schema::from_json_file(path)?,
        (None, Some(preset)) => preset_schema(preset),
        (None, None) => Schema::default(),
    };

    let records: Arc<[Record]> = load_records(&cli.file, &schema)
        .with_context(|| format!("loading {}", cli.file.display()))?
        .into();

    if let (Some(key), Some(value)) = (&cli.group_by, &cli.value) {
        let out = rollup(records.iter(), key, value, cli.reducer.into())?;
        let out: Vec<(String, f64)> = out.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        return print(&out, cli.pretty);
    }

    match cli.preset {
        Some(Preset::Experiment) => print(&TrialAccuracyView.derive(&records)?, cli.pretty),
        Some(Preset::Disasters) => {
            let mut view = DisasterTimelineView::new(records);
            for category in &cli.select {
                view.toggle_category(category);
            }
            print(&view.derive()?, cli.pretty)
        }
        Some(Preset::Leaders) => {
            let mut dashboard = LeaderDashboard::new(records);
            if let Some(group) = &cli.country_group {
                if !dashboard.set_country_group(group) {
                    bail!(
                        "unknown country group '{group}' (expected one of {})",
                        schema::COUNTRY_GROUPS.join(", ")
                    );
                }
            }
            for leader in &cli.select {
                dashboard.toggle_leader(Side::Lexis, leader);
            }
            print(&dashboard.derive()?, cli.pretty)
        }
        None => print(&*records, cli.pretty),
    }
}

fn preset_schema(preset: Preset) -> Schema {
    match preset {
        Preset::Experiment => schema::experiment_schema(),
        Preset::Disasters => schema::disaster_schema(),
        Preset::Leaders => schema::leader_schema(),
    }
}

fn print<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}
