use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, Duration, NaiveDate};
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[(self.next_u64() % items.len() as u64) as usize]
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// experiment_data.csv
// ---------------------------------------------------------------------------

fn write_experiment(dir: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let path = dir.join("experiment_data.csv");
    let mut writer = csv::Writer::from_path(&path).context("creating experiment_data.csv")?;
    writer.write_record(["trial", "accuracy"])?;
    let mut rows = 0;
    for trial in 1..=5 {
        let base = 0.45 + 0.08 * trial as f64;
        for _ in 0..20 {
            let accuracy = round2((base + rng.range(-0.15, 0.15)).clamp(0.0, 1.0));
            writer.write_record([trial.to_string(), accuracy.to_string()])?;
            rows += 1;
        }
    }
    writer.flush()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// disaster_costs.csv
// ---------------------------------------------------------------------------

fn write_disasters(dir: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let categories = [
        "winter-storm-freeze",
        "drought-wildfire",
        "flooding",
        "tropical-cyclone",
        "severe-storm",
    ];
    let path = dir.join("disaster_costs.csv");
    let mut writer = csv::Writer::from_path(&path).context("creating disaster_costs.csv")?;
    writer.write_record(["name", "category", "year", "mid", "cost"])?;
    let mut rows = 0;
    for year in 1980..=2017 {
        let count = 2 + (rng.next_u64() % 6) as usize;
        for n in 0..count {
            let category = rng.pick(&categories);
            let start = NaiveDate::from_ymd_opt(year, 1, 1).context("invalid year")?;
            let mid = start + Duration::days((rng.next_u64() % 365) as i64);
            let cost = round2(rng.range(1.0, 12.0).powi(2) / 4.0);
            let name = format!("{} {} #{}", category.replace('-', " "), mid.year(), n + 1);
            writer.write_record([
                name,
                category.to_string(),
                year.to_string(),
                mid.format("%Y-%m-%d").to_string(),
                cost.to_string(),
            ])?;
            rows += 1;
        }
    }
    writer.flush()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// leaderlist.csv / leaderlist.parquet
// ---------------------------------------------------------------------------

struct Leader {
    country: String,
    leader: String,
    gender: String,
    start_year: i64,
    end_year: i64,
    start_age: i64,
    pcgdp: Option<f64>,
    label: i64,
    groups: [i64; 4],
}

fn generate_leaders(rng: &mut SimpleRng) -> Vec<Leader> {
    // country, oecd, eu27, brics, gs20
    let countries: [(&str, [i64; 4]); 6] = [
        ("Germany", [1, 1, 0, 1]),
        ("France", [1, 1, 0, 1]),
        ("Canada", [1, 0, 0, 1]),
        ("Brazil", [0, 0, 1, 1]),
        ("India", [0, 0, 1, 1]),
        ("Ghana", [0, 0, 0, 0]),
    ];
    let genders = ["male", "male", "male", "female"];

    let mut leaders = Vec::new();
    for (country, groups) in countries {
        let mut year = 1950;
        let mut n = 1;
        while year < 2018 {
            let duration = 1 + (rng.next_u64() % 9) as i64;
            let start_age = 40 + (rng.next_u64() % 30) as i64;
            let pcgdp = if rng.next_f64() < 0.15 {
                None
            } else {
                Some(round2(rng.range(500.0, 60000.0)))
            };
            leaders.push(Leader {
                country: country.to_string(),
                leader: format!("{country} Leader {n}"),
                gender: rng.pick(&genders).to_string(),
                start_year: year,
                end_year: year + duration,
                start_age,
                pcgdp,
                label: i64::from(rng.next_f64() < 0.1),
                groups,
            });
            year += duration;
            n += 1;
        }
    }
    leaders
}

const LEADER_HEADER: [&str; 14] = [
    "country", "leader", "gender", "start_year", "end_year", "start_age", "end_age", "duration",
    "pcgdp", "label", "oecd", "eu27", "brics", "gs20",
];

fn write_leaders_csv(dir: &Path, leaders: &[Leader]) -> Result<()> {
    let path = dir.join("leaderlist.csv");
    let mut writer = csv::Writer::from_path(&path).context("creating leaderlist.csv")?;
    writer.write_record(LEADER_HEADER)?;
    for l in leaders {
        let duration = l.end_year - l.start_year;
        let mut row = vec![
            l.country.clone(),
            l.leader.clone(),
            l.gender.clone(),
            l.start_year.to_string(),
            l.end_year.to_string(),
            l.start_age.to_string(),
            (l.start_age + duration).to_string(),
            duration.to_string(),
            l.pcgdp.map_or_else(|| "NA".to_string(), |v| v.to_string()),
            l.label.to_string(),
        ];
        row.extend(l.groups.iter().map(|g| g.to_string()));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_leaders_parquet(dir: &Path, leaders: &[Leader]) -> Result<()> {
    let text = |f: fn(&Leader) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(leaders.iter().map(f).collect::<Vec<_>>()))
    };
    let int = |f: fn(&Leader) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from(leaders.iter().map(f).collect::<Vec<_>>()))
    };

    let mut fields = vec![
        Field::new("country", DataType::Utf8, false),
        Field::new("leader", DataType::Utf8, false),
        Field::new("gender", DataType::Utf8, false),
        Field::new("start_year", DataType::Int64, false),
        Field::new("end_year", DataType::Int64, false),
        Field::new("start_age", DataType::Int64, false),
        Field::new("end_age", DataType::Int64, false),
        Field::new("duration", DataType::Int64, false),
        Field::new("pcgdp", DataType::Float64, true),
        Field::new("label", DataType::Int64, false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        text(|l| &l.country),
        text(|l| &l.leader),
        text(|l| &l.gender),
        int(|l| l.start_year),
        int(|l| l.end_year),
        int(|l| l.start_age),
        int(|l| l.start_age + l.end_year - l.start_year),
        int(|l| l.end_year - l.start_year),
        Arc::new(Float64Array::from(
            leaders.iter().map(|l| l.pcgdp).collect::<Vec<_>>(),
        )),
        int(|l| l.label),
    ];
    for (idx, group) in ["oecd", "eu27", "brics", "gs20"].into_iter().enumerate() {
        fields.push(Field::new(group, DataType::Int64, false));
        columns.push(Arc::new(Int64Array::from(
            leaders.iter().map(|l| l.groups[idx]).collect::<Vec<_>>(),
        )));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let path = dir.join("leaderlist.parquet");
    let file = std::fs::File::create(&path).context("creating leaderlist.parquet")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let dir: PathBuf = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_data".to_string())
        .into();
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

    let mut rng = SimpleRng::new(42);

    let trials = write_experiment(&dir, &mut rng)?;
    let disasters = write_disasters(&dir, &mut rng)?;
    let leaders = generate_leaders(&mut rng);
    write_leaders_csv(&dir, &leaders)?;
    write_leaders_parquet(&dir, &leaders)?;

    log::info!(
        "wrote {trials} measurements, {disasters} disasters and {} leaders to {}",
        leaders.len(),
        dir.display()
    );
    Ok(())
}
