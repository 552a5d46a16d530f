use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, ArrayRef, AsArray, BooleanArray, Date32Array, Float32Array, Float64Array, Int32Array,
    Int64Array,
};
use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{RawRow, RawTable, Record};
use super::normalize::normalize_table;
use super::schema::Schema;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read and normalize a dataset in one step.
pub fn load_records(path: &Path, schema: &Schema) -> Result<Vec<Record>> {
    let table = load_file(path, schema)?;
    let records = normalize_table(&table, schema)
        .with_context(|| format!("normalizing {}", path.display()))?;
    log::info!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Read a raw table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus one row per observation
/// * `.json`    – `[{ "year": 2005, "name": "Katrina", ... }, ...]`
/// * `.parquet` – flat scalar columns
///
/// Null cells (JSON `null`, Parquet nulls) become the schema's null
/// sentinel so that the normalizer sees one representation of "absent".
pub fn load_file(path: &Path, schema: &Schema) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path, schema)?,
        "parquet" | "pq" => load_parquet(path, schema)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    log::debug!(
        "read {} rows x {} columns from {}",
        table.len(),
        table.headers.len(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RawTable> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

/// Parse CSV text from any reader; the first row is the header.
pub fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<RawTable> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: {} cells but {} headers",
                record.len(),
                headers.len()
            );
        }
        let row: RawRow = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient='records')`.
///
/// The header is the union of keys in first-seen order.
fn load_json(path: &Path, schema: &Schema) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut row = RawRow::new();
        for (key, val) in obj {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
            row.insert(key.clone(), json_to_cell(val, &schema.null_sentinel));
        }
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

fn json_to_cell(val: &JsonValue, null_sentinel: &str) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => null_sentinel.to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns (strings, ints, floats,
/// bools, dates).  Works with files written by Pandas and Polars.
fn load_parquet(path: &Path, schema: &Schema) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;
    let rows = collect_rows(reader, &headers, schema)?;

    Ok(RawTable { headers, rows })
}

/// Flatten record batches into raw rows.  Row numbers in error messages
/// count from the start of the file, not of the batch.
fn collect_rows<I>(batches: I, headers: &[String], schema: &Schema) -> Result<Vec<RawRow>>
where
    I: IntoIterator<Item = Result<RecordBatch, ArrowError>>,
{
    let mut rows = Vec::new();

    for batch_result in batches {
        let batch = batch_result.context("reading parquet record batch")?;
        let offset = rows.len();
        for row in 0..batch.num_rows() {
            let mut raw = RawRow::new();
            for (col_idx, name) in headers.iter().enumerate() {
                let cell = cell_to_string(batch.column(col_idx), row, schema)
                    .with_context(|| format!("Row {}: failed to read '{name}'", offset + row))?;
                raw.insert(name.clone(), cell);
            }
            rows.push(raw);
        }
    }

    Ok(rows)
}

/// Render a single Arrow cell as the text the normalizer expects.
fn cell_to_string(col: &ArrayRef, row: usize, schema: &Schema) -> Result<String> {
    if col.is_null(row) {
        return Ok(schema.null_sentinel.clone());
    }
    let cell = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int32 => downcast::<Int32Array>(col)?.value(row).to_string(),
        DataType::Int64 => downcast::<Int64Array>(col)?.value(row).to_string(),
        DataType::Float32 => downcast::<Float32Array>(col)?.value(row).to_string(),
        DataType::Float64 => downcast::<Float64Array>(col)?.value(row).to_string(),
        DataType::Boolean => {
            let flag = downcast::<BooleanArray>(col)?.value(row);
            if flag { "1" } else { "0" }.to_string()
        }
        DataType::Date32 => downcast::<Date32Array>(col)?
            .value_as_date(row)
            .context("date out of range")?
            .format(&schema.date_format)
            .to_string(),
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(cell)
}

fn downcast<T: 'static>(col: &ArrayRef) -> Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("column is not a {}", std::any::type_name::<T>()))
}
