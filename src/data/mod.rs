/// Data layer: loading, typed records, aggregation and selection filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  read file → RawTable (strings)
///   └──────────┘
///        │  + schema
///        ▼
///   ┌───────────┐
///   │ normalize  │  coerce declared columns → Vec<Record>
///   └───────────┘
///        │
///        ├─────────────────────┐
///        ▼                     ▼
///   ┌───────────┐        ┌──────────┐
///   │ aggregate  │        │  filter   │  selection → record subsequence
///   └───────────┘        └──────────┘
///                              │
///                              ▼
///                        ┌──────────┐
///                        │ dispatch  │  selection change → subscribers
///                        └──────────┘
/// ```

pub mod aggregate;
pub mod dispatch;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod schema;
