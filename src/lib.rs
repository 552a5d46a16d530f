//! Typed loading, grouped aggregation and selection filtering for chart
//! datasets.
//!
//! The [`data`] layer turns raw tabular rows into typed [`Record`]s and
//! derives aggregates and filtered subsequences from them.  The [`views`]
//! compose those operations into what each chart needs to render.

pub mod data;
pub mod error;
pub mod views;

pub use data::aggregate::{GroupKey, Reducer};
pub use data::filter::{Filter, Selection, SelectionState};
pub use data::model::{RawRow, RawTable, Record, Value};
pub use data::schema::{FieldType, Schema};
pub use error::{GroupingError, ParseError};
