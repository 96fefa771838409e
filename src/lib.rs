//! Per-column data-quality profiling for delimited text tables.
//!
//! A table is read with every cell as text, each column's best type is
//! inferred (integer, float, date, falling back to string), and a fixed set
//! of summary statistics plus two value-frequency tables are computed per
//! column.

pub mod column;
pub mod config;
pub mod error;
pub mod infer;
pub mod ingest;
pub mod logging;
pub mod rank;
pub mod render;
pub mod report;
pub mod sample;
pub mod stats;
pub mod value;

pub use column::{Column, ColumnType, Table, TypedColumn};
pub use config::ProfileConfig;
pub use error::{ProfileError, Result};
pub use infer::infer;
pub use ingest::{ReadOptions, read_table};
pub use rank::{DetailPair, DetailTable, Distribution, rank};
pub use report::{ColumnReport, Report, assemble, profile};
pub use stats::{Statistic, SummaryRow, compute};
pub use value::Value;
