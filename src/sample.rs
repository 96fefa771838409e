use polars::prelude::{IdxSize, PolarsResult};
use rand::Rng;
use rand::seq::index::sample;
use tracing::debug;

use crate::column::{Column, Table};
use crate::error::Result;

/// Number of rows kept when sampling `percent` of `row_count`.
pub fn sample_size(row_count: usize, percent: u8) -> usize {
    usize::from(percent) * row_count / 100
}

/// Keep a uniform random `percent` of the table's rows, in original order.
///
/// The same row subset is applied to every column.
pub fn sample_rows<R: Rng + ?Sized>(table: &Table, percent: u8, rng: &mut R) -> Result<Table> {
    let row_count = table.row_count();
    let size = sample_size(row_count, percent);
    debug!(row_count, size, percent, "Sampling rows");

    let mut keep: Vec<IdxSize> = sample(rng, row_count, size)
        .into_iter()
        .map(|row| row as IdxSize)
        .collect();
    keep.sort_unstable();

    let columns = table
        .columns()
        .iter()
        .map(|c| c.take(&keep))
        .collect::<PolarsResult<Vec<Column>>>()?;
    Table::new(columns)
}
