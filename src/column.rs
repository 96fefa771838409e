use std::fmt;

use polars::prelude::{
    ChunkTake, DataType, IdxSize, IntoSeries, NewChunkedArray, PlSmallStr, PolarsResult, Series,
    StringChunked, TimeUnit,
};

use crate::value::Value;

/// Storage type of date columns.
pub const DATE_DTYPE: DataType = DataType::Datetime(TimeUnit::Microseconds, None);

/// A labelled column of raw text cells; nulls are missing cells.
#[derive(Debug, Clone)]
pub struct Column {
    cells: StringChunked,
}

impl Column {
    pub fn new<S, I>(label: impl Into<String>, cells: I) -> Self
    where
        S: AsRef<str>,
        I: IntoIterator<Item = Option<S>>,
    {
        let name = PlSmallStr::from(label.into());
        Self {
            cells: StringChunked::from_iter_options(name, cells.into_iter()),
        }
    }

    /// Wrap a text series; other dtypes are cast to text first.
    pub fn from_series(series: &Series) -> PolarsResult<Self> {
        let text = series.cast(&DataType::String)?;
        Ok(Self {
            cells: text.str()?.clone(),
        })
    }

    pub fn label(&self) -> &str {
        self.cells.name().as_str()
    }

    pub fn cells(&self) -> &StringChunked {
        &self.cells
    }

    pub fn series(&self) -> Series {
        self.cells.clone().into_series()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.cells.null_count()
    }

    /// Keep only the rows at `indices`, in the order given.
    pub fn take(&self, indices: &[IdxSize]) -> PolarsResult<Self> {
        Ok(Self {
            cells: self.cells.take(indices)?,
        })
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.label() == other.label() && self.cells.iter().eq(other.cells.iter())
    }
}

/// A fully loaded table: ordered columns sharing one row count.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> crate::Result<Self> {
        let row_count = columns.first().map_or(0, Column::len);
        if let Some(ragged) = columns.iter().find(|column| column.len() != row_count) {
            return Err(crate::ProfileError::invalid_input(format!(
                "column '{}' has {} rows, expected {}",
                ragged.label(),
                ragged.len(),
                row_count
            )));
        }
        Ok(Self { columns, row_count })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.label().to_string()).collect()
    }
}

/// Semantic type decided by inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Float,
    Date,
    String,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Date => "date",
            ColumnType::String => "string",
        }
    }

    /// Integer, float and date columns get order statistics and moments.
    pub fn is_ordinal(self) -> bool {
        !matches!(self, ColumnType::String)
    }

    /// The polars dtype a column of this type is stored as.
    pub fn dtype(self) -> DataType {
        match self {
            ColumnType::Integer => DataType::Int64,
            ColumnType::Float => DataType::Float64,
            ColumnType::Date => DATE_DTYPE,
            ColumnType::String => DataType::String,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A column together with its inferred type and coerced series.
#[derive(Debug, Clone)]
pub struct TypedColumn {
    column_type: ColumnType,
    series: Series,
}

impl TypedColumn {
    pub fn new(column_type: ColumnType, series: Series) -> Self {
        Self {
            column_type,
            series,
        }
    }

    pub fn label(&self) -> &str {
        self.series.name().as_str()
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn series(&self) -> &Series {
        &self.series
    }

    pub fn row_count(&self) -> usize {
        self.series.len()
    }

    pub fn null_count(&self) -> usize {
        self.series.null_count()
    }

    pub fn non_null_count(&self) -> usize {
        self.row_count() - self.null_count()
    }

    pub fn is_all_null(&self) -> bool {
        self.non_null_count() == 0
    }

    /// Cells as [`Value`]s in row order.
    pub fn values(&self) -> PolarsResult<Vec<Option<Value>>> {
        values_of(&self.series, self.column_type)
    }
}

/// Read `series` back as [`Value`]s of `column_type`.
pub(crate) fn values_of(
    series: &Series,
    column_type: ColumnType,
) -> PolarsResult<Vec<Option<Value>>> {
    let values = match column_type {
        ColumnType::Integer => series.i64()?.iter().map(|v| v.map(Value::Integer)).collect(),
        ColumnType::Float => series.f64()?.iter().map(|v| v.map(Value::Float)).collect(),
        ColumnType::Date => {
            let micros = series.to_physical_repr();
            micros
                .i64()?
                .iter()
                .map(|v| v.and_then(Value::from_timestamp_micros))
                .collect()
        }
        ColumnType::String => series.str()?.iter().map(|v| v.map(Value::from)).collect(),
    };
    Ok(values)
}
