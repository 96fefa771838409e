use std::path::Path;

use polars::prelude::{
    DataFrame, LazyCsvReader, LazyFileListReader, NullValues, PlSmallStr, PolarsResult,
};
use polars_utils::plpath::PlPath;
use tracing::{debug, info};

use crate::column::{Column, Table};
use crate::config::ProfileConfig;
use crate::error::{ProfileError, Result};

/// Cell spellings read as null.
pub const NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// How to read the input file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadOptions {
    pub skip_rows: usize,
    /// Overrides the separator implied by the file extension.
    pub separator: Option<u8>,
}

impl ReadOptions {
    pub fn from_config(config: &ProfileConfig) -> Self {
        Self {
            skip_rows: config.skip_rows(),
            separator: None,
        }
    }

    pub fn with_separator(mut self, separator: Option<u8>) -> Self {
        self.separator = separator;
        self
    }
}

/// Separator implied by the file extension, looking through `.gz`/`.zst`.
pub fn detect_separator(path: &Path) -> Result<u8> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ProfileError::invalid_input("could not determine file extension"))?;

    // Handle compressed files by looking at the full extension chain
    let file_stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let inner_extension = Path::new(file_stem).extension().and_then(|e| e.to_str());

    let format = match extension {
        "gz" | "zst" => inner_extension.ok_or_else(|| {
            ProfileError::invalid_input("compressed file missing format extension")
        })?,
        ext => ext,
    };

    match format {
        "csv" | "txt" => Ok(b','),
        "tsv" | "tab" => Ok(b'\t'),
        _ => Err(ProfileError::invalid_input(format!(
            "unsupported file format: .{format}"
        ))),
    }
}

/// Load a delimited text file with every column as text.
pub fn read_table(path: &Path, options: &ReadOptions) -> Result<Table> {
    let separator = match options.separator {
        Some(separator) => separator,
        None => detect_separator(path)?,
    };
    let read_error = |source| ProfileError::Read {
        path: path.to_path_buf(),
        source,
    };

    info!("Reading from '{}' ...", path.display());
    let null_values = NULL_MARKERS
        .iter()
        .map(|marker| PlSmallStr::from_static(*marker))
        .collect();
    let df = LazyCsvReader::new(PlPath::new(&path.to_string_lossy()))
        .with_separator(separator)
        .with_skip_rows(options.skip_rows)
        .with_infer_schema_length(Some(0)) // every column as text
        .with_null_values(Some(NullValues::AllColumns(null_values)))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(read_error)?;

    let table = frame_to_table(&df).map_err(read_error)??;
    debug!(
        rows = table.row_count(),
        columns = table.column_count(),
        "Loaded table"
    );
    Ok(table)
}

fn frame_to_table(df: &DataFrame) -> PolarsResult<Result<Table>> {
    let columns = df
        .get_columns()
        .iter()
        .map(|column| Column::from_series(column.as_materialized_series()))
        .collect::<PolarsResult<Vec<_>>>()?;
    Ok(Table::new(columns))
}
