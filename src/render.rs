//! Turning a report into polars frames and files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::{
    AnyValue, Column as FrameColumn, CsvWriter, DataFrame, JsonFormat, JsonWriter, NamedFrom,
    ParquetWriter, PolarsResult, SerWriter,
};
use rust_xlsxwriter::{ColNum, RowNum, Workbook, XlsxError};
use tracing::info;

use crate::error::{ProfileError, Result};
use crate::rank::DetailTable;
use crate::report::{ColumnReport, Report};
use crate::stats::{Statistic, SummaryRow};

/// Longest file stem or sheet name produced for a detail table.
pub const MAX_NAME_LENGTH: usize = 31;

pub const LABEL_HEADING: &str = "column";

pub const SUMMARY_SHEET: &str = "Summary";

const DOWN_ARROW: &str = "⤓";
const UP_ARROW: &str = "⤒";

/// Shorten `s` to `max_length` characters, ending in `filler` when cut.
///
/// `truncate_string("Hello world!", 7, "...")` is `"Hell..."`.
pub fn truncate_string(s: &str, max_length: usize, filler: &str) -> String {
    if s.chars().count() <= max_length {
        return s.to_string();
    }
    let keep = max_length.saturating_sub(filler.chars().count());
    let mut truncated: String = s.chars().take(keep).collect();
    truncated.push_str(filler);
    truncated
}

/// Replace characters that are not allowed in file names.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Make `name` a legal worksheet name.
fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim_matches('\'');
    if trimmed.trim().is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

/// The summary table: one row per column, the label first, then every statistic.
pub fn summary_frame(report: &Report) -> Result<DataFrame> {
    let rows: Vec<&SummaryRow> = report.summaries().collect();
    let frame = || -> PolarsResult<DataFrame> {
        let mut columns = Vec::with_capacity(Statistic::ALL.len() + 1);
        let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
        columns.push(FrameColumn::new(LABEL_HEADING.into(), labels));

        for statistic in Statistic::ALL {
            let name = statistic.name().into();
            let column = if statistic.is_count() {
                let counts: Vec<u64> = rows
                    .iter()
                    .map(|r| {
                        let count = match statistic {
                            Statistic::RowCount => r.row_count,
                            Statistic::NullCount => r.null_count,
                            _ => r.unique_count,
                        };
                        count as u64
                    })
                    .collect();
                FrameColumn::new(name, counts)
            } else if statistic.is_percent() {
                let percents: Vec<Option<f64>> = rows
                    .iter()
                    .map(|r| r.get(statistic).and_then(|v| v.as_f64()))
                    .collect();
                FrameColumn::new(name, percents)
            } else {
                let text: Vec<Option<String>> = rows
                    .iter()
                    .map(|r| r.get(statistic).map(|v| v.to_string()))
                    .collect();
                FrameColumn::new(name, text)
            };
            columns.push(column);
        }
        DataFrame::new(columns)
    };
    frame().map_err(|source| ProfileError::Write {
        path: PathBuf::from("<summary>"),
        source,
    })
}

/// The detail table for one column: descending view, a blank spacer, ascending view.
pub fn detail_frame(column: &ColumnReport) -> Result<DataFrame> {
    let descending = &column.detail.descending;
    let ascending = &column.detail.ascending;
    let height = descending.len().max(ascending.len());

    let mut columns = view_columns(descending, DOWN_ARROW);
    columns.push(FrameColumn::new(" ".into(), vec![None::<String>; height]));
    columns.extend(view_columns(ascending, UP_ARROW));

    DataFrame::new(columns).map_err(|source| ProfileError::Write {
        path: PathBuf::from(format!("<detail of {}>", column.label)),
        source,
    })
}

fn view_columns(table: &DetailTable, arrow: &str) -> Vec<FrameColumn> {
    let ranks: Vec<u64> = table.iter().map(|r| r.rank as u64).collect();
    let values: Vec<Option<String>> = table
        .iter()
        .map(|r| r.value.as_ref().map(|v| v.to_string()))
        .collect();
    let percents: Vec<f64> = table.iter().map(|r| r.percent_of_total).collect();
    vec![
        FrameColumn::new(format!("rank {arrow}").into(), ranks),
        FrameColumn::new(format!("value {arrow}").into(), values),
        FrameColumn::new(format!("%total {arrow}").into(), percents),
    ]
}

/// Write DataFrame to output file (format detected by extension)
pub fn write_output_file(df: &DataFrame, path: &Path) -> Result<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ProfileError::invalid_input("could not determine output file extension"))?;
    if !is_frame_extension(extension) {
        return Err(ProfileError::invalid_input(format!(
            "unsupported output format: .{extension}"
        )));
    }

    let mut file = fs::File::create(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut df = df.clone();
    let written = match extension {
        "csv" | "txt" => CsvWriter::new(&mut file).finish(&mut df),
        "tsv" => CsvWriter::new(&mut file)
            .with_separator(b'\t')
            .finish(&mut df),
        "parquet" | "pq" => ParquetWriter::new(&mut file).finish(&mut df).map(|_| ()),
        "json" => JsonWriter::new(&mut file)
            .with_json_format(JsonFormat::Json)
            .finish(&mut df),
        _ => JsonWriter::new(&mut file)
            .with_json_format(JsonFormat::JsonLines)
            .finish(&mut df),
    };
    written.map_err(|source| ProfileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn is_supported_extension(extension: &str) -> bool {
    extension == "xlsx" || is_frame_extension(extension)
}

/// Extensions written by [`write_output_file`], one frame per file.
pub fn is_frame_extension(extension: &str) -> bool {
    matches!(
        extension,
        "csv" | "txt" | "tsv" | "parquet" | "pq" | "json" | "jsonl" | "ndjson"
    )
}

/// Print a DataFrame (pretty for TTY, raw CSV for pipes)
pub fn print_dataframe(df: &DataFrame, is_tty: bool) -> Result<()> {
    if is_tty {
        println!("{df}");
    } else {
        let mut buf = Vec::new();
        CsvWriter::new(&mut buf)
            .finish(&mut df.clone())
            .map_err(|source| ProfileError::Write {
                path: PathBuf::from("<stdout>"),
                source,
            })?;
        print!("{}", String::from_utf8_lossy(&buf));
    }
    Ok(())
}

/// File names for each column's detail table, unique within one directory.
pub fn detail_file_names(labels: &[&str], extension: &str) -> Vec<String> {
    let mut taken = HashSet::new();
    labels
        .iter()
        .map(|label| {
            let stem = sanitize_file_name(&truncate_string(
                &format!("{label} detail"),
                MAX_NAME_LENGTH,
                "...",
            ));
            let mut name = format!("{stem}.{extension}");
            let mut copy = 2;
            while !taken.insert(name.to_lowercase()) {
                name = format!("{stem} ({copy}).{extension}");
                copy += 1;
            }
            name
        })
        .collect()
}

/// Write one detail file per column into `dir`, creating it if needed.
pub fn write_details(report: &Report, dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|source| ProfileError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let labels: Vec<&str> = report.columns().iter().map(|c| c.label.as_str()).collect();
    let names = detail_file_names(&labels, extension);
    report
        .columns()
        .iter()
        .zip(names)
        .map(|(column, name)| {
            info!("Writing detail for column '{}' ...", column.label);
            let path = dir.join(name);
            write_output_file(&detail_frame(column)?, &path)?;
            Ok(path)
        })
        .collect()
}

/// Worksheet names for each column's detail table.
///
/// Names are cut to 31 characters, stripped of characters Excel rejects and
/// made unique case-insensitively. Every name ends in ` detail`, `...` or a
/// ` (n)` suffix, so none can collide with the summary sheet.
pub fn sheet_names(labels: &[&str]) -> Vec<String> {
    let mut taken = HashSet::new();
    labels
        .iter()
        .map(|label| {
            let stem = sanitize_sheet_name(&truncate_string(
                &format!("{label} detail"),
                MAX_NAME_LENGTH,
                "...",
            ));
            let mut name = stem.clone();
            let mut copy = 2;
            while !taken.insert(name.to_lowercase()) {
                let suffix = format!(" ({copy})");
                let keep = MAX_NAME_LENGTH - suffix.chars().count();
                let head: String = stem.chars().take(keep).collect();
                name = format!("{head}{suffix}");
                copy += 1;
            }
            name
        })
        .collect()
}

/// Write the report as one workbook: the summary sheet first, then one
/// sheet per column's detail table when `include_details` is set.
pub fn write_workbook(report: &Report, path: &Path, include_details: bool) -> Result<()> {
    let workbook_error = |source| ProfileError::Workbook {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = Workbook::new();
    write_sheet(&mut workbook, SUMMARY_SHEET, &summary_frame(report)?).map_err(workbook_error)?;

    if include_details {
        let labels: Vec<&str> = report.columns().iter().map(|c| c.label.as_str()).collect();
        for (column, name) in report.columns().iter().zip(sheet_names(&labels)) {
            info!("Writing detail sheet for column '{}' ...", column.label);
            write_sheet(&mut workbook, &name, &detail_frame(column)?).map_err(workbook_error)?;
        }
    }

    workbook.save(path).map_err(workbook_error)
}

/// Copy `df` into a new worksheet below a header row of column names.
fn write_sheet(workbook: &mut Workbook, name: &str, df: &DataFrame) -> Result<(), XlsxError> {
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(name)?;
    for (col, column) in df.get_columns().iter().enumerate() {
        let col = ColNum::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)?;
        worksheet.write_string(0, col, column.name().as_str())?;
        for (row, value) in column.as_materialized_series().iter().enumerate() {
            let row = RowNum::try_from(row + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
            match value {
                AnyValue::Null => continue,
                AnyValue::UInt64(count) => worksheet.write_number(row, col, count as f64)?,
                AnyValue::Float64(number) => worksheet.write_number(row, col, number)?,
                other => match other.get_str() {
                    Some(text) => worksheet.write_string(row, col, text)?,
                    None => worksheet.write_string(row, col, other.to_string())?,
                },
            };
        }
    }
    Ok(())
}

/// Size of a written file, for the closing log line.
pub fn file_size(path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{Column, Table};
    use crate::config::ProfileConfig;
    use crate::report::profile;

    fn report() -> Report {
        let table = Table::new(vec![
            Column::new("id", [Some("1"), Some("2"), Some("2"), Some("3"), None]),
            Column::new("when", [Some("2024-01-05"), None, None, None, None]),
            Column::new("empty", [None::<&str>, None, None, None, None]),
        ])
        .unwrap();
        let config = ProfileConfig::default().with_max_detail_values(2).unwrap();
        profile(&table, &config).unwrap()
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello world!", 7, "..."), "Hell...");
        assert_eq!(truncate_string("short", 7, "..."), "short");
        assert_eq!(truncate_string("exactly", 7, "..."), "exactly");
        assert_eq!(truncate_string("ééééééééé", 5, "…"), "éééé…");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("a/b:c"), "a_b_c");
        assert_eq!(sanitize_file_name("   "), "_");
        assert_eq!(sanitize_file_name("plain name"), "plain name");
    }

    #[test]
    fn test_detail_file_names_are_unique() {
        let names = detail_file_names(&["a/b", "a:b", "Total"], "csv");
        assert_eq!(
            names,
            vec!["a_b detail.csv", "a_b detail (2).csv", "Total detail.csv"]
        );

        let long = "a column label well past the limit";
        let names = detail_file_names(&[long], "csv");
        assert_eq!(names[0], "a column label well past the....csv");
    }

    #[test]
    fn test_summary_frame_layout() {
        let df = summary_frame(&report()).unwrap();
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names[0], LABEL_HEADING);
        assert_eq!(
            &names[1..],
            Statistic::ALL.iter().map(|s| s.name()).collect::<Vec<_>>()
        );
        assert_eq!(df.height(), 3);

        let counts = df.column("count").unwrap().as_materialized_series().u64().unwrap();
        assert_eq!(counts.get(0), Some(5));
        let most_common = df.column("most_common").unwrap().as_materialized_series().str().unwrap();
        assert_eq!(most_common.get(0), Some("2"));
        assert_eq!(most_common.get(2), None);
        let largest = df.column("largest").unwrap().as_materialized_series().str().unwrap();
        assert_eq!(largest.get(1), Some("2024-01-05 00:00:00"));
    }

    #[test]
    fn test_detail_frame_layout() {
        let report = report();
        let df = detail_frame(report.get("id").unwrap()).unwrap();
        let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["rank ⤓", "value ⤓", "%total ⤓", " ", "rank ⤒", "value ⤒", "%total ⤒"]
        );
        assert_eq!(df.height(), 2);
        let values = df.column("value ⤓").unwrap().as_materialized_series().str().unwrap();
        assert_eq!(values.get(0), Some("2"));
        let percents = df.column("%total ⤓").unwrap().as_materialized_series().f64().unwrap();
        assert_eq!(percents.get(0), Some(40.0));

        let empty = detail_frame(report.get("empty").unwrap()).unwrap();
        assert_eq!(empty.height(), 0);
    }

    #[test]
    fn test_write_summary_and_details() -> Result<()> {
        let report = report();
        let dir = std::env::temp_dir().join("aq_render_details");
        let summary_path = std::env::temp_dir().join("aq_render_summary.csv");

        write_output_file(&summary_frame(&report)?, &summary_path)?;
        let text = fs::read_to_string(&summary_path).unwrap();
        assert!(text.starts_with("column,count,null,%null,unique"));
        assert!(file_size(&summary_path)? > 0);

        let paths = write_details(&report, &dir, "csv")?;
        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("id detail.csv"));
        for path in &paths {
            assert!(path.exists());
        }

        fs::remove_file(summary_path).ok();
        fs::remove_dir_all(dir).ok();
        Ok(())
    }

    #[test]
    fn test_unsupported_output_format() {
        let df = summary_frame(&report()).unwrap();
        let err = write_output_file(&df, Path::new("out.xls")).unwrap_err();
        assert!(err.is_invalid_input());
        // Workbooks hold several frames and go through write_workbook.
        let err = write_output_file(&df, Path::new("out.xlsx")).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(is_supported_extension("xlsx"));
    }

    #[test]
    fn test_sheet_names_are_legal_and_unique() {
        let names = sheet_names(&["a/b", "a:b", "Total", "'quoted'"]);
        assert_eq!(
            names,
            vec!["a_b detail", "a_b detail (2)", "Total detail", "quoted' detail"]
        );

        let long = "a column label well past the limit";
        let names = sheet_names(&[long, long, &long.to_uppercase()]);
        assert_eq!(names[0], "a column label well past the...");
        assert_eq!(names[1], "a column label well past th (2)");
        assert_eq!(names[2], "A COLUMN LABEL WELL PAST TH (3)");
        assert!(names.iter().all(|n| n.chars().count() <= MAX_NAME_LENGTH));
    }

    #[test]
    fn test_workbook_sheets_round_trip() -> Result<()> {
        use calamine::{Data, Reader, Xlsx, open_workbook};

        let report = report();
        let path = std::env::temp_dir().join("aq_render_workbook.xlsx");
        write_workbook(&report, &path, true)?;

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec!["Summary", "id detail", "when detail", "empty detail"]
        );

        let summary = workbook.worksheet_range(SUMMARY_SHEET).unwrap();
        assert_eq!(summary.get((0, 0)), Some(&Data::String("column".to_string())));
        assert_eq!(summary.get((1, 0)), Some(&Data::String("id".to_string())));
        assert_eq!(summary.get((1, 1)), Some(&Data::Float(5.0)));

        let detail = workbook.worksheet_range("id detail").unwrap();
        assert_eq!(detail.get((1, 1)), Some(&Data::String("2".to_string())));
        assert_eq!(detail.get((1, 2)), Some(&Data::Float(40.0)));

        fs::remove_file(path).ok();
        Ok(())
    }

    #[test]
    fn test_workbook_without_details() -> Result<()> {
        use calamine::{Reader, Xlsx, open_workbook};

        let path = std::env::temp_dir().join("aq_render_workbook_summary_only.xlsx");
        write_workbook(&report(), &path, false)?;
        let workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Summary"]);

        fs::remove_file(path).ok();
        Ok(())
    }
}
