//! Per-column summary statistics.

use chrono::TimeDelta;
use polars::prelude::{ChunkAgg, ChunkQuantile, ChunkVar, DataType, QuantileMethod, Series};
use tracing::warn;

use crate::column::{ColumnType, TypedColumn};
use crate::error::{ProfileError, Result};
use crate::rank::Distribution;
use crate::value::Value;

/// The fixed set of summary statistics, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    RowCount,
    NullCount,
    NullPercent,
    UniqueCount,
    UniquePercent,
    MostCommon,
    MostCommonPercent,
    Largest,
    Smallest,
    Longest,
    Shortest,
    Mean,
    Percentile25th,
    Median,
    Percentile75th,
    StdDev,
}

impl Statistic {
    pub const ALL: [Statistic; 16] = [
        Statistic::RowCount,
        Statistic::NullCount,
        Statistic::NullPercent,
        Statistic::UniqueCount,
        Statistic::UniquePercent,
        Statistic::MostCommon,
        Statistic::MostCommonPercent,
        Statistic::Largest,
        Statistic::Smallest,
        Statistic::Longest,
        Statistic::Shortest,
        Statistic::Mean,
        Statistic::Percentile25th,
        Statistic::Median,
        Statistic::Percentile75th,
        Statistic::StdDev,
    ];

    /// Column heading used in rendered reports.
    pub fn name(self) -> &'static str {
        match self {
            Statistic::RowCount => "count",
            Statistic::NullCount => "null",
            Statistic::NullPercent => "%null",
            Statistic::UniqueCount => "unique",
            Statistic::UniquePercent => "%unique",
            Statistic::MostCommon => "most_common",
            Statistic::MostCommonPercent => "%most_common",
            Statistic::Largest => "largest",
            Statistic::Smallest => "smallest",
            Statistic::Longest => "longest",
            Statistic::Shortest => "shortest",
            Statistic::Mean => "mean",
            Statistic::Percentile25th => "percentile_25th",
            Statistic::Median => "median",
            Statistic::Percentile75th => "percentile_75th",
            Statistic::StdDev => "stddev",
        }
    }

    pub fn is_count(self) -> bool {
        matches!(
            self,
            Statistic::RowCount | Statistic::NullCount | Statistic::UniqueCount
        )
    }

    pub fn is_percent(self) -> bool {
        matches!(
            self,
            Statistic::NullPercent | Statistic::UniquePercent | Statistic::MostCommonPercent
        )
    }
}

/// One column's statistics. Fields that do not apply are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub label: String,
    pub column_type: ColumnType,
    pub row_count: usize,
    pub null_count: usize,
    pub null_percent: f64,
    pub unique_count: usize,
    pub unique_percent: f64,
    pub most_common: Option<Value>,
    pub most_common_percent: Option<f64>,
    pub largest: Option<Value>,
    pub smallest: Option<Value>,
    pub longest: Option<String>,
    pub shortest: Option<String>,
    pub mean: Option<Value>,
    pub percentile_25th: Option<Value>,
    pub median: Option<Value>,
    pub percentile_75th: Option<Value>,
    pub stddev: Option<Value>,
}

impl SummaryRow {
    fn base(
        column: &TypedColumn,
        row_count: usize,
        null_count: usize,
        unique_count: usize,
    ) -> Self {
        Self {
            label: column.label().to_string(),
            column_type: column.column_type(),
            row_count,
            null_count,
            null_percent: percent(null_count, row_count),
            unique_count,
            unique_percent: percent(unique_count, row_count),
            most_common: None,
            most_common_percent: None,
            largest: None,
            smallest: None,
            longest: None,
            shortest: None,
            mean: None,
            percentile_25th: None,
            median: None,
            percentile_75th: None,
            stddev: None,
        }
    }

    pub fn non_null_count(&self) -> usize {
        self.row_count - self.null_count
    }

    pub fn is_all_null(&self) -> bool {
        self.null_count == self.row_count
    }

    /// Look up a statistic by name; counts are integers, percentages floats.
    pub fn get(&self, statistic: Statistic) -> Option<Value> {
        match statistic {
            Statistic::RowCount => Some(count_value(self.row_count)),
            Statistic::NullCount => Some(count_value(self.null_count)),
            Statistic::NullPercent => Some(Value::Float(self.null_percent)),
            Statistic::UniqueCount => Some(count_value(self.unique_count)),
            Statistic::UniquePercent => Some(Value::Float(self.unique_percent)),
            Statistic::MostCommon => self.most_common.clone(),
            Statistic::MostCommonPercent => self.most_common_percent.map(Value::Float),
            Statistic::Largest => self.largest.clone(),
            Statistic::Smallest => self.smallest.clone(),
            Statistic::Longest => self.longest.clone().map(Value::Text),
            Statistic::Shortest => self.shortest.clone().map(Value::Text),
            Statistic::Mean => self.mean.clone(),
            Statistic::Percentile25th => self.percentile_25th.clone(),
            Statistic::Median => self.median.clone(),
            Statistic::Percentile75th => self.percentile_75th.clone(),
            Statistic::StdDev => self.stddev.clone(),
        }
    }
}

fn count_value(count: usize) -> Value {
    Value::Integer(i64::try_from(count).unwrap_or(i64::MAX))
}

pub(crate) fn percent(part: usize, whole: usize) -> f64 {
    100.0 * part as f64 / whole as f64
}

/// Compute the summary row for an inferred column from its value counts.
///
/// A column with no rows is rejected; an all-null column only gets the
/// count and uniqueness fields.
pub fn compute(column: &TypedColumn, distribution: &Distribution) -> Result<SummaryRow> {
    let row_count = column.row_count();
    if row_count == 0 {
        return Err(ProfileError::invalid_input(format!(
            "column '{}' has no rows",
            column.label()
        )));
    }

    let null_count = column.null_count();
    let mut row = SummaryRow::base(column, row_count, null_count, distribution.distinct());

    if column.is_all_null() {
        warn!(column = column.label(), "Column is entirely null");
        return Ok(row);
    }

    if let Some(mode) = distribution.mode() {
        row.most_common = mode.value.clone();
        row.most_common_percent = Some(percent(mode.count, row_count));
    }

    let series = column.series();
    match column.column_type() {
        ColumnType::String => fill_text(&mut row, series)?,
        ColumnType::Integer => {
            let values = series.i64()?;
            row.largest = values.max().map(Value::Integer);
            row.smallest = values.min().map(Value::Integer);
            fill_moments(&mut row, series, float_value, float_value)?;
        }
        ColumnType::Float => {
            let values = series.f64()?;
            row.largest = values.max().map(Value::Float);
            row.smallest = values.min().map(Value::Float);
            fill_moments(&mut row, series, float_value, float_value)?;
        }
        ColumnType::Date => {
            let micros = series.to_physical_repr();
            let values = micros.i64()?;
            row.largest = values.max().and_then(Value::from_timestamp_micros);
            row.smallest = values.min().and_then(Value::from_timestamp_micros);
            // Dates are averaged on the microsecond timeline, exact below 2^53.
            fill_moments(&mut row, &micros, date_from_micros, stddev_as_duration)?;
        }
    }

    Ok(row)
}

fn fill_text(row: &mut SummaryRow, series: &Series) -> Result<()> {
    row.largest = series.max_reduce()?.value().get_str().map(Value::from);
    row.smallest = series.min_reduce()?.value().get_str().map(Value::from);

    // Strict comparisons keep the first value of a tied length.
    let mut longest: Option<(&str, usize)> = None;
    let mut shortest: Option<(&str, usize)> = None;
    for value in series.str()?.iter().flatten() {
        let length = value.chars().count();
        if longest.is_none_or(|(_, best)| length > best) {
            longest = Some((value, length));
        }
        if shortest.is_none_or(|(_, best)| length < best) {
            shortest = Some((value, length));
        }
    }
    row.longest = longest.map(|(s, _)| s.to_string());
    row.shortest = shortest.map(|(s, _)| s.to_string());
    Ok(())
}

/// Mean, linear quartiles and N-1 standard deviation of a numeric series.
///
/// The series is the physical representation: integers, floats or
/// microseconds since the epoch. The standard deviation needs two values.
fn fill_moments(
    row: &mut SummaryRow,
    series: &Series,
    to_value: impl Fn(f64) -> Option<Value>,
    to_stddev: impl Fn(f64) -> Option<Value>,
) -> Result<()> {
    let numbers = series.cast(&DataType::Float64)?;
    let numbers = numbers.f64()?;
    let quartile = |q: f64| -> Result<Option<Value>> {
        Ok(numbers
            .quantile(q, QuantileMethod::Linear)?
            .and_then(&to_value))
    };

    row.mean = numbers.mean().and_then(&to_value);
    row.percentile_25th = quartile(0.25)?;
    row.median = quartile(0.5)?;
    row.percentile_75th = quartile(0.75)?;
    if row.non_null_count() >= 2 {
        row.stddev = numbers
            .std(1)
            .filter(|v| v.is_finite())
            .and_then(to_stddev);
    }
    Ok(())
}

fn float_value(value: f64) -> Option<Value> {
    Some(Value::Float(value))
}

fn date_from_micros(micros: f64) -> Option<Value> {
    Value::from_timestamp_micros(micros.round() as i64)
}

fn stddev_as_duration(micros: f64) -> Option<Value> {
    Some(Value::Duration(TimeDelta::microseconds(micros.round() as i64)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::infer::infer;
    use chrono::{NaiveDate, NaiveDateTime};
    use proptest::prelude::*;

    fn summarize_column(column: Column) -> Result<SummaryRow> {
        let typed = infer(&column);
        let distribution = Distribution::of(&typed)?;
        compute(&typed, &distribution)
    }

    fn summarize(cells: &[Option<&str>]) -> SummaryRow {
        summarize_column(Column::new("test", cells.iter().copied())).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn assert_close(actual: Option<Value>, expected: f64) {
        let actual = actual.and_then(|v| v.as_f64()).expect("numeric statistic");
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_integer_scenario_with_null() {
        let row = summarize(&[Some("1"), Some("2"), Some("2"), Some("3"), None]);
        assert_eq!(row.column_type, ColumnType::Integer);
        assert_eq!(row.row_count, 5);
        assert_eq!(row.null_count, 1);
        assert_eq!(row.null_percent, 20.0);
        assert_eq!(row.unique_count, 4);
        assert_eq!(row.unique_percent, 80.0);
        assert_eq!(row.most_common, Some(Value::Integer(2)));
        assert_eq!(row.most_common_percent, Some(40.0));
        assert_eq!(row.largest, Some(Value::Integer(3)));
        assert_eq!(row.smallest, Some(Value::Integer(1)));
        assert_close(row.mean.clone(), 2.0);
        assert_close(row.percentile_25th.clone(), 1.75);
        assert_close(row.median.clone(), 2.0);
        assert_close(row.percentile_75th.clone(), 2.25);
        assert_close(row.stddev.clone(), (2.0f64 / 3.0).sqrt());
        assert_eq!(row.longest, None);
        assert_eq!(row.shortest, None);
    }

    #[test]
    fn test_interpolated_quartiles() {
        let row = summarize(&[Some("4"), Some("1"), Some("3"), Some("2")]);
        assert_close(row.percentile_25th.clone(), 1.75);
        assert_close(row.median.clone(), 2.5);
        assert_close(row.percentile_75th.clone(), 3.25);
        assert_close(row.stddev.clone(), 1.290_994_448_735_805_6);
    }

    #[test]
    fn test_all_null_column() {
        let row = summarize(&[None, None, None]);
        assert_eq!(row.row_count, 3);
        assert_eq!(row.null_count, 3);
        assert_eq!(row.null_percent, 100.0);
        assert_eq!(row.unique_count, 1);
        assert!(row.is_all_null());
        for statistic in &Statistic::ALL[5..] {
            assert_eq!(row.get(*statistic), None, "{} should be absent", statistic.name());
        }
    }

    #[test]
    fn test_string_column() {
        let row = summarize(&[Some("b"), Some("a"), Some("ccc")]);
        assert_eq!(row.column_type, ColumnType::String);
        assert_eq!(row.largest, Some(Value::from("ccc")));
        assert_eq!(row.smallest, Some(Value::from("a")));
        assert_eq!(row.longest.as_deref(), Some("ccc"));
        // First value of the shortest length wins.
        assert_eq!(row.shortest.as_deref(), Some("b"));
        let reordered = summarize(&[Some("a"), Some("b"), Some("ccc")]);
        assert_eq!(reordered.shortest.as_deref(), Some("a"));
        assert_eq!(row.mean, None);
        assert_eq!(row.median, None);
        assert_eq!(row.stddev, None);
    }

    #[test]
    fn test_string_length_counts_characters() {
        let row = summarize(&[Some("ééé"), Some("abcd"), Some("xy")]);
        assert_eq!(row.longest.as_deref(), Some("abcd"));
        assert_eq!(row.shortest.as_deref(), Some("xy"));
    }

    #[test]
    fn test_mode_tie_breaks_on_smallest_value() {
        let row = summarize(&[Some("pear"), Some("apple"), Some("pear"), Some("apple")]);
        assert_eq!(row.most_common, Some(Value::from("apple")));
        assert_eq!(row.most_common_percent, Some(50.0));
    }

    #[test]
    fn test_mode_ignores_null_category() {
        let row = summarize(&[None, None, None, Some("x"), Some("y"), Some("y")]);
        assert_eq!(row.most_common, Some(Value::from("y")));
        assert_eq!(row.unique_count, 3);
    }

    #[test]
    fn test_float_column() {
        let row = summarize(&[Some("1.5"), Some("-0.5"), Some("2.0")]);
        assert_eq!(row.column_type, ColumnType::Float);
        assert_eq!(row.largest, Some(Value::Float(2.0)));
        assert_eq!(row.smallest, Some(Value::Float(-0.5)));
        assert_close(row.mean.clone(), 1.0);
        assert_close(row.median.clone(), 1.5);
    }

    #[test]
    fn test_date_column() {
        let row = summarize(&[Some("2024-01-01"), Some("2024-01-03"), None]);
        assert_eq!(row.column_type, ColumnType::Date);
        assert_eq!(row.smallest, Some(Value::Date(date(2024, 1, 1))));
        assert_eq!(row.largest, Some(Value::Date(date(2024, 1, 3))));
        assert_eq!(row.mean, Some(Value::Date(date(2024, 1, 2))));
        assert_eq!(row.median, Some(Value::Date(date(2024, 1, 2))));
        let expected = (2.0f64.sqrt() * 86_400_000_000.0).round() as i64;
        let Some(Value::Duration(stddev)) = row.stddev else {
            panic!("date stddev should be a duration, got {:?}", row.stddev);
        };
        assert!((stddev.num_microseconds().unwrap() - expected).abs() <= 1);
    }

    #[test]
    fn test_signed_zeros_are_one_value() {
        let row = summarize(&[Some("0.0"), Some("-0.0"), Some("1.5")]);
        assert_eq!(row.unique_count, 2);
        assert_eq!(row.most_common, Some(Value::Float(0.0)));
        assert_eq!(row.smallest, Some(Value::Float(0.0)));
        assert_close(row.most_common_percent.map(Value::Float), 100.0 * 2.0 / 3.0);
    }

    #[test]
    fn test_single_value_has_no_stddev() {
        let row = summarize(&[Some("7"), None]);
        assert_close(row.mean.clone(), 7.0);
        assert_close(row.median.clone(), 7.0);
        assert_eq!(row.stddev, None);
    }

    #[test]
    fn test_zero_rows_is_invalid_input() {
        let err = summarize_column(Column::new("empty", Vec::<Option<String>>::new())).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_statistic_names_in_report_order() {
        let names: Vec<_> = Statistic::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec![
                "count",
                "null",
                "%null",
                "unique",
                "%unique",
                "most_common",
                "%most_common",
                "largest",
                "smallest",
                "longest",
                "shortest",
                "mean",
                "percentile_25th",
                "median",
                "percentile_75th",
                "stddev",
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_counts_are_consistent(
            cells in prop::collection::vec(prop::option::of(-50i64..50), 1..80),
        ) {
            let text: Vec<Option<String>> =
                cells.iter().map(|c| c.map(|v| v.to_string())).collect();
            let row = summarize_column(Column::new("p", text)).unwrap();
            let non_null = cells.iter().filter(|c| c.is_some()).count();
            prop_assert_eq!(row.null_count + non_null, row.row_count);
            prop_assert!((0.0..=100.0).contains(&row.null_percent));
            prop_assert!(row.unique_count <= row.row_count);
        }

        #[test]
        fn prop_quartiles_are_ordered(
            values in prop::collection::vec(-1.0e6f64..1.0e6, 1..60),
        ) {
            let text: Vec<Option<String>> =
                values.iter().map(|v| Some(format!("{v:.3}"))).collect();
            let row = summarize_column(Column::new("p", text)).unwrap();
            let stats: Vec<f64> = [
                &row.smallest,
                &row.percentile_25th,
                &row.median,
                &row.percentile_75th,
                &row.largest,
            ]
            .iter()
            .map(|v| v.as_ref().and_then(Value::as_f64).unwrap())
            .collect();
            prop_assert!(stats.windows(2).all(|pair| pair[0] <= pair[1]), "{:?}", stats);
        }

        #[test]
        fn prop_longest_is_at_least_every_length(
            words in prop::collection::vec("[a-z]{0,8}x", 1..40),
        ) {
            let column = Column::new("p", words.iter().map(|w| Some(w.as_str())));
            let row = summarize_column(column).unwrap();
            let longest = row.longest.unwrap();
            let length = longest.chars().count();
            prop_assert!(words.iter().all(|w| w.chars().count() <= length));
            let first = words.iter().find(|w| w.chars().count() == length).unwrap();
            prop_assert_eq!(&longest, first);
        }
    }
}
