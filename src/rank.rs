//! Value-frequency tables.
//!
//! The full distribution is ordered once, most frequent first, with ties
//! broken by value (smallest first) and the null category placed after
//! every value of the same count. The descending view is the head of that
//! order; the ascending view is the head of its reverse, so a value carries
//! the same rank in both views.

use polars::prelude::{SeriesMethods, SortMultipleOptions};

use crate::column::{TypedColumn, values_of};
use crate::error::Result;
use crate::stats::percent;
use crate::value::Value;

const VALUE: &str = "value";
const COUNT: &str = "count";

/// How often one value (or the null category) occurs in a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frequency {
    pub value: Option<Value>,
    pub count: usize,
}

/// Every distinct value of a column with its count, most frequent first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    entries: Vec<Frequency>,
    total: usize,
}

impl Distribution {
    pub fn of(column: &TypedColumn) -> Result<Self> {
        let values = column.series().clone().with_name(VALUE.into());
        let counts = values
            .value_counts(false, false, COUNT.into(), false)?
            .sort(
                vec![COUNT, VALUE],
                SortMultipleOptions::default()
                    .with_order_descending_multi([true, false])
                    .with_nulls_last(true)
                    .with_maintain_order(true),
            )?;

        let distinct = values_of(
            counts.column(VALUE)?.as_materialized_series(),
            column.column_type(),
        )?;
        let tallies = counts.column(COUNT)?.as_materialized_series().idx()?;
        let entries = distinct
            .into_iter()
            .zip(tallies.iter())
            .map(|(value, count)| Frequency {
                value,
                count: count.unwrap_or_default() as usize,
            })
            .collect();

        Ok(Self {
            entries,
            total: column.row_count(),
        })
    }

    /// Entries in descending frequency order.
    pub fn entries(&self) -> &[Frequency] {
        &self.entries
    }

    pub fn distinct(&self) -> usize {
        self.entries.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// True when the only category is null, or there are no rows.
    pub fn is_all_null(&self) -> bool {
        self.entries.iter().all(|entry| entry.value.is_none())
    }

    /// The most frequent non-null value.
    pub fn mode(&self) -> Option<&Frequency> {
        self.entries.iter().find(|entry| entry.value.is_some())
    }

    pub fn percent_of_total(&self, count: usize) -> f64 {
        percent(count, self.total)
    }
}

/// One row of a detail table; `value` is `None` for the null category.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedValue {
    pub rank: usize,
    pub value: Option<Value>,
    pub percent_of_total: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailTable {
    entries: Vec<RankedValue>,
}

impl DetailTable {
    pub fn entries(&self) -> &[RankedValue] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> Option<&RankedValue> {
        self.entries.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RankedValue> {
        self.entries.iter()
    }
}

impl FromIterator<RankedValue> for DetailTable {
    fn from_iter<I: IntoIterator<Item = RankedValue>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Most-frequent-first and least-frequent-first views of one column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailPair {
    pub descending: DetailTable,
    pub ascending: DetailTable,
}

/// Build both detail tables from `distribution`, each at most `max_values` long.
///
/// An all-null column yields two empty tables.
pub fn rank(distribution: &Distribution, max_values: usize) -> DetailPair {
    if distribution.is_all_null() {
        return DetailPair::default();
    }

    let distinct = distribution.distinct();
    let length = max_values.min(distinct);
    let ranked = |position: usize, entry: &Frequency| RankedValue {
        rank: position + 1,
        value: entry.value.clone(),
        percent_of_total: distribution.percent_of_total(entry.count),
    };

    let descending = distribution
        .entries()
        .iter()
        .enumerate()
        .take(length)
        .map(|(position, entry)| ranked(position, entry))
        .collect();
    let ascending = distribution
        .entries()
        .iter()
        .enumerate()
        .rev()
        .take(length)
        .map(|(position, entry)| ranked(position, entry))
        .collect();

    DetailPair {
        descending,
        ascending,
    }
}
