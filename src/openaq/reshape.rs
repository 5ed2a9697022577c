//! Pivots long measurement rows (one row per location, parameter and timestamp) into a
//! wide table with one row per `(date, location, city, country)` and one column per
//! parameter.

use crate::types::measurement::Measurement;
use crate::types::parameter::Parameter;
use log::warn;
use polars::prelude::*;
use std::collections::{HashMap, HashSet};

/// Columns that together identify a row of the wide table.
pub const KEY_COLUMNS: [&str; 4] = ["date", "location", "city", "country"];

/// Wide air-quality table.
///
/// The `date` column is a timezone-naive UTC datetime, `location`/`city`/`country` are
/// strings (city and country may be null), and there is one `f64` column per parameter
/// that produced at least one measurement. Rows are unique per key and sorted by it.
#[derive(Debug, Clone)]
pub struct MeasurementTable {
    frame: DataFrame,
    parameters: Vec<Parameter>,
}

impl MeasurementTable {
    pub fn empty() -> Self {
        Self {
            frame: DataFrame::empty(),
            parameters: Vec::new(),
        }
    }

    /// Builds the table from validated measurements.
    ///
    /// Parameter columns follow the order of `requested`; parameters that appear in
    /// `rows` but not in `requested` are appended. Rows that share a key and parameter
    /// are averaged, and the number of such collisions is logged.
    pub fn from_measurements(
        rows: &[Measurement],
        requested: &[Parameter],
    ) -> PolarsResult<Self> {
        if rows.is_empty() {
            return Ok(Self::empty());
        }

        let present: HashSet<Parameter> = rows.iter().map(|m| m.parameter).collect();
        let mut parameters: Vec<Parameter> = Vec::new();
        for p in requested.iter().chain(Parameter::ALL.iter()) {
            if present.contains(p) && !parameters.contains(p) {
                parameters.push(*p);
            }
        }

        let collisions = count_collisions(rows);
        if collisions > 0 {
            warn!(
                "{} measurement rows share a (date, location, city, country, parameter) key with another row; their values are averaged",
                collisions
            );
        }

        Self::from_long_frame(long_frame(rows)?, &parameters)
    }

    /// Pivots a long frame with columns `date, location, city, country, parameter, value`.
    /// Parameters with no rows in the frame are dropped.
    pub fn from_long_frame(long: DataFrame, parameters: &[Parameter]) -> PolarsResult<Self> {
        if long.height() == 0 {
            return Ok(Self::empty());
        }

        let present: HashSet<String> = long
            .column("parameter")?
            .str()?
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        let parameters: Vec<Parameter> = parameters
            .iter()
            .copied()
            .filter(|p| present.contains(p.as_str()))
            .collect();
        if parameters.is_empty() {
            return Ok(Self::empty());
        }

        let keys: Vec<Expr> = KEY_COLUMNS.iter().map(|c| col(*c)).collect();
        let value_columns: Vec<Expr> = parameters
            .iter()
            .map(|p| {
                col("value")
                    .filter(col("parameter").eq(lit(p.as_str())))
                    .mean()
                    .alias(p.as_str())
            })
            .collect();

        let frame = long
            .lazy()
            .group_by(keys.clone())
            .agg(value_columns)
            .sort_by_exprs(keys, SortMultipleOptions::default().with_nulls_last(true))
            .collect()?;

        Ok(Self { frame, parameters })
    }

    /// Unpivots the table back to long form, dropping empty cells.
    pub fn to_long_frame(&self) -> PolarsResult<DataFrame> {
        if self.parameters.is_empty() {
            return Ok(DataFrame::empty());
        }

        let parts: Vec<LazyFrame> = self
            .parameters
            .iter()
            .map(|p| {
                let mut columns: Vec<Expr> = KEY_COLUMNS.iter().map(|c| col(*c)).collect();
                columns.push(lit(p.as_str()).alias("parameter"));
                columns.push(col(p.as_str()).alias("value"));
                self.frame
                    .clone()
                    .lazy()
                    .select(columns)
                    .filter(col("value").is_not_null())
            })
            .collect();

        concat(parts, UnionArgs::default())?.collect()
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// The cell of `parameter` in row `row`, if both exist and the cell is not null.
    pub fn value(&self, row: usize, parameter: Parameter) -> Option<f64> {
        self.frame
            .column(parameter.as_str())
            .ok()?
            .f64()
            .ok()?
            .get(row)
    }
}

/// Long frame of raw rows; timestamps become a naive-UTC millisecond datetime column.
fn long_frame(rows: &[Measurement]) -> PolarsResult<DataFrame> {
    let df = df!(
        "date" => rows.iter().map(|m| m.timestamp.timestamp_millis()).collect::<Vec<i64>>(),
        "location" => rows.iter().map(|m| m.location.as_str()).collect::<Vec<_>>(),
        "city" => rows.iter().map(|m| m.city.as_deref()).collect::<Vec<_>>(),
        "country" => rows.iter().map(|m| m.country.as_deref()).collect::<Vec<_>>(),
        "parameter" => rows.iter().map(|m| m.parameter.as_str()).collect::<Vec<_>>(),
        "value" => rows.iter().map(|m| m.value).collect::<Vec<f64>>(),
        "unit" => rows.iter().map(|m| m.unit.as_str()).collect::<Vec<_>>(),
    )?;

    df.lazy()
        .with_column(col("date").cast(DataType::Datetime(TimeUnit::Milliseconds, None)))
        .collect()
}

/// Number of rows beyond the first for every (key, parameter) combination.
fn count_collisions(rows: &[Measurement]) -> usize {
    let mut seen: HashMap<(i64, &str, Option<&str>, Option<&str>, Parameter), usize> =
        HashMap::new();
    for m in rows {
        let key = (
            m.timestamp.timestamp_millis(),
            m.location.as_str(),
            m.city.as_deref(),
            m.country.as_deref(),
            m.parameter,
        );
        *seen.entry(key).or_default() += 1;
    }
    seen.values().map(|n| n - 1).sum()
}
