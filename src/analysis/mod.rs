//! The five analyses over the transaction table.
//!
//! Each analysis is a function from an immutable [`TransactionTable`] to a
//! report. Reports print themselves through `Display` and describe their
//! charts as [`ChartSpec`]s; nothing in here renders.

pub mod frequency;
pub mod loyalty;
pub mod seasonal;
pub mod segmentation;
pub mod shipping;

use crate::chart::ChartSpec;
use crate::cli::Task;
use crate::data::TransactionTable;
use crate::error::DataResult;
use polars::prelude::*;
use std::fmt;
use tracing::debug;

pub use frequency::{product_frequency, FrequencyReport, ProductFrequency};
pub use loyalty::{age_loyalty, AgeGroupMean, AgeLoyaltyReport};
pub use seasonal::{seasonal_trends, MonthCount, ProductYears, Season, SeasonShare, SeasonalReport, YearCount};
pub use segmentation::{spend_segments, SegmentCounts, SpendSegmentReport};
pub use shipping::{shipping_mix, ProductShipping, ShippingMixReport, ShippingShare};

/// Name of the count column produced by [`count_by`] and [`mean_by`]
pub(crate) const COUNT: &str = "count";
/// Name of the mean column produced by [`mean_by`]
pub(crate) const MEAN: &str = "mean";

/// Output of one analysis
pub trait Report: fmt::Display {
    /// Charts describing the report, in display order
    fn charts(&self) -> Vec<ChartSpec>;
}

/// Caller-supplied knobs for a run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Product for the seasonal yearly breakdown, instead of the first row's
    pub product: Option<String>,
}

/// Run the selected analysis on its own cleaned copy of `table`
pub fn run(task: Task, table: &TransactionTable, options: &RunOptions) -> DataResult<Box<dyn Report>> {
    debug!(?task, rows = table.height(), "running analysis");
    let report: Box<dyn Report> = match task {
        Task::Shipping => Box::new(shipping_mix(table)?),
        Task::Segments => Box::new(spend_segments(table)?),
        Task::Frequency => Box::new(product_frequency(table)?),
        Task::Seasonal => Box::new(seasonal_trends(table, options.product.as_deref())?),
        Task::Loyalty => Box::new(age_loyalty(table)?),
    };
    Ok(report)
}

/// Number of rows per distinct combination of `keys`
pub(crate) fn count_by(frame: &DataFrame, keys: &[&str]) -> DataResult<DataFrame> {
    let keys: Vec<Expr> = keys.iter().map(|key| col(*key)).collect();
    Ok(frame
        .clone()
        .lazy()
        .group_by(keys)
        .agg([len().alias(COUNT)])
        .collect()?)
}

/// Mean of `value` and row count per distinct combination of `keys`
pub(crate) fn mean_by(frame: &DataFrame, keys: &[&str], value: &str) -> DataResult<DataFrame> {
    let keys: Vec<Expr> = keys.iter().map(|key| col(*key)).collect();
    Ok(frame
        .clone()
        .lazy()
        .group_by(keys)
        .agg([col(value).mean().alias(MEAN), len().alias(COUNT)])
        .collect()?)
}

pub(crate) fn text_column(frame: &DataFrame, name: &str) -> DataResult<Vec<String>> {
    Ok(frame
        .column(name)?
        .str()?
        .into_no_null_iter()
        .map(str::to_owned)
        .collect())
}

pub(crate) fn int_column(frame: &DataFrame, name: &str) -> DataResult<Vec<i64>> {
    let column = frame.column(name)?.cast(&DataType::Int64)?;
    Ok(column.i64()?.into_no_null_iter().collect())
}

pub(crate) fn count_column(frame: &DataFrame) -> DataResult<Vec<u64>> {
    let column = frame.column(COUNT)?.cast(&DataType::UInt64)?;
    Ok(column.u64()?.into_no_null_iter().collect())
}

pub(crate) fn mean_column(frame: &DataFrame) -> DataResult<Vec<f64>> {
    let column = frame.column(MEAN)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_no_null_iter().collect())
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Share of `count` in `total` as a percentage
pub(crate) fn percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_by() {
        let frame = df!(
            "product" => &["Shoes", "Shoes", "Hat"],
            "shipping" => &["Express", "Express", "Standard"]
        )
        .unwrap();

        let grouped = count_by(&frame, &["product", "shipping"]).unwrap();
        let mut rows: Vec<(String, u64)> = text_column(&grouped, "product")
            .unwrap()
            .into_iter()
            .zip(count_column(&grouped).unwrap())
            .collect();
        rows.sort();
        assert_eq!(rows, vec![("Hat".to_string(), 1), ("Shoes".to_string(), 2)]);
    }

    #[test]
    fn test_mean_by() {
        let frame = df!(
            "age" => &[20i64, 20, 30],
            "purchases" => &[1i64, 3, 10]
        )
        .unwrap();

        let grouped = mean_by(&frame, &["age"], "purchases").unwrap();
        let ages = int_column(&grouped, "age").unwrap();
        let means = mean_column(&grouped).unwrap();
        let counts = count_column(&grouped).unwrap();

        let mut rows: Vec<(i64, f64, u64)> = ages
            .into_iter()
            .zip(means)
            .zip(counts)
            .map(|((age, mean), count)| (age, mean, count))
            .collect();
        rows.sort_by_key(|row| row.0);
        assert_eq!(rows, vec![(20, 2.0, 2), (30, 10.0, 1)]);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(66.666, 0), 67.0);
        assert_eq!(round_to(2.345_6, 2), 2.35);
        assert_eq!(round_to(0.5, 0), 1.0);
    }

    #[test]
    fn test_percent_of_empty_total() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 4), 25.0);
    }
}
