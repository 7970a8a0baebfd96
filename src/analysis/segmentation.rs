//! Customer segmentation by total spend value, split by gender

use super::{count_by, count_column, int_column, text_column, Report};
use crate::chart::{ChartSpec, DataSeries};
use crate::data::{Field, Gender, TransactionTable};
use crate::error::DataResult;
use polars::prelude::*;
use std::fmt;
use tracing::debug;

/// Fields a row needs to be segmented
pub const REQUIRED: [Field; 3] = [Field::Gender, Field::Amount, Field::PreviousPurchases];

/// Width of each spend segment in currency units
pub const SEGMENT_WIDTH: f64 = 500.0;
/// Number of segments; together they cover `[0, 6000]`
pub const SEGMENT_COUNT: usize = 12;
/// Upper bound of the last segment, inclusive
pub const SEGMENT_CEILING: f64 = SEGMENT_WIDTH * SEGMENT_COUNT as f64;

const GENDER_KEY: &str = "gender";
const SEGMENT_KEY: &str = "segment";

/// Purchase amount times previous-purchase count
pub fn total_value(amount: f64, previous_purchases: i64) -> f64 {
    amount * previous_purchases as f64
}

/// Segment index of a total value.
///
/// Segment `i` covers `[i*500, (i+1)*500)`; the last one also includes 6000.
/// Values outside `[0, 6000]` are unsegmented.
pub fn segment_index(total: f64) -> Option<usize> {
    if !(0.0..=SEGMENT_CEILING).contains(&total) {
        return None;
    }
    Some(((total / SEGMENT_WIDTH).floor() as usize).min(SEGMENT_COUNT - 1))
}

/// Label such as `"500-1000"`
pub fn segment_label(index: usize) -> String {
    let lower = index as u64 * SEGMENT_WIDTH as u64;
    format!("{}-{}", lower, lower + SEGMENT_WIDTH as u64)
}

/// Row counts of one segment per gender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentCounts {
    pub label: String,
    pub female: u64,
    pub male: u64,
}

impl SegmentCounts {
    pub fn count(&self, gender: Gender) -> u64 {
        match gender {
            Gender::Female => self.female,
            Gender::Male => self.male,
        }
    }

    pub fn total(&self) -> u64 {
        self.female + self.male
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendSegmentReport {
    /// Every segment, lowest boundary first
    pub segments: Vec<SegmentCounts>,
    /// Rows left out: total value outside `[0, 6000]` or unrecognised gender
    pub excluded: usize,
}

impl SpendSegmentReport {
    pub fn segment(&self, label: &str) -> Option<&SegmentCounts> {
        self.segments.iter().find(|s| s.label == label)
    }
}

/// Cross-tabulate spend segment against gender
pub fn spend_segments(table: &TransactionTable) -> DataResult<SpendSegmentReport> {
    let table = table.clean(&REQUIRED)?;
    let genders = table.labels(Field::Gender)?;
    let amounts = table.decimals(Field::Amount)?;
    let purchases = table.whole_numbers(Field::PreviousPurchases)?;

    let mut gender_keys = Vec::with_capacity(genders.len());
    let mut segment_keys = Vec::with_capacity(genders.len());
    let mut excluded = 0;
    for ((gender, amount), previous) in genders.iter().zip(amounts).zip(purchases) {
        let segment = segment_index(total_value(amount, previous));
        match (Gender::from_label(gender), segment) {
            (Some(gender), Some(segment)) => {
                gender_keys.push(gender.as_str());
                segment_keys.push(segment as i64);
            }
            _ => excluded += 1,
        }
    }
    if excluded > 0 {
        debug!(excluded, "rows left unsegmented");
    }

    let frame = df!(GENDER_KEY => gender_keys, SEGMENT_KEY => segment_keys)?;
    let grouped = count_by(&frame, &[SEGMENT_KEY, GENDER_KEY])?;

    let mut segments: Vec<SegmentCounts> = (0..SEGMENT_COUNT)
        .map(|index| SegmentCounts {
            label: segment_label(index),
            female: 0,
            male: 0,
        })
        .collect();

    let keys = int_column(&grouped, SEGMENT_KEY)?;
    let genders = text_column(&grouped, GENDER_KEY)?;
    let counts = count_column(&grouped)?;
    for ((segment, gender), count) in keys.into_iter().zip(genders).zip(counts) {
        let Some(counts) = segments.get_mut(segment as usize) else {
            continue;
        };
        match Gender::from_label(&gender) {
            Some(Gender::Female) => counts.female = count,
            Some(Gender::Male) => counts.male = count,
            None => {}
        }
    }

    Ok(SpendSegmentReport { segments, excluded })
}

impl fmt::Display for SpendSegmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Customer Segments by Total Spend Value ===")?;
        writeln!(f, "  {:>10} | {:>7} | {:>7}", "Segment", "Female", "Male")?;
        writeln!(f, "  {:-<10}-+-{:-<7}-+-{:-<7}", "", "", "")?;
        for segment in &self.segments {
            writeln!(
                f,
                "  {:>10} | {:>7} | {:>7}",
                segment.label, segment.female, segment.male
            )?;
        }
        if self.excluded > 0 {
            writeln!(f, "\n{} rows outside the segmented range", self.excluded)?;
        }
        Ok(())
    }
}

impl Report for SpendSegmentReport {
    fn charts(&self) -> Vec<ChartSpec> {
        let categories = self.segments.iter().map(|s| s.label.clone()).collect();
        let chart = Gender::ALL.into_iter().fold(
            ChartSpec::grouped_bar("spend_segments", "Customer Segments by Gender", categories)
                .with_axes("Total value segment (USD)", "Customers"),
            |chart, gender| {
                let values = self.segments.iter().map(|s| s.count(gender) as f64).collect();
                chart.with_series(DataSeries::new(gender.as_str(), values))
            },
        );
        vec![chart]
    }
}
