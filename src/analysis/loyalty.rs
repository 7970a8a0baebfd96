//! Loyalty (mean previous purchases) per decade age group

use super::{count_column, int_column, mean_by, mean_column, round_to, Report};
use crate::chart::ChartSpec;
use crate::data::{Field, TransactionTable};
use crate::error::DataResult;
use polars::prelude::*;
use std::fmt;

/// Fields a row needs to be grouped by age
pub const REQUIRED: [Field; 2] = [Field::Age, Field::PreviousPurchases];

/// Number of groups in the top list
pub const TOP_GROUPS: usize = 5;

const GROUP_KEY: &str = "age_group";

/// Lower bound of the decade containing `age`
pub fn age_group(age: i64) -> i64 {
    age.div_euclid(10) * 10
}

/// Label such as `"30-40"`
pub fn age_group_label(lower: i64) -> String {
    format!("{}-{}", lower, lower.saturating_add(10))
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgeGroupMean {
    /// Inclusive lower bound of the decade
    pub lower: i64,
    pub label: String,
    /// Mean previous purchases, two decimals
    pub mean: f64,
    pub customers: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgeLoyaltyReport {
    /// Every populated group, youngest first
    pub groups: Vec<AgeGroupMean>,
    /// At most five groups, highest mean first; ties keep age order
    pub top: Vec<AgeGroupMean>,
}

/// Mean previous purchases per age group and the most loyal groups
pub fn age_loyalty(table: &TransactionTable) -> DataResult<AgeLoyaltyReport> {
    let table = table.clean(&REQUIRED)?;
    let groups: Vec<i64> = table
        .whole_numbers(Field::Age)?
        .into_iter()
        .map(age_group)
        .collect();
    let purchases = table.whole_numbers(Field::PreviousPurchases)?;

    let frame = df!(
        GROUP_KEY => groups,
        Field::PreviousPurchases.column() => purchases
    )?;
    let grouped = mean_by(&frame, &[GROUP_KEY], Field::PreviousPurchases.column())?;

    let mut means: Vec<(i64, f64, u64)> = int_column(&grouped, GROUP_KEY)?
        .into_iter()
        .zip(mean_column(&grouped)?)
        .zip(count_column(&grouped)?)
        .map(|((lower, mean), count)| (lower, mean, count))
        .collect();
    means.sort_by_key(|(lower, _, _)| *lower);

    let mut ranked = means.clone();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(TOP_GROUPS);

    let to_group = |(lower, mean, customers): (i64, f64, u64)| AgeGroupMean {
        lower,
        label: age_group_label(lower),
        mean: round_to(mean, 2),
        customers,
    };

    Ok(AgeLoyaltyReport {
        groups: means.into_iter().map(to_group).collect(),
        top: ranked.into_iter().map(to_group).collect(),
    })
}

impl fmt::Display for AgeLoyaltyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Mean Previous Purchases by Age Group ===")?;
        for group in &self.groups {
            writeln!(
                f,
                "  {:>7}: {:>6.2} ({} customers)",
                group.label, group.mean, group.customers
            )?;
        }

        writeln!(f, "\nMost loyal age groups:")?;
        for (rank, group) in self.top.iter().enumerate() {
            writeln!(f, "  {}. {} ({:.2})", rank + 1, group.label, group.mean)?;
        }
        Ok(())
    }
}

impl Report for AgeLoyaltyReport {
    fn charts(&self) -> Vec<ChartSpec> {
        if self.groups.is_empty() {
            return Vec::new();
        }
        vec![ChartSpec::bar(
            "age_loyalty",
            "Mean Previous Purchases by Age Group",
            self.groups.iter().map(|g| g.label.clone()).collect(),
            self.groups.iter().map(|g| g.mean).collect(),
        )
        .with_axes("Age group", "Mean previous purchases")]
    }
}
