//! Per-product purchase frequency: average of per-age means against the plain mean

use super::{mean_by, mean_column, round_to, text_column, Report, MEAN};
use crate::chart::{ChartSpec, DataSeries};
use crate::data::{Field, TransactionTable};
use crate::error::DataResult;
use std::collections::BTreeMap;
use std::fmt;

/// Fields a row needs to take part in the comparison
pub const REQUIRED: [Field; 3] = [Field::Product, Field::Age, Field::PreviousPurchases];

#[derive(Debug, Clone, PartialEq)]
pub struct ProductFrequency {
    pub product: String,
    /// Unweighted mean over ages of each age's mean previous purchases (A)
    pub age_averaged: f64,
    /// Mean previous purchases over all of the product's rows (B)
    pub overall: f64,
}

impl ProductFrequency {
    /// Rare-age buyers purchase more often than typical
    pub fn is_flagged(&self) -> bool {
        self.age_averaged < self.overall
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyReport {
    /// Sorted by product name; values rounded to two decimals
    pub products: Vec<ProductFrequency>,
}

impl FrequencyReport {
    pub fn product(&self, name: &str) -> Option<&ProductFrequency> {
        self.products.iter().find(|p| p.product == name)
    }

    /// Products where the age-averaged mean is below the overall mean
    pub fn flagged(&self) -> Vec<&str> {
        self.products
            .iter()
            .filter(|p| p.is_flagged())
            .map(|p| p.product.as_str())
            .collect()
    }
}

/// Compare the two purchase-frequency averages for every product
pub fn product_frequency(table: &TransactionTable) -> DataResult<FrequencyReport> {
    let table = table.clean(&REQUIRED)?;
    let product = Field::Product.column();
    let purchases = Field::PreviousPurchases.column();

    let per_age = mean_by(table.frame(), &[product, Field::Age.column()], purchases)?;
    let age_averaged = mean_by(&per_age, &[product], MEAN)?;
    let overall = mean_by(table.frame(), &[product], purchases)?;

    let mut values: BTreeMap<String, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for (name, mean) in text_column(&age_averaged, product)?
        .into_iter()
        .zip(mean_column(&age_averaged)?)
    {
        values.entry(name).or_default().0 = Some(mean);
    }
    for (name, mean) in text_column(&overall, product)?
        .into_iter()
        .zip(mean_column(&overall)?)
    {
        values.entry(name).or_default().1 = Some(mean);
    }

    let products = values
        .into_iter()
        .filter_map(|(product, means)| match means {
            (Some(a), Some(b)) => Some(ProductFrequency {
                product,
                age_averaged: round_to(a, 2),
                overall: round_to(b, 2),
            }),
            _ => None,
        })
        .collect();

    Ok(FrequencyReport { products })
}

impl fmt::Display for FrequencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Purchase Frequency per Product ===")?;
        writeln!(f, "  A = average of per-age mean previous purchases")?;
        writeln!(f, "  B = mean previous purchases over all buyers\n")?;
        for product in &self.products {
            writeln!(
                f,
                "  {:<20} A = {:>6.2}  B = {:>6.2}",
                product.product, product.age_averaged, product.overall
            )?;
        }

        let flagged = self.flagged();
        writeln!(f, "\nProducts where A < B:")?;
        if flagged.is_empty() {
            writeln!(f, "  none")?;
        }
        for product in flagged {
            writeln!(f, "  {}", product)?;
        }
        Ok(())
    }
}

impl Report for FrequencyReport {
    fn charts(&self) -> Vec<ChartSpec> {
        if self.products.is_empty() {
            return Vec::new();
        }
        let categories = self.products.iter().map(|p| p.product.clone()).collect();
        let a = self.products.iter().map(|p| p.age_averaged).collect();
        let b = self.products.iter().map(|p| p.overall).collect();

        vec![ChartSpec::grouped_bar(
            "purchase_frequency",
            "Average Previous Purchases per Product",
            categories,
        )
        .with_axes("Product", "Previous purchases")
        .with_series(DataSeries::new("Average of age means (A)", a))
        .with_series(DataSeries::new("Overall mean (B)", b))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn table(rows: &[(&str, i64, i64)]) -> TransactionTable {
        let products: Vec<&str> = rows.iter().map(|r| r.0).collect();
        let ages: Vec<String> = rows.iter().map(|r| r.1.to_string()).collect();
        let purchases: Vec<String> = rows.iter().map(|r| r.2.to_string()).collect();
        let frame = df!(
            "Item Purchased" => products,
            "Age" => ages,
            "Previous Purchases" => purchases
        )
        .unwrap();
        TransactionTable::from_frame(frame).unwrap()
    }

    #[test]
    fn test_rare_age_buyers_are_flagged() {
        // age 20: 1, 1, 1 (mean 1); age 60: 13 (mean 13)
        // A = (1 + 13) / 2 = 7, B = 16 / 4 = 4
        // age 30: 10, 10, 10; age 40: 2
        // A = (10 + 2) / 2 = 6, B = 32 / 4 = 8
        let report = product_frequency(&table(&[
            ("Hat", 20, 1),
            ("Hat", 20, 1),
            ("Hat", 20, 1),
            ("Hat", 60, 13),
            ("Coat", 30, 10),
            ("Coat", 30, 10),
            ("Coat", 30, 10),
            ("Coat", 40, 2),
        ]))
        .unwrap();

        let hat = report.product("Hat").unwrap();
        assert_eq!((hat.age_averaged, hat.overall), (7.0, 4.0));
        let coat = report.product("Coat").unwrap();
        assert_eq!((coat.age_averaged, coat.overall), (6.0, 8.0));
        assert_eq!(report.flagged(), vec!["Coat"]);
    }

    #[test]
    fn test_one_row_per_age_gives_equal_means() {
        let report = product_frequency(&table(&[
            ("Scarf", 21, 3),
            ("Scarf", 35, 17),
            ("Scarf", 48, 9),
            ("Scarf", 66, 40),
        ]))
        .unwrap();

        let scarf = report.product("Scarf").unwrap();
        assert_eq!(scarf.age_averaged, scarf.overall);
        assert!(report.flagged().is_empty());
    }

    #[test]
    fn test_values_rounded_to_two_decimals() {
        let report = product_frequency(&table(&[
            ("Belt", 30, 1),
            ("Belt", 30, 1),
            ("Belt", 30, 2),
        ]))
        .unwrap();

        let belt = report.product("Belt").unwrap();
        assert_eq!(belt.overall, 1.33);
        assert_eq!(belt.age_averaged, 1.33);
    }

    #[test]
    fn test_chart_compares_a_and_b() {
        let report = product_frequency(&table(&[("Belt", 30, 1), ("Hat", 40, 3)])).unwrap();
        let chart = &report.charts()[0];
        assert_eq!(chart.categories, vec!["Belt", "Hat"]);
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[1].values, vec![1.0, 3.0]);
    }
}
