//! Shipping-type mix per product

use super::{count_by, count_column, percent, round_to, text_column, Report};
use crate::chart::{ChartSpec, DataSeries};
use crate::data::{Field, TransactionTable};
use crate::error::DataResult;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Fields a row needs to take part in the shipping mix
pub const REQUIRED: [Field; 2] = [Field::Product, Field::Shipping];

/// One shipping type's share of a product's transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingShare {
    pub shipping_type: String,
    pub count: u64,
    /// Whole percent of the product's transactions
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductShipping {
    pub product: String,
    pub total: u64,
    /// Sorted by percentage, highest first
    pub shares: Vec<ShippingShare>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingMixReport {
    /// Sorted by product name
    pub products: Vec<ProductShipping>,
}

impl ShippingMixReport {
    pub fn product(&self, name: &str) -> Option<&ProductShipping> {
        self.products.iter().find(|p| p.product == name)
    }
}

/// Distribution of shipping types used for each product
pub fn shipping_mix(table: &TransactionTable) -> DataResult<ShippingMixReport> {
    let table = table.clean(&REQUIRED)?;
    let grouped = count_by(
        table.frame(),
        &[Field::Product.column(), Field::Shipping.column()],
    )?;

    let products = text_column(&grouped, Field::Product.column())?;
    let shipping = text_column(&grouped, Field::Shipping.column())?;
    let counts = count_column(&grouped)?;

    let mut by_product: BTreeMap<String, Vec<(String, u64)>> = BTreeMap::new();
    for ((product, shipping_type), count) in products.into_iter().zip(shipping).zip(counts) {
        by_product.entry(product).or_default().push((shipping_type, count));
    }

    let products = by_product
        .into_iter()
        .map(|(product, types)| {
            let total: u64 = types.iter().map(|(_, count)| count).sum();
            let mut shares: Vec<ShippingShare> = types
                .into_iter()
                .map(|(shipping_type, count)| ShippingShare {
                    shipping_type,
                    count,
                    percent: round_to(percent(count, total), 0) as u32,
                })
                .collect();
            shares.sort_by(|a, b| {
                b.count
                    .cmp(&a.count)
                    .then_with(|| a.shipping_type.cmp(&b.shipping_type))
            });
            ProductShipping {
                product,
                total,
                shares,
            }
        })
        .collect();

    Ok(ShippingMixReport { products })
}

impl fmt::Display for ShippingMixReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Shipping Type Mix per Product ===")?;
        if self.products.is_empty() {
            return writeln!(f, "No transactions with both a product and a shipping type.");
        }
        for product in &self.products {
            writeln!(f, "\nProduct: {}", product.product)?;
            for share in &product.shares {
                writeln!(
                    f,
                    "  {} - {}% (count: {})",
                    share.shipping_type, share.percent, share.count
                )?;
            }
        }
        Ok(())
    }
}

impl Report for ShippingMixReport {
    fn charts(&self) -> Vec<ChartSpec> {
        if self.products.is_empty() {
            return Vec::new();
        }

        let shipping_types: BTreeSet<&str> = self
            .products
            .iter()
            .flat_map(|p| p.shares.iter().map(|s| s.shipping_type.as_str()))
            .collect();
        let categories = self.products.iter().map(|p| p.product.clone()).collect();

        let chart = shipping_types.into_iter().fold(
            ChartSpec::grouped_bar("shipping_mix", "Shipping Type Mix per Product", categories)
                .with_axes("Product", "Share of transactions (%)"),
            |chart, shipping_type| {
                let values = self
                    .products
                    .iter()
                    .map(|p| {
                        p.shares
                            .iter()
                            .find(|s| s.shipping_type == shipping_type)
                            .map_or(0.0, |s| f64::from(s.percent))
                    })
                    .collect();
                chart.with_series(DataSeries::new(shipping_type, values))
            },
        );
        vec![chart]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn table(rows: &[(&str, &str)]) -> TransactionTable {
        let products: Vec<&str> = rows.iter().map(|r| r.0).collect();
        let shipping: Vec<&str> = rows.iter().map(|r| r.1).collect();
        let frame = df!(
            "Item Purchased" => products,
            "Shipping Type" => shipping
        )
        .unwrap();
        TransactionTable::from_frame(frame).unwrap()
    }

    #[test]
    fn test_shoes_example() {
        let report = shipping_mix(&table(&[
            ("Shoes", "Express"),
            ("Shoes", "Standard"),
            ("Shoes", "Standard"),
        ]))
        .unwrap();

        let shoes = report.product("Shoes").unwrap();
        assert_eq!(shoes.total, 3);
        assert_eq!(
            shoes.shares,
            vec![
                ShippingShare {
                    shipping_type: "Standard".into(),
                    count: 2,
                    percent: 67
                },
                ShippingShare {
                    shipping_type: "Express".into(),
                    count: 1,
                    percent: 33
                },
            ]
        );
    }

    #[test]
    fn test_products_sorted_and_normalized() {
        let report = shipping_mix(&table(&[
            ("  shoes", "express "),
            ("Hat", "Standard"),
            ("Shoes", "EXPRESS"),
            ("", "Standard"),
        ]))
        .unwrap();

        let names: Vec<&str> = report.products.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(names, vec!["Hat", "Shoes"]);
        assert_eq!(report.product("Shoes").unwrap().shares[0].count, 2);
        assert_eq!(report.product("Shoes").unwrap().shares[0].percent, 100);
    }

    #[test]
    fn test_percentages_sum_to_about_100() {
        let report = shipping_mix(&table(&[
            ("Hat", "Express"),
            ("Hat", "Standard"),
            ("Hat", "Pickup"),
            ("Coat", "Express"),
            ("Coat", "Express"),
            ("Coat", "Pickup"),
            ("Coat", "Standard"),
            ("Coat", "Free Shipping"),
            ("Coat", "Next Day Air"),
            ("Coat", "2-Day Shipping"),
        ]))
        .unwrap();

        for product in &report.products {
            let sum: u32 = product.shares.iter().map(|s| s.percent).sum();
            assert!((99..=101).contains(&sum), "{} sums to {}", product.product, sum);
        }
    }

    #[test]
    fn test_chart_has_series_per_shipping_type() {
        let report = shipping_mix(&table(&[("Hat", "Express"), ("Coat", "Standard")])).unwrap();
        let charts = report.charts();
        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].categories, vec!["Coat", "Hat"]);
        assert_eq!(charts[0].series.len(), 2);
        assert_eq!(charts[0].series[0].name, "Express");
        assert_eq!(charts[0].series[0].values, vec![0.0, 100.0]);
    }

    #[test]
    fn test_empty_table_reports_nothing() {
        let report = shipping_mix(&table(&[])).unwrap();
        assert!(report.products.is_empty());
        assert!(report.charts().is_empty());
    }
}
