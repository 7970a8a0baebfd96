//! Seasonal, monthly and yearly transaction trends

use super::{count_by, count_column, int_column, percent, round_to, text_column, Report};
use crate::chart::ChartSpec;
use crate::data::{normalize_label, Field, TransactionTable};
use crate::error::DataResult;
use chrono::{Datelike, Month, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::fmt;
use tracing::debug;

/// Fields a row needs for the trend analysis
pub const REQUIRED: [Field; 2] = [Field::Product, Field::Date];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%m-%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

const SEASON_KEY: &str = "season";
const MONTH_KEY: &str = "month";
const YEAR_KEY: &str = "year";

/// Meteorological-style seasons anchored on the 21st
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    /// Spring Mar 21 - Jun 20, Summer Jun 21 - Sep 20,
    /// Autumn Sep 21 - Dec 20, Winter Dec 21 - Mar 20
    pub fn of(date: NaiveDate) -> Season {
        let day_of_year = date.month() * 100 + date.day();
        match day_of_year {
            321..=620 => Season::Spring,
            621..=920 => Season::Summer,
            921..=1220 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
        }
    }

    fn from_name(name: &str) -> Option<Season> {
        Season::ALL.into_iter().find(|s| s.name() == name)
    }
}

/// Parse a transaction date in one of the accepted layouts
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                .map(|dt| dt.date())
        })
}

/// English name of a month number, 1-based
pub fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map_or("Unknown", |m| m.name())
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonShare {
    pub season: Season,
    pub count: u64,
    /// Percent of dated transactions, one decimal
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthCount {
    pub month: u32,
    pub name: &'static str,
    pub count: u64,
    /// Percent of dated transactions, one decimal
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearCount {
    pub year: i32,
    pub count: u64,
}

/// Yearly transaction counts of a single product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductYears {
    pub product: String,
    /// Sorted by year; empty when the product has no dated sales
    pub years: Vec<YearCount>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalReport {
    pub total: u64,
    /// All four seasons, Spring first
    pub seasons: Vec<SeasonShare>,
    /// Months with at least one transaction, by month number
    pub months: Vec<MonthCount>,
    /// Up to three busiest months; ties keep month order
    pub top_months: Vec<MonthCount>,
    /// `None` when no product could be chosen (no dated rows, no override)
    pub product: Option<ProductYears>,
    /// Rows dropped for an unparseable date
    pub excluded: usize,
}

impl SeasonalReport {
    pub fn season(&self, season: Season) -> Option<&SeasonShare> {
        self.seasons.iter().find(|s| s.season == season)
    }
}

/// Transaction counts per season, per month and, for one product, per year.
///
/// `product` picks the product for the yearly breakdown; by default it is
/// the product of the first cleaned row, whether or not its date parses.
pub fn seasonal_trends(table: &TransactionTable, product: Option<&str>) -> DataResult<SeasonalReport> {
    let table = table.clean(&REQUIRED)?;
    let products = table.labels(Field::Product)?;
    let dates = table.labels(Field::Date)?;
    let first_product = products.first().cloned();

    let mut product_keys = Vec::with_capacity(products.len());
    let mut season_keys = Vec::with_capacity(products.len());
    let mut month_keys = Vec::with_capacity(products.len());
    let mut year_keys = Vec::with_capacity(products.len());
    for (product, text) in products.into_iter().zip(&dates) {
        if let Some(date) = parse_date(text) {
            product_keys.push(product);
            season_keys.push(Season::of(date).name());
            month_keys.push(i64::from(date.month()));
            year_keys.push(i64::from(date.year()));
        }
    }
    let excluded = dates.len() - product_keys.len();
    if excluded > 0 {
        debug!(excluded, "rows dropped for unparseable dates");
    }

    let example = match product {
        Some(name) => normalize_label(name),
        None => first_product,
    };
    let total = product_keys.len() as u64;

    let frame = df!(
        Field::Product.column() => product_keys,
        SEASON_KEY => season_keys,
        MONTH_KEY => month_keys,
        YEAR_KEY => year_keys
    )?;

    let seasons = season_shares(&frame, total)?;
    let months = month_counts(&frame, total)?;
    let mut top_months = months.clone();
    top_months.sort_by(|a, b| b.count.cmp(&a.count).then(a.month.cmp(&b.month)));
    top_months.truncate(3);

    let product = example
        .map(|name| product_years(&frame, name))
        .transpose()?;

    Ok(SeasonalReport {
        total,
        seasons,
        months,
        top_months,
        product,
        excluded,
    })
}

fn season_shares(frame: &DataFrame, total: u64) -> DataResult<Vec<SeasonShare>> {
    let grouped = count_by(frame, &[SEASON_KEY])?;
    let mut seasons: Vec<SeasonShare> = Season::ALL
        .into_iter()
        .map(|season| SeasonShare {
            season,
            count: 0,
            percent: 0.0,
        })
        .collect();

    for (name, count) in text_column(&grouped, SEASON_KEY)?
        .into_iter()
        .zip(count_column(&grouped)?)
    {
        if let Some(share) = Season::from_name(&name).and_then(|season| seasons.iter_mut().find(|s| s.season == season)) {
            share.count = count;
            share.percent = round_to(percent(count, total), 1);
        }
    }
    Ok(seasons)
}

fn month_counts(frame: &DataFrame, total: u64) -> DataResult<Vec<MonthCount>> {
    let grouped = count_by(frame, &[MONTH_KEY])?;
    let mut months: Vec<MonthCount> = int_column(&grouped, MONTH_KEY)?
        .into_iter()
        .zip(count_column(&grouped)?)
        .map(|(month, count)| {
            let month = month as u32;
            MonthCount {
                month,
                name: month_name(month),
                count,
                percent: round_to(percent(count, total), 1),
            }
        })
        .collect();
    months.sort_by_key(|m| m.month);
    Ok(months)
}

fn product_years(frame: &DataFrame, product: String) -> DataResult<ProductYears> {
    let sales = frame
        .clone()
        .lazy()
        .filter(col(Field::Product.column()).eq(lit(product.clone())))
        .collect()?;
    let grouped = count_by(&sales, &[YEAR_KEY])?;

    let mut years: Vec<YearCount> = int_column(&grouped, YEAR_KEY)?
        .into_iter()
        .zip(count_column(&grouped)?)
        .map(|(year, count)| YearCount {
            year: year as i32,
            count,
        })
        .collect();
    years.sort_by_key(|y| y.year);
    Ok(ProductYears { product, years })
}

impl fmt::Display for SeasonalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Sales by Season ===")?;
        for share in &self.seasons {
            writeln!(
                f,
                "  {:<8} {:>6} ({:.1}%)",
                share.season.name(),
                share.count,
                share.percent
            )?;
        }

        writeln!(f, "\n=== Sales by Month ===")?;
        for month in &self.months {
            writeln!(f, "  {:<10} {:>6} ({:.1}%)", month.name, month.count, month.percent)?;
        }

        writeln!(f, "\nBusiest months:")?;
        for (rank, month) in self.top_months.iter().enumerate() {
            writeln!(f, "  {}. {} ({} sales)", rank + 1, month.name, month.count)?;
        }

        match &self.product {
            Some(product) if !product.years.is_empty() => {
                writeln!(f, "\n=== Yearly Sales: {} ===", product.product)?;
                for year in &product.years {
                    writeln!(f, "  {}: {}", year.year, year.count)?;
                }
            }
            Some(product) => writeln!(f, "\nNo sales information for {}", product.product)?,
            None => writeln!(f, "\nNo sales information")?,
        }

        if self.excluded > 0 {
            writeln!(f, "\n{} rows skipped for an invalid date", self.excluded)?;
        }
        Ok(())
    }
}

impl Report for SeasonalReport {
    fn charts(&self) -> Vec<ChartSpec> {
        let mut charts = Vec::new();

        let seasons: Vec<&SeasonShare> = self.seasons.iter().filter(|s| s.count > 0).collect();
        if !seasons.is_empty() {
            charts.push(ChartSpec::pie(
                "sales_by_season",
                "Sales by Season",
                seasons.iter().map(|s| s.season.name().to_string()).collect(),
                seasons.iter().map(|s| s.count as f64).collect(),
            ));
        }

        if !self.months.is_empty() {
            charts.push(
                ChartSpec::line(
                    "sales_by_month",
                    "Sales by Month",
                    self.months.iter().map(|m| m.name.to_string()).collect(),
                    self.months.iter().map(|m| m.count as f64).collect(),
                )
                .with_axes("Month", "Transactions"),
            );
        }

        if let Some(product) = self.product.as_ref().filter(|p| !p.years.is_empty()) {
            charts.push(
                ChartSpec::bar(
                    "product_sales_by_year",
                    format!("Yearly Sales: {}", product.product),
                    product.years.iter().map(|y| y.year.to_string()).collect(),
                    product.years.iter().map(|y| y.count as f64).collect(),
                )
                .with_axes("Year", "Transactions"),
            );
        }

        charts
    }
}
