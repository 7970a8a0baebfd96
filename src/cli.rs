//! Command-line interface definitions and argument parsing

use crate::analysis::RunOptions;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Analysis selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Task {
    /// Shipping type mix per product
    Shipping,
    /// Customer segments by total spend, per gender
    Segments,
    /// Age-averaged vs. overall purchase frequency per product
    Frequency,
    /// Sales by season, month and year
    Seasonal,
    /// Mean previous purchases per age group
    Loyalty,
}

/// Exploratory analysis of retail shopping transactions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Analysis to run
    #[arg(value_enum)]
    pub task: Task,

    /// Path to the input CSV file
    #[arg(short, long, env = "SHOPPING_DATA", default_value = "data/shopping.csv")]
    pub input: PathBuf,

    /// Directory the charts are written to
    #[arg(short, long, default_value = "charts")]
    pub output_dir: PathBuf,

    /// Product for the yearly sales breakdown (seasonal task only).
    /// Defaults to the product of the first dated transaction
    #[arg(short, long)]
    pub product: Option<String>,

    /// Print the report without rendering charts
    #[arg(long)]
    pub no_plot: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            product: self.product.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task_and_flags() {
        let args = Args::try_parse_from([
            "shopping-insights",
            "seasonal",
            "--input",
            "shop.csv",
            "--product",
            "Shoes",
            "--no-plot",
        ])
        .unwrap();

        assert_eq!(args.task, Task::Seasonal);
        assert_eq!(args.input, PathBuf::from("shop.csv"));
        assert_eq!(args.output_dir, PathBuf::from("charts"));
        assert!(args.no_plot);
        assert_eq!(args.run_options().product.as_deref(), Some("Shoes"));
    }

    #[test]
    fn test_task_names() {
        for (name, task) in [
            ("shipping", Task::Shipping),
            ("segments", Task::Segments),
            ("frequency", Task::Frequency),
            ("seasonal", Task::Seasonal),
            ("loyalty", Task::Loyalty),
        ] {
            let args = Args::try_parse_from(["shopping-insights", name, "-i", "x.csv"]).unwrap();
            assert_eq!(args.task, task);
        }
    }

    #[test]
    fn test_task_is_required() {
        assert!(Args::try_parse_from(["shopping-insights"]).is_err());
        assert!(Args::try_parse_from(["shopping-insights", "forecast"]).is_err());
    }
}
