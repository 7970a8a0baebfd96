//! Shopping Insights: exploratory analysis of retail transactions
//!
//! Loads a shopping dataset with Polars, cleans it per analysis and answers
//! five fixed questions: shipping mix per product, spend segments by gender,
//! purchase frequency per product, seasonal trends and age-group loyalty.
//! Analyses return plain reports; charts are rendered separately with Plotters.

pub mod analysis;
pub mod chart;
pub mod cli;
pub mod data;
pub mod error;
pub mod viz;

// Re-export public items for easier access
pub use analysis::{run, Report, RunOptions};
pub use chart::{ChartKind, ChartSpec, DataSeries};
pub use cli::{Args, Task};
pub use data::{load_transactions, Field, Gender, TransactionTable};
pub use error::{DataError, DataResult};

/// Common result type used by the binary and the renderer
pub type Result<T> = anyhow::Result<T>;
