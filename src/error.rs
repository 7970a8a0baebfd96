//! Error taxonomy for loading and cleaning the transaction table

use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the data layer.
///
/// Unparseable cell values are not errors: the Cleaner drops the affected
/// rows and the tasks count whatever they exclude on top of that.
#[derive(Debug, Error)]
pub enum DataError {
    /// The dataset file is missing, unreadable or not valid CSV.
    #[error("cannot read dataset at '{}': {source}", .path.display())]
    DataSource {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    /// A column a task depends on is absent from the dataset.
    #[error("dataset has no column named '{column}'")]
    MissingField { column: String },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

pub type DataResult<T> = std::result::Result<T, DataError>;
