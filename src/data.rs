//! Data loading and cleaning of shopping transactions using Polars

use crate::error::{DataError, DataResult};
use polars::prelude::*;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::{debug, info};

/// Columns of the shopping dataset the analyses read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Product,
    Shipping,
    Gender,
    Amount,
    PreviousPurchases,
    Age,
    Date,
}

/// Oldest plausible customer age; larger values are treated as unparseable
pub const MAX_AGE: i64 = 150;

/// How a field's raw text is coerced by the Cleaner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Trimmed, title-cased text
    Label,
    /// Non-negative decimal
    Decimal,
    /// Non-negative whole number
    Count,
    /// Whole number between 1 and [`MAX_AGE`]
    Age,
    /// Trimmed text, parsed into a calendar date by the tasks that need it
    Date,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Product,
        Field::Shipping,
        Field::Gender,
        Field::Amount,
        Field::PreviousPurchases,
        Field::Age,
        Field::Date,
    ];

    /// Column header as it appears in the dataset (after trimming)
    pub fn column(self) -> &'static str {
        match self {
            Field::Product => "Item Purchased",
            Field::Shipping => "Shipping Type",
            Field::Gender => "Gender",
            Field::Amount => "Purchase Amount (USD)",
            Field::PreviousPurchases => "Previous Purchases",
            Field::Age => "Age",
            Field::Date => "Dates",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Product | Field::Shipping | Field::Gender => FieldKind::Label,
            Field::Amount => FieldKind::Decimal,
            Field::PreviousPurchases => FieldKind::Count,
            Field::Age => FieldKind::Age,
            Field::Date => FieldKind::Date,
        }
    }

    fn from_column(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.column() == name)
    }
}

/// Customer gender as recorded in the dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Female, Gender::Male];

    /// Parse a cleaned (title-cased) label
    pub fn from_label(label: &str) -> Option<Gender> {
        match label {
            "Female" => Some(Gender::Female),
            "Male" => Some(Gender::Male),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }
}

/// Immutable snapshot of the transaction table.
///
/// Cleaning never mutates a table in place: [`TransactionTable::clean`]
/// returns a new table, so every task works on its own copy.
#[derive(Debug, Clone)]
pub struct TransactionTable {
    frame: DataFrame,
}

impl TransactionTable {
    /// Wrap an existing frame, stripping surrounding whitespace from column names
    pub fn from_frame(mut frame: DataFrame) -> DataResult<Self> {
        let names: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|name| name.trim().to_string())
            .collect();
        frame.set_column_names(names)?;
        Ok(Self { frame })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Produce a cleaned copy of the table for a task needing `required`.
    ///
    /// Text columns are trimmed and title-cased, numeric fields are parsed
    /// (unparseable or out-of-range values become null), and finally rows
    /// with a null in any required field are dropped. Running `clean` on its
    /// own output yields the same table.
    pub fn clean(&self, required: &[Field]) -> DataResult<TransactionTable> {
        for field in required {
            self.column(*field)?;
        }

        let mut frame = self.frame.clone();
        let names: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        for name in &names {
            let column = frame.column(name)?;
            let cleaned = match Field::from_column(name).map(Field::kind) {
                Some(FieldKind::Label) => map_text(column, normalize_label)?,
                Some(FieldKind::Date) => map_text(column, trim_text)?,
                Some(FieldKind::Decimal) => parse_decimals(column)?,
                Some(FieldKind::Count) => parse_whole(column, 0..=i64::MAX)?,
                Some(FieldKind::Age) => parse_whole(column, 1..=MAX_AGE)?,
                None if column.dtype() == &DataType::String => {
                    map_text(column, normalize_label)?
                }
                None => continue,
            };
            frame.with_column(cleaned)?;
        }

        let before = frame.height();
        let frame = drop_incomplete(frame, required)?;
        if frame.height() < before {
            debug!(
                dropped = before - frame.height(),
                remaining = frame.height(),
                "dropped rows missing required fields"
            );
        }

        Ok(TransactionTable { frame })
    }

    /// Text values of a label or date field. Call on a table cleaned with `field` required.
    pub fn labels(&self, field: Field) -> DataResult<Vec<String>> {
        Ok(self
            .column(field)?
            .str()?
            .into_no_null_iter()
            .map(str::to_owned)
            .collect())
    }

    /// Decimal values of a cleaned decimal field
    pub fn decimals(&self, field: Field) -> DataResult<Vec<f64>> {
        Ok(self.column(field)?.f64()?.into_no_null_iter().collect())
    }

    /// Whole-number values of a cleaned count or age field
    pub fn whole_numbers(&self, field: Field) -> DataResult<Vec<i64>> {
        Ok(self.column(field)?.i64()?.into_no_null_iter().collect())
    }

    fn column(&self, field: Field) -> DataResult<&Column> {
        self.frame
            .column(field.column())
            .map_err(|_| DataError::MissingField {
                column: field.column().to_string(),
            })
    }
}

/// Load the shopping dataset from a CSV file.
///
/// Every column is read as text; type coercion is left to the Cleaner.
pub fn load_transactions(path: impl AsRef<Path>) -> DataResult<TransactionTable> {
    let path = path.as_ref();
    let source_error = |source: PolarsError| DataError::DataSource {
        path: path.to_path_buf(),
        source,
    };

    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(source_error)?;

    if frame.width() == 0 {
        return Err(source_error(PolarsError::NoData(
            "dataset has no columns".into(),
        )));
    }

    let table = match TransactionTable::from_frame(frame) {
        Ok(table) => table,
        Err(DataError::Polars(source)) => return Err(source_error(source)),
        Err(other) => return Err(other),
    };

    info!(
        path = %path.display(),
        rows = table.height(),
        columns = table.frame.width(),
        "loaded transactions"
    );
    Ok(table)
}

/// Trim surrounding whitespace and title-case a label; blank labels are missing
pub fn normalize_label(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(title_case(trimmed))
    }
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(ch);
            word_start = true;
        }
    }
    out
}

fn trim_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn map_text(column: &Column, f: fn(&str) -> Option<String>) -> DataResult<Series> {
    let text = column.cast(&DataType::String)?;
    let values: Vec<Option<String>> = text.str()?.into_iter().map(|v| v.and_then(f)).collect();
    Ok(Series::new(column.name().clone(), values))
}

/// Parse currency amounts, tolerating `$` and thousands separators
fn parse_decimals(column: &Column) -> DataResult<Series> {
    let text = column.cast(&DataType::String)?;
    let values: Vec<Option<f64>> = text
        .str()?
        .into_iter()
        .map(|v| {
            v.and_then(|s| {
                let cleaned = s.replace(['$', ','], "");
                cleaned
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|amount| amount.is_finite() && *amount >= 0.0)
            })
        })
        .collect();
    Ok(Series::new(column.name().clone(), values))
}

fn parse_whole(column: &Column, range: RangeInclusive<i64>) -> DataResult<Series> {
    let text = column.cast(&DataType::String)?;
    let values: Vec<Option<i64>> = text
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_whole_number).filter(|n| range.contains(n)))
        .collect();
    Ok(Series::new(column.name().clone(), values))
}

/// Accept `"3"` as well as `"3.0"`; reject fractional values
fn parse_whole_number(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

fn drop_incomplete(frame: DataFrame, required: &[Field]) -> DataResult<DataFrame> {
    let predicate = required
        .iter()
        .map(|field| col(field.column()).is_not_null())
        .reduce(|acc, expr| acc.and(expr));

    match predicate {
        Some(predicate) => Ok(frame.lazy().filter(predicate).collect()?),
        None => Ok(frame),
    }
}
