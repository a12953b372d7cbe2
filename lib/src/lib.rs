use chrono::{DateTime, NaiveDate, Utc};
use parse_display::{Display, FromStr};
use polars::prelude::*;
use std::path::Path;

pub mod asof;
pub mod config;
mod error;
pub mod filter;
pub mod game_data;
mod join;
pub mod quarterback;
pub mod schema;
pub mod tables;
pub mod teams;
pub mod temporal;
pub mod validate;

pub use config::{Config, PointsFormula};
pub use error::Error;
pub use game_data::GameTable;
pub use tables::{Table, Tables};

pub type Result<T> = std::result::Result<T, error::Error>;

/// Which side of a game a team-level column describes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, FromStr)]
#[display(style = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Home, Side::Away];

    /// `tm_pts` -> `tm_pts_home`
    pub fn suffixed(self, column: &str) -> String {
        format!("{}_{}", column, self)
    }
}

pub fn load_parquet<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    let mut file = std::fs::File::open(path)?;
    let df = ParquetReader::new(&mut file).finish()?;
    Ok(df)
}

pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<DataFrame> {
    // gzip input is detected and inflated by the reader
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Days since 1970-01-01, the physical value of a polars `Date`.
pub(crate) fn epoch_days(date: NaiveDate) -> i32 {
    let epoch = DateTime::<Utc>::UNIX_EPOCH.date_naive();
    date.signed_duration_since(epoch).num_days() as i32
}

/// Reads a polars `Date` column as days since the unix epoch.
pub(crate) fn date_column(df: &DataFrame, name: &str) -> Result<Vec<Option<i32>>> {
    let days = df.column(name)?.cast(&DataType::Int32)?;
    Ok(days.i32()?.into_iter().collect())
}

pub(crate) fn date_series(name: &str, days: Vec<Option<i32>>) -> Result<Series> {
    Ok(Series::new(name, days).cast(&DataType::Date)?)
}

pub(crate) fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let values = df.column(name)?.cast(&DataType::String)?;
    Ok(values
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

pub(crate) fn id_column(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let ids = df.column(name)?.cast(&DataType::Int64)?;
    Ok(ids.i64()?.into_iter().collect())
}
