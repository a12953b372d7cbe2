use polars::error::PolarsError;
use std::io::Error as IoError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] IoError),

    #[error("No {table} table found in {}", .dir.display())]
    MissingTable { table: String, dir: PathBuf },

    #[error("{table} table is missing column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Invalid date '{value}' for game {game_id}")]
    InvalidDate { game_id: i64, value: String },

    #[error("{what} missing for games: {}", .game_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", "))]
    MissingRecord { what: String, game_ids: Vec<i64> },

    #[error("More than one {what} for games: {}", .game_ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", "))]
    DuplicateRecord { what: String, game_ids: Vec<i64> },

    #[error("No starting quarterback for offense: {}", .0.join(", "))]
    MissingQuarterback(Vec<String>),

    #[error("Validation failed:\n{}", .0.join("\n"))]
    Validation(Vec<String>),
}
