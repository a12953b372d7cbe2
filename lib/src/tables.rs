use crate::{epoch_days, error::Error, teams, Result};
use chrono::NaiveDate;
use parse_display::{Display, FromStr};
use polars::prelude::*;
use std::path::{Path, PathBuf};

/// The raw tables the pipeline reads, named as their files are named.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, FromStr)]
#[display(style = "UPPERCASE")]
pub enum Table {
    Game,
    Schedule,
    Team,
    Play,
    Pass,
    Rush,
    Drive,
    Player,
}

impl Table {
    pub const ALL: [Table; 8] = [
        Table::Game,
        Table::Schedule,
        Table::Team,
        Table::Play,
        Table::Pass,
        Table::Rush,
        Table::Drive,
        Table::Player,
    ];

    /// Source column and canonical name for every column kept from this table.
    pub fn columns(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Table::Game => &[
                ("gid", "game_id"),
                ("seas", "season"),
                ("wk", "week"),
                ("day", "day"),
                ("h", "team_home"),
                ("v", "team_away"),
                ("ou", "total_vegas"),
                ("sprv", "spread_vegas"),
                ("temp", "gm_temperature"),
                ("humd", "gm_humidity"),
                ("wspd", "gm_wind_speed"),
            ],
            Table::Schedule => &[("gid", "game_id"), ("date", "date")],
            Table::Team => &[
                ("gid", "game_id"),
                ("tname", "team"),
                ("pts", "tm_pts"),
                ("ry", "tm_rush_yds"),
                ("ra", "tm_rush_att"),
                ("py", "tm_pass_yds"),
                ("pa", "tm_pass_att"),
                ("pc", "tm_pass_comp"),
                ("sk", "tm_sacks"),
                ("sky", "tm_sack_yds"),
                ("ints", "tm_ints"),
                ("iry", "tm_int_yds"),
                ("fum", "tm_fumbles"),
                ("pu", "tm_punts"),
                ("gpy", "tm_punt_yds"),
                ("fgm", "tm_field_goals"),
                ("fgat", "tm_field_goal_att"),
                ("pen", "tm_penalty_yds"),
                ("top", "tm_possess_time"),
                ("tdp", "tm_pass_tds"),
                ("tdr", "tm_rush_tds"),
                ("td", "tm_tds"),
                ("qba", "tm_qb_rush_att"),
                ("qby", "tm_qb_rush_yds"),
            ],
            Table::Play => &[
                ("gid", "game_id"),
                ("pid", "play_id"),
                ("off", "offense"),
                ("def", "defense"),
                ("epa", "epa"),
                ("eps", "eps"),
            ],
            Table::Pass => &[("pid", "play_id"), ("psr", "passer")],
            Table::Rush => &[("pid", "play_id"), ("bc", "rusher")],
            Table::Drive => &[("gid", "game_id"), ("fpid", "first_play_id")],
            Table::Player => &[
                ("player", "player_id"),
                ("fname", "first_name"),
                ("lname", "last_name"),
            ],
        }
    }

    /// Finds the file backing this table, preferring compressed CSV.
    pub fn resolve(self, dir: &Path) -> Result<PathBuf> {
        ["csv.gz", "csv", "parquet"]
            .iter()
            .map(|ext| dir.join(format!("{}.{}", self, ext)))
            .find(|path| path.is_file())
            .ok_or_else(|| Error::MissingTable {
                table: self.to_string(),
                dir: dir.to_path_buf(),
            })
    }

    pub fn load(self, dir: &Path) -> Result<DataFrame> {
        let path = self.resolve(dir)?;
        log::debug!("Reading {} from {}", self, path.display());
        let raw = match path.extension().and_then(|ext| ext.to_str()) {
            Some("parquet") => crate::load_parquet(&path)?,
            _ => crate::load_csv(&path)?,
        };
        let df = self.project(raw)?;
        log::debug!("{} rows in {}", df.height(), self);
        Ok(df)
    }

    /// Selects this table's columns from a raw frame, renamed and typed canonically.
    pub fn project(self, raw: DataFrame) -> Result<DataFrame> {
        let present = raw.get_column_names();
        if let Some((source, _)) = self
            .columns()
            .iter()
            .find(|(source, _)| !present.contains(source))
        {
            return Err(Error::MissingColumn {
                table: self.to_string(),
                column: source.to_string(),
            });
        }

        let exprs: Vec<Expr> = self
            .columns()
            .iter()
            .map(|(source, target)| typed(col(source), target).alias(target))
            .collect();
        let df = raw.lazy().select(exprs).collect()?;

        match self {
            Table::Schedule => parse_dates(df),
            _ => Ok(df),
        }
    }
}

fn typed(expr: Expr, canonical: &str) -> Expr {
    match canonical {
        "game_id" | "play_id" | "first_play_id" | "season" | "week" => {
            expr.cast(DataType::Int64)
        }
        "team" | "team_home" | "team_away" | "offense" | "defense" => teams::canonicalize(expr),
        "day" | "date" | "passer" | "rusher" | "player_id" | "first_name" | "last_name" => {
            expr.cast(DataType::String)
        }
        _ => expr.cast(DataType::Float64),
    }
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value.trim(), format).ok())
}

fn parse_dates(mut df: DataFrame) -> Result<DataFrame> {
    let game_ids = crate::id_column(&df, "game_id")?;
    let raw = crate::string_column(&df, "date")?;

    let days = game_ids
        .into_iter()
        .zip(raw)
        .map(|(game_id, value)| {
            let value = value.unwrap_or_default();
            match parse_date(&value) {
                Some(date) => Ok(Some(epoch_days(date))),
                None => Err(Error::InvalidDate {
                    game_id: game_id.unwrap_or_default(),
                    value,
                }),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    df.with_column(crate::date_series("date", days)?)?;
    Ok(df)
}

/// Every table the pipeline needs, projected to canonical columns.
#[derive(Clone)]
pub struct Tables {
    pub games: DataFrame,
    pub schedule: DataFrame,
    pub teams: DataFrame,
    pub plays: DataFrame,
    pub passes: DataFrame,
    pub rushes: DataFrame,
    pub drives: DataFrame,
    pub players: DataFrame,
}

impl Tables {
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        log::trace!("tables::load");
        let dir = dir.as_ref();
        Ok(Tables {
            games: Table::Game.load(dir)?,
            schedule: Table::Schedule.load(dir)?,
            teams: Table::Team.load(dir)?,
            plays: Table::Play.load(dir)?,
            passes: Table::Pass.load(dir)?,
            rushes: Table::Rush.load(dir)?,
            drives: Table::Drive.load(dir)?,
            players: Table::Player.load(dir)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_table_is_renamed_and_canonicalized() {
        let raw = df!(
            "gid" => [1i64],
            "seas" => [2016i64],
            "wk" => [1i64],
            "day" => ["SUN"],
            "v" => ["SD"],
            "h" => ["KC"],
            "stad" => ["Arrowhead"],
            "temp" => [88i64],
            "humd" => [52i64],
            "wspd" => [9i64],
            "ou" => [44.5],
            "sprv" => [7.0],
        )
        .unwrap();

        let df = Table::Game.project(raw).unwrap();
        assert_eq!(
            df.get_column_names(),
            [
                "game_id",
                "season",
                "week",
                "day",
                "team_home",
                "team_away",
                "total_vegas",
                "spread_vegas",
                "gm_temperature",
                "gm_humidity",
                "gm_wind_speed"
            ]
        );
        let away = crate::string_column(&df, "team_away").unwrap();
        assert_eq!(away, [Some("LAC".to_string())]);
        assert_eq!(df.column("gm_temperature").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn missing_source_column_is_fatal() {
        let raw = df!("pid" => [10i64]).unwrap();
        let err = Table::Pass.project(raw).unwrap_err();
        match err {
            Error::MissingColumn { table, column } => {
                assert_eq!(table, "PASS");
                assert_eq!(column, "psr");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn schedule_dates_accept_both_formats() {
        let raw = df!(
            "gid" => [1i64, 2],
            "date" => ["2019-09-08", "9/15/2019"],
        )
        .unwrap();
        let df = Table::Schedule.project(raw).unwrap();
        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);

        let days = crate::date_column(&df, "date").unwrap();
        assert_eq!(days, [Some(18_147), Some(18_154)]);
    }

    #[test]
    fn malformed_date_names_the_game() {
        let raw = df!(
            "gid" => [7i64, 8],
            "date" => ["2019-09-08", "Sept 15"],
        )
        .unwrap();
        match Table::Schedule.project(raw).unwrap_err() {
            Error::InvalidDate { game_id, value } => {
                assert_eq!(game_id, 8);
                assert_eq!(value, "Sept 15");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn resolve_prefers_compressed_then_plain_csv() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Table::Drive.resolve(dir.path()),
            Err(Error::MissingTable { .. })
        ));

        std::fs::write(dir.path().join("DRIVE.csv"), "gid,fpid\n1,10\n").unwrap();
        assert_eq!(
            Table::Drive.resolve(dir.path()).unwrap(),
            dir.path().join("DRIVE.csv")
        );

        let df = Table::Drive.load(dir.path()).unwrap();
        assert_eq!(df.get_column_names(), ["game_id", "first_play_id"]);
        assert_eq!(df.height(), 1);
    }

    #[test]
    fn table_names_match_file_stems() {
        assert_eq!(Table::Schedule.to_string(), "SCHEDULE");
        assert_eq!("PLAYER".parse::<Table>().unwrap(), Table::Player);
    }
}
