use crate::{error::Error, Result, Side};
use chrono::{Datelike, Utc};
use polars::prelude::*;

pub const REGULAR_SEASON_GAMES: i64 = 16;
pub const POSTSEASON_GAMES: i64 = 11;
pub const LAST_REGULAR_SEASON_WEEK: i64 = 17;

/// The current year. Seasons before it are complete.
pub fn first_incomplete_season() -> i64 {
    i64::from(Utc::now().year())
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRange {
    pub column: String,
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    pub fn new(column: impl Into<String>, min: f64, max: f64) -> Self {
        FeatureRange {
            column: column.into(),
            min,
            max,
        }
    }

    /// Plausible bounds for every published numeric feature.
    pub fn defaults() -> Vec<Self> {
        let mut ranges = vec![
            FeatureRange::new("season", 2000.0, first_incomplete_season() as f64),
            FeatureRange::new("week", 1.0, 21.0),
            FeatureRange::new("total_vegas", 30.0, 65.0),
            FeatureRange::new("spread_vegas", -27.0, 27.0),
            FeatureRange::new("gm_temperature", -10.0, 110.0),
            FeatureRange::new("gm_humidity", 0.0, 100.0),
            FeatureRange::new("gm_wind_speed", 0.0, 40.0),
        ];

        let per_side = [
            ("tm_pts", 0.0, 65.0),
            ("tm_rush_yds", -20.0, 425.0),
            ("tm_rush_att", 0.0, 60.0),
            ("tm_pass_yds", -10.0, 550.0),
            ("tm_pass_att", 0.0, 70.0),
            ("tm_pass_comp", 0.0, 45.0),
            ("tm_sacks", 0.0, 12.0),
            ("tm_sack_yds", 0.0, 100.0),
            ("tm_ints", 0.0, 7.0),
            ("tm_int_yds", -25.0, 200.0),
            ("tm_fumbles", 0.0, 7.0),
            ("tm_punts", 0.0, 15.0),
            ("tm_punt_yds", 0.0, 575.0),
            ("tm_tds", 0.0, 8.0),
            ("tm_field_goals", 0.0, 8.0),
            ("tm_field_goal_att", 0.0, 8.0),
            ("tm_penalty_yds", 0.0, 200.0),
            ("tm_possess_time", 15.0, 48.0),
            ("rest_days", 3.0, 16.0),
        ];
        for side in Side::BOTH {
            ranges.extend(
                per_side
                    .iter()
                    .map(|(column, min, max)| FeatureRange::new(side.suffixed(column), *min, *max)),
            );
        }
        ranges
    }
}

/// Checks every listed column stays within its range. Nulls are ignored.
pub fn check_ranges(df: &DataFrame, ranges: &[FeatureRange]) -> Result<()> {
    let mut violations = Vec::new();
    for range in ranges {
        let values = match df.column(&range.column) {
            Ok(series) => series.cast(&DataType::Float64)?,
            Err(_) => {
                violations.push(format!("{}: column missing", range.column));
                continue;
            }
        };
        let values = values.f64()?;
        if let (Some(min), Some(max)) = (values.min(), values.max()) {
            if min < range.min || max > range.max {
                violations.push(format!(
                    "{}: values in [{}, {}] outside [{}, {}]",
                    range.column, min, max, range.min, range.max
                ));
            }
        }
    }
    into_result(violations)
}

/// Checks game counts for every season before `before_season`: 16 regular
/// season appearances per team and 11 postseason games per season.
pub fn check_game_counts(df: &DataFrame, before_season: i64) -> Result<()> {
    let completed = df
        .clone()
        .lazy()
        .filter(col("season").lt(lit(before_season)));
    let regular = completed
        .clone()
        .filter(col("week").lt_eq(lit(LAST_REGULAR_SEASON_WEEK)));

    let appearances = concat(
        Side::BOTH.map(|side| {
            regular
                .clone()
                .select([col(&side.suffixed("team")).alias("team"), col("season")])
        }),
        UnionArgs::default(),
    )?
    .group_by([col("team"), col("season")])
    .agg([len().cast(DataType::Int64).alias("games")])
    .filter(col("games").neq(lit(REGULAR_SEASON_GAMES)))
    .sort(["season", "team"], SortMultipleOptions::default())
    .collect()?;

    let postseason = completed
        .filter(col("week").gt(lit(LAST_REGULAR_SEASON_WEEK)))
        .group_by([col("season")])
        .agg([len().cast(DataType::Int64).alias("games")])
        .filter(col("games").neq(lit(POSTSEASON_GAMES)))
        .sort(["season"], SortMultipleOptions::default())
        .collect()?;

    let mut violations = Vec::new();
    let teams = crate::string_column(&appearances, "team")?;
    let seasons = crate::id_column(&appearances, "season")?;
    let games = crate::id_column(&appearances, "games")?;
    for ((team, season), games) in teams.iter().zip(&seasons).zip(&games) {
        violations.push(format!(
            "{} {}: {} regular season games, expected {}",
            team.as_deref().unwrap_or_default(),
            season.unwrap_or_default(),
            games.unwrap_or_default(),
            REGULAR_SEASON_GAMES
        ));
    }

    let seasons = crate::id_column(&postseason, "season")?;
    let games = crate::id_column(&postseason, "games")?;
    for (season, games) in seasons.iter().zip(&games) {
        violations.push(format!(
            "{}: {} postseason games, expected {}",
            season.unwrap_or_default(),
            games.unwrap_or_default(),
            POSTSEASON_GAMES
        ));
    }
    into_result(violations)
}

fn into_result(violations: Vec<String>) -> Result<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(violations))
    }
}
