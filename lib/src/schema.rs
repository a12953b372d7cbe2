use crate::{Result, Side};
use itertools::Itertools;
use polars::prelude::*;

/// Identifier, calendar, descriptor and line/outcome columns, in published order.
pub const LEADING_COLUMNS: &[&str] = &[
    "game_id",
    "week_id",
    "date",
    "season",
    "week",
    "day",
    "team_home",
    "team_away",
    "qb_home",
    "qb_away",
    "qb_name_home",
    "qb_name_away",
    "home",
    "away",
    "total_vegas",
    "total_outcome",
    "spread_vegas",
    "spread_outcome",
    "outcome",
];

/// Per-side quarterback and temporal features, published after the `tm_` block.
pub const SIDE_FEATURES: &[&str] = &[
    "qb_epa",
    "def_eps",
    "qb_points",
    "qb_prev",
    "exp",
    "date_prev",
    "rest_days",
];

pub const GAME_FEATURE_PREFIX: &str = "gm_";
pub const TEAM_FEATURE_PREFIX: &str = "tm_";

/// `week_id`, point total, point spread and line-relative outcome columns.
pub fn outcome_columns() -> [Expr; 4] {
    [
        (lit(100i64) * col("season") + col("week")).alias("week_id"),
        (col("tm_pts_home") + col("tm_pts_away")).alias("total_outcome"),
        (col("tm_pts_home") - col("tm_pts_away")).alias("spread_outcome"),
        (col("tm_pts_home") - col("tm_pts_away") - col("spread_vegas")).alias("outcome"),
    ]
}

/// `home` and `away`: the team joined to its starter's name, e.g. `KC Alex Smith`.
/// A starter without a player record falls back to the quarterback id.
pub fn matchup_columns() -> [Expr; 2] {
    Side::BOTH.map(|side| {
        let qb = coalesce(&[col(&side.suffixed("qb_name")), col(&side.suffixed("qb"))]);
        concat_str([col(&side.suffixed("team")), qb], " ", true).alias(&side.to_string())
    })
}

/// The published column order for a frame holding `columns`.
pub fn column_order<'a>(columns: &[&'a str]) -> Vec<String> {
    let prefixed = |prefix: &'a str| {
        columns
            .iter()
            .filter(move |name| name.starts_with(prefix))
            .map(|name| name.to_string())
            .sorted()
    };

    LEADING_COLUMNS
        .iter()
        .map(|name| name.to_string())
        .chain(prefixed(GAME_FEATURE_PREFIX))
        .chain(prefixed(TEAM_FEATURE_PREFIX))
        .chain(
            SIDE_FEATURES
                .iter()
                .flat_map(|feature| Side::BOTH.map(|side| side.suffixed(feature))),
        )
        .collect()
}

/// Derives the outcome columns, orders columns for publication and sorts
/// games by kickoff date, then home team.
pub fn assemble(df: DataFrame) -> Result<DataFrame> {
    log::trace!("schema::assemble");
    let df = df
        .lazy()
        .with_columns(outcome_columns())
        .with_columns(matchup_columns())
        .collect()?;
    let order = column_order(&df.get_column_names());
    let df = df
        .lazy()
        .select(order.iter().map(|name| col(name)).collect_vec())
        .sort(
            ["date", "team_home", "game_id"],
            SortMultipleOptions::default().with_maintain_order(true),
        )
        .collect()?;
    Ok(df)
}
