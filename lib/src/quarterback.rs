use crate::{error::Error, PointsFormula, Result};
use derive_deref::Deref;
use itertools::Itertools;
use polars::prelude::*;

/// One row per (game, offense): the starting quarterback and his aggregates.
///
/// Columns: `game_id`, `team`, `qb`, `qb_name`, `qb_epa`, `def_eps`, `qb_points`.
#[derive(Clone, Deref)]
pub struct QuarterbackStats(DataFrame);

impl QuarterbackStats {
    pub fn compute(
        plays: &DataFrame,
        passes: &DataFrame,
        rushes: &DataFrame,
        drives: &DataFrame,
        players: &DataFrame,
        points: PointsFormula,
    ) -> Result<Self> {
        log::trace!("quarterback::compute");
        let starters = starting_quarterbacks(plays, passes)?;
        let offense = offense_epa(plays, passes, rushes, &starters)?;
        let defense = defense_eps(plays, drives)?;

        let opponent_eps = col("def_eps").sum().over([col("game_id")]) - col("def_eps");
        let qb_points = match points {
            PointsFormula::Raw => col("qb_epa"),
            PointsFormula::DefenseAdjusted => col("qb_epa") - opponent_eps,
        };
        let qb_name = when(col("first_name").is_null().and(col("last_name").is_null()))
            .then(lit(NULL).cast(DataType::String))
            .otherwise(concat_str([col("first_name"), col("last_name")], " ", true));

        let join_args = JoinArgs::new(JoinType::Left).with_coalesce(JoinCoalesce::CoalesceColumns);
        let df = offense
            .lazy()
            .join(
                defense.lazy(),
                [col("game_id"), col("team")],
                [col("game_id"), col("team")],
                join_args.clone(),
            )
            .join(
                players.clone().lazy(),
                [col("qb")],
                [col("player_id")],
                join_args,
            )
            .with_columns([qb_points.alias("qb_points"), qb_name.alias("qb_name")])
            .select([
                col("game_id"),
                col("team"),
                col("qb"),
                col("qb_name"),
                col("qb_epa"),
                col("def_eps"),
                col("qb_points"),
            ])
            .sort(["game_id", "team"], SortMultipleOptions::default())
            .collect()?;

        log::debug!("{} quarterback starts with {} points", df.height(), points);
        Ok(QuarterbackStats(df))
    }

    pub fn into_inner(self) -> DataFrame {
        self.0
    }
}

/// The passer on each offense's lowest-numbered pass play of the game.
pub fn starting_quarterbacks(plays: &DataFrame, passes: &DataFrame) -> Result<DataFrame> {
    let join_args = JoinArgs::new(JoinType::Inner).with_coalesce(JoinCoalesce::CoalesceColumns);
    let df = plays
        .clone()
        .lazy()
        .select([col("game_id"), col("play_id"), col("offense")])
        .join(
            passes.clone().lazy(),
            [col("play_id")],
            [col("play_id")],
            join_args,
        )
        .filter(col("passer").is_not_null().and(col("offense").is_not_null()))
        .group_by([col("game_id"), col("offense")])
        .agg([col("passer")
            .sort_by([col("play_id")], SortMultipleOptions::default())
            .first()
            .alias("qb")])
        .rename(["offense"], ["team"])
        .sort(["game_id", "team"], SortMultipleOptions::default())
        .collect()?;

    log::debug!("{} starting quarterbacks", df.height());
    Ok(df)
}

/// Offensive EPA credited to each offense's starting quarterback.
///
/// A play counts when the starter threw it or carried it himself; handoffs to
/// another rusher and plays with neither a passer nor a rusher do not.
pub fn offense_epa(
    plays: &DataFrame,
    passes: &DataFrame,
    rushes: &DataFrame,
    starters: &DataFrame,
) -> Result<DataFrame> {
    let credited = col("passer")
        .eq(col("qb"))
        .fill_null(lit(false))
        .or(col("rusher").eq(col("qb")).fill_null(lit(false)));

    let join_args = JoinArgs::new(JoinType::Left).with_coalesce(JoinCoalesce::CoalesceColumns);
    let df = plays
        .clone()
        .lazy()
        .filter(col("offense").is_not_null())
        .join(
            starters.clone().lazy(),
            [col("game_id"), col("offense")],
            [col("game_id"), col("team")],
            join_args.clone(),
        )
        .join(
            passes.clone().lazy(),
            [col("play_id")],
            [col("play_id")],
            join_args.clone(),
        )
        .join(
            rushes.clone().lazy(),
            [col("play_id")],
            [col("play_id")],
            join_args,
        )
        .group_by([col("game_id"), col("offense")])
        .agg([
            col("qb").first(),
            when(credited)
                .then(col("epa").fill_null(lit(0.0)))
                .otherwise(lit(0.0))
                .sum()
                .alias("qb_epa"),
        ])
        .rename(["offense"], ["team"])
        .sort(["game_id", "team"], SortMultipleOptions::default())
        .collect()?;

    let game_ids = crate::id_column(&df, "game_id")?;
    let teams = crate::string_column(&df, "team")?;
    let qbs = crate::string_column(&df, "qb")?;
    let missing = game_ids
        .iter()
        .zip(&teams)
        .zip(&qbs)
        .filter(|(_, qb)| qb.is_none())
        .map(|((game_id, team), _)| {
            format!(
                "{}:{}",
                game_id.unwrap_or_default(),
                team.as_deref().unwrap_or_default()
            )
        })
        .collect_vec();
    if !missing.is_empty() {
        return Err(Error::MissingQuarterback(missing));
    }

    Ok(df)
}

/// Expected points at the start of each drive a team defended, summed per
/// game and zero-centered on the mean over every team-game in `plays`.
///
/// A team that defended no drives in a game conceded nothing, so it enters
/// the mean with zero rather than being left out of it.
pub fn defense_eps(plays: &DataFrame, drives: &DataFrame) -> Result<DataFrame> {
    let plays = plays.clone().lazy();
    let team_games = concat(
        [
            plays.clone().select([col("game_id"), col("offense").alias("team")]),
            plays.clone().select([col("game_id"), col("defense").alias("team")]),
        ],
        UnionArgs::default(),
    )?
    .filter(col("team").is_not_null())
    .unique(None, UniqueKeepStrategy::Any);

    let allowed = drives
        .clone()
        .lazy()
        .join(
            plays.select([col("game_id"), col("play_id"), col("defense"), col("eps")]),
            [col("game_id"), col("first_play_id")],
            [col("game_id"), col("play_id")],
            JoinArgs::new(JoinType::Inner).with_coalesce(JoinCoalesce::CoalesceColumns),
        )
        .filter(col("defense").is_not_null())
        .group_by([col("game_id"), col("defense")])
        .agg([col("eps").fill_null(lit(0.0)).sum().alias("eps_allowed")])
        .rename(["defense"], ["team"]);

    let df = team_games
        .join(
            allowed,
            [col("game_id"), col("team")],
            [col("game_id"), col("team")],
            JoinArgs::new(JoinType::Left).with_coalesce(JoinCoalesce::CoalesceColumns),
        )
        .with_column(col("eps_allowed").fill_null(lit(0.0)))
        .select([
            col("game_id"),
            col("team"),
            (col("eps_allowed") - col("eps_allowed").mean()).alias("def_eps"),
        ])
        .sort(["game_id", "team"], SortMultipleOptions::default())
        .collect()?;

    log::debug!("{} defensive drive baselines", df.height());
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    struct Fixture {
        plays: DataFrame,
        passes: DataFrame,
        rushes: DataFrame,
        drives: DataFrame,
        players: DataFrame,
    }

    // NE: brady throws (1, 3) and kneels (4); a back carries (2).
    // MIA: tua throws first (5), a backup throws later (6).
    fn fixture() -> Fixture {
        Fixture {
            plays: df!(
                "game_id" => [1i64, 1, 1, 1, 1, 1],
                "play_id" => [1i64, 2, 3, 4, 5, 6],
                "offense" => ["NE", "NE", "NE", "NE", "MIA", "MIA"],
                "defense" => ["MIA", "MIA", "MIA", "MIA", "NE", "NE"],
                "epa" => [0.5, -0.2, 1.0, -0.1, 0.3, 2.0],
                "eps" => [1.0, 0.8, 1.5, 2.0, 0.4, 0.9],
            )
            .unwrap(),
            passes: df!(
                "play_id" => [1i64, 3, 5, 6],
                "passer" => ["QB-NE", "QB-NE", "QB-MIA", "QB-MIA2"],
            )
            .unwrap(),
            rushes: df!(
                "play_id" => [2i64, 4],
                "rusher" => ["RB-NE", "QB-NE"],
            )
            .unwrap(),
            drives: df!(
                "game_id" => [1i64, 1],
                "first_play_id" => [1i64, 5],
            )
            .unwrap(),
            players: df!(
                "player_id" => ["QB-NE", "QB-MIA", "RB-NE"],
                "first_name" => ["Tom", "Tua", "Sony"],
                "last_name" => ["Brady", "Tagovailoa", "Michel"],
            )
            .unwrap(),
        }
    }

    fn floats(df: &DataFrame, name: &str) -> Vec<f64> {
        df.column(name)
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .map(|v| v.unwrap())
            .collect()
    }

    #[test]
    fn first_passer_starts() {
        let f = fixture();
        let df = starting_quarterbacks(&f.plays, &f.passes).unwrap();
        assert_eq!(
            crate::string_column(&df, "qb").unwrap(),
            [Some("QB-MIA".to_string()), Some("QB-NE".to_string())]
        );
    }

    #[test]
    fn epa_counts_starter_passes_and_own_carries_only() {
        let f = fixture();
        let starters = starting_quarterbacks(&f.plays, &f.passes).unwrap();
        let df = offense_epa(&f.plays, &f.passes, &f.rushes, &starters).unwrap();
        let epa = floats(&df, "qb_epa");
        // MIA, NE
        assert_abs_diff_eq!(epa[0], 0.3, epsilon = 1e-9);
        assert_abs_diff_eq!(epa[1], 1.4, epsilon = 1e-9);
    }

    #[test]
    fn defensive_baseline_is_zero_centered() {
        let f = fixture();
        let df = defense_eps(&f.plays, &f.drives).unwrap();
        let eps = floats(&df, "def_eps");
        assert_abs_diff_eq!(eps[0], 0.3, epsilon = 1e-9);
        assert_abs_diff_eq!(eps[1], -0.3, epsilon = 1e-9);
        assert_abs_diff_eq!(eps.iter().sum::<f64>(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn team_without_defended_drives_concedes_nothing() {
        let f = fixture();
        // only MIA's defense faces a drive, starting at 1.0
        let drives = f.drives.head(Some(1));
        let df = defense_eps(&f.plays, &drives).unwrap();
        assert_eq!(
            crate::string_column(&df, "team").unwrap(),
            [Some("MIA".to_string()), Some("NE".to_string())]
        );
        let eps = floats(&df, "def_eps");
        assert_abs_diff_eq!(eps[0], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(eps[1], -0.5, epsilon = 1e-9);
    }

    #[test]
    fn raw_points_ignore_defensive_baseline() {
        let f = fixture();
        let stats = QuarterbackStats::compute(
            &f.plays,
            &f.passes,
            &f.rushes,
            &f.drives,
            &f.players,
            PointsFormula::Raw,
        )
        .unwrap();
        assert_eq!(floats(&stats, "qb_points"), floats(&stats, "qb_epa"));
        assert_eq!(
            crate::string_column(&stats, "qb_name").unwrap(),
            [
                Some("Tua Tagovailoa".to_string()),
                Some("Tom Brady".to_string())
            ]
        );
    }

    #[test]
    fn adjusted_points_subtract_opponent_baseline() {
        let f = fixture();
        let stats = QuarterbackStats::compute(
            &f.plays,
            &f.passes,
            &f.rushes,
            &f.drives,
            &f.players,
            PointsFormula::DefenseAdjusted,
        )
        .unwrap();
        let points = floats(&stats, "qb_points");
        assert_abs_diff_eq!(points[0], 0.3 + 0.3, epsilon = 1e-9);
        assert_abs_diff_eq!(points[1], 1.4 - 0.3, epsilon = 1e-9);
    }

    #[test]
    fn offense_without_passer_is_fatal() {
        let f = fixture();
        let passes = df!("play_id" => [1i64], "passer" => ["QB-NE"]).unwrap();
        let starters = starting_quarterbacks(&f.plays, &passes).unwrap();
        match offense_epa(&f.plays, &passes, &f.rushes, &starters) {
            Err(Error::MissingQuarterback(offenses)) => assert_eq!(offenses, ["1:MIA"]),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected a missing quarterback"),
        }
    }
}
