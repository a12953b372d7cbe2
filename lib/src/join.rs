use crate::{error::Error, Result, Side};
use itertools::Itertools;
use polars::prelude::*;
use std::collections::HashMap;

fn join_type(allow_incomplete: bool) -> JoinArgs {
    let how = if allow_incomplete {
        JoinType::Left
    } else {
        JoinType::Inner
    };
    JoinArgs::new(how).with_coalesce(JoinCoalesce::CoalesceColumns)
}

/// Box score and quarterback attributes keyed by (`game_id`, `team`).
pub(crate) fn team_games(
    teams: &DataFrame,
    quarterbacks: &DataFrame,
    allow_incomplete: bool,
) -> Result<DataFrame> {
    let df = teams.join(
        quarterbacks,
        ["game_id", "team"],
        ["game_id", "team"],
        join_type(allow_incomplete),
    )?;
    log::debug!("{} team-game records with a starting quarterback", df.height());
    Ok(df)
}

/// Renames every team-game column except `game_id` with the side's suffix,
/// so `team` becomes the `team_home`/`team_away` join key.
fn side_frame(team_games: &DataFrame, side: Side) -> Result<DataFrame> {
    let exprs = team_games
        .get_column_names()
        .into_iter()
        .map(|name| match name {
            "game_id" => col(name),
            _ => col(name).alias(&side.suffixed(name)),
        })
        .collect_vec();
    Ok(team_games.clone().lazy().select(exprs).collect()?)
}

/// Attaches schedule dates, then home and away team-game columns, to every game.
///
/// Output has one row per input game. With strict joins a game that loses its
/// date or either side's record is an error, as is a side with more than one
/// matching record.
pub(crate) fn join_games(
    games: &DataFrame,
    schedule: &DataFrame,
    team_games: &DataFrame,
    allow_incomplete: bool,
) -> Result<DataFrame> {
    log::trace!("join::join_games");
    let expected = crate::id_column(games, "game_id")?;

    // a game without a date can't be placed in time, so this join is always strict
    let mut df = games.join(schedule, ["game_id"], ["game_id"], join_type(false))?;
    check_one_per_game(&expected, &df, "schedule date")?;
    log::debug!("{} games with a schedule date", df.height());

    for side in Side::BOTH {
        let key = side.suffixed("team");
        let side_df = side_frame(team_games, side)?;
        df = df.join(
            &side_df,
            ["game_id", key.as_str()],
            ["game_id", key.as_str()],
            join_type(allow_incomplete),
        )?;
        check_one_per_game(&expected, &df, &format!("{} team record", side))?;
        log::debug!("{} games after joining {} teams", df.height(), side);
    }
    Ok(df)
}

fn check_one_per_game(expected: &[Option<i64>], joined: &DataFrame, what: &str) -> Result<()> {
    let mut counts: HashMap<i64, usize> = expected.iter().flatten().map(|id| (*id, 0)).collect();
    for id in crate::id_column(joined, "game_id")?.into_iter().flatten() {
        *counts.entry(id).or_default() += 1;
    }

    let missing = counts
        .iter()
        .filter(|(_, n)| **n == 0)
        .map(|(id, _)| *id)
        .sorted()
        .collect_vec();
    if !missing.is_empty() {
        return Err(Error::MissingRecord {
            what: what.to_string(),
            game_ids: missing,
        });
    }

    let duplicated = counts
        .iter()
        .filter(|(_, n)| **n > 1)
        .map(|(id, _)| *id)
        .sorted()
        .collect_vec();
    if !duplicated.is_empty() {
        return Err(Error::DuplicateRecord {
            what: what.to_string(),
            game_ids: duplicated,
        });
    }
    Ok(())
}
