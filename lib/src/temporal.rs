use crate::{asof::AsOfIndex, Result, Side};
use polars::prelude::*;

pub const REST_DAYS_MIN: i64 = 3;
pub const REST_DAYS_MAX: i64 = 16;
/// Rest assumed for a team's first tracked game.
pub const REST_DAYS_DEFAULT: i64 = 7;

/// Days rested since the previous game, clipped to a plausible schedule gap.
pub fn rest_days(date: i32, date_prev: Option<i32>) -> i64 {
    date_prev
        .map(|prev| (i64::from(date) - i64::from(prev)).clamp(REST_DAYS_MIN, REST_DAYS_MAX))
        .unwrap_or(REST_DAYS_DEFAULT)
}

/// Adds `date_prev_*`, `qb_prev_*`, `rest_days_*` and `exp_*` for both sides.
///
/// Expects one row per game with `date`, `team_home`, `team_away`, `qb_home`
/// and `qb_away`. Every game contributes a record for each side to a single
/// team-keyed history, so a team's previous game is found regardless of
/// whether it was home or away in either game.
pub fn add_temporal_features(df: &DataFrame) -> Result<DataFrame> {
    log::trace!("temporal::add_temporal_features");
    let dates = crate::date_column(df, "date")?;
    let teams = [
        crate::string_column(df, &Side::Home.suffixed("team"))?,
        crate::string_column(df, &Side::Away.suffixed("team"))?,
    ];
    let qbs = [
        crate::string_column(df, &Side::Home.suffixed("qb"))?,
        crate::string_column(df, &Side::Away.suffixed("qb"))?,
    ];

    // (date, team) -> that game's starting quarterback
    let by_team: AsOfIndex<&str, i32, Option<&str>> = AsOfIndex::new(
        (0..2)
            .flat_map(|side| {
                dates
                    .iter()
                    .zip(&teams[side])
                    .zip(&qbs[side])
                    .map(|((date, team), qb)| (*date, team.as_deref(), qb.as_deref()))
            })
            .filter_map(|(date, team, qb)| Some((date?, team?, qb))),
    );
    // (date, qb) for every start
    let by_qb: AsOfIndex<&str, i32, ()> = AsOfIndex::new(
        (0..2)
            .flat_map(|side| dates.iter().zip(&qbs[side]))
            .filter_map(|(date, qb)| Some(((*date)?, qb.as_deref()?, ()))),
    );

    let mut columns = Vec::with_capacity(8);
    for (side, (teams, qbs)) in Side::BOTH.iter().zip(teams.iter().zip(&qbs)) {
        let mut date_prev = Vec::with_capacity(df.height());
        let mut qb_prev = Vec::with_capacity(df.height());
        let mut rest = Vec::with_capacity(df.height());
        let mut exp = Vec::with_capacity(df.height());

        for ((date, team), qb) in dates.iter().zip(teams).zip(qbs) {
            let prior = match (date, team) {
                (Some(date), Some(team)) => by_team.prior(team.as_str(), *date),
                _ => None,
            };
            date_prev.push(prior.map(|(at, _)| at));
            qb_prev.push(prior.and_then(|(_, qb)| qb.map(str::to_string)));
            rest.push(date.map(|date| rest_days(date, prior.map(|(at, _)| at))));
            exp.push(match (date, qb) {
                (Some(date), Some(qb)) => Some(by_qb.count_prior(qb.as_str(), *date) as i64),
                _ => None,
            });
        }

        columns.push(Series::new(&side.suffixed("qb_prev"), qb_prev));
        columns.push(Series::new(&side.suffixed("exp"), exp));
        columns.push(crate::date_series(&side.suffixed("date_prev"), date_prev)?);
        columns.push(Series::new(&side.suffixed("rest_days"), rest));
    }

    let out = df.hstack(&columns)?;
    log::debug!("Added temporal features to {} games", out.height());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn games(rows: &[(i32, &str, &str, &str, &str)]) -> DataFrame {
        let dates: Vec<Option<i32>> = rows.iter().map(|r| Some(r.0)).collect();
        let mut df = df!(
            "team_home" => rows.iter().map(|r| r.1).collect::<Vec<_>>(),
            "team_away" => rows.iter().map(|r| r.2).collect::<Vec<_>>(),
            "qb_home" => rows.iter().map(|r| r.3).collect::<Vec<_>>(),
            "qb_away" => rows.iter().map(|r| r.4).collect::<Vec<_>>(),
        )
        .unwrap();
        df.with_column(crate::date_series("date", dates).unwrap())
            .unwrap();
        df
    }

    fn ints(df: &DataFrame, name: &str) -> Vec<Option<i64>> {
        crate::id_column(df, name).unwrap()
    }

    #[test]
    fn rest_days_are_clipped_and_defaulted() {
        assert_eq!(rest_days(1000, Some(800)), 16);
        assert_eq!(rest_days(1000, Some(999)), 3);
        assert_eq!(rest_days(1000, Some(993)), 7);
        assert_eq!(rest_days(1000, Some(990)), 10);
        assert_eq!(rest_days(1000, None), 7);
    }

    #[test]
    fn previous_game_is_latest_strictly_earlier_one() {
        // NE plays on day 100 (home), 107 (away) and 121 (home)
        let df = games(&[
            (100, "NE", "MIA", "brady", "tua"),
            (107, "BUF", "NE", "allen", "brady"),
            (121, "NE", "NYJ", "jones", "wilson"),
        ]);
        let out = add_temporal_features(&df).unwrap();

        let date_prev = crate::date_column(&out, "date_prev_home").unwrap();
        assert_eq!(date_prev, [None, None, Some(107)]);
        let date_prev = crate::date_column(&out, "date_prev_away").unwrap();
        assert_eq!(date_prev, [None, Some(100), None]);

        assert_eq!(ints(&out, "rest_days_home"), [Some(7), Some(7), Some(14)]);
        assert_eq!(ints(&out, "rest_days_away"), [Some(7), Some(7), Some(7)]);

        let qb_prev = crate::string_column(&out, "qb_prev_home").unwrap();
        assert_eq!(qb_prev, [None, None, Some("brady".to_string())]);
    }

    #[test]
    fn quarterback_experience_counts_prior_starts_on_any_team() {
        let df = games(&[
            (100, "NE", "MIA", "brady", "tua"),
            (107, "BUF", "NE", "allen", "brady"),
            (400, "TB", "NO", "brady", "brees"),
        ]);
        let out = add_temporal_features(&df).unwrap();
        assert_eq!(ints(&out, "exp_home"), [Some(0), Some(0), Some(2)]);
        assert_eq!(ints(&out, "exp_away"), [Some(0), Some(1), Some(0)]);
        // first tracked game for TB
        assert_eq!(ints(&out, "rest_days_home"), [Some(7), Some(7), Some(7)]);
    }

    #[test]
    fn long_gap_and_short_week_are_clipped() {
        let df = games(&[
            (100, "NE", "MIA", "a", "b"),
            (101, "NE", "NYJ", "a", "c"),
            (301, "NE", "BUF", "a", "d"),
        ]);
        let out = add_temporal_features(&df).unwrap();
        assert_eq!(ints(&out, "rest_days_home"), [Some(7), Some(3), Some(16)]);
    }

    #[test]
    fn same_day_games_do_not_match_themselves() {
        let df = games(&[(100, "NE", "MIA", "a", "b"), (100, "NE", "NYJ", "a", "c")]);
        let out = add_temporal_features(&df).unwrap();
        assert_eq!(
            crate::date_column(&out, "date_prev_home").unwrap(),
            [None, None]
        );
        assert_eq!(ints(&out, "rest_days_home"), [Some(7), Some(7)]);
    }
}
