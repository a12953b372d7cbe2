use crate::{validate::LAST_REGULAR_SEASON_WEEK, Result};
use polars::{prelude::*, sql::SQLContext};

/// Runs a SQL query against the game table, registered as `games`.
pub fn filter_sql(df: LazyFrame, query: &str) -> Result<LazyFrame> {
    let mut ctx = SQLContext::new();
    ctx.register("games", df);
    let df = ctx.execute(query)?;
    Ok(df)
}

#[derive(Clone, Default)]
pub struct GameFilter {
    filter_expr: Option<Expr>,
}

impl GameFilter {
    pub fn new() -> Self {
        Self { filter_expr: None }
    }

    // Matches the team on either side
    pub fn team(self, team_name: &str) -> Self {
        let team_name = crate::teams::canonical_team(team_name);
        let expr = col("team_home")
            .eq(lit(team_name))
            .or(col("team_away").eq(lit(team_name)));
        self.extend_filter(expr)
    }

    pub fn season(self, season: i64) -> Self {
        self.extend_filter(col("season").eq(lit(season)))
    }

    pub fn season_range(self, start: i64, end: i64) -> Self {
        let expr = col("season").is_between(lit(start), lit(end), ClosedInterval::Both);
        self.extend_filter(expr)
    }

    pub fn week(self, week: i64) -> Self {
        self.extend_filter(col("week").eq(lit(week)))
    }

    pub fn week_range(self, start: i64, end: i64) -> Self {
        let expr = col("week").is_between(lit(start), lit(end), ClosedInterval::Both);
        self.extend_filter(expr)
    }

    pub fn regular_season(self) -> Self {
        self.extend_filter(col("week").lt_eq(lit(LAST_REGULAR_SEASON_WEEK)))
    }

    pub fn postseason(self) -> Self {
        self.extend_filter(col("week").gt(lit(LAST_REGULAR_SEASON_WEEK)))
    }

    // Combines the current filter with a new one using AND logic
    fn extend_filter(mut self, new_expr: Expr) -> Self {
        self.filter_expr = match self.filter_expr.take() {
            Some(existing_expr) => Some(existing_expr.and(new_expr)),
            None => Some(new_expr),
        };
        self
    }

    // Builds the final filter expression
    pub fn build(self) -> Expr {
        self.filter_expr.unwrap_or_else(|| lit(true))
    }
}
