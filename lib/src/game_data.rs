use crate::{
    join, quarterback::QuarterbackStats, schema, tables::Tables, temporal, Config, Result,
};
use derive_deref::Deref;
use polars::prelude::*;

/// The assembled model input: one row per game, home and away features side
/// by side, in the published column order.
#[derive(Clone, Deref)]
pub struct GameTable(DataFrame);

impl GameTable {
    /// Loads every table from `config.data_dir` and builds the game table.
    pub fn build(config: &Config) -> Result<Self> {
        log::trace!("game_data::build");
        let tables = Tables::load(&config.data_dir)?;
        Self::from_tables(&tables, config)
    }

    pub fn from_tables(tables: &Tables, config: &Config) -> Result<Self> {
        let quarterbacks = QuarterbackStats::compute(
            &tables.plays,
            &tables.passes,
            &tables.rushes,
            &tables.drives,
            &tables.players,
            config.points,
        )?;
        let team_games = join::team_games(&tables.teams, &quarterbacks, config.allow_incomplete)?;
        let games = join::join_games(
            &tables.games,
            &tables.schedule,
            &team_games,
            config.allow_incomplete,
        )?;
        let games = games.sort(
            ["date", "team_home", "game_id"],
            SortMultipleOptions::default().with_maintain_order(true),
        )?;

        let games = temporal::add_temporal_features(&games)?;
        let df = schema::assemble(games)?;
        log::info!("Built {} games with {} columns", df.height(), df.width());
        Ok(GameTable(df))
    }

    pub fn filter(self, filter: Expr) -> Result<Self> {
        let df = self.0.lazy().filter(filter).collect()?;
        Ok(GameTable(df))
    }

    pub fn into_inner(self) -> DataFrame {
        self.0
    }
}
