use parse_display::{Display, FromStr};
use std::path::PathBuf;

/// How `qb_points` is derived from the per-quarterback aggregates.
///
/// Both `qb_epa` and `def_eps` are published regardless of the choice, so
/// downstream code can always recompute the other variant.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Display, FromStr)]
#[display(style = "kebab-case")]
pub enum PointsFormula {
    /// Offensive EPA credited to the starting quarterback.
    #[default]
    Raw,
    /// Offensive EPA minus the opponent defense's zero-centered EPS baseline.
    DefenseAdjusted,
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Directory holding the GAME, TEAM, SCHEDULE, PLAY, PASS, RUSH, DRIVE and PLAYER tables
    pub data_dir: PathBuf,
    /// Keep games whose team or quarterback records are not available yet
    pub allow_incomplete: bool,
    pub points: PointsFormula,
}

impl Config {
    pub fn new<P: Into<PathBuf>>(data_dir: P) -> Self {
        Config {
            data_dir: data_dir.into(),
            allow_incomplete: false,
            points: PointsFormula::default(),
        }
    }

    pub fn allow_incomplete(mut self, allow: bool) -> Self {
        self.allow_incomplete = allow;
        self
    }

    pub fn points(mut self, points: PointsFormula) -> Self {
        self.points = points;
        self
    }
}
