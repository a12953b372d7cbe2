use polars::prelude::*;

/// Historical team abbreviations and the current franchise name they map to.
pub static FRANCHISE_RENAMES: &[(&str, &str)] = &[
    ("JAC", "JAX"),
    ("SD", "LAC"),
    ("STL", "LA"),
    ("OAK", "LV"),
];

pub fn canonical_team(name: &str) -> &str {
    FRANCHISE_RENAMES
        .iter()
        .find(|(old, _)| *old == name)
        .map(|(_, new)| *new)
        .unwrap_or(name)
}

/// Rewrites a team column expression so every historical name becomes the current one.
pub fn canonicalize(team: Expr) -> Expr {
    let team = team.cast(DataType::String);
    FRANCHISE_RENAMES
        .iter()
        .fold(team.clone(), |acc, (old, new)| {
            when(team.clone().eq(lit(*old)))
                .then(lit(*new))
                .otherwise(acc)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relocated_franchises_use_current_name() {
        assert_eq!(canonical_team("SD"), "LAC");
        assert_eq!(canonical_team("STL"), "LA");
        assert_eq!(canonical_team("JAC"), "JAX");
        assert_eq!(canonical_team("NE"), "NE");
    }

    #[test]
    fn canonicalize_rewrites_column() {
        let df = df!("team" => ["SD", "LAC", "STL", "NE"]).unwrap();
        let out = df
            .lazy()
            .select([canonicalize(col("team")).alias("team")])
            .collect()
            .unwrap();
        let teams: Vec<_> = out
            .column("team")
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .map(|t| t.unwrap().to_string())
            .collect();
        assert_eq!(teams, ["LAC", "LAC", "LA", "NE"]);
    }
}
