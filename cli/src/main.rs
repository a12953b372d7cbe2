use anyhow::{bail, Result};
use clap::Parser;
use itertools::Itertools;
use log::LevelFilter;
use parse_display::{Display, FromStr};
use polars::prelude::*;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use spreadline::{
    filter::{filter_sql, GameFilter},
    validate::{check_game_counts, check_ranges, first_incomplete_season, FeatureRange},
    Config, GameTable, PointsFormula,
};
use std::path::PathBuf;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display, FromStr)]
#[display(style = "lowercase")]
enum Format {
    Parquet,
    Csv,
}

impl Format {
    fn from_path(path: &std::path::Path) -> Option<Self> {
        path.extension()?.to_str()?.parse().ok()
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Directory holding GAME, TEAM, SCHEDULE, PLAY, PASS, RUSH, DRIVE and PLAYER tables
    #[arg(short = 'd', long = "data-dir", env = "SPREADLINE_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Write the table here instead of printing it
    #[arg(short = 'o', long = "output", value_name = "FILE", env = "SPREADLINE_OUTPUT")]
    output: Option<PathBuf>,

    /// Output format, inferred from the output extension when omitted
    #[arg(long)]
    format: Option<Format>,

    #[arg(short = 's', long = "season")]
    season: Option<i64>,

    #[arg(long = "season-from", requires = "season_to")]
    season_from: Option<i64>,

    #[arg(long = "season-to", requires = "season_from")]
    season_to: Option<i64>,

    #[arg(short = 'w', long = "week")]
    week: Option<i64>,

    #[arg(short = 't', long = "team")]
    team: Option<String>,

    /// SQL run against the built table, registered as `games`
    #[arg(short = 'q', long = "query")]
    query: Option<String>,

    /// Keep games whose team or quarterback records are not available yet
    #[arg(long, env = "SPREADLINE_ALLOW_INCOMPLETE")]
    allow_incomplete: bool,

    /// How qb_points is computed: raw or defense-adjusted
    #[arg(long, env = "SPREADLINE_POINTS", default_value = "raw")]
    points: PointsFormula,

    /// Check game counts and value ranges before writing
    #[arg(long)]
    validate: bool,

    /// First season excluded from game count checks, defaults to the current year
    #[arg(long = "complete-before", value_name = "SEASON", requires = "validate")]
    complete_before: Option<i64>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set the default level based on verbosity
    let default_level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let config = ConfigBuilder::new().add_filter_allow_str("spreadline").build();

    TermLogger::init(
        default_level,
        config,
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    log::trace!("Args {:#?}", args);

    let config = Config::new(&args.data_dir)
        .allow_incomplete(args.allow_incomplete)
        .points(args.points);
    let table = GameTable::build(&config)?;
    log::info!("Loaded {} games from {}", table.height(), args.data_dir.display());

    if args.validate {
        let before = args.complete_before.unwrap_or_else(first_incomplete_season);
        validate(&table, before)?;
    }

    let mut filter = GameFilter::new();
    if let Some(season) = args.season {
        filter = filter.season(season);
    }
    if let (Some(start), Some(end)) = (args.season_from, args.season_to) {
        if start > end {
            bail!("--season-from {} is after --season-to {}", start, end);
        }
        filter = filter.season_range(start, end);
    }
    if let Some(week) = args.week {
        filter = filter.week(week);
    }
    if let Some(team) = &args.team {
        filter = filter.team(team);
    }

    let mut lf = table.into_inner().lazy().filter(filter.build());
    if let Some(query) = &args.query {
        lf = filter_sql(lf, query)?;
    }
    let mut df = lf.collect()?;
    log::info!("{} games selected", df.height());

    match &args.output {
        Some(path) => {
            let format = match args.format.or_else(|| Format::from_path(path)) {
                Some(format) => format,
                None => bail!("Cannot infer output format for {}. Use --format parquet or csv", path.display()),
            };
            let mut file = std::fs::File::create(path)?;
            match format {
                Format::Parquet => {
                    ParquetWriter::new(&mut file).finish(&mut df)?;
                }
                Format::Csv => {
                    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
                }
            }
            log::info!("Wrote {} games as {} to {}", df.height(), format, path.display());
        }
        None => println!("{}", df),
    }

    Ok(())
}

fn validate(table: &GameTable, before_season: i64) -> Result<()> {
    check_game_counts(table, before_season)?;
    check_ranges(table, &FeatureRange::defaults())?;
    log::info!(
        "Validated game counts for seasons {}",
        table
            .column("season")?
            .i64()?
            .into_iter()
            .flatten()
            .filter(|season| *season < before_season)
            .unique()
            .sorted()
            .join(", ")
    );
    Ok(())
}
