//! League standings and match prediction CLI
//!
//! Group tables with elimination tracking, and win probabilities from a small
//! neural classifier with a heuristic fallback.

use clap::{Parser, Subcommand};
use league::{Config, Result};

#[derive(Parser)]
#[command(name = "league")]
#[command(about = "Esports league standings and match prediction", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new project with default config
    Init,
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Enter the result of a match
    Result {
        /// Match ID
        match_id: i64,
        /// Team 1 score (rounds for BO1, maps won otherwise)
        #[arg(long, default_value = "0")]
        t1: u32,
        /// Team 2 score
        #[arg(long, default_value = "0")]
        t2: u32,
        /// Winner name or tag, when the scores do not decide it
        #[arg(long)]
        winner: Option<String>,
        /// Mark the match as a forfeit
        #[arg(long)]
        forfeit: bool,
        /// Map result as NAME:T1-T2, in play order (repeatable)
        #[arg(long = "map")]
        maps: Vec<String>,
    },
    /// Show group standings
    Standings {
        /// Only show this group
        #[arg(long)]
        group: Option<String>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Predict a match between two teams
    Predict {
        /// Team A name or tag
        team_a: String,
        /// Team B name or tag
        team_b: String,
        /// Week of the match (defaults to the week after the latest)
        #[arg(long)]
        week: Option<u32>,
        /// Map to compare the teams on (repeatable)
        #[arg(long = "map")]
        maps: Vec<String>,
        /// Expected team A player (repeatable)
        #[arg(long = "a-player")]
        a_players: Vec<String>,
        /// Expected team B player (repeatable)
        #[arg(long = "b-player")]
        b_players: Vec<String>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Predict every scheduled match
    Upcoming {
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Retrain the prediction model
    Train {
        /// Override number of epochs
        #[arg(long)]
        epochs: Option<usize>,
        /// Build features from the full history instead of earlier weeks only
        #[arg(long)]
        full_history: bool,
    },
    /// Show the top players by average combat score
    Leaderboard {
        /// Minimum number of matches played
        #[arg(long, default_value = "1")]
        min_games: usize,
        /// Number of players to show
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
enum DataCommands {
    /// Import a league snapshot from a JSON file
    Import {
        /// Path to the JSON snapshot
        path: String,
    },
    /// Show database status
    Status,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Init => commands::init(&cli.config),
        Commands::Data { action } => match action {
            DataCommands::Import { path } => commands::data_import(&config, &path),
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Result {
            match_id,
            t1,
            t2,
            winner,
            forfeit,
            maps,
        } => commands::enter_result(&config, match_id, t1, t2, winner, forfeit, &maps),
        Commands::Standings { group, format } => commands::standings(&config, group, format),
        Commands::Predict {
            team_a,
            team_b,
            week,
            maps,
            a_players,
            b_players,
            format,
        } => commands::predict(
            &config,
            &team_a,
            &team_b,
            week,
            maps,
            &a_players,
            &b_players,
            format,
        ),
        Commands::Upcoming { format } => commands::upcoming(&config, format),
        Commands::Train {
            epochs,
            full_history,
        } => commands::train(&config, epochs, full_history),
        Commands::Leaderboard {
            min_games,
            limit,
            format,
        } => commands::leaderboard(&config, min_games, limit, format),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use league::data::{Database, LeagueSnapshot, ScoreEntry};
    use league::features::{player_leaderboard, MatchupOverrides};
    use league::predict::{
        format_prediction, DefaultBackend, PredictionSource, Predictor, TrainOutcome,
    };
    use league::standings::standings_for;
    use league::{LeagueError, MatchId, MatchMap, PlayerId, TeamId};

    type CliPredictor = Predictor<DefaultBackend, Database>;

    fn open_predictor(config: &Config) -> Result<CliPredictor> {
        let db = Database::open(&config.data.database_path)?;
        CliPredictor::load(db, config.clone(), Default::default())
    }

    fn resolve_team(snapshot: &LeagueSnapshot, name: &str) -> Result<TeamId> {
        snapshot
            .find_team(name)
            .map(|t| t.id)
            .ok_or_else(|| LeagueError::UnknownTeamName(name.to_string()))
    }

    fn resolve_players(snapshot: &LeagueSnapshot, names: &[String]) -> Result<Vec<PlayerId>> {
        names
            .iter()
            .map(|name| {
                let wanted = name.trim().to_lowercase();
                snapshot
                    .players
                    .iter()
                    .find(|p| {
                        p.name.to_lowercase() == wanted
                            || p.riot_id.as_ref().is_some_and(|r| r.to_lowercase() == wanted)
                    })
                    .map(|p| p.id)
                    .or_else(|| name.trim().parse().ok().map(PlayerId))
                    .ok_or_else(|| LeagueError::Parse(format!("Unknown player: {}", name)))
            })
            .collect()
    }

    /// Parse a map result written as NAME:T1-T2
    pub(crate) fn parse_map_result(
        match_id: MatchId,
        map_index: u32,
        teams: (TeamId, TeamId),
        text: &str,
    ) -> Result<MatchMap> {
        let invalid =
            || LeagueError::Parse(format!("Invalid map result '{}', expected NAME:13-9", text));
        let (name, score) = text.rsplit_once(':').ok_or_else(invalid)?;
        let (r1, r2) = score.split_once('-').ok_or_else(invalid)?;
        let team1_rounds: u32 = r1.trim().parse().map_err(|_| invalid())?;
        let team2_rounds: u32 = r2.trim().parse().map_err(|_| invalid())?;

        let winner = match team1_rounds.cmp(&team2_rounds) {
            std::cmp::Ordering::Greater => Some(teams.0),
            std::cmp::Ordering::Less => Some(teams.1),
            std::cmp::Ordering::Equal => None,
        };

        Ok(MatchMap {
            match_id,
            map_index,
            map_name: name.trim().to_string(),
            team1_rounds,
            team2_rounds,
            winner,
            is_forfeit: false,
        })
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        let db = Database::open(&config.data.database_path)?;
        drop(db);
        println!("Created database at {}", config.data.database_path);

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'league data import league.json' to load teams and matches");
        println!("  3. Run 'league standings' to see the group tables");
        println!("  4. Run 'league train' and 'league predict \"Team A\" \"Team B\"'");

        Ok(())
    }

    pub fn data_import(config: &Config, path: &str) -> Result<()> {
        let snapshot = LeagueSnapshot::from_file(path)?;
        let db = Database::open(&config.data.database_path)?;
        let summary = db.import_snapshot(&snapshot)?;

        println!("Imported from {}", path);
        println!("  Teams:        {}", summary.teams);
        println!("  Players:      {}", summary.players);
        println!("  Matches:      {}", summary.matches);
        println!("  Maps:         {}", summary.maps);
        println!("  Stat lines:   {}", summary.player_stats);
        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:       {}", config.data.database_path);
        println!("  Teams:      {}", stats.team_count);
        println!("  Players:    {}", stats.player_count);
        println!("  Completed:  {}", stats.completed_matches);
        println!("  Scheduled:  {}", stats.scheduled_matches);
        if let Some(week) = stats.latest_week {
            println!("  Latest wk:  {}", week);
        }
        println!("  Models:     {}", stats.model_versions);

        Ok(())
    }

    pub fn enter_result(
        config: &Config,
        match_id: i64,
        t1: u32,
        t2: u32,
        winner: Option<String>,
        forfeit: bool,
        maps: &[String],
    ) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let id = MatchId(match_id);
        let existing = db.get_match(id)?;
        let teams = (existing.team1, existing.team2);

        let winner = match winner {
            Some(name) => Some(
                db.find_team_by_name(&name)?
                    .ok_or(LeagueError::UnknownTeamName(name))?
                    .id,
            ),
            None => None,
        };
        let maps = maps
            .iter()
            .enumerate()
            .map(|(i, text)| parse_map_result(id, i as u32, teams, text))
            .collect::<Result<Vec<_>>>()?;

        let record = db.record_result(
            id,
            &ScoreEntry {
                score_t1: t1,
                score_t2: t2,
                winner,
                is_forfeit: forfeit,
                maps,
            },
        )?;

        let name = |team: TeamId| -> Result<String> { Ok(db.get_team(team)?.name) };
        println!(
            "Recorded week {}: {} {} - {} {}",
            record.week,
            name(record.team1)?,
            record.score_t1,
            record.score_t2,
            name(record.team2)?
        );
        if let Some(w) = record.winner {
            println!("Winner: {}", name(w)?);
        }
        Ok(())
    }

    pub fn standings(config: &Config, group: Option<String>, format: OutputFormat) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let snapshot = LeagueSnapshot::load(&db)?;
        let (mut tables, mut races) = standings_for(&snapshot, &config.standings)?;

        if let Some(wanted) = group {
            tables.retain(|g, _| g.eq_ignore_ascii_case(&wanted));
            races.retain(|r| r.group.eq_ignore_ascii_case(&wanted));
            if tables.is_empty() {
                return Err(LeagueError::Parse(format!("Unknown group: {}", wanted)));
            }
        }

        match format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "groups": tables, "playoff_race": races });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Table => {
                for (group, rows) in &tables {
                    println!("\nGroup {}", group);
                    println!(
                        "{:>3}  {:<24} {:>3} {:>3} {:>3} {:>5} {:>5} {:>5} {:>4}",
                        "#", "Team", "P", "W", "L", "Pts", "PA", "PD", "Rem"
                    );
                    println!("{}", "─".repeat(68));
                    for (i, row) in rows.iter().enumerate() {
                        println!(
                            "{:>3}  {:<24} {:>3} {:>3} {:>3} {:>5} {:>5} {:>+5} {:>4}{}",
                            i + 1,
                            row.name,
                            row.played,
                            row.wins,
                            row.losses,
                            row.points,
                            row.points_against,
                            row.point_diff,
                            row.remaining,
                            if row.eliminated { "  out" } else { "" }
                        );
                    }
                }

                if !races.is_empty() {
                    println!("\nPlayoff race");
                    for race in &races {
                        println!(
                            "  {} ({}) vs {}: win to reach {} points",
                            race.team_name, race.group, race.opponent_name, race.points_if_win
                        );
                    }
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn predict(
        config: &Config,
        team_a: &str,
        team_b: &str,
        week: Option<u32>,
        maps: Vec<String>,
        a_players: &[String],
        b_players: &[String],
        format: OutputFormat,
    ) -> Result<()> {
        let predictor = open_predictor(config)?;
        let snapshot = LeagueSnapshot::load(predictor.store())?;

        let a = resolve_team(&snapshot, team_a)?;
        let b = resolve_team(&snapshot, team_b)?;
        let overrides = MatchupOverrides {
            team_a_players: resolve_players(&snapshot, a_players)?,
            team_b_players: resolve_players(&snapshot, b_players)?,
            maps,
        };

        let prediction = predictor
            .predict(&snapshot, a, b, week, &overrides)
            .ok_or_else(|| LeagueError::UnknownTeamName(format!("{} / {}", team_a, team_b)))?;
        let (name_a, name_b) = (snapshot.team_name(a), snapshot.team_name(b));

        match format {
            OutputFormat::Table => {
                print!("{}", format_prediction(&prediction, &name_a, &name_b));
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "team_a": name_a,
                    "team_b": name_b,
                    "prediction": prediction,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
        }
        Ok(())
    }

    pub fn upcoming(config: &Config, format: OutputFormat) -> Result<()> {
        let predictor = open_predictor(config)?;
        let snapshot = LeagueSnapshot::load(predictor.store())?;
        let upcoming = predictor.predict_upcoming(&snapshot);

        match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&upcoming)?);
            }
            OutputFormat::Table => {
                if upcoming.is_empty() {
                    println!("No scheduled matches");
                    return Ok(());
                }
                let mut current_week = None;
                for item in &upcoming {
                    if current_week != Some(item.week) {
                        println!("\nWeek {}", item.week);
                        current_week = Some(item.week);
                    }
                    let p = &item.prediction;
                    let source = match p.source {
                        PredictionSource::Model(v) => v.to_string(),
                        PredictionSource::Heuristic => "heuristic".to_string(),
                    };
                    println!(
                        "  {:<22} {:>5.1}%  vs  {:>5.1}%  {:<22} [{}]",
                        snapshot.team_name(p.team_a),
                        p.team_a_win_prob * 100.0,
                        p.team_b_win_prob * 100.0,
                        snapshot.team_name(p.team_b),
                        source
                    );
                }
            }
        }
        Ok(())
    }

    pub fn train(config: &Config, epochs: Option<usize>, full_history: bool) -> Result<()> {
        let mut training_config = config.clone();
        if let Some(e) = epochs {
            training_config.training.epochs = e;
        }
        if full_history {
            training_config.training.walk_forward = false;
        }

        let predictor = open_predictor(&training_config)?;
        let snapshot = LeagueSnapshot::load(predictor.store())?;

        match predictor.retrain(&snapshot)? {
            TrainOutcome::Trained { version, report } => {
                println!("Trained model {}", version);
                println!("  Examples:   {}", report.examples);
                println!("  Epochs:     {}", report.epochs);
                println!("  Loss:       {:.4} -> {:.4}", report.initial_loss, report.final_loss);
                println!("  Accuracy:   {:.1}%", report.accuracy * 100.0);
            }
            TrainOutcome::InsufficientData { found, required } => {
                println!(
                    "Not enough completed matches to train ({} found, {} required)",
                    found, required
                );
            }
        }
        Ok(())
    }

    pub fn leaderboard(
        config: &Config,
        min_games: usize,
        limit: usize,
        format: OutputFormat,
    ) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let snapshot = LeagueSnapshot::load(&db)?;
        let board = player_leaderboard(&snapshot, min_games, limit);

        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&board)?),
            OutputFormat::Table => {
                println!(
                    "{:>3}  {:<20} {:>5} {:>7} {:>6} {:>6} {:>5}",
                    "#", "Player", "Games", "ACS", "K", "D", "K/D"
                );
                println!("{}", "─".repeat(60));
                for (i, entry) in board.iter().enumerate() {
                    println!(
                        "{:>3}  {:<20} {:>5} {:>7.1} {:>6} {:>6} {:>5.2}",
                        i + 1,
                        entry.name,
                        entry.games,
                        entry.avg_acs,
                        entry.kills,
                        entry.deaths,
                        entry.kd
                    );
                }
            }
        }
        Ok(())
    }
}
