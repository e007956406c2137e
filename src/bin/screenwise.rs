//! Screenwise CLI - command-line front end for the Screenwise engine
//!
//! Commands mirror the app's REST surface:
//! - user: register, profile, settings, link-music
//! - screen-time: add, history
//! - mood: record, latest
//! - recommend: generate, list, accept
//! - music: playlist, save, saved, unlink
//! - challenge: create, list, join, progress, leaderboard
//! - contact: submit a contact message
//! - doctor: diagnose configuration and store health

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use screenwise::challenge::NewChallenge;
use screenwise::config::{Config, MusicProvider};
use screenwise::mood::MoodOutcome;
use screenwise::music::{MusicCatalog, StaticCatalog};
use screenwise::screen_time::{DateInput, RawTab, ScreenTimeUpload};
use screenwise::store::{Database, STORE_VERSION};
use screenwise::types::{Mood, MusicToken, Preferences};
use screenwise::{logging, Wellness, WellnessError, PRODUCT_NAME, SCREENWISE_VERSION};

/// Screenwise - screen-time, mood and challenge tracking
#[derive(Parser)]
#[command(name = "screenwise")]
#[command(version = SCREENWISE_VERSION)]
#[command(about = "Track screen time and mood, get recommendations, run challenges", long_about = None)]
struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "auto")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct UserArg {
    /// Acting user id
    #[arg(short, long)]
    user: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage user accounts
    #[command(subcommand)]
    User(UserCommand),

    /// Upload and inspect screen time
    #[command(subcommand)]
    ScreenTime(ScreenTimeCommand),

    /// Report and inspect mood
    #[command(subcommand)]
    Mood(MoodCommand),

    /// Generate and review recommendations
    #[command(subcommand)]
    Recommend(RecommendCommand),

    /// Mood-matched playlists
    #[command(subcommand)]
    Music(MusicCommand),

    /// Screen-time reduction challenges
    #[command(subcommand)]
    Challenge(ChallengeCommand),

    /// Send a contact message
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },

    /// Diagnose configuration and store health
    Doctor,
}

#[derive(Subcommand)]
enum UserCommand {
    /// Create a user
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
    },
    /// Show a user's profile
    Profile(UserArg),
    /// Replace a user's preferences
    Settings {
        #[command(flatten)]
        who: UserArg,
        #[arg(long)]
        webcam: bool,
        /// Reminder interval in minutes
        #[arg(long)]
        notify_every: Option<u32>,
        #[arg(long)]
        hide_from_leaderboard: bool,
    },
    /// Store a music token obtained from the provider
    LinkMusic {
        #[command(flatten)]
        who: UserArg,
        #[arg(long)]
        access_token: String,
        #[arg(long)]
        refresh_token: Option<String>,
        /// Token lifetime in seconds
        #[arg(long, default_value = "3600")]
        expires_in: i64,
    },
}

#[derive(Subcommand)]
enum ScreenTimeCommand {
    /// Upload a screen-time increment
    Add {
        #[command(flatten)]
        who: UserArg,
        /// Upload JSON file (use - for stdin); overrides the flags below
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Seconds of screen time
        #[arg(long)]
        total_time: Option<f64>,
        /// Per-site time as URL=SECONDS (repeatable)
        #[arg(long = "tab")]
        tabs: Vec<String>,
        /// Day as YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// List all recorded days, newest first
    History(UserArg),
}

#[derive(Subcommand)]
enum MoodCommand {
    /// Report a detected mood
    Record {
        #[command(flatten)]
        who: UserArg,
        #[arg(long)]
        mood: String,
        #[arg(long)]
        confidence: f64,
    },
    /// Show the latest stored mood
    Latest(UserArg),
}

#[derive(Subcommand)]
enum RecommendCommand {
    /// Generate a new recommendation
    Generate(UserArg),
    /// List the most recent recommendations
    List(UserArg),
    /// Accept or decline a recommendation
    Accept {
        #[command(flatten)]
        who: UserArg,
        #[arg(long)]
        id: String,
        #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
        accepted: bool,
    },
}

#[derive(Subcommand)]
enum MusicCommand {
    /// Suggest a playlist for a mood
    Playlist {
        #[command(flatten)]
        who: UserArg,
        #[arg(long, default_value = "default")]
        mood: String,
        /// Ask for a different playlist than the cached one
        #[arg(long)]
        skip: bool,
    },
    /// Save (or unsave) a suggested playlist
    Save {
        #[command(flatten)]
        who: UserArg,
        #[arg(long)]
        id: String,
        #[arg(long)]
        unsave: bool,
    },
    /// List saved playlists
    Saved(UserArg),
    /// Remove the music token and saved playlists
    Unlink(UserArg),
}

#[derive(Subcommand)]
enum ChallengeCommand {
    /// Create a challenge
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// Duration in days
        #[arg(long)]
        duration: u32,
        /// Daily reduction goal in minutes
        #[arg(long)]
        goal: f64,
        /// Start date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        start: String,
    },
    /// List running and upcoming challenges
    List,
    /// Join a challenge
    Join {
        #[command(flatten)]
        who: UserArg,
        #[arg(long)]
        id: String,
    },
    /// Recompute progress for a participant
    Progress {
        #[command(flatten)]
        who: UserArg,
        #[arg(long)]
        id: String,
        /// Bypass the hourly rate limit
        #[arg(long)]
        manual: bool,
    },
    /// Show the top participants
    Leaderboard {
        #[arg(long)]
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Pretty JSON on a terminal, compact JSON otherwise
    Auto,
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), ScreenwiseCliError> {
    let config = Config::load(cli.config.as_deref())?;
    logging::init(&config.log)?;
    let format = cli.format;

    if let Commands::Doctor = cli.command {
        return cmd_doctor(&config, cli.config.as_deref(), format);
    }

    let catalog = build_catalog(&config)?;
    let mut app = Wellness::open(&config, catalog)?;

    let mutated = match cli.command {
        Commands::User(cmd) => cmd_user(&mut app, cmd, format)?,
        Commands::ScreenTime(cmd) => cmd_screen_time(&mut app, cmd, format)?,
        Commands::Mood(cmd) => cmd_mood(&mut app, cmd, format)?,
        Commands::Recommend(cmd) => cmd_recommend(&mut app, cmd, format)?,
        Commands::Music(cmd) => cmd_music(&mut app, cmd, format)?,
        Commands::Challenge(cmd) => cmd_challenge(&mut app, cmd, format)?,
        Commands::Contact {
            name,
            email,
            message,
        } => {
            emit(&app.submit_contact(&name, &email, &message)?, format)?;
            true
        }
        Commands::Doctor => false,
    };

    if mutated {
        app.save()?;
    }
    Ok(())
}

fn build_catalog(config: &Config) -> Result<Box<dyn MusicCatalog>, ScreenwiseCliError> {
    match config.music.provider {
        MusicProvider::Static => {
            let catalog = match &config.music.catalog_path {
                Some(path) => StaticCatalog::load(path)?,
                None => StaticCatalog::new(),
            };
            Ok(Box::new(catalog))
        }
        #[cfg(feature = "spotify")]
        MusicProvider::Spotify => Ok(Box::new(screenwise::music::SpotifyCatalog::new(
            config.music.api_base.clone(),
        )?)),
        #[cfg(not(feature = "spotify"))]
        MusicProvider::Spotify => Err(ScreenwiseCliError::InvalidArgument(
            "spotify provider requires building with --features spotify".to_string(),
        )),
    }
}

type App = Wellness<Box<dyn MusicCatalog>>;

fn cmd_user(app: &mut App, cmd: UserCommand, format: OutputFormat) -> Result<bool, ScreenwiseCliError> {
    match cmd {
        UserCommand::Register { username, email } => {
            emit(&app.register(&username, &email)?, format)?;
            Ok(true)
        }
        UserCommand::Profile(who) => {
            emit(&app.profile(&who.user)?, format)?;
            Ok(false)
        }
        UserCommand::Settings {
            who,
            webcam,
            notify_every,
            hide_from_leaderboard,
        } => {
            let prefs = Preferences {
                webcam_enabled: webcam,
                notify_every,
                show_on_leaderboard: !hide_from_leaderboard,
            };
            emit(&app.update_settings(&who.user, prefs)?, format)?;
            Ok(true)
        }
        UserCommand::LinkMusic {
            who,
            access_token,
            refresh_token,
            expires_in,
        } => {
            let token = MusicToken {
                access_token,
                refresh_token,
                expires_in,
                obtained_at: Utc::now(),
            };
            app.link_music(&who.user, token)?;
            emit(&serde_json::json!({ "message": "music account linked" }), format)?;
            Ok(true)
        }
    }
}

fn cmd_screen_time(
    app: &mut App,
    cmd: ScreenTimeCommand,
    format: OutputFormat,
) -> Result<bool, ScreenwiseCliError> {
    match cmd {
        ScreenTimeCommand::Add {
            who,
            input,
            total_time,
            tabs,
            date,
        } => {
            let upload = match input {
                Some(path) => serde_json::from_str(&read_input(&path)?)?,
                None => ScreenTimeUpload {
                    total_time,
                    tabs: Some(tabs.iter().map(|t| parse_tab(t)).collect::<Result<_, _>>()?),
                    date: date.map(DateInput::Text),
                },
            };
            emit(&app.ingest_screen_time(&who.user, upload)?, format)?;
            Ok(true)
        }
        ScreenTimeCommand::History(who) => {
            emit(&app.screen_time_history(&who.user), format)?;
            Ok(false)
        }
    }
}

fn cmd_mood(app: &mut App, cmd: MoodCommand, format: OutputFormat) -> Result<bool, ScreenwiseCliError> {
    match cmd {
        MoodCommand::Record {
            who,
            mood,
            confidence,
        } => {
            let mood: Mood = mood.parse()?;
            let outcome = app.record_mood(&who.user, mood, confidence)?;
            let mutated = matches!(outcome, MoodOutcome::Recorded(_));
            emit(&outcome, format)?;
            Ok(mutated)
        }
        MoodCommand::Latest(who) => {
            emit(&app.latest_mood(&who.user)?, format)?;
            Ok(false)
        }
    }
}

fn cmd_recommend(
    app: &mut App,
    cmd: RecommendCommand,
    format: OutputFormat,
) -> Result<bool, ScreenwiseCliError> {
    match cmd {
        RecommendCommand::Generate(who) => {
            emit(&app.recommend(&who.user)?, format)?;
            Ok(true)
        }
        RecommendCommand::List(who) => {
            emit(&app.recent_recommendations(&who.user), format)?;
            Ok(false)
        }
        RecommendCommand::Accept { who, id, accepted } => {
            emit(&app.set_recommendation_accepted(&who.user, &id, accepted)?, format)?;
            Ok(true)
        }
    }
}

fn cmd_music(app: &mut App, cmd: MusicCommand, format: OutputFormat) -> Result<bool, ScreenwiseCliError> {
    match cmd {
        MusicCommand::Playlist { who, mood, skip } => {
            emit(&app.suggest_playlist(&who.user, &mood, skip)?, format)?;
            Ok(true)
        }
        MusicCommand::Save { who, id, unsave } => {
            emit(&app.set_playlist_saved(&who.user, &id, !unsave)?, format)?;
            Ok(true)
        }
        MusicCommand::Saved(who) => {
            emit(&app.saved_playlists(&who.user), format)?;
            Ok(false)
        }
        MusicCommand::Unlink(who) => {
            let removed = app.unlink_music(&who.user)?;
            emit(
                &serde_json::json!({ "message": "music account unlinked", "removed_playlists": removed }),
                format,
            )?;
            Ok(true)
        }
    }
}

fn cmd_challenge(
    app: &mut App,
    cmd: ChallengeCommand,
    format: OutputFormat,
) -> Result<bool, ScreenwiseCliError> {
    match cmd {
        ChallengeCommand::Create {
            title,
            description,
            duration,
            goal,
            start,
        } => {
            let new = NewChallenge {
                title,
                description,
                duration_days: Some(duration),
                goal_minutes: Some(goal),
                start_date: Some(start),
            };
            emit(&app.create_challenge(new)?, format)?;
            Ok(true)
        }
        ChallengeCommand::List => {
            emit(&app.visible_challenges(), format)?;
            Ok(false)
        }
        ChallengeCommand::Join { who, id } => {
            emit(&app.join_challenge(&id, &who.user)?, format)?;
            Ok(true)
        }
        ChallengeCommand::Progress { who, id, manual } => {
            emit(&app.update_progress(&id, &who.user, manual)?, format)?;
            Ok(true)
        }
        ChallengeCommand::Leaderboard { id } => {
            emit(&app.leaderboard(&id)?, format)?;
            Ok(false)
        }
    }
}

fn cmd_doctor(
    config: &Config,
    config_path: Option<&Path>,
    format: OutputFormat,
) -> Result<(), ScreenwiseCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "config".to_string(),
        status: CheckStatus::Ok,
        message: match config_path {
            Some(p) => format!("Loaded {}", p.display()),
            None => "Using defaults".to_string(),
        },
    });

    let store_path = &config.store.path;
    if store_path.exists() {
        match Database::load(store_path) {
            Ok(db) => checks.push(DoctorCheck {
                name: "store".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "Store valid (version {}, {} users, {} records)",
                    db.version,
                    db.users.len(),
                    db.record_count()
                ),
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "store".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot load store: {}", e),
            }),
        }
    } else {
        checks.push(DoctorCheck {
            name: "store".to_string(),
            status: CheckStatus::Warning,
            message: format!(
                "Store {} does not exist yet (created on first write, version {})",
                store_path.display(),
                STORE_VERSION
            ),
        });
    }

    let music_check = match (config.music.provider, &config.music.catalog_path) {
        (MusicProvider::Static, Some(path)) => match StaticCatalog::load(path) {
            Ok(catalog) => DoctorCheck {
                name: "music".to_string(),
                status: CheckStatus::Ok,
                message: format!("Static catalog with {} categories", catalog.category_count()),
            },
            Err(e) => DoctorCheck {
                name: "music".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot load catalog: {}", e),
            },
        },
        (MusicProvider::Static, None) => DoctorCheck {
            name: "music".to_string(),
            status: CheckStatus::Warning,
            message: "No catalog configured; playlist suggestions will be empty".to_string(),
        },
        (MusicProvider::Spotify, _) if cfg!(feature = "spotify") => DoctorCheck {
            name: "music".to_string(),
            status: CheckStatus::Ok,
            message: format!("Spotify API at {}", config.music.api_base),
        },
        (MusicProvider::Spotify, _) => DoctorCheck {
            name: "music".to_string(),
            status: CheckStatus::Error,
            message: "Spotify provider configured but the spotify feature is not built".to_string(),
        },
    };
    checks.push(music_check);

    let report = DoctorReport {
        product: PRODUCT_NAME.to_string(),
        version: SCREENWISE_VERSION.to_string(),
        checked_at: Utc::now(),
        checks,
    };

    if matches!(format, OutputFormat::Auto) && atty::is(atty::Stream::Stdout) {
        println!("Screenwise Doctor Report");
        println!("========================");
        println!("Version:  {}", report.version);
        println!("\nChecks:");
        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    } else {
        emit(&report, format)?;
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(ScreenwiseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn emit<T: Serialize>(value: &T, format: OutputFormat) -> Result<(), ScreenwiseCliError> {
    let pretty = match format {
        OutputFormat::Auto => atty::is(atty::Stream::Stdout),
        OutputFormat::Json => false,
        OutputFormat::JsonPretty => true,
    };
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", text);
    Ok(())
}

fn read_input(path: &Path) -> Result<String, ScreenwiseCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn parse_tab(spec: &str) -> Result<RawTab, ScreenwiseCliError> {
    let (url, secs) = spec.rsplit_once('=').ok_or_else(|| {
        ScreenwiseCliError::InvalidArgument(format!("tab must be URL=SECONDS, got '{}'", spec))
    })?;
    let secs: f64 = secs.parse().map_err(|_| {
        ScreenwiseCliError::InvalidArgument(format!("invalid seconds in tab '{}'", spec))
    })?;
    Ok(RawTab {
        url: Some(url.to_string()),
        time_spent: Some(secs),
    })
}

#[derive(Debug)]
enum ScreenwiseCliError {
    Io(io::Error),
    Json(serde_json::Error),
    Wellness(WellnessError),
    InvalidArgument(String),
    DoctorFailed,
}

impl From<io::Error> for ScreenwiseCliError {
    fn from(e: io::Error) -> Self {
        ScreenwiseCliError::Io(e)
    }
}

impl From<serde_json::Error> for ScreenwiseCliError {
    fn from(e: serde_json::Error) -> Self {
        ScreenwiseCliError::Json(e)
    }
}

impl From<WellnessError> for ScreenwiseCliError {
    fn from(e: WellnessError) -> Self {
        ScreenwiseCliError::Wellness(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    status: u16,
    message: String,
    hint: Option<String>,
}

impl From<ScreenwiseCliError> for CliError {
    fn from(e: ScreenwiseCliError) -> Self {
        match e {
            ScreenwiseCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                status: 500,
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            ScreenwiseCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                status: 400,
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            ScreenwiseCliError::Wellness(e) => {
                let hint = match &e {
                    WellnessError::MusicTokenExpired => {
                        Some("Re-link the music account with a fresh token".to_string())
                    }
                    WellnessError::NoBaseline => {
                        Some("Upload screen time for the challenge's first day".to_string())
                    }
                    WellnessError::Config(_) => Some("Run 'screenwise doctor' for details".to_string()),
                    _ => None,
                };
                CliError {
                    code: error_code(&e).to_string(),
                    status: e.status_code(),
                    message: e.to_string(),
                    hint,
                }
            }
            ScreenwiseCliError::InvalidArgument(msg) => CliError {
                code: "INVALID_ARGUMENT".to_string(),
                status: 400,
                message: msg,
                hint: Some("See --help for the expected format".to_string()),
            },
            ScreenwiseCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                status: 500,
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

fn error_code(e: &WellnessError) -> &'static str {
    match e {
        WellnessError::InvalidInput(_) => "INVALID_INPUT",
        WellnessError::NotFound(_) => "NOT_FOUND",
        WellnessError::Conflict(_) => "CONFLICT",
        WellnessError::Forbidden(_) => "FORBIDDEN",
        WellnessError::ChallengeNotActive => "CHALLENGE_NOT_ACTIVE",
        WellnessError::NoBaseline => "NO_BASELINE",
        WellnessError::NoParticipants => "NO_PARTICIPANTS",
        WellnessError::MusicTokenExpired => "MUSIC_TOKEN_EXPIRED",
        WellnessError::NoPlaylists(_) => "NO_PLAYLISTS",
        WellnessError::MusicProvider(_) => "MUSIC_PROVIDER_ERROR",
        WellnessError::JsonError(_) => "JSON_ERROR",
        WellnessError::Io(_) => "IO_ERROR",
        WellnessError::Config(_) => "CONFIG_ERROR",
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    product: String,
    version: String,
    checked_at: DateTime<Utc>,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
