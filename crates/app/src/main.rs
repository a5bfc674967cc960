use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use app::config::{Config, StoreKind, normalize_sqlite_url};
use app::{AppState, router, terminal};
use drill_core::model::{SortDirection, StatsSortKey};
use services::QuizSession;
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidValue { flag: &'static str, raw: String },
    ResetNotConfirmed,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::ResetNotConfirmed => {
                write!(f, "reset deletes every record; pass --yes to confirm")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_value<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let raw = require_value(args, flag)?;
    raw.parse()
        .map_err(|_| ArgsError::InvalidValue { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  drill serve  [--addr <host:port>] [storage options]");
    eprintln!("  drill quiz   [--questions <n>] [storage options]");
    eprintln!("  drill stats  [--sort problem|bestTime|attempts|incorrectAttempts]");
    eprintln!("               [--direction asc|desc]");
    eprintln!("  drill reset  --yes [storage options]");
    eprintln!();
    eprintln!("Storage options:");
    eprintln!("  --store sqlite|json|memory   (default sqlite)");
    eprintln!("  --db <sqlite_url>            (default sqlite://performance.sqlite3)");
    eprintln!("  --json-path <file>           (default performance.json)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  DRILL_SERVER_ADDRESS, DRILL_STORE, DRILL_DB_URL, DRILL_JSON_PATH,");
    eprintln!("  DRILL_STORAGE_TIMEOUT_MS, DRILL_MIN_FACTOR, DRILL_MAX_FACTOR,");
    eprintln!("  DRILL_EXCLUDED_FACTORS, DRILL_QUESTION_CHOICES, DRILL_NO_REPEAT, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Serve,
    Quiz { questions: Option<u32> },
    Stats { sort: StatsSortKey, direction: SortDirection },
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "serve" => Some(Self::Serve),
            "quiz" => Some(Self::Quiz { questions: None }),
            "stats" => Some(Self::Stats {
                sort: StatsSortKey::default(),
                direction: SortDirection::default(),
            }),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

struct Args {
    command: Command,
    config: Config,
}

impl Args {
    /// Flags override whatever `Config::from_env` produced.
    fn parse(
        mut command: Command,
        mut config: Config,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut confirmed = false;

        while let Some(arg) = args.next() {
            match (arg.as_str(), &mut command) {
                ("--db", _) => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidValue { flag: "--db", raw: value });
                    }
                    config.database_url = normalize_sqlite_url(value);
                    config.store = StoreKind::Sqlite;
                }
                ("--store", _) => config.store = parse_value(args, "--store")?,
                ("--json-path", _) => {
                    config.json_path = PathBuf::from(require_value(args, "--json-path")?);
                    config.store = StoreKind::Json;
                }
                ("--addr", Command::Serve) => {
                    config.server_address = require_value(args, "--addr")?;
                }
                ("--questions", Command::Quiz { questions }) => {
                    *questions = Some(parse_value(args, "--questions")?);
                }
                ("--sort", Command::Stats { sort, .. }) => *sort = parse_value(args, "--sort")?,
                ("--direction", Command::Stats { direction, .. }) => {
                    *direction = parse_value(args, "--direction")?;
                }
                ("--yes" | "-y", Command::Reset) => confirmed = true,
                ("--help" | "-h", _) => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if command == Command::Reset && !confirmed {
            return Err(ArgsError::ResetNotConfirmed);
        }
        Ok(Self { command, config })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn serve(config: &Config, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .server_address
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_address))?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    let mut argv = std::env::args().skip(1);
    let command = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            print_usage();
            ArgsError::UnknownCommand(first)
        })?,
    };

    let config = Config::from_env()?;
    let Args { command, config } = Args::parse(command, config, &mut argv).inspect_err(|_| {
        print_usage();
    })?;

    let settings = config.quiz_settings()?;
    let storage = config.open_storage().await?;
    let state = AppState::new(&storage, settings.generator().clone());

    let outcome = match command {
        Command::Serve => serve(&config, state).await,
        Command::Quiz { questions } => {
            let mut session = QuizSession::new(settings);
            let stdin = BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            terminal::run_quiz(&state.quiz_loop(), &mut session, questions, stdin, &mut stdout)
                .await
                .map(|_| ())
        }
        Command::Stats { sort, direction } => {
            let rows = state.performance.sorted_stats(sort, direction).await?;
            let achievement = state.performance.achievement().await?;
            terminal::print_stats(&rows, achievement.as_ref(), &mut std::io::stdout())?;
            Ok(())
        }
        Command::Reset => {
            state.performance.reset().await?;
            println!("All performance records deleted.");
            Ok(())
        }
    };

    storage.close().await?;
    outcome
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(command: &str, flags: &[&str]) -> Result<Args, ArgsError> {
        let command = Command::from_arg(command).unwrap();
        let mut flags = flags.iter().map(|s| (*s).to_string());
        Args::parse(command, Config::default(), &mut flags)
    }

    #[test]
    fn quiz_flags_override_config() {
        let args = parse("quiz", &["--questions", "20", "--db", "drill.db"]).unwrap();
        assert_eq!(args.command, Command::Quiz { questions: Some(20) });
        assert_eq!(args.config.store, StoreKind::Sqlite);
        assert!(args.config.database_url.starts_with("sqlite://"));
        assert!(args.config.database_url.ends_with("drill.db"));
    }

    #[test]
    fn json_path_switches_store() {
        let flags = ["--json-path", "p.json", "--sort", "attempts", "--direction", "desc"];
        let args = parse("stats", &flags).unwrap();
        assert_eq!(args.config.store, StoreKind::Json);
        assert_eq!(args.config.json_path, PathBuf::from("p.json"));
        assert_eq!(
            args.command,
            Command::Stats {
                sort: StatsSortKey::Attempts,
                direction: SortDirection::Desc,
            }
        );
    }

    #[test]
    fn reset_requires_confirmation() {
        assert!(matches!(parse("reset", &[]), Err(ArgsError::ResetNotConfirmed)));
        assert_eq!(parse("reset", &["--yes"]).unwrap().command, Command::Reset);
    }

    #[test]
    fn flags_are_scoped_to_their_command() {
        assert!(matches!(parse("serve", &["--questions", "5"]), Err(ArgsError::UnknownArg(_))));
        assert!(matches!(
            parse("quiz", &["--questions"]),
            Err(ArgsError::MissingValue { flag: "--questions" })
        ));
        assert!(matches!(
            parse("quiz", &["--questions", "many"]),
            Err(ArgsError::InvalidValue { .. })
        ));
        assert!(Command::from_arg("learn").is_none());
    }
}
