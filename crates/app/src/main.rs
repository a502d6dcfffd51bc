use std::fmt;
use std::path::{Path, PathBuf};

use services::{AppServices, Clock};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod console;

const DEFAULT_DB_URL: &str = "sqlite://mock-exam.sqlite3";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    DbDir { dir: PathBuf, source: std::io::Error },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::DbDir { dir, source } => {
                write!(f, "cannot create {}: {source}", dir.display())
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  mock-exam [--db <sqlite_url>] [--memory]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DB_URL, RUST_LOG");
}

#[derive(Debug, PartialEq, Eq)]
enum Backend {
    Sqlite(String),
    Memory,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    backend: Backend,
    help: bool,
}

impl Args {
    fn parse(
        env_db_url: Option<String>,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env_db_url.map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut memory = false;
        let mut help = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--memory" => memory = true,
                "--help" | "-h" => help = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let backend = if memory {
            Backend::Memory
        } else {
            Backend::Sqlite(db_url)
        };
        Ok(Self { backend, help })
    }
}

const MEMORY_URL: &str = "sqlite::memory:";

/// Turn `sqlite:relative/path` or a bare path into an absolute `sqlite://` URL.
fn normalize_sqlite_url(raw: String) -> String {
    let raw = raw.trim();
    if raw == MEMORY_URL || raw.starts_with("sqlite://") {
        return raw.to_owned();
    }
    let path = PathBuf::from(raw.strip_prefix("sqlite:").unwrap_or(raw));
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the directory that will hold the database file.
fn ensure_db_dir(db_url: &str) -> Result<(), ArgsError> {
    if db_url == MEMORY_URL {
        return Ok(());
    }
    let invalid = || ArgsError::InvalidDbUrl {
        raw: db_url.to_owned(),
    };
    let file = db_url
        .strip_prefix("sqlite://")
        .and_then(|rest| rest.split('?').next())
        .filter(|file| !file.is_empty())
        .ok_or_else(invalid)?;
    match Path::new(file).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|source| ArgsError::DbDir {
                dir: dir.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(std::env::var("EXAM_DB_URL").ok(), &mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if args.help {
        print_usage();
        return Ok(());
    }

    let clock = Clock::system();
    let services = match &args.backend {
        Backend::Memory => {
            info!("using in-memory storage");
            AppServices::in_memory(clock)
        }
        Backend::Sqlite(db_url) => {
            ensure_db_dir(db_url)?;
            info!(db_url = %db_url, "opening storage");
            AppServices::new_sqlite(db_url, clock).await?
        }
    };

    console::run(services.controller(), console::spawn_stdin_lines()).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(env: Option<&str>, argv: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = argv.iter().map(|s| (*s).to_string());
        Args::parse(env.map(str::to_string), &mut iter)
    }

    #[test]
    fn defaults_to_local_sqlite_file() {
        let args = parse(None, &[]).unwrap();
        assert_eq!(args.backend, Backend::Sqlite(DEFAULT_DB_URL.into()));
        assert!(!args.help);
    }

    #[test]
    fn flag_overrides_env() {
        let args = parse(Some("sqlite:///tmp/env.db"), &["--db", "sqlite:///tmp/flag.db"]).unwrap();
        assert_eq!(args.backend, Backend::Sqlite("sqlite:///tmp/flag.db".into()));
    }

    #[test]
    fn memory_wins_over_db() {
        let args = parse(None, &["--db", "sqlite:///tmp/x.db", "--memory"]).unwrap();
        assert_eq!(args.backend, Backend::Memory);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(matches!(
            parse(None, &["--db"]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(
            parse(None, &["--db", "  "]),
            Err(ArgsError::InvalidDbUrl { .. })
        ));
        assert!(matches!(
            parse(None, &["--verbose"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn relative_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("sqlite:data/exam.db".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/exam.db"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), MEMORY_URL);
    }

    #[test]
    fn db_dir_needs_a_file_path() {
        assert!(ensure_db_dir(MEMORY_URL).is_ok());
        assert!(ensure_db_dir(DEFAULT_DB_URL).is_ok());
        assert!(matches!(
            ensure_db_dir("sqlite://?mode=rwc"),
            Err(ArgsError::InvalidDbUrl { .. })
        ));
        assert!(matches!(
            ensure_db_dir("postgres://db"),
            Err(ArgsError::InvalidDbUrl { .. })
        ));
    }
}
