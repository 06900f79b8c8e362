//! Process-wide logging bootstrap.
//!
//! # Responsibility
//! - Start the rotating `famtree` file logger once per process.
//! - Log panics as sanitized single-line events before the default hook runs.
//!
//! # Invariants
//! - Repeating `init_logging` with the same level and directory is a no-op.
//! - A second call with another level or directory is rejected.
//! - Nothing here panics; failures come back as `LogInitError`.
//! - Log lines carry ids and counts only, never person names.

use flexi_logger::{
    Cleanup, Criterion, FileSpec, LogSpecification, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::Location;
use std::path::{Path, PathBuf};

const LOG_BASENAME: &str = "famtree";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_ROTATED_FILES: usize = 5;
const PANIC_TEXT_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    level: LevelFilter,
    dir: PathBuf,
    _handle: LoggerHandle,
}

impl ActiveLogger {
    fn describe(level: LevelFilter, dir: &Path) -> String {
        format!("level={level} dir={}", dir.display())
    }
}

/// Logging bootstrap failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogInitError {
    UnsupportedLevel(String),
    EmptyDirectory,
    RelativeDirectory(String),
    CreateDirectory { path: PathBuf, message: String },
    Backend(String),
    /// Logging already runs with a different level or directory.
    Conflict { active: String, requested: String },
}

impl Display for LogInitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => {
                write!(f, "log level `{level}` is not one of trace|debug|info|warn|error")
            }
            Self::EmptyDirectory => write!(f, "log directory is blank"),
            Self::RelativeDirectory(path) => write!(f, "log directory `{path}` is not absolute"),
            Self::CreateDirectory { path, message } => {
                write!(f, "cannot create log directory `{}`: {message}", path.display())
            }
            Self::Backend(message) => write!(f, "logger backend failed: {message}"),
            Self::Conflict { active, requested } => {
                write!(f, "logging runs with {active}; cannot switch to {requested}")
            }
        }
    }
}

impl Error for LogInitError {}

/// Starts file logging at `level` under the absolute directory `log_dir`.
///
/// # Errors
/// - Unknown level, blank or relative directory, directory creation or
///   backend failure.
/// - A previous call already configured a different level or directory.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LogInitError> {
    let level = parse_level(level)?;
    let dir = absolute_dir(log_dir)?;

    let active = ACTIVE.get_or_try_init(|| start(level, &dir))?;
    if active.level == level && active.dir == dir {
        return Ok(());
    }
    Err(LogInitError::Conflict {
        active: ActiveLogger::describe(active.level, &active.dir),
        requested: ActiveLogger::describe(level, &dir),
    })
}

/// Active level and directory, or `None` before `init_logging` succeeded.
pub fn logging_status() -> Option<(LevelFilter, PathBuf)> {
    ACTIVE.get().map(|active| (active.level, active.dir.clone()))
}

fn start(level: LevelFilter, dir: &Path) -> Result<ActiveLogger, LogInitError> {
    std::fs::create_dir_all(dir).map_err(|err| LogInitError::CreateDirectory {
        path: dir.to_path_buf(),
        message: err.to_string(),
    })?;

    let handle = Logger::with(LogSpecification::builder().default(level).build())
        .log_to_file(FileSpec::default().directory(dir).basename(LOG_BASENAME))
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_ROTATED_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| LogInitError::Backend(err.to_string()))?;

    if PANIC_HOOK_INSTALLED.set(()).is_ok() {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            log_panic(info.location(), info.payload());
            previous(info);
        }));
    }

    info!(
        "event=engine_start module=core status=ok platform={} version={} level={level}",
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION"),
    );
    Ok(ActiveLogger {
        level,
        dir: dir.to_path_buf(),
        _handle: handle,
    })
}

fn log_panic(location: Option<&Location<'_>>, payload: &(dyn Any + Send)) {
    let location = location.map_or_else(
        || "unknown".to_string(),
        |loc| format!("{}:{}", loc.file(), loc.line()),
    );
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    error!(
        "event=panic_captured module=core status=error location={location} payload={}",
        single_line(message, PANIC_TEXT_LIMIT)
    );
}

fn parse_level(raw: &str) -> Result<LevelFilter, LogInitError> {
    let raw = raw.trim().to_ascii_lowercase();
    let name = if raw == "warning" { "warn" } else { raw.as_str() };
    match name.parse::<LevelFilter>() {
        Ok(LevelFilter::Off) | Err(_) => Err(LogInitError::UnsupportedLevel(raw)),
        Ok(level) => Ok(level),
    }
}

fn absolute_dir(raw: &str) -> Result<PathBuf, LogInitError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(LogInitError::EmptyDirectory);
    }
    let dir = PathBuf::from(raw);
    if dir.is_absolute() {
        Ok(dir)
    } else {
        Err(LogInitError::RelativeDirectory(raw.to_string()))
    }
}

/// Collapses line breaks and caps the length of free text.
fn single_line(value: &str, max_chars: usize) -> String {
    let mut out: String = value
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .take(max_chars)
        .collect();
    if value.chars().count() > max_chars {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{absolute_dir, init_logging, logging_status, parse_level, single_line, LogInitError};
    use log::LevelFilter;

    #[test]
    fn levels_are_case_insensitive() {
        assert_eq!(parse_level(" WARNING "), Ok(LevelFilter::Warn));
        assert_eq!(parse_level("Trace"), Ok(LevelFilter::Trace));
        assert_eq!(
            parse_level("verbose"),
            Err(LogInitError::UnsupportedLevel("verbose".to_string()))
        );
        assert!(parse_level("off").is_err());
    }

    #[test]
    fn relative_directories_are_rejected() {
        assert_eq!(
            absolute_dir("logs/dev"),
            Err(LogInitError::RelativeDirectory("logs/dev".to_string()))
        );
        assert_eq!(absolute_dir("  "), Err(LogInitError::EmptyDirectory));
    }

    #[test]
    fn single_line_flattens_and_caps() {
        assert_eq!(single_line("a\nb\rc-long-tail", 5), "a b c...");
        assert_eq!(single_line("short", 10), "short");
    }

    #[test]
    fn init_is_idempotent_and_rejects_conflicts() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let first_dir = first.path().to_str().unwrap().to_string();
        let second_dir = second.path().to_str().unwrap().to_string();

        init_logging("info", &first_dir).unwrap();
        init_logging("INFO", &first_dir).unwrap();
        assert!(matches!(
            init_logging("debug", &first_dir),
            Err(LogInitError::Conflict { .. })
        ));
        assert!(matches!(
            init_logging("info", &second_dir),
            Err(LogInitError::Conflict { .. })
        ));

        let (level, dir) = logging_status().unwrap();
        assert_eq!(level, LevelFilter::Info);
        assert_eq!(dir, first.path());
    }
}
