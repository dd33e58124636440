//! File logging for hosts embedding the agenda core.
//!
//! # Responsibility
//! - Start one size-rotated `agenda` log per process.
//! - Record panics as a single sanitized event before the default hook runs.
//!
//! # Invariants
//! - Starting again with the same settings is a no-op; different settings
//!   are refused.
//! - Events carry record ids, counts and table names, never note text or
//!   attachment references.

use flexi_logger::{
    Cleanup, Criterion, FileSpec, LogSpecBuilder, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::path::{Path, PathBuf};

const LOG_BASENAME: &str = "agenda";
const ROTATE_AT_BYTES: u64 = 5 * 1024 * 1024;
const KEEP_FILES: usize = 3;
const PANIC_TEXT_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    level: LevelFilter,
    dir: PathBuf,
}

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

/// Starts file logging at `level` (`trace`..`error`, any case) under the
/// absolute directory `log_dir`, creating it if needed.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<(), String> {
    let wanted = LogSettings {
        level: parse_level(level)?,
        dir: require_absolute(log_dir)?,
    };

    let active = ACTIVE.get_or_try_init(|| start(wanted.clone()))?;
    if active.settings == wanted {
        Ok(())
    } else {
        Err(format!(
            "logging already running with level `{}` in `{}`; refusing to switch to `{}` in `{}`",
            active.settings.level,
            active.settings.dir.display(),
            wanted.level,
            wanted.dir.display()
        ))
    }
}

/// Level and directory of the running logger, if any.
pub fn logging_status() -> Option<(LevelFilter, PathBuf)> {
    ACTIVE
        .get()
        .map(|active| (active.settings.level, active.settings.dir.clone()))
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

pub(crate) fn parse_level(level: &str) -> Result<LevelFilter, String> {
    match level.trim().parse::<LevelFilter>() {
        Ok(LevelFilter::Off) | Err(_) => Err(format!(
            "unsupported log level `{}`; expected trace, debug, info, warn or error",
            level.trim()
        )),
        Ok(parsed) => Ok(parsed),
    }
}

pub(crate) fn require_absolute(dir: &Path) -> Result<PathBuf, String> {
    if dir.is_absolute() {
        Ok(dir.to_path_buf())
    } else {
        Err(format!(
            "log directory must be absolute, got `{}`",
            dir.display()
        ))
    }
}

fn start(settings: LogSettings) -> Result<ActiveLogger, String> {
    std::fs::create_dir_all(&settings.dir)
        .map_err(|err| format!("cannot create `{}`: {err}", settings.dir.display()))?;

    let handle = Logger::with(LogSpecBuilder::new().default(settings.level).build())
        .log_to_file(
            FileSpec::default()
                .directory(&settings.dir)
                .basename(LOG_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| format!("logger backend failed to start: {err}"))?;

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |loc| format!("{}:{}", loc.file(), loc.line()));
        error!(
            "event=panic module=core status=error location={} payload={}",
            location,
            single_line(panic_text(info.payload()), PANIC_TEXT_LIMIT)
        );
        previous(info);
    }));

    info!(
        "event=logging_start module=core status=ok level={} os={} version={}",
        settings.level,
        std::env::consts::OS,
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        settings,
        _handle: handle,
    })
}

fn panic_text(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<non-string payload>")
}

// Payloads may quote user text; keep them on one capped line.
fn single_line(text: &str, limit: usize) -> String {
    let mut line: String = text
        .chars()
        .map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch })
        .take(limit)
        .collect();
    if text.chars().count() > limit {
        line.push_str("...");
    }
    line
}
