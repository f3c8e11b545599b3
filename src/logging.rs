use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result, anyhow};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{self, RollingFileAppender},
};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::{Directive, LevelFilter},
    fmt, layer::SubscriberExt, util::SubscriberInitExt,
};
use uuid::Uuid;

use crate::config::{LoggingConfig, LoggingRotation};

const LOG_FILE_PREFIX: &str = "lms-launch.log";

/// Keeps the non-blocking writer alive; dropping it flushes pending lines.
pub struct LoggingGuard {
    _worker_guard: WorkerGuard,
    run_id: String,
}

impl LoggingGuard {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

pub fn init_tracing(logging_config: &LoggingConfig) -> Result<LoggingGuard> {
    validate_logging_config(logging_config)?;

    let log_dir = resolve_log_dir(&logging_config.dir)?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create logging directory {}", log_dir.display()))?;

    let retention_warnings =
        purge_expired_log_files(&log_dir, LOG_FILE_PREFIX, logging_config.retention_days);
    let appender = rolling_appender(&log_dir, &logging_config.rotation);
    let (writer, worker_guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(parse_filter(&logging_config.filter)?);

    let stderr_layer = logging_config.stderr_warn_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    let run_id = Uuid::now_v7().to_string();
    tracing::info!(
        target: "logging",
        run_id = %run_id,
        service = env!("CARGO_PKG_NAME"),
        version = env!("CARGO_PKG_VERSION"),
        dir = %log_dir.display(),
        filter = %logging_config.filter,
        rotation = ?logging_config.rotation,
        retention_days = logging_config.retention_days,
        "logging_initialized"
    );
    for warning in retention_warnings {
        tracing::warn!(target: "logging", warning = %warning, "logging_retention_warning");
    }

    Ok(LoggingGuard {
        _worker_guard: worker_guard,
        run_id,
    })
}

fn validate_logging_config(logging_config: &LoggingConfig) -> Result<()> {
    if logging_config.filter.trim().is_empty() {
        return Err(anyhow!("logging.filter cannot be empty"));
    }
    if logging_config.dir.as_os_str().is_empty() {
        return Err(anyhow!("logging.dir cannot be empty"));
    }
    if logging_config.retention_days == 0 {
        return Err(anyhow!("logging.retention_days must be at least 1"));
    }
    Ok(())
}

/// Level applied to a launch target when `logging.filter` does not mention it.
const LAUNCH_TARGET_DEFAULTS: &[(&str, &str)] = &[
    ("dispatch", "info"),
    ("content_item", "info"),
    ("launch", "info"),
    ("provisioning", "warn"),
    ("tower_http", "warn"),
];

fn parse_filter(filter: &str) -> Result<EnvFilter> {
    let mut env_filter = EnvFilter::try_new(filter)
        .with_context(|| format!("failed to parse logging.filter '{filter}'"))?;
    for directive in launch_target_directives(filter) {
        env_filter = env_filter.add_directive(
            directive
                .parse::<Directive>()
                .with_context(|| format!("invalid launch target directive '{directive}'"))?,
        );
    }
    Ok(env_filter)
}

/// Directives for launch targets the configured filter leaves unspecified.
fn launch_target_directives(filter: &str) -> Vec<String> {
    let named: Vec<&str> = filter
        .split(',')
        .filter_map(|directive| {
            let target = directive.split(['=', '[']).next()?.trim();
            (!target.is_empty()).then_some(target)
        })
        .collect();

    LAUNCH_TARGET_DEFAULTS
        .iter()
        .filter(|(target, _)| {
            !named.iter().any(|name| {
                name == target
                    || name
                        .strip_prefix(target)
                        .is_some_and(|rest| rest.starts_with("::"))
            })
        })
        .map(|(target, level)| format!("{target}={level}"))
        .collect()
}

fn rolling_appender(log_dir: &Path, rotation: &LoggingRotation) -> RollingFileAppender {
    match rotation {
        LoggingRotation::Daily => rolling::daily(log_dir, LOG_FILE_PREFIX),
        LoggingRotation::Hourly => rolling::hourly(log_dir, LOG_FILE_PREFIX),
    }
}

fn resolve_log_dir(dir: &Path) -> Result<PathBuf> {
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }

    Ok(std::env::current_dir()
        .context("failed to read current working directory for logging.dir resolution")?
        .join(dir))
}

fn purge_expired_log_files(log_dir: &Path, prefix: &str, retention_days: usize) -> Vec<String> {
    purge_expired_log_files_at(log_dir, prefix, retention_days, SystemTime::now())
}

/// Removes rotated launch logs older than the retention window. Failures are
/// collected and reported once the subscriber is installed.
fn purge_expired_log_files_at(
    log_dir: &Path,
    prefix: &str,
    retention_days: usize,
    now: SystemTime,
) -> Vec<String> {
    let retention = Duration::from_secs(retention_days.saturating_mul(24 * 60 * 60) as u64);
    let cutoff = now.checked_sub(retention).unwrap_or(SystemTime::UNIX_EPOCH);

    let mut warnings = Vec::new();
    let expired = match expired_log_files(log_dir, prefix, cutoff, &mut warnings) {
        Ok(expired) => expired,
        Err(err) => return vec![err],
    };
    for path in expired {
        if let Err(err) = fs::remove_file(&path) {
            warnings.push(format!(
                "failed to remove expired log file {}: {err}",
                path.display()
            ));
        }
    }
    warnings
}

fn expired_log_files(
    log_dir: &Path,
    prefix: &str,
    cutoff: SystemTime,
    warnings: &mut Vec<String>,
) -> Result<Vec<PathBuf>, String> {
    let entries = fs::read_dir(log_dir).map_err(|err| {
        format!(
            "failed to scan logging directory {}: {err}",
            log_dir.display()
        )
    })?;

    let mut expired = Vec::new();
    for entry in entries.flatten() {
        if !entry.file_name().to_string_lossy().starts_with(prefix) {
            continue;
        }
        let path = entry.path();
        match entry.metadata() {
            Ok(metadata) if !metadata.is_file() => {}
            Ok(metadata) => match metadata.modified() {
                Ok(modified) if modified <= cutoff => expired.push(path),
                Ok(_) => {}
                Err(err) => warnings.push(format!("failed to stat {}: {err}", path.display())),
            },
            Err(err) => warnings.push(format!("failed to stat {}: {err}", path.display())),
        }
    }
    Ok(expired)
}
