use crate::config::{Config, DEFAULT_LOG_FILE};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone, Debug, PartialEq, Eq)]
enum LogTarget {
    File(PathBuf),
    Stderr,
}

/// Installs the global subscriber. Keep the guard alive until exit.
pub fn init(config: &Config) -> Option<WorkerGuard> {
    if !config.log_enabled {
        return None;
    }

    let level = filter_directive(&config.log_level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let target = log_target(config);
    let (writer, guard, target) = open_writer(target);

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_level(true)
        .with_target(true)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
    info!(
        "airport-ops {} run: airport={} operator={} ({}) refresh={}s mode={} log={}",
        env!("CARGO_PKG_VERSION"),
        config.airport,
        config.operator_name,
        config.operator_prefix,
        config.refresh.as_secs(),
        if config.once { "once" } else { "dashboard" },
        match &target {
            LogTarget::File(path) => path.display().to_string(),
            LogTarget::Stderr => "stderr".to_string(),
        }
    );
    Some(guard)
}

fn filter_directive(level: &str) -> &str {
    match level.trim() {
        "" => "info",
        level => level,
    }
}

// The dashboard owns the terminal, so it always logs to a file. `--once`
// prints the board on stdout and may log to stderr when no file is set.
fn log_target(config: &Config) -> LogTarget {
    let file = config.log_file.trim();
    if !file.is_empty() {
        LogTarget::File(PathBuf::from(file))
    } else if config.once {
        LogTarget::Stderr
    } else {
        LogTarget::File(PathBuf::from(DEFAULT_LOG_FILE))
    }
}

fn open_writer(target: LogTarget) -> (NonBlocking, WorkerGuard, LogTarget) {
    let LogTarget::File(path) = target else {
        let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
        return (writer, guard, LogTarget::Stderr);
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = fs::create_dir_all(parent);
        }
    }
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            (writer, guard, LogTarget::File(path))
        }
        Err(_) => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::sink());
            (writer, guard, LogTarget::File(path))
        }
    }
}
