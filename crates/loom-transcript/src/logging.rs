use std::fs;
use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LogConfig;

/// Installs the global subscriber. Returns `false` when one was already set.
pub fn init_tracing(config: &LogConfig) -> bool {
    static TRACE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

    let file_layer = config.path.as_ref().and_then(|path| {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            if let Err(error) = fs::create_dir_all(parent) {
                eprintln!("warning: failed to create log directory {}: {error}", parent.display());
                return None;
            }
        }
        let file = match fs::OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => file,
            Err(error) => {
                eprintln!("warning: failed to open log file {}: {error}", path.display());
                return None;
            }
        };
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let _ = TRACE_GUARD.set(guard);
        Some(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .boxed(),
        )
    });
    let stdout_layer = config
        .stdout
        .then(|| tracing_subscriber::fmt::layer().with_ansi(false).boxed());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .is_ok()
}
