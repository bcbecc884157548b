use std::{
    fs::{self, File, OpenOptions},
    io,
    path::Path,
    sync::Mutex,
};

use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default filter when `RUST_LOG` is unset.
pub fn default_filter(debug: bool) -> EnvFilter {
    let level = if debug { "debug" } else { "warn" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Installs the global subscriber. Logs go to stderr, or appended to
/// `log_file` when given (its directory is created if missing). Stdout is
/// left for command output.
pub fn init_logging(log_file: Option<&Path>, debug: bool) -> io::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(default_filter(debug))
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_target(debug);

    let result = match log_file {
        Some(path) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(open_log_file(path)?))
            .try_init(),
        None => builder.with_writer(io::stderr).try_init(),
    };
    result.map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
