/// Tracing setup: stderr plus an append-only log file in the logs directory.
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const LOG_FILE: &str = "agent.log";

/// Install the global subscriber. `RUST_LOG` overrides the default `info`
/// level. If the log file cannot be opened, logging continues on stderr only.
pub fn init(logs_dir: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let path = logs_dir.join(LOG_FILE);
    let file_layer = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        ),
        Err(e) => {
            eprintln!("warning: cannot open {}: {e}", path.display());
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .init();
}
