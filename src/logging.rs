use std::fs;
use std::path::PathBuf;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::constants::LOG_DIR_ENV;

/// How the CLI asked for logging to be set up.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// 0 = warnings only, 1 = info, 2+ = debug
    pub verbosity: u8,
    /// Also write JSON logs, rotated daily, into this directory
    pub log_dir: Option<PathBuf>,
}

impl LogOptions {
    /// Explicit log directory, else `PRICE_PIPELINE_LOG_DIR` when set
    pub fn new(verbosity: u8, log_dir: Option<PathBuf>) -> Self {
        let log_dir = log_dir.or_else(|| {
            std::env::var(LOG_DIR_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        });
        Self { verbosity, log_dir }
    }

    fn default_directive(&self) -> &'static str {
        match self.verbosity {
            0 => "price_pipeline=warn",
            1 => "price_pipeline=info",
            _ => "price_pipeline=debug",
        }
    }
}

/// Initializes console logging on stderr (stdout carries results) plus the
/// optional JSON file layer. `RUST_LOG` overrides the verbosity flags.
///
/// Keep the returned guard alive until exit so buffered file logs are flushed.
pub fn init_logging(options: &LogOptions) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.default_directive()));

    let mut dir_error = None;
    let (file_layer, guard) = match &options.log_dir {
        Some(dir) => match fs::create_dir_all(dir) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::daily(dir, "pipeline.log");
                let (writer, guard) = tracing_appender::non_blocking(file_appender);
                (Some(fmt::layer().json().with_writer(writer)), Some(guard))
            }
            Err(e) => {
                dir_error = Some(format!("cannot create log directory {}: {}", dir.display(), e));
                (None, None)
            }
        },
        None => (None, None),
    };

    let console_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    if let Some(message) = dir_error {
        warn!("{}", message);
    }
    guard
}
