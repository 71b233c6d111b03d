//! CLI logging initialization
//!
//! Phase-scoped log control on top of `tracing-subscriber`.

use crate::config::LogConfig;
use clap::ValueEnum;
use kiln_config::Phase;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Colored, multi-line (development)
    Pretty,
    /// One line per event
    Compact,
    /// JSON lines (tool integration)
    Json,
}

fn targets(log_config: &LogConfig) -> Targets {
    let mut targets = Targets::new().with_default(log_config.global);
    for phase in Phase::ALL {
        targets = targets.with_target(phase.target(), log_config.level_for(phase));
    }
    targets.with_target("kiln::cli", log_config.global)
}

/// Initialize logging to stderr, and to `file` as well when given
pub fn init_with_file(log_config: &LogConfig, format: LogFormat, file: Option<&Path>) -> io::Result<()> {
    let targets = targets(log_config);
    let stderr_layer = create_format_layer(format, io::stderr).with_filter(targets.clone());

    match file {
        Some(path) => {
            let handle = Arc::new(
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?,
            );
            let file_layer = create_format_layer(format, move || FileWriter(handle.clone()))
                .with_filter(targets);
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .init();
        }
        None => {
            tracing_subscriber::registry().with(stderr_layer).init();
        }
    }
    Ok(())
}

/// Shared append handle to the log file
struct FileWriter(Arc<File>);

impl io::Write for FileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self.0).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self.0).flush()
    }
}

/// Create formatter layer based on format
fn create_format_layer<S, W, F>(format: LogFormat, make_writer: F) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: io::Write + 'static,
    F: Fn() -> W + Send + Sync + 'static,
{
    match format {
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_target(true)
            .without_time()
            .with_writer(make_writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_timer(fmt::time::time())
            .with_writer(make_writer)
            .boxed(),
    }
}
