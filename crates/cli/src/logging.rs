//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Where log records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    /// Drop everything; used while the CLI runner owns the terminal.
    Discard,
}

impl LogSink {
    pub fn for_console(runner_owns_console: bool) -> Self {
        if runner_owns_console {
            LogSink::Discard
        } else {
            LogSink::Stderr
        }
    }

    fn writer(self) -> BoxMakeWriter {
        match self {
            LogSink::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogSink::Discard => BoxMakeWriter::new(std::io::sink),
        }
    }
}

/// Filter directives: `--verbose` forces debug, otherwise the configured level.
pub fn directives(configured: &str, verbose: bool) -> String {
    if verbose {
        "debug".to_string()
    } else {
        configured.to_string()
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `directives`.
pub fn init(sink: LogSink, directives: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(directives))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(sink.writer())
        .with_ansi(sink == LogSink::Stderr)
        .try_init()
}
