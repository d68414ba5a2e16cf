//! Logging through `tracing` and `tracing-subscriber`.
//!
//! Libraries log under their crate target: `warn` for schema problems and
//! unknown code tables, `info` for loaded documents, `debug` for unresolved
//! paths and option matching. Patient values only show up with
//! `--log-data`.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

const EXAM_CRATES: [&str; 6] = [
    "exam_cli",
    "exam_cards",
    "exam_codes",
    "exam_format",
    "exam_model",
    "exam_resolve",
];

static LOG_DATA: AtomicBool = AtomicBool::new(false);

/// Placeholder logged instead of patient data.
pub const REDACTED_VALUE: &str = "[REDACTED]";

/// The value itself when `--log-data` was given, a placeholder otherwise.
pub fn redact_value(value: &str) -> &str {
    if LOG_DATA.load(Ordering::Relaxed) {
        value
    } else {
        REDACTED_VALUE
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level_filter: LevelFilter,
    /// Let `RUST_LOG` decide the filter when set.
    pub use_env_filter: bool,
    pub with_ansi: bool,
    pub format: LogFormat,
    /// Logs go to this file instead of stderr.
    pub log_file: Option<PathBuf>,
    pub log_data: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level_filter: LevelFilter::WARN,
            use_env_filter: true,
            with_ansi: true,
            format: LogFormat::default(),
            log_file: None,
            log_data: false,
        }
    }
}

/// Installs the global subscriber. Call once at startup.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
pub fn init_logging(config: &LogConfig) -> io::Result<()> {
    LOG_DATA.store(config.log_data, Ordering::Release);
    let layer = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            output_layer(config, SharedFile(Arc::new(Mutex::new(file))))
        }
        None => output_layer(config, io::stderr),
    };
    tracing_subscriber::registry()
        .with(layer.with_filter(env_filter(config)))
        .init();
    Ok(())
}

fn output_layer<W>(config: &LogConfig, writer: W) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_target(false);
    match config.format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Compact => layer
            .compact()
            .without_time()
            .with_ansi(config.with_ansi)
            .boxed(),
        LogFormat::Pretty => layer.without_time().with_ansi(config.with_ansi).boxed(),
    }
}

/// Log file shared by every event writer.
#[derive(Clone)]
struct SharedFile(Arc<Mutex<File>>);

impl SharedFile {
    fn with_file<T>(&self, op: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut file = self
            .0
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        op(&mut *file)
    }
}

impl Write for SharedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(File::flush)
    }
}

impl<'a> MakeWriter<'a> for SharedFile {
    type Writer = SharedFile;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Exam crates log at the configured level, everything else at warn.
fn env_filter(config: &LogConfig) -> EnvFilter {
    let level = config.level_filter.to_string().to_lowercase();
    let fallback = || {
        let directives: Vec<String> = EXAM_CRATES
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect();
        EnvFilter::new(format!("warn,{}", directives.join(",")))
    };
    if config.use_env_filter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback())
    } else {
        fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patient_values_are_redacted_by_default() {
        assert_eq!(redact_value("Moreau"), REDACTED_VALUE);
    }

    #[test]
    fn explicit_level_applies_to_exam_crates() {
        let config = LogConfig {
            level_filter: LevelFilter::DEBUG,
            use_env_filter: false,
            ..LogConfig::default()
        };
        let filter = env_filter(&config).to_string();
        assert!(filter.contains("exam_model=debug"), "{filter}");
        assert!(filter.contains("exam_resolve=debug"), "{filter}");
    }
}
