//! Centralized logging for SyncFile hosts
//!
//! Provides a custom formatter for tracing that:
//! - Formats thread IDs as #N instead of ThreadId(N)
//! - Extracts `runtime_type` and `script_id` fields to display as `js::script-id`
//! - Strips the host crate prefix from targets for cleaner output
//! - Filters external dependency logs based on `SYNC_FILE_LOGDEPS` environment variable
//!
//! # Environment Variables
//!
//! - `SYNC_FILE_LOGDEPS`: Set to `1` to enable logging from external dependencies.
//!   Default is `0` which only shows logs from SyncFile code.
//!
//! # Usage
//!
//! ```rust,ignore
//! use sync_log::{init_logging, LogConfig};
//! use tracing::Level;
//!
//! let config = LogConfig::new("sync_file_host::")
//!     .with_level(Level::DEBUG);
//! init_logging(config)?;
//! ```

use std::fmt as std_fmt;
use std::io::Write;
use tracing::Level;
use tracing::field::Field;
use tracing_subscriber::field::Visit;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields, format::Writer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// Crates whose logs are shown when dependency logging is off
const OWN_TARGETS: &[&str] = &["sync_file_host", "sync_file", "sync_log", "js"];

/// Field extractor for runtime_type, script_id, and message fields
///
/// Used by the custom formatter to detect script console output
/// and format it as `js::script-id: message`.
#[derive(Default)]
pub struct FieldExtractor {
    pub runtime_type: Option<String>,
    pub script_id: Option<String>,
    pub message: Option<String>,
}

impl Visit for FieldExtractor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "runtime_type" => self.runtime_type = Some(value.to_string()),
            "script_id" => self.script_id = Some(value.to_string()),
            "message" => self.message = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std_fmt::Debug) {
        let text = format!("{:?}", value).trim_matches('"').to_string();
        match field.name() {
            "runtime_type" => self.runtime_type = Some(text),
            "script_id" => self.script_id = Some(text),
            "message" => self.message = Some(text),
            _ => {}
        }
    }
}

/// Custom event formatter for SyncFile hosts
///
/// Features:
/// - Thread IDs displayed as #N instead of ThreadId(N)
/// - Script logs formatted as `js::script-id: message`
/// - Configurable ANSI color support
/// - Configurable target prefix stripping
pub struct CustomFormatter<T> {
    timer: T,
    ansi: bool,
    /// Prefix to strip from log targets (e.g., "sync_file_host::")
    strip_prefix: Option<String>,
}

impl<T> CustomFormatter<T> {
    pub fn new(timer: T, ansi: bool) -> Self {
        Self {
            timer,
            ansi,
            strip_prefix: None,
        }
    }

    /// Set the prefix to strip from log targets
    pub fn with_strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefix = Some(prefix.into());
        self
    }

    /// Target as it should be printed, or `None` when it should be hidden
    fn display_target<'t>(&self, target: &'t str) -> Option<&'t str> {
        let display = match &self.strip_prefix {
            Some(prefix) if target.starts_with(prefix.trim_end_matches("::")) => {
                target.strip_prefix(prefix.as_str()).unwrap_or(target)
            }
            _ => target,
        };

        // The bare app name carries no information
        let app_name = self.strip_prefix.as_ref().map(|p| p.trim_end_matches("::"));
        if display.is_empty() || app_name.is_some_and(|name| display == name) {
            None
        } else {
            Some(display)
        }
    }
}

impl<T: Clone> Clone for CustomFormatter<T> {
    fn clone(&self) -> Self {
        Self {
            timer: self.timer.clone(),
            ansi: self.ansi,
            strip_prefix: self.strip_prefix.clone(),
        }
    }
}

impl<S, N, T> FormatEvent<S, N> for CustomFormatter<T>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
    T: fmt::time::FormatTime,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std_fmt::Result {
        let metadata = event.metadata();

        let (dim_start, dim_end) = if self.ansi {
            ("\x1b[2m", "\x1b[0m")
        } else {
            ("", "")
        };
        let (level_color, level_str) = match *metadata.level() {
            Level::ERROR => (if self.ansi { "\x1b[31m" } else { "" }, "ERROR"),
            Level::WARN => (if self.ansi { "\x1b[33m" } else { "" }, " WARN"),
            Level::INFO => (if self.ansi { "\x1b[32m" } else { "" }, " INFO"),
            Level::DEBUG => (if self.ansi { "\x1b[34m" } else { "" }, "DEBUG"),
            Level::TRACE => (if self.ansi { "\x1b[35m" } else { "" }, "TRACE"),
        };
        let color_end = if self.ansi { "\x1b[0m" } else { "" };

        write!(writer, "{}", dim_start)?;
        self.timer.format_time(&mut writer)?;
        write!(writer, "{} ", dim_end)?;

        write!(writer, "{}{}{} ", level_color, level_str, color_end)?;

        let thread_id = format!("{:?}", std::thread::current().id());
        if let Some(num_str) = thread_id
            .strip_prefix("ThreadId(")
            .and_then(|s| s.strip_suffix(")"))
        {
            if let Ok(num) = num_str.parse::<u64>() {
                write!(writer, "#{:03} ", num)?;
            }
        }

        let mut extractor = FieldExtractor::default();
        event.record(&mut extractor);

        if let (Some(rt), Some(sid)) = (&extractor.runtime_type, &extractor.script_id) {
            write!(writer, "{}{}::{}{}: ", dim_start, rt, sid, dim_end)?;
            if let Some(msg) = &extractor.message {
                write!(writer, "{}", msg)?;
            }
        } else {
            if let Some(target) = self.display_target(metadata.target()) {
                write!(writer, "{}{}{}: ", dim_start, target, dim_end)?;
            }
            ctx.field_format().format_fields(writer.by_ref(), event)?;
        }

        writeln!(writer)
    }
}

/// Create a timer with custom format
///
/// Uses format: `[year]/[month]/[day] [hour]:[minute]:[second].[subsecond digits:4]`
pub fn create_custom_timer()
-> OffsetTime<&'static [time::format_description::BorrowedFormatItem<'static>]> {
    use time::macros::format_description;

    let format =
        format_description!("[year]/[month]/[day] [hour]:[minute]:[second].[subsecond digits:4]");
    let offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    OffsetTime::new(offset, format)
}

/// Check if dependency logging is enabled via SYNC_FILE_LOGDEPS environment variable
pub fn is_dependency_logging_enabled() -> bool {
    std::env::var("SYNC_FILE_LOGDEPS")
        .map(|v| v == "1")
        .unwrap_or(false)
}

/// Parse a level name as written in config files (`"info"`, `"DEBUG"`, ...)
pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Build the filter directive for dependency logging
///
/// When `log_deps` is false only SyncFile crates and script output are shown.
pub fn build_filter_directives(level: Level, log_deps: bool) -> String {
    let level_str = level.as_str().to_lowercase();

    if log_deps {
        return level_str;
    }

    let mut directives = String::from("off");
    for target in OWN_TARGETS {
        directives.push_str(&format!(",{}={}", target, level_str));
    }
    directives
}

/// Detect if ANSI colors should be used based on environment
///
/// Disables ANSI colors if:
/// - stdout is not a TTY (piped/redirected)
/// - NO_COLOR env var is set (https://no-color.org/)
/// - TERM=dumb
pub fn should_use_ansi() -> bool {
    atty::is(atty::Stream::Stdout)
        && std::env::var("NO_COLOR").is_err()
        && std::env::var("TERM").map(|t| t != "dumb").unwrap_or(true)
}

/// Logging configuration
pub struct LogConfig<W: Write + Send + 'static = std::fs::File> {
    /// Prefix to strip from log targets (e.g., "sync_file_host::")
    pub strip_prefix: String,
    /// Whether to use ANSI color codes (auto-detected if None)
    pub use_ansi: Option<bool>,
    /// Minimum log level
    pub level: Level,
    /// Optional file to write logs to
    pub log_file: Option<W>,
}

impl<W: Write + Send + 'static> LogConfig<W> {
    pub fn new(strip_prefix: impl Into<String>) -> Self {
        Self {
            strip_prefix: strip_prefix.into(),
            use_ansi: None,
            level: Level::INFO,
            log_file: None,
        }
    }

    pub fn with_ansi(mut self, use_ansi: bool) -> Self {
        self.use_ansi = Some(use_ansi);
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_log_file(mut self, file: W) -> Self {
        self.log_file = Some(file);
        self
    }
}

/// Initialize logging with the given configuration
///
/// `RUST_LOG` overrides the default filter directives when set.
pub fn init_logging<W: Write + Send + 'static>(
    config: LogConfig<W>,
) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::EnvFilter;

    let timer = create_custom_timer();
    let use_ansi = config.use_ansi.unwrap_or_else(should_use_ansi);
    let filter_directives = build_filter_directives(config.level, is_dependency_logging_enabled());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&filter_directives));

    let formatter_stdout =
        CustomFormatter::new(timer.clone(), use_ansi).with_strip_prefix(&config.strip_prefix);
    let stdout_layer = tracing_subscriber::fmt::layer()
        .event_format(formatter_stdout)
        .with_ansi(use_ansi)
        .with_writer(std::io::stdout);

    // Files never get color codes
    let file_layer = config.log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .event_format(CustomFormatter::new(timer, false).with_strip_prefix(&config.strip_prefix))
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .with(env_filter)
        .try_init()?;

    Ok(())
}

/// Initialize logging without a log file
pub fn init_logging_simple(
    strip_prefix: impl Into<String>,
    level: Level,
) -> Result<(), Box<dyn std::error::Error>> {
    let config: LogConfig<std::fs::File> = LogConfig::new(strip_prefix).with_level(level);
    init_logging(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_hide_dependencies() {
        let directives = build_filter_directives(Level::DEBUG, false);
        assert!(directives.starts_with("off,"));
        assert!(directives.contains("sync_file=debug"));
        assert!(directives.contains("js=debug"));
    }

    #[test]
    fn test_filter_directives_with_dependencies() {
        assert_eq!(build_filter_directives(Level::WARN, true), "warn");
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("INFO"), Some(Level::INFO));
        assert_eq!(parse_level("warning"), Some(Level::WARN));
        assert_eq!(parse_level("verbose"), None);
    }

    #[test]
    fn test_display_target_strips_prefix() {
        let formatter = CustomFormatter::new((), false).with_strip_prefix("sync_file_host::");
        assert_eq!(formatter.display_target("sync_file_host::config"), Some("config"));
        assert_eq!(formatter.display_target("sync_file_host"), None);
        assert_eq!(formatter.display_target("sync_file::installer"), Some("sync_file::installer"));
    }
}
