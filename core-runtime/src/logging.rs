//! # Logging & Tracing Infrastructure
//!
//! Structured logging built on `tracing`, supporting:
//! - Pretty, JSON and compact console output (written to stderr)
//! - An optional plain-text log file alongside the console
//! - Crate-level filtering with `RUST_LOG` taking precedence
//! - Explicit [`LogContext`] values handed to each component
//! - Redaction helpers for tokens and secrets
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogContext, LogLevel, LoggingConfig};
//!
//! let config = LoggingConfig::default()
//!     .with_level(LogLevel::Debug)
//!     .with_log_file("harvest.log");
//! init_logging(config)?;
//!
//! let log = LogContext::for_run();
//! let enumerator_log = log.component("enumerator");
//! ```
//!
//! ## Logging contexts
//!
//! The subscriber is installed once by the binary, but components never log
//! "into the void": each one is constructed with a [`LogContext`] and wraps
//! its operations in spans derived from it. Two harvesters running in the
//! same process therefore produce distinguishable, correctly nested output.

use crate::error::{Error, Result};

use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use tracing::Span;
use tracing_subscriber::{
    filter::EnvFilter, fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt,
    Layer, Registry,
};

/// Crates whose events are shown at the configured level; everything else
/// is limited to warnings.
const WORKSPACE_TARGETS: &[&str] = &[
    "docharvest",
    "core_runtime",
    "core_auth",
    "core_library",
    "core_transfer",
    "core_service",
    "provider_sharepoint",
    "provider_bedrock",
    "bridge_desktop",
];

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    /// Accepts `tracing` spellings and the `WARNING` / `CRITICAL` names used by
    /// older command lines, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" | "critical" => Ok(LogLevel::Error),
            other => Err(Error::Config(format!("Unknown log level: {}", other))),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Single-line format
    #[default]
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Console output format
    pub format: LogFormat,
    /// Minimum log level for workspace crates
    pub level: LogLevel,
    /// Custom filter string (e.g., "provider_sharepoint=trace")
    pub filter: Option<String>,
    /// Mirror every event into this file (appended, no ANSI colors)
    pub log_file: Option<PathBuf>,
    /// Emit span open/close events
    pub enable_spans: bool,
    /// Display target module in logs
    pub display_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            log_file: None,
            enable_spans: false,
            display_target: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }
}

/// Initialize the logging system
///
/// This should be called once during application startup. Subsequent calls
/// return an error.
///
/// # Errors
///
/// Returns [`Error::Config`] if:
/// - Logging is already initialized
/// - The filter string is invalid
/// - The log file cannot be opened
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    let mut layers: Vec<BoxedLayer> = vec![console_layer(&config)];
    if let Some(layer) = file_layer(&config)? {
        layers.push(layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(from_env) = EnvFilter::try_from_default_env() {
        return Ok(from_env);
    }

    let filter_string = match &config.filter {
        Some(custom) => custom.clone(),
        None => default_filter(config.level),
    };

    EnvFilter::try_new(filter_string)
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

fn default_filter(level: LogLevel) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(
        WORKSPACE_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level.as_filter_str())),
    );
    directives.join(",")
}

fn span_events(config: &LoggingConfig) -> FmtSpan {
    if config.enable_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

fn console_layer(config: &LoggingConfig) -> BoxedLayer {
    let base = tracing_subscriber::fmt::layer()
        .with_target(config.display_target)
        .with_span_events(span_events(config))
        .with_writer(io::stderr);

    match config.format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Json => base
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Compact => base.compact().boxed(),
    }
}

fn file_layer(config: &LoggingConfig) -> Result<Option<BoxedLayer>> {
    let Some(path) = config.log_file.as_ref() else {
        return Ok(None);
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            Error::Config(format!(
                "Cannot open log file {}: {}",
                path.display(),
                e
            ))
        })?;

    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_span_events(span_events(config))
        .with_writer(Mutex::new(file))
        .boxed();

    Ok(Some(layer))
}

/// Logging context handed to a component at construction time.
///
/// Cloning is cheap; clones share the same parent span.
#[derive(Debug, Clone)]
pub struct LogContext {
    component: &'static str,
    span: Span,
}

impl LogContext {
    /// Root context for one harvester run, tagged with a fresh run id.
    pub fn for_run() -> Self {
        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let short_id = &run_id[..8];
        Self {
            component: "harvest",
            span: tracing::info_span!("harvest", run = short_id),
        }
    }

    /// Context that records nothing; useful in tests.
    pub fn disabled() -> Self {
        Self {
            component: "disabled",
            span: Span::none(),
        }
    }

    /// Child context for a named component.
    pub fn component(&self, name: &'static str) -> Self {
        Self {
            component: name,
            span: tracing::info_span!(parent: &self.span, "component", name),
        }
    }

    pub fn component_name(&self) -> &'static str {
        self.component
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Span for a single operation performed by this component.
    pub fn operation(&self, op: &'static str) -> Span {
        tracing::debug_span!(parent: &self.span, "op", component = self.component, op)
    }
}

impl Default for LogContext {
    fn default() -> Self {
        Self::for_run()
    }
}

/// Helper function to redact sensitive field values
///
/// ```ignore
/// use tracing::info;
/// use core_runtime::logging::redact_if_sensitive;
///
/// info!(client_secret = %redact_if_sensitive("client_secret", secret), "Loaded settings");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    const SENSITIVE_FIELDS: &[&str] = &[
        "token",
        "password",
        "secret",
        "api_key",
        "authorization",
        "bearer",
        "verifier",
        "code",
        "credential",
    ];

    let field_lower = field_name.to_lowercase();
    if SENSITIVE_FIELDS.iter().any(|&f| field_lower.contains(f)) {
        "[REDACTED]".to_string()
    } else if value.contains('@') && value.contains('.') {
        // Likely an email - redact domain but keep first char
        match value.find('@') {
            Some(at_pos) => format!("{}***@[REDACTED]", &value[..1.min(at_pos)]),
            None => value.to_string(),
        }
    } else {
        value.to_string()
    }
}

/// Strip full file paths to basename only
pub fn strip_path(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Json)
            .with_level(LogLevel::Debug)
            .with_filter("core_auth=trace")
            .with_log_file("/tmp/harvest.log")
            .with_spans(true)
            .with_target(true);

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.filter, Some("core_auth=trace".to_string()));
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/harvest.log")));
        assert!(config.enable_spans);
        assert!(config.display_target);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("info".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("ERROR".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_default_filter_covers_workspace() {
        let filter = default_filter(LogLevel::Debug);

        assert!(filter.starts_with("warn,"));
        assert!(filter.contains("provider_sharepoint=debug"));
        assert!(filter.contains("core_transfer=debug"));
        assert!(EnvFilter::try_new(filter).is_ok());
    }

    #[test]
    fn test_build_custom_filter() {
        let config = LoggingConfig::default().with_filter("core_auth=trace");
        let filter = build_filter(&config).unwrap();
        // RUST_LOG may be set in the environment running the tests
        if std::env::var("RUST_LOG").is_err() {
            assert!(filter.to_string().contains("core_auth=trace"));
        }
    }

    #[test]
    fn test_file_layer_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig::default().with_log_file(dir.path().join("missing/dir/x.log"));

        let err = file_layer(&config).err().unwrap();
        assert!(matches!(err, Error::Config(msg) if msg.contains("Cannot open log file")));
    }

    #[test]
    fn test_file_layer_absent_without_path() {
        assert!(file_layer(&LoggingConfig::default()).unwrap().is_none());
    }

    #[test]
    fn test_log_context_component_names() {
        let root = LogContext::disabled();
        let child = root.component("enumerator");

        assert_eq!(child.component_name(), "enumerator");
        assert!(child.span().is_disabled());
    }

    #[test]
    fn test_redact_if_sensitive() {
        assert_eq!(redact_if_sensitive("access_token", "secret123"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("client_secret", "abc"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("code_verifier", "xyz"), "[REDACTED]");

        let redacted = redact_if_sensitive("mail", "user@example.com");
        assert!(redacted.starts_with('u'));
        assert!(!redacted.contains("example.com"));

        assert_eq!(redact_if_sensitive("library", "Documents"), "Documents");
    }

    #[test]
    fn test_strip_path() {
        assert_eq!(strip_path("/srv/downloads/Documents/report.pdf"), "report.pdf");
        assert_eq!(strip_path("C:\\Users\\ana\\report.pdf"), "report.pdf");
        assert_eq!(strip_path("report.pdf"), "report.pdf");
        assert_eq!(strip_path("/var/log/"), "");
    }
}
