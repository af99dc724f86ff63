//! Operational log sink
//!
//! Library code logs through `tracing`. The [`OperationLogLayer`] turns each
//! event into a line written by [`OperationLog`]: to the console when the
//! event's [`Severity`] reaches the configured minimum, and to the log file
//! unconditionally.
//!
//! Tracing has five levels while the operation log has six severities.
//! `ADVISORY` and `EXCEPTION` are carried as a `severity` field, see the
//! [`advisory!`](crate::advisory) and [`exception!`](crate::exception) macros.
//! Line layout is controlled per event with the boolean fields
//! `suppress_console`, `suppress_file`, `blank_before` and `blank_after`.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Log an `ADVISORY` event (informational, but worth the operator's attention)
#[macro_export]
macro_rules! advisory {
    ($($arg:tt)+) => {
        ::tracing::info!(severity = "advisory", $($arg)+)
    };
}

/// Log an `EXCEPTION` event (an unexpected failure that was handled)
#[macro_export]
macro_rules! exception {
    ($($arg:tt)+) => {
        ::tracing::error!(severity = "exception", $($arg)+)
    };
}

/// Operation log severities, in strictly increasing order
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Advisory,
    Warning,
    Exception,
    Error,
}

impl Severity {
    /// Upper-case label written into each line
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Advisory => "ADVISORY",
            Severity::Warning => "WARNING",
            Severity::Exception => "EXCEPTION",
            Severity::Error => "ERROR",
        }
    }

    /// Severity of a tracing event without an explicit `severity` field
    pub fn from_level(level: &Level) -> Self {
        match *level {
            Level::TRACE | Level::DEBUG => Severity::Debug,
            Level::INFO => Severity::Info,
            Level::WARN => Severity::Warning,
            Level::ERROR => Severity::Error,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Severity::Debug),
            "info" => Ok(Severity::Info),
            "advisory" => Ok(Severity::Advisory),
            "warning" | "warn" => Ok(Severity::Warning),
            "exception" => Ok(Severity::Exception),
            "error" => Ok(Severity::Error),
            other => Err(format!("unknown severity: {}", other)),
        }
    }
}

/// Per-line layout flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogFlags {
    pub suppress_console: bool,
    pub suppress_file: bool,
    pub blank_before: bool,
    pub blank_after: bool,
}

type SharedWriter = Mutex<Box<dyn Write + Send>>;

/// Console and file sink for operation log lines
pub struct OperationLog {
    console_level: Severity,
    console: SharedWriter,
    file: Option<SharedWriter>,
}

impl OperationLog {
    /// Create a sink writing to stderr, filtered at `console_level`
    pub fn new(console_level: Severity) -> Self {
        Self {
            console_level,
            console: Mutex::new(Box::new(std::io::stderr())),
            file: None,
        }
    }

    /// Replace the console writer
    pub fn with_console_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.console = Mutex::new(Box::new(writer));
        self
    }

    /// Append every line to `path`, creating the file and its directory
    pub fn with_file(self, path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(self.with_file_writer(file))
    }

    /// Replace the file writer
    pub fn with_file_writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.file = Some(Mutex::new(Box::new(writer)));
        self
    }

    /// Minimum severity shown on the console
    pub fn console_level(&self) -> Severity {
        self.console_level
    }

    /// Write one entry
    ///
    /// Write failures are swallowed: logging never fails the operation
    /// being logged.
    pub fn write(&self, severity: Severity, text: &str, flags: LogFlags) {
        let line = format!(
            "[{}] [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            severity.label(),
            text
        );

        if !flags.suppress_console && severity >= self.console_level {
            if let Ok(mut console) = self.console.lock() {
                let _ = write_entry(console.as_mut(), &line, flags);
            }
        }

        if !flags.suppress_file {
            if let Some(file) = &self.file {
                if let Ok(mut file) = file.lock() {
                    let _ = write_entry(file.as_mut(), &line, flags);
                }
            }
        }
    }
}

fn write_entry(writer: &mut dyn Write, line: &str, flags: LogFlags) -> std::io::Result<()> {
    if flags.blank_before {
        writeln!(writer)?;
    }
    writeln!(writer, "{}", line)?;
    if flags.blank_after {
        writeln!(writer)?;
    }
    writer.flush()
}

/// `tracing` layer feeding an [`OperationLog`]
#[derive(Clone)]
pub struct OperationLogLayer {
    log: Arc<OperationLog>,
}

impl OperationLogLayer {
    pub fn new(log: OperationLog) -> Self {
        Self { log: Arc::new(log) }
    }
}

impl<S> Layer<S> for OperationLogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let severity = visitor
            .severity
            .unwrap_or_else(|| Severity::from_level(event.metadata().level()));
        self.log.write(severity, &visitor.render(), visitor.flags);
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: Vec<String>,
    severity: Option<Severity>,
    flags: LogFlags,
}

impl EventVisitor {
    fn render(&self) -> String {
        if self.fields.is_empty() {
            self.message.clone()
        } else {
            format!("{} ({})", self.message, self.fields.join(", "))
        }
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "severity" => self.severity = value.parse().ok(),
            "message" => self.message = value.to_string(),
            name => self.fields.push(format!("{}={}", name, value)),
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        match field.name() {
            "suppress_console" => self.flags.suppress_console = value,
            "suppress_file" => self.flags.suppress_file = value,
            "blank_before" => self.flags.blank_before = value,
            "blank_after" => self.flags.blank_after = value,
            name => self.fields.push(format!("{}={}", name, value)),
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}
