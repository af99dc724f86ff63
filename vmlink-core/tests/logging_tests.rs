//! Tests for the operation log sink

use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use tracing_subscriber::layer::SubscriberExt;
use vmlink_core::logging::{LogFlags, OperationLog, OperationLogLayer, Severity};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

#[test]
fn test_file_receives_every_severity() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logs").join("vmlink.log");
    let console = Captured::default();

    let log = OperationLog::new(Severity::Error)
        .with_console_writer(console.clone())
        .with_file(&path)
        .unwrap();

    for severity in [
        Severity::Debug,
        Severity::Info,
        Severity::Advisory,
        Severity::Warning,
        Severity::Exception,
        Severity::Error,
    ] {
        log.write(severity, "entry", LogFlags::default());
    }

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written.lines().count(), 6);
    assert!(written.contains("[ADVISORY] entry"));
    assert!(written.contains("[EXCEPTION] entry"));
    assert_eq!(console.text().lines().count(), 1);
}

#[test]
fn test_line_layout() {
    let console = Captured::default();
    let log = OperationLog::new(Severity::Debug).with_console_writer(console.clone());

    log.write(Severity::Warning, "token expiring", LogFlags::default());

    let line = console.text();
    // [YYYY-MM-DD HH:MM:SS] [WARNING] token expiring
    assert_eq!(&line[0..1], "[");
    assert_eq!(&line[20..22], "] ");
    assert!(line.trim_end().ends_with("[WARNING] token expiring"));
}

#[test]
fn test_flags() {
    let console = Captured::default();
    let file = Captured::default();
    let log = OperationLog::new(Severity::Debug)
        .with_console_writer(console.clone())
        .with_file_writer(file.clone());

    log.write(
        Severity::Info,
        "file only",
        LogFlags {
            suppress_console: true,
            ..Default::default()
        },
    );
    log.write(
        Severity::Info,
        "console only",
        LogFlags {
            suppress_file: true,
            blank_before: true,
            blank_after: true,
            ..Default::default()
        },
    );

    assert!(!console.text().contains("file only"));
    assert!(file.text().contains("file only"));
    assert!(!file.text().contains("console only"));
    assert!(console.text().starts_with('\n'));
    assert!(console.text().ends_with("console only\n\n"));
}

#[test]
fn test_layer_renders_extra_fields() {
    let console = Captured::default();
    let log = OperationLog::new(Severity::Debug).with_console_writer(console.clone());
    let subscriber = tracing_subscriber::registry().with(OperationLogLayer::new(log));

    tracing::subscriber::with_default(subscriber, || {
        tracing::warn!(endpoint = "vc01.lab.local", attempt = 2, "Liveness probe failed");
    });

    let text = console.text();
    assert!(text.contains("[WARNING] Liveness probe failed (endpoint=vc01.lab.local, attempt=2)"));
}

#[test]
fn test_severity_parsing() {
    assert_eq!("advisory".parse::<Severity>(), Ok(Severity::Advisory));
    assert_eq!("EXCEPTION".parse::<Severity>(), Ok(Severity::Exception));
    assert!("verbose".parse::<Severity>().is_err());
}
