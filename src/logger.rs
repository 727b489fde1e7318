//! Rust-style colored logging without emojis
//!
//! Diagnostics from a swizzle pass flow through the `DiagnosticSink` trait
//! so callers can redirect them; `Logger` is the default console sink.

use std::sync::Mutex;

/// Receives single-line diagnostics, one per swizzle outcome.
pub trait DiagnosticSink {
    /// Informational line (successful replacement, skip detail).
    fn line(&self, message: &str);

    /// Warning line (unresolvable symbol, rejected install).
    fn warn(&self, message: &str);
}

pub struct Logger {
    use_color: bool,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            use_color: std::env::var("NO_COLOR").is_err(),
        }
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", self.cyan("INFO"), message);
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", self.green("OK"), message);
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", self.yellow("WARN"), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.red("ERROR"), message);
    }

    // Color helpers
    fn red(&self, s: &str) -> String {
        self.paint("31", s)
    }

    fn green(&self, s: &str) -> String {
        self.paint("32", s)
    }

    fn yellow(&self, s: &str) -> String {
        self.paint("33", s)
    }

    fn cyan(&self, s: &str) -> String {
        self.paint("36", s)
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.use_color {
            format!("\x1b[{}m{}\x1b[0m", code, s)
        } else {
            s.to_string()
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink for Logger {
    fn line(&self, message: &str) {
        self.success(message);
    }

    fn warn(&self, message: &str) {
        self.warning(message);
    }
}

/// Collects diagnostic lines for inspection in tests.
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .any(|line| line.contains(needle))
    }
}

impl DiagnosticSink for MemorySink {
    fn line(&self, message: &str) {
        self.lines.lock().unwrap().push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.lines
            .lock()
            .unwrap()
            .push(format!("warning: {}", message));
    }
}

// Global logger instance
lazy_static::lazy_static! {
    pub static ref LOG: Logger = Logger::new();
}
