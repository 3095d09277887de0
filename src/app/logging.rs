//! Operator event stream.
//!
//! The probe reports what it is doing through an `EventSink` handed to it by
//! the caller. The console sink prints one timestamped line per event; tests
//! collect events into a `Vec<String>` instead.

use std::io::Write;

use chrono::{DateTime, Local};

/// Receives operator-facing event lines.
pub trait EventSink {
    /// Emits one event line. Implementations add their own timestamping.
    fn emit(&mut self, message: &str);
}

/// Collects raw messages, without timestamps.
impl EventSink for Vec<String> {
    fn emit(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

/// Writes `<ISO 8601 local timestamp>  <message>` lines to a writer.
///
/// Each line is flushed immediately so the stream stays readable when piped.
/// Write errors are ignored: a closed stdout must not abort a probe that is
/// already talking to the target.
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl ConsoleSink<std::io::Stdout> {
    /// Creates a sink that writes to standard output.
    pub fn stdout() -> Self {
        ConsoleSink {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> ConsoleSink<W> {
    /// Creates a sink that writes to any writer.
    pub fn new(out: W) -> Self {
        ConsoleSink { out }
    }

    /// Consumes the sink and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for ConsoleSink<W> {
    fn emit(&mut self, message: &str) {
        let line = format_event_line(Local::now(), message);
        let _ = writeln!(self.out, "{line}");
        let _ = self.out.flush();
    }
}

/// Formats one event line: timestamp, two spaces, message.
pub fn format_event_line(timestamp: DateTime<Local>, message: &str) -> String {
    format!("{}  {}", timestamp.format("%Y-%m-%dT%H:%M:%S%.6f"), message)
}
