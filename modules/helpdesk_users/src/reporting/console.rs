//! Human-readable progress output.
//!
//! Rendering is a pure function of the event ([`render`]); [`ConsoleReporter`]
//! only decides where the text goes.

use std::io::Write;

use crate::domain::ports::{ProgressEvent, Reporter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Out,
    Err,
}

/// One rendered message and the stream it belongs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub stream: Stream,
    pub text: String,
}

impl Line {
    fn out(text: impl Into<String>) -> Self {
        Self {
            stream: Stream::Out,
            text: text.into(),
        }
    }

    fn err(text: impl Into<String>) -> Self {
        Self {
            stream: Stream::Err,
            text: text.into(),
        }
    }
}

pub fn render(event: &ProgressEvent) -> Line {
    match event {
        ProgressEvent::BatchStarted { total } => {
            Line::out(format!("\n📧 Processing {} email address(es)...\n", total))
        }
        ProgressEvent::Checking { email } => Line::out(format!("\nChecking user: {}", email)),
        ProgressEvent::UserFound { user } => {
            Line::out(format!("✓ Found user: {} (ID: {})", user.name, user.id))
        }
        ProgressEvent::NotFound { email } => Line::out(format!("❌ User not found: {}", email)),
        ProgressEvent::Unsuspending { .. } => Line::out("⚠ User is suspended. Unsuspending..."),
        ProgressEvent::Unsuspended { email } => {
            Line::out(format!("✓ Successfully unsuspended: {}", email))
        }
        ProgressEvent::AlreadyActive { email } => {
            Line::out(format!("✓ User is already active: {}", email))
        }
        ProgressEvent::Failed { email, error } => {
            Line::err(format!("❌ Error processing {}: {}", email, error))
        }
        ProgressEvent::BatchFinished { summary } => Line::out(format!(
            "\n📊 Summary:\n\
             Total processed: {}\n\
             Unsuspended: {}\n\
             Already active: {}\n\
             Not found: {}\n\
             Errors: {}",
            summary.total,
            summary.unsuspended,
            summary.already_active,
            summary.not_found,
            summary.errors
        )),
    }
}

/// Writes progress to the terminal. Failures go to stderr; everything else
/// goes to stdout, or to stderr as well when stdout is reserved for
/// machine-readable output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    stdout_reserved: bool,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send all progress to stderr.
    pub fn stderr_only() -> Self {
        Self {
            stdout_reserved: true,
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, event: &ProgressEvent) {
        let line = render(event);
        // A closed pipe must not abort the batch
        let _ = match (line.stream, self.stdout_reserved) {
            (Stream::Out, false) => writeln!(std::io::stdout().lock(), "{}", line.text),
            _ => writeln!(std::io::stderr().lock(), "{}", line.text),
        };
    }
}
