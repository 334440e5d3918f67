//! Operator-facing run report: messages, severity levels, and aggregation.
//!
//! Every message goes to stdout (unless the reporter is quiet) and to the
//! `tracing` log at the matching level, and is kept in the [`RunReport`].

use tracing::{error, info, warn};

/// Severity level of a report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Progress message.
    Info,
    /// Non-blocking problem.
    Warning,
    /// Problem that makes the run unsuccessful.
    Error,
}

/// A single report message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    /// Human-readable message.
    pub message: String,
    /// Severity of the message.
    pub severity: Severity,
    /// Optional additional detail lines.
    pub details: Vec<String>,
}

impl ReportEntry {
    /// Creates a progress entry.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Info,
            details: Vec::new(),
        }
    }

    /// Creates a warning entry.
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Warning,
            details: Vec::new(),
        }
    }

    /// Creates an error entry with additional detail lines.
    pub fn error_with_details(message: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            message: message.into(),
            severity: Severity::Error,
            details,
        }
    }

    /// Attaches detail lines.
    #[must_use]
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }

    /// Returns true if this entry is an error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Everything reported during one run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Entries in the order they were reported.
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the count of error entries.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_error()).count()
    }

    /// Returns true if any entry's message contains `needle`.
    #[must_use]
    pub fn mentions(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.message.contains(needle))
    }
}

/// Prints and logs report entries.
#[derive(Debug)]
pub struct Reporter {
    echo: bool,
    report: RunReport,
}

impl Reporter {
    /// A reporter that prints every entry to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            echo: true,
            report: RunReport::new(),
        }
    }

    /// A reporter that only logs and records.
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            echo: false,
            report: RunReport::new(),
        }
    }

    /// Reports a progress message.
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ReportEntry::info(message));
    }

    /// Reports a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(ReportEntry::warn(message));
    }

    /// Reports an entry.
    pub fn push(&mut self, entry: ReportEntry) {
        match entry.severity {
            Severity::Info => info!(details = ?entry.details, "{}", entry.message),
            Severity::Warning => warn!(details = ?entry.details, "{}", entry.message),
            Severity::Error => error!(details = ?entry.details, "{}", entry.message),
        }
        if self.echo {
            println!("{}", entry.message);
            for line in &entry.details {
                println!("  {line}");
            }
        }
        self.report.entries.push(entry);
    }

    /// Everything reported so far.
    #[must_use]
    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Consumes the reporter, returning what it recorded.
    #[must_use]
    pub fn into_report(self) -> RunReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_recorded_in_order() {
        let mut reporter = Reporter::quiet();
        reporter.info("one");
        reporter.warn("two");
        reporter.push(ReportEntry::error_with_details("three", vec!["detail".to_owned()]));
        let report = reporter.into_report();
        let messages: Vec<_> = report.entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, ["one", "two", "three"]);
        assert_eq!(report.error_count(), 1);
        assert!(report.mentions("thr"));
    }
}
