//! Structured logger with dry-run awareness and per-target summary.
use std::path::PathBuf;
use std::sync::Mutex;

use super::utils::log_file_path;

/// Outcome of reconciling one target, for the run summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetStatus {
    /// Already converged; nothing to do.
    InSync,
    /// Changes were applied.
    Changed,
    /// Changes were found but only reported (dry run).
    DryRun,
    /// Reconciliation failed.
    Failed,
}

/// One target's recorded outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEntry {
    pub name: String,
    pub status: TargetStatus,
    pub message: Option<String>,
}

/// Logger facade over [`tracing`].
///
/// All messages also land in the persistent log file at
/// `$XDG_CACHE_HOME/confsync/<command>.log` (default
/// `~/.cache/confsync/<command>.log`) with timestamps and ANSI codes
/// stripped, regardless of the verbose flag.
#[derive(Debug)]
pub struct Logger {
    targets: Mutex<Vec<TargetEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a new logger.
    ///
    /// Stores the log file path for display in the run summary. The file
    /// itself is created and initialised by
    /// [`init_subscriber`](super::init_subscriber); this constructor does
    /// not write to it.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            targets: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: "confsync::stage", "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message. Tagged in the text itself so it reads
    /// the same on the console and in the log file.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!("(dry run) {msg}");
    }

    /// Record a target outcome for the summary.
    pub fn record_target(&self, name: &str, status: TargetStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.targets.lock() {
            guard.push(TargetEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Count the number of failed targets.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.targets.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|t| t.status == TargetStatus::Failed)
                .count()
        })
    }

    /// Return a clone of all recorded target entries.
    #[must_use]
    pub fn target_entries(&self) -> Vec<TargetEntry> {
        self.targets.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Print the summary of all recorded targets.
    pub fn print_summary(&self) {
        let targets = match self.targets.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };
        if targets.is_empty() {
            return;
        }

        println!();
        self.stage("Summary");

        let mut in_sync = 0u32;
        let mut changed = 0u32;
        let mut dry_run = 0u32;
        let mut failed = 0u32;

        for target in &targets {
            let (icon, color) = match target.status {
                TargetStatus::InSync => {
                    in_sync += 1;
                    ("✓", "\x1b[32m")
                }
                TargetStatus::Changed => {
                    changed += 1;
                    ("~", "\x1b[33m")
                }
                TargetStatus::DryRun => {
                    dry_run += 1;
                    ("○", "\x1b[37m")
                }
                TargetStatus::Failed => {
                    failed += 1;
                    ("✗", "\x1b[31m")
                }
            };

            let suffix = target
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", target.name));
        }

        println!();
        let total = in_sync + changed + dry_run + failed;
        self.info(&format!(
            "{total} targets: \x1b[32m{in_sync} in sync\x1b[0m, \x1b[33m{changed} changed\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m, \x1b[31m{failed} failed\x1b[0m"
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn logger_starts_empty() {
        let log = Logger::new("test");
        assert!(log.target_entries().is_empty());
    }

    #[test]
    fn record_target_in_sync() {
        let log = Logger::new("test");
        log.record_target("app", TargetStatus::InSync, None);
        let entries = log.target_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "app");
        assert_eq!(entries[0].status, TargetStatus::InSync);
    }

    #[test]
    fn record_target_with_message() {
        let log = Logger::new("test");
        log.record_target("web", TargetStatus::Failed, Some("apply failed"));
        assert_eq!(
            log.target_entries()[0].message,
            Some("apply failed".to_string())
        );
    }

    #[test]
    fn failure_count_counts_only_failures() {
        let log = Logger::new("test");
        assert_eq!(log.failure_count(), 0);
        log.record_target("a", TargetStatus::Changed, None);
        log.record_target("b", TargetStatus::Failed, Some("boom"));
        log.record_target("c", TargetStatus::Failed, Some("boom2"));
        log.record_target("d", TargetStatus::DryRun, None);
        assert_eq!(log.failure_count(), 2);
    }
}
