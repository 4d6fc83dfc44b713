//! Transient user notifications (success and error).

use std::io::Write;

pub trait Notifier: Send + Sync {
    fn notify_error(&self, message: &str);
    fn notify_success(&self, message: &str);
}

/// Prints notifications on stderr, as the interactive CLI does.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify_error(&self, message: &str) {
        let _ = writeln!(std::io::stderr(), "Error: {}", message);
    }

    fn notify_success(&self, message: &str) {
        let _ = writeln!(std::io::stderr(), "{}", message);
    }
}
