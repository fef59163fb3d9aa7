//! Progress reporting for fetch runs. Purely observational.

use std::fmt;
use std::io::Write;

/// Snapshot emitted after each stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Messages stored so far in this run.
    pub total: usize,
    /// 1-based page number.
    pub page: u32,
    /// 1-based position within the page.
    pub position: usize,
    pub page_size: usize,
    /// Provider's estimate of the full listing size, if it gave one.
    pub result_size_estimate: Option<u64>,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}); page {}; email {}/{} | ",
            self.total, self.page, self.position, self.page_size
        )?;
        match self.result_size_estimate {
            Some(estimate) => write!(f, "{estimate}"),
            None => f.write_str("?"),
        }
    }
}

/// Receiver of progress events.
pub trait ProgressReporter: Send + Sync {
    fn message_stored(&self, progress: &Progress);

    /// Called once after the last page, successful runs only.
    fn finished(&self, _total: usize) {}

    /// Called once when a run ends with an error.
    fn failed(&self, _total: usize) {}
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn message_stored(&self, _progress: &Progress) {}
}

/// Single overwriting status line on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalProgress;

impl ProgressReporter for TerminalProgress {
    fn message_stored(&self, progress: &Progress) {
        let mut stderr = std::io::stderr().lock();
        let _ = write!(stderr, "\r{progress}");
        let _ = stderr.flush();
    }

    fn finished(&self, total: usize) {
        end_line(total);
    }

    fn failed(&self, total: usize) {
        end_line(total);
    }
}

/// Terminate the status line so whatever prints next starts on its own line.
fn end_line(total: usize) {
    if total > 0 {
        eprintln!();
    }
}
