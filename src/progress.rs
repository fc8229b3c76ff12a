//! Progress reporting for long-running database operations.
//!
//! The auxiliary databases report progress through an explicit context object
//! passed to the store constructor instead of process-wide state. The default
//! context is [`SilentProgress`], which discards everything. [`StderrProgress`]
//! writes a single self-updating status line to standard error. Batch reads
//! such as [`crate::CoverageBase::get_many`] are currently the only operations
//! that report progress.

/// Receives progress messages during long operations.
///
/// A task is started with [`start`](Progress::start), reports zero or more
/// [`update`](Progress::update) messages, and finishes with
/// [`end`](Progress::end). Tasks do not nest.
pub trait Progress {
    /// Called when a task begins.
    fn start(&mut self, task: &str);

    /// Called when the current task has something new to report.
    fn update(&mut self, message: &str);

    /// Called when the current task ends.
    fn end(&mut self);
}

//-----------------------------------------------------------------------------

/// Ignores all progress messages.
///
/// This is the context used by the store constructors that do not take one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn start(&mut self, _: &str) {}

    fn update(&mut self, _: &str) {}

    fn end(&mut self) {}
}

//-----------------------------------------------------------------------------

/// Reports progress to standard error, rewriting one status line per task.
#[derive(Debug, Default)]
pub struct StderrProgress {
    task: String,
    width: usize,
}

impl StderrProgress {
    /// Creates a new reporter with no active task.
    pub fn new() -> Self {
        StderrProgress::default()
    }

    // Rewrites the status line, padding over leftovers from a longer line.
    fn show(&mut self, line: &str) {
        let padding = self.width.saturating_sub(line.len());
        eprint!("\r{}{}", line, " ".repeat(padding));
        self.width = line.len();
    }
}

impl Progress for StderrProgress {
    fn start(&mut self, task: &str) {
        self.task = task.to_string();
        self.width = 0;
        let line = format!("{} ...", self.task);
        self.show(&line);
    }

    fn update(&mut self, message: &str) {
        let line = format!("{}: {}", self.task, message);
        self.show(&line);
    }

    fn end(&mut self) {
        let line = format!("{}: done", self.task);
        self.show(&line);
        eprintln!();
        self.task.clear();
        self.width = 0;
    }
}

//-----------------------------------------------------------------------------
