//! Progress reporting hooks for long-running pipeline stages
//!
//! The pipeline never prints on its own; callers pass a reporter and decide
//! how (or whether) to surface progress.

use std::cell::Cell;

/// Receives observational progress events from the pipeline
pub trait ProgressReporter {
    /// Called after each received chunk with the running byte total
    fn downloaded(&self, _total_bytes: u64) {}

    /// Called after a project file has been written
    fn file_written(&self, _relative_path: &str) {}
}

/// Reporter that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {}

/// Reporter that tallies events, handy for summaries
#[derive(Debug, Default)]
pub struct CountingProgress {
    bytes: Cell<u64>,
    files: Cell<usize>,
}

impl CountingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes downloaded so far
    pub fn bytes(&self) -> u64 {
        self.bytes.get()
    }

    /// Number of files written so far
    pub fn files(&self) -> usize {
        self.files.get()
    }
}

impl ProgressReporter for CountingProgress {
    fn downloaded(&self, total_bytes: u64) {
        self.bytes.set(total_bytes);
    }

    fn file_written(&self, _relative_path: &str) {
        self.files.set(self.files.get() + 1);
    }
}

/// Format a byte count the way the download spinner shows it
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;

    let bytes_f = bytes as f64;
    if bytes_f >= MIB {
        format!("{:.1} MiB", bytes_f / MIB)
    } else if bytes_f >= KIB {
        format!("{:.1} KiB", bytes_f / KIB)
    } else {
        format!("{} B", bytes)
    }
}
