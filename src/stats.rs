//! Per-transfer accounting.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Statistics for a finished file transfer.
#[derive(Debug, Clone)]
pub struct FileStats {
    /// Bytes written to disk.
    pub size: u64,
    /// Size announced by `Content-Length`, if any.
    pub expected_size: Option<u64>,
    /// Time taken by the transfer.
    pub elapsed: Duration,
    /// Average speed in bytes per second.
    pub average_speed: u64,
    /// Peak speed in bytes per second.
    pub peak_speed: u64,
}

impl FileStats {
    /// Returns `true` if the server announced a size and fewer bytes arrived.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.expected_size.is_some_and(|expected| self.size < expected)
    }
}

/// State of one in-flight transfer. Lives only for the duration of a single
/// download call.
#[derive(Debug)]
pub struct TransferState {
    destination: PathBuf,
    offset: u64,
    expected_size: Option<u64>,
    start_time: Instant,
    peak_speed: u64,
}

impl TransferState {
    /// Starts tracking a from-scratch transfer into `destination`.
    #[must_use]
    pub fn new(destination: PathBuf, expected_size: Option<u64>) -> Self {
        Self {
            destination,
            offset: 0,
            expected_size,
            start_time: Instant::now(),
            peak_speed: 0,
        }
    }

    /// Records `bytes` written and returns the current average speed.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn record_bytes(&mut self, bytes: u64) -> u64 {
        self.offset += bytes;
        let secs = self.start_time.elapsed().as_secs_f64();
        if secs > 0.0 {
            let speed = (self.offset as f64 / secs) as u64;
            self.peak_speed = self.peak_speed.max(speed);
            speed
        } else {
            0
        }
    }

    /// Bytes written so far.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// Size announced by the server.
    #[must_use]
    pub const fn expected_size(&self) -> Option<u64> {
        self.expected_size
    }

    /// File being written.
    #[must_use]
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Returns the elapsed time since the transfer started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns the average speed in bytes per second.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn average_speed(&self) -> u64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            (self.offset as f64 / secs) as u64
        } else {
            0
        }
    }

    /// Converts this state into final file statistics.
    #[must_use]
    pub fn into_file_stats(self) -> FileStats {
        FileStats {
            size: self.offset,
            expected_size: self.expected_size,
            elapsed: self.elapsed(),
            average_speed: self.average_speed(),
            peak_speed: self.peak_speed,
        }
    }
}
