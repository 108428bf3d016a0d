//! Terminal progress for CLI downloads.

use std::sync::Mutex;
use std::time::Duration;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::format::{file_summary, format_size};
use crate::{DownloadProgress, FileStats};

/// Creates a byte bar for a download with a known size.
fn make_progress_bar(size: u64, name: &str) -> ProgressBar {
    let bar = ProgressBar::new(size);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{bar:40.cyan/blue}] {bytes}/{total_bytes} @ {bytes_per_sec} ({eta}) - {msg}",
        )
        .expect("progress template is valid")
        .progress_chars("━━╌"),
    );
    bar.set_message(name.to_string());
    bar
}

/// Creates a spinner for a download whose size the server did not announce.
fn make_spinner(name: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {bytes} @ {bytes_per_sec} - {msg}")
            .expect("spinner template is valid"),
    );
    bar.set_message(name.to_string());
    bar
}

/// [`DownloadProgress`] sink drawing one indicatif bar per file.
pub struct BarProgress {
    multi: MultiProgress,
    current: Mutex<Option<ProgressBar>>,
}

impl BarProgress {
    /// Draws into `multi`.
    #[must_use]
    pub const fn new(multi: MultiProgress) -> Self {
        Self {
            multi,
            current: Mutex::new(None),
        }
    }

    fn println(&self, line: impl AsRef<str>) {
        let _ = self.multi.println(line);
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.current.lock() {
            if let Some(bar) = guard.as_ref() {
                f(bar);
            }
        }
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.current.lock().ok().and_then(|mut guard| guard.take())
    }

    #[cfg(test)]
    fn position(&self) -> Option<u64> {
        self.current
            .lock()
            .unwrap()
            .as_ref()
            .map(ProgressBar::position)
    }
}

impl DownloadProgress for BarProgress {
    fn on_url_start(&self, index: usize, total: usize, _url: &str) {
        self.println(format!("\n{}", style(format!("URL {index} of {total}:")).bold()));
    }

    fn on_url_failed(&self, _url: &str, error: &str) {
        if let Some(bar) = self.take_bar() {
            bar.abandon();
        }
        self.println(format!("{} {error}", style("URL failed.").red().bold()));
    }

    fn on_file_start(&self, name: &str, size: Option<u64>) {
        self.println(format!("{name} ({})", format_size(size)));
        let bar = match size {
            Some(size) => make_progress_bar(size, name),
            None => make_spinner(name),
        };
        let bar = self.multi.add(bar);
        bar.enable_steady_tick(Duration::from_millis(250));
        if let Ok(mut guard) = self.current.lock() {
            if let Some(previous) = guard.replace(bar) {
                previous.finish_and_clear();
            }
        }
    }

    fn on_progress(&self, _name: &str, bytes_delta: u64, _speed: u64) {
        self.with_bar(|bar| bar.inc(bytes_delta));
    }

    fn on_file_complete(&self, name: &str, stats: &FileStats) {
        if let Some(bar) = self.take_bar() {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
        self.println(format!("  {}", style(file_summary(name, stats)).green()));
    }

    fn on_skipped(&self, name: &str) {
        self.println(format!(
            "{name}\n  {}",
            style("File already exists locally.").yellow()
        ));
    }

    fn on_error(&self, name: &str, error: &str) {
        if let Some(bar) = self.take_bar() {
            bar.abandon_with_message(format!("{name}: {error}"));
        }
    }
}
