//! Streaming file transfer to disk.

use std::path::Path;
use std::sync::Arc;

use futures::TryStreamExt;
use reqwest::header::{RANGE, REFERER};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;

use crate::config::DownloadConfig;
use crate::error::{Error, Result};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::resolve::ResolvedDownload;
use crate::stats::{FileStats, TransferState};

/// Trait for receiving download progress updates.
///
/// All methods have default no-op implementations for convenience.
pub trait DownloadProgress: Send + Sync {
    /// Called before a candidate URL is processed (`index` is 1-based).
    fn on_url_start(&self, _index: usize, _total: usize, _url: &str) {}

    /// Called when a candidate URL could not be matched, resolved or fetched.
    fn on_url_failed(&self, _url: &str, _error: &str) {}

    /// Called when the transfer starts. `size` is `None` when the server sent
    /// no `Content-Length`.
    fn on_file_start(&self, _name: &str, _size: Option<u64>) {}

    /// Called after each chunk is written with the chunk's size.
    fn on_progress(&self, _name: &str, _bytes_delta: u64, _speed: u64) {}

    /// Called when a file download completes successfully.
    fn on_file_complete(&self, _name: &str, _stats: &FileStats) {}

    /// Called when the file is already present and overwrite is off.
    fn on_skipped(&self, _name: &str) {}

    /// Called when a transfer fails after it has started.
    fn on_error(&self, _name: &str, _error: &str) {}
}

/// A null progress implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl DownloadProgress for NoProgress {}

/// What [`Fetcher::download`] did.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The destination already existed; nothing was requested.
    AlreadyExists,
    /// The file was streamed to disk.
    Downloaded(FileStats),
}

/// Streams resolved links into an output directory.
pub struct Fetcher<F: FileSystem = TokioFileSystem> {
    client: reqwest::Client,
    config: DownloadConfig,
    fs: F,
}

impl Fetcher<TokioFileSystem> {
    /// Creates a new fetcher with the default file system.
    #[must_use]
    pub const fn new(client: reqwest::Client, config: DownloadConfig) -> Self {
        Self {
            client,
            config,
            fs: TokioFileSystem,
        }
    }
}

impl<F: FileSystem> Fetcher<F> {
    /// Creates a new fetcher with a custom file system implementation.
    #[must_use]
    pub const fn with_fs(client: reqwest::Client, config: DownloadConfig, fs: F) -> Self {
        Self { client, config, fs }
    }

    /// Creates `output_dir` if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn ensure_output_dir(&self, output_dir: &Path) -> Result<()> {
        self.fs.create_dir_all(output_dir).await?;
        Ok(())
    }

    /// Downloads `target` into `output_dir` under its decoded file name.
    ///
    /// An existing file is left alone unless `force_overwrite` is set, in
    /// which case it is truncated and rewritten from the first byte.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Status`] for a non-success response, [`Error::Http`]
    /// if the request cannot be sent, and [`Error::Transfer`] if reading the
    /// body or writing the file fails. A partially written file is left on
    /// disk.
    pub async fn download(
        &self,
        target: &ResolvedDownload,
        output_dir: &Path,
        progress: &Arc<dyn DownloadProgress>,
    ) -> Result<FetchOutcome> {
        let name = target.file_name.as_str();
        let destination = output_dir.join(name);

        if self.fs.file_exists(&destination).await {
            if !self.config.force_overwrite {
                log::info!("File already exists locally: {}", destination.display());
                progress.on_skipped(name);
                return Ok(FetchOutcome::AlreadyExists);
            }
            log::info!("File already exists locally. Will overwrite: {}", destination.display());
        }

        let response = self.open_stream(target).await?;
        let expected_size = response.content_length();
        let mut file = self.fs.create_file(&destination).await?;
        let mut state = TransferState::new(destination, expected_size);

        progress.on_file_start(name, expected_size);

        if let Err(e) = self
            .stream_body(response, &mut file, &mut state, name, progress.as_ref())
            .await
        {
            let err = Error::Transfer {
                url: target.final_url.clone(),
                source: e,
            };
            progress.on_error(name, &err.to_string());
            return Err(err);
        }

        if let Some(expected) = state.expected_size().filter(|&e| state.offset() < e) {
            log::warn!(
                "{}: received {} of {expected} announced bytes",
                state.destination().display(),
                state.offset()
            );
        }
        let stats = state.into_file_stats();
        progress.on_file_complete(name, &stats);
        Ok(FetchOutcome::Downloaded(stats))
    }

    /// Sends the ranged, referred GET and checks its status.
    async fn open_stream(&self, target: &ResolvedDownload) -> Result<reqwest::Response> {
        let response = self
            .client
            .get(&target.final_url)
            .header(RANGE, "bytes=0-")
            .header(REFERER, &target.referer_url)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: target.final_url.clone(),
                status,
            });
        }
        Ok(response)
    }

    /// Copies the response body into `file` in `chunk_size` reads.
    async fn stream_body(
        &self,
        response: reqwest::Response,
        file: &mut tokio::fs::File,
        state: &mut TransferState,
        name: &str,
        progress: &dyn DownloadProgress,
    ) -> std::io::Result<()> {
        // Empty body frames are consumed inside the reader and never surface
        // as zero-length reads; a zero-length read is end of body.
        let reader = StreamReader::new(response.bytes_stream().map_err(std::io::Error::other));
        tokio::pin!(reader);
        let mut buf = vec![0u8; self.config.chunk_size.max(1)];

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).await?;
            let delta = n as u64;
            let speed = state.record_bytes(delta);
            progress.on_progress(name, delta, speed);
        }

        file.flush().await
    }
}
