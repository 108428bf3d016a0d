//! Batch driver: expand containers, then match, resolve and fetch each URL.
//!
//! Candidates are handled strictly one after another. A failure on one item is
//! logged with the offending URL and the batch moves on; only an unusable
//! output directory aborts the run.

use std::path::Path;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::dlc::{ContainerDecryptor, ContainerExpander, DcryptService};
use crate::download::{DownloadProgress, FetchOutcome, Fetcher};
use crate::error::Result;
use crate::fs::{FileSystem, TokioFileSystem};
use crate::http::build_http_client;
use crate::resolve::LinkResolver;
use crate::stats::FileStats;
use crate::url::UrlMatcher;

/// What happened to each candidate of a batch.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Candidates whose file was written, with their transfer statistics.
    pub downloaded: Vec<(String, FileStats)>,
    /// Candidates whose file was already present.
    pub skipped: Vec<String>,
    /// Candidates that could not be matched, resolved or fetched.
    pub failed: Vec<(String, String)>,
}

impl RunReport {
    /// Number of candidates that were processed after container expansion.
    #[must_use]
    pub fn total(&self) -> usize {
        self.downloaded.len() + self.skipped.len() + self.failed.len()
    }
}

/// Wires the matcher, expander, resolver and fetcher together.
pub struct Orchestrator<D: ContainerDecryptor = DcryptService, F: FileSystem = TokioFileSystem> {
    matcher: UrlMatcher,
    expander: ContainerExpander<D>,
    resolver: LinkResolver,
    fetcher: Fetcher<F>,
}

impl Orchestrator {
    /// Builds the production pipeline from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g. a malformed
    /// proxy address).
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = build_http_client(&config.download)?;
        let decryptor = DcryptService::new(client.clone(), config.site.container_endpoint.clone());

        Ok(Self::new(
            UrlMatcher::new(&config.site.domain),
            ContainerExpander::new(decryptor, config.download.container_throttle()),
            LinkResolver::new(client.clone(), config.site.clone(), &config.download),
            Fetcher::new(client, config.download.clone()),
        ))
    }
}

impl<D: ContainerDecryptor, F: FileSystem> Orchestrator<D, F> {
    /// Assembles an orchestrator from its parts.
    #[must_use]
    pub const fn new(
        matcher: UrlMatcher,
        expander: ContainerExpander<D>,
        resolver: LinkResolver,
        fetcher: Fetcher<F>,
    ) -> Self {
        Self {
            matcher,
            expander,
            resolver,
            fetcher,
        }
    }

    /// Processes `candidates` into `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error only if `output_dir` cannot be created. Per-item
    /// failures are recorded in the returned [`RunReport`].
    pub async fn run(
        &self,
        candidates: Vec<String>,
        output_dir: &Path,
        progress: &Arc<dyn DownloadProgress>,
    ) -> Result<RunReport> {
        self.fetcher.ensure_output_dir(output_dir).await?;

        let urls = self.expander.expand_all(candidates).await;
        let total = urls.len();
        let mut report = RunReport::default();

        for (idx, url) in urls.into_iter().enumerate() {
            log::debug!("URL {} of {total}: {url}", idx + 1);
            progress.on_url_start(idx + 1, total, &url);

            match self.process(&url, output_dir, progress).await {
                Ok(FetchOutcome::Downloaded(stats)) => report.downloaded.push((url, stats)),
                Ok(FetchOutcome::AlreadyExists) => report.skipped.push(url),
                Err(e) => {
                    log::error!("URL failed: {url}: {e}");
                    progress.on_url_failed(&url, &e.to_string());
                    report.failed.push((url, e.to_string()));
                }
            }
        }

        log::debug!(
            "Batch finished: {} downloaded, {} skipped, {} failed",
            report.downloaded.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    async fn process(
        &self,
        url: &str,
        output_dir: &Path,
        progress: &Arc<dyn DownloadProgress>,
    ) -> Result<FetchOutcome> {
        let share = self.matcher.match_url(url)?;
        let target = self.resolver.resolve(&share, url).await?;
        log::info!("Resolved {} -> {}", target.file_name, target.final_url);
        self.fetcher.download(&target, output_dir, progress).await
    }
}
