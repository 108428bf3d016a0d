//! zs-dl - resolve file-host share links into direct downloads.
//!
//! A share page hides its direct link behind a small script challenge. This
//! crate matches share URLs, expands `.dlc` containers through a remote
//! decryption service, computes the direct link from the page, and streams the
//! file to disk. The pieces are usable on their own or driven together by the
//! [`Orchestrator`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zs_dl::{AppConfig, DownloadProgress, NoProgress, Orchestrator};
//!
//! # async fn example() -> zs_dl::Result<()> {
//! let config = AppConfig::load()?;
//! let orchestrator = Orchestrator::from_config(&config)?;
//!
//! let progress: Arc<dyn DownloadProgress> = Arc::new(NoProgress);
//! let report = orchestrator
//!     .run(
//!         vec!["https://www12.zippyshare.com/v/ABCD1234/file.html".to_string()],
//!         &config.paths.output_dir,
//!         &progress,
//!     )
//!     .await?;
//! println!("{} file(s) downloaded", report.downloaded.len());
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dlc;
pub mod download;
pub mod error;
pub mod format;
pub mod fs;
pub mod http;
pub mod resolve;
pub mod runner;
pub mod stats;
pub mod url;

// Re-export main types for convenience
pub use config::{AppConfig, DownloadConfig, PathConfig, SiteConfig};
pub use dlc::{ContainerDecryptor, ContainerExpander, DcryptService};
pub use download::{DownloadProgress, FetchOutcome, Fetcher, NoProgress};
pub use error::{Error, Result};
pub use fs::{FileSystem, TokioFileSystem};
pub use http::build_http_client;
pub use resolve::{LinkResolver, ResolvedDownload, decode_file_name, final_number};
pub use runner::{Orchestrator, RunReport};
pub use stats::FileStats;
pub use url::{ShareReference, UrlMatcher, is_dlc_path, is_list_path};
