//! DLC container expansion through an external decryption service.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::url::is_dlc_path;

/// Longest slice of an unexpected service response quoted in errors.
const MAX_QUOTED_RESPONSE: usize = 200;

/// Turns a container file into the share links it holds.
#[async_trait]
pub trait ContainerDecryptor: Send + Sync {
    /// Decrypts the container at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContainerExpansion`] if the container cannot be read or
    /// the service yields no links.
    async fn decrypt(&self, path: &Path) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct DecryptResponse {
    success: Option<DecryptSuccess>,
}

#[derive(Debug, Deserialize)]
struct DecryptSuccess {
    links: Option<Vec<String>>,
}

/// Client for a dcrypt-style paste endpoint: the container text is POSTed as
/// the `content` form field and the answer is
/// `{"success": {"links": [...]}}`.
#[derive(Debug, Clone)]
pub struct DcryptService {
    client: reqwest::Client,
    endpoint: String,
}

impl DcryptService {
    /// Creates a service client posting to `endpoint`.
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ContainerDecryptor for DcryptService {
    async fn decrypt(&self, path: &Path) -> Result<Vec<String>> {
        let fail = |reason: String| Error::ContainerExpansion {
            path: path.display().to_string(),
            reason,
        };

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| fail(format!("Failed to read file: {e}")))?;
        let content = String::from_utf8_lossy(&bytes).into_owned();

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("content", content.as_str())])
            .send()
            .await
            .map_err(|e| fail(format!("Service unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("Service returned HTTP {status}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| fail(format!("Failed to read response: {e}")))?;
        parse_links(&text).map_err(fail)
    }
}

/// Pulls `success.links` out of a service response.
fn parse_links(text: &str) -> std::result::Result<Vec<String>, String> {
    let response: DecryptResponse =
        serde_json::from_str(text).map_err(|e| format!("Invalid JSON response: {e}"))?;

    let links: Vec<String> = response
        .success
        .and_then(|s| s.links)
        .ok_or_else(|| format!("No links in response: {}", quote(text)))?
        .into_iter()
        .map(|link| link.trim().to_string())
        .filter(|link| !link.is_empty())
        .collect();

    if links.is_empty() {
        return Err("Service returned an empty link list".to_string());
    }
    Ok(links)
}

fn quote(text: &str) -> &str {
    match text.char_indices().nth(MAX_QUOTED_RESPONSE) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Replaces container entries in a batch with the links they hold.
pub struct ContainerExpander<D: ContainerDecryptor = DcryptService> {
    decryptor: D,
    throttle: Duration,
}

impl<D: ContainerDecryptor> ContainerExpander<D> {
    /// Creates an expander that pauses `throttle` after every service call.
    #[must_use]
    pub const fn new(decryptor: D, throttle: Duration) -> Self {
        Self {
            decryptor,
            throttle,
        }
    }

    /// Decrypts a single container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContainerExpansion`] if decryption fails.
    pub async fn expand(&self, path: &str) -> Result<Vec<String>> {
        log::info!("Processing DLC container: {path}");
        self.decryptor.decrypt(Path::new(path)).await
    }

    /// Expands every `.dlc` entry of `candidates`.
    ///
    /// Container entries are removed whether or not decryption succeeds;
    /// recovered links are appended after the remaining candidates in
    /// container order. A failed container is logged and skipped.
    pub async fn expand_all(&self, candidates: Vec<String>) -> Vec<String> {
        let (containers, mut urls): (Vec<_>, Vec<_>) =
            candidates.into_iter().partition(|c| is_dlc_path(c));

        for container in containers {
            match self.expand(&container).await {
                Ok(links) => {
                    log::info!("Extracted {} URLs from {container}", links.len());
                    urls.extend(links);
                }
                Err(e) => log::error!("Failed to decrypt DLC container: {container}: {e}"),
            }
            tokio::time::sleep(self.throttle).await;
        }

        urls
    }
}
