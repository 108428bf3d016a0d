//! Share URL validation and input path detection.

use std::path::Path;

use regex::Regex;

use crate::error::{Error, Result};

/// A validated share link: which server shard hosts it and the file's id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareReference {
    /// Numeric shard from the `www<N>` host label (1–3 digits).
    pub server_shard: u16,
    /// Host exactly as written in the URL, e.g. `www012.zippyshare.com`.
    pub host: String,
    /// 8-character alphanumeric resource id.
    pub resource_id: String,
}

impl ShareReference {
    /// Path of the share page on the shard.
    #[must_use]
    pub fn page_path(&self) -> String {
        format!("/v/{}/file.html", self.resource_id)
    }
}

/// Validates share page URLs of the form
/// `https://www<N>.<domain>.com/v/<id>/file.html`.
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    pattern: Regex,
}

impl UrlMatcher {
    /// Creates a matcher for the given hosting domain.
    ///
    /// # Panics
    ///
    /// Never in practice: the domain is escaped before being embedded.
    #[must_use]
    pub fn new(domain: &str) -> Self {
        let pattern = format!(
            r"^https://(www([0-9]{{1,3}})\.{}\.com)/v/([a-zA-Z0-9]{{8}})/file\.html$",
            regex::escape(domain)
        );
        Self {
            pattern: Regex::new(&pattern).expect("valid regex"),
        }
    }

    /// Decomposes `url` into its shard and resource id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `url` is not exactly a share page URL.
    pub fn match_url(&self, url: &str) -> Result<ShareReference> {
        let invalid = || Error::InvalidUrl(url.to_string());
        let caps = self.pattern.captures(url).ok_or_else(invalid)?;
        let server_shard = caps[2].parse().map_err(|_| invalid())?;
        Ok(ShareReference {
            server_shard,
            host: caps[1].to_string(),
            resource_id: caps[3].to_string(),
        })
    }
}

/// Returns `true` if `s` looks like a path to a `.dlc` file.
#[must_use]
pub fn is_dlc_path(s: &str) -> bool {
    has_extension(s, "dlc")
}

/// Returns `true` if `s` looks like a newline-delimited URL list.
#[must_use]
pub fn is_list_path(s: &str) -> bool {
    has_extension(s, "txt")
}

fn has_extension(s: &str, wanted: &str) -> bool {
    Path::new(s)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}
