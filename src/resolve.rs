//! Share page scraping and direct link computation.
//!
//! The share page hides the real download path behind a small script:
//!
//! ```text
//! var a = 12;
//! document.getElementById('dlbutton').omg = "asdasd".substr(0, 3);
//! var b = document.getElementById('dlbutton').omg.length;
//! document.getElementById('dlbutton').href = "/d/ABCD1234/"+(Math.pow(a, 3)+b)+"/my%20file.zip";
//! ```
//!
//! `b` is the length of a fixed three-character decoy, so the path segment is
//! always `a^3 + 3`. The constant is reproduced rather than evaluated from the
//! page; if the host ever varies the decoy, the scan below stops matching and
//! every link fails with [`Error::PatternNotFound`].

use std::borrow::Cow;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use reqwest::StatusCode;

use crate::config::{DownloadConfig, SiteConfig};
use crate::error::{Error, Result};
use crate::url::ShareReference;

static CHALLENGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"var a = ([0-9]+);\s+",
        r#"document\.getElementById\('dlbutton'\)\.omg = "asdasd"\.substr\(0, 3\);\s+"#,
        r"var b = document\.getElementById\('dlbutton'\)\.omg\.length;\s+",
        r#"document\.getElementById\('dlbutton'\)\.href = "/d/[a-zA-Z0-9]{8}/"\+\(Math\.pow\(a, 3\)\+b\)\+"/(.+)";"#,
    ))
    .expect("valid regex")
});

/// `"asdasd".substr(0, 3).length`
const DECOY_LENGTH: u128 = 3;

/// A direct, time-limited download link and where to store it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDownload {
    /// Direct file URL.
    pub final_url: String,
    /// Percent-decoded file name for local storage.
    pub file_name: String,
    /// Share page URL, sent as `Referer` to authorise the transfer.
    pub referer_url: String,
}

/// Values captured from the share page script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageChallenge {
    /// The integer `a`.
    pub challenge: u32,
    /// Percent-encoded file name from the button's href.
    pub encoded_name: String,
}

/// Computes the download path segment from the page challenge: `a^3 + 3`.
#[must_use]
pub const fn final_number(challenge: u32) -> u128 {
    let a = challenge as u128;
    a * a * a + DECOY_LENGTH
}

/// Scans a share page for the download challenge.
///
/// Returns `None` when the file is gone or the markup has changed.
#[must_use]
pub fn scan_page(body: &str) -> Option<PageChallenge> {
    let caps = CHALLENGE_RE.captures(body)?;
    Some(PageChallenge {
        challenge: caps[1].parse().ok()?,
        encoded_name: caps[2].to_string(),
    })
}

/// Percent-decodes a file name. Text without escape sequences is returned
/// unchanged; invalid UTF-8 is replaced lossily.
#[must_use]
pub fn decode_file_name(encoded: &str) -> String {
    urlencoding::decode(encoded).map_or_else(
        |_| String::from_utf8_lossy(&urlencoding::decode_binary(encoded.as_bytes())).into_owned(),
        Cow::into_owned,
    )
}

/// Replaces path separators so a decoded name cannot leave the output directory.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "download".to_string(),
        _ => cleaned,
    }
}

/// Turns share references into direct download links.
#[derive(Debug, Clone)]
pub struct LinkResolver {
    client: reqwest::Client,
    site: SiteConfig,
    attempts: u32,
    retry_delay: Duration,
}

impl LinkResolver {
    /// Creates a resolver using `client` for page requests.
    #[must_use]
    pub fn new(client: reqwest::Client, site: SiteConfig, config: &DownloadConfig) -> Self {
        Self {
            client,
            site,
            attempts: config.page_retries.max(1),
            retry_delay: config.retry_delay(),
        }
    }

    /// Fetches the share page for `share` and computes its direct link.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Status`] if the page answers with a non-success status
    /// (after retrying HTTP 500), [`Error::Http`] on transport failure, and
    /// [`Error::PatternNotFound`] if the page carries no download challenge.
    pub async fn resolve(&self, share: &ShareReference, raw_url: &str) -> Result<ResolvedDownload> {
        let body = self.fetch_page(&self.page_url(share, raw_url)).await?;

        let page = scan_page(&body).ok_or_else(|| Error::PatternNotFound {
            url: raw_url.to_string(),
        })?;
        let number = final_number(page.challenge);
        log::debug!("Challenge {} -> {number} for {raw_url}", page.challenge);

        Ok(ResolvedDownload {
            final_url: format!(
                "{}/d/{}/{number}/{}",
                self.site.origin(share),
                share.resource_id,
                page.encoded_name
            ),
            file_name: sanitize_file_name(&decode_file_name(&page.encoded_name)),
            referer_url: raw_url.to_string(),
        })
    }

    /// The share page is requested at the URL as given; an origin override
    /// only swaps the scheme and host.
    fn page_url(&self, share: &ShareReference, raw_url: &str) -> String {
        if self.site.origin_override.is_some() {
            format!("{}{}", self.site.origin(share), share.page_path())
        } else {
            raw_url.to_string()
        }
    }

    /// GETs the share page, retrying only on HTTP 500.
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let mut attempt = 1;
        loop {
            let response = self.client.get(url).send().await?;
            let status = response.status();

            if status == StatusCode::INTERNAL_SERVER_ERROR && attempt < self.attempts {
                log::warn!(
                    "Share page returned {status}, retrying in {:?}... (attempt {attempt}/{})",
                    self.retry_delay,
                    self.attempts
                );
                tokio::time::sleep(self.retry_delay).await;
                attempt += 1;
                continue;
            }

            if !status.is_success() {
                return Err(Error::Status {
                    url: url.to_string(),
                    status,
                });
            }
            return Ok(response.text().await?);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::url::UrlMatcher;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Share page body as served by the host.
    pub(crate) fn share_page(id: &str, challenge: u32, encoded_name: &str) -> String {
        format!(
            r##"<html><body>
<a id="dlbutton" href="#">Download</a>
<script type="text/javascript">
    var a = {challenge};
    document.getElementById('dlbutton').omg = "asdasd".substr(0, 3);
    var b = document.getElementById('dlbutton').omg.length;
    document.getElementById('dlbutton').href = "/d/{id}/"+(Math.pow(a, 3)+b)+"/{encoded_name}";
</script>
</body></html>"##
        )
    }

    fn share(id: &str) -> ShareReference {
        ShareReference {
            server_shard: 12,
            host: "www12.example.com".to_string(),
            resource_id: id.to_string(),
        }
    }

    fn resolver(server: &MockServer) -> LinkResolver {
        let config = DownloadConfig::default().with_retry_delay(Duration::from_millis(1));
        LinkResolver::new(
            reqwest::Client::new(),
            SiteConfig::new("example").with_origin_override(server.uri()),
            &config,
        )
    }

    const RAW: &str = "https://www12.example.com/v/ABCD1234/file.html";

    // =========================================================================
    // Numeric transform
    // =========================================================================

    #[test]
    fn final_number_known_values() {
        assert_eq!(final_number(12), 1731);
        assert_eq!(final_number(0), 3);
        assert_eq!(final_number(1), 4);
    }

    #[test]
    fn final_number_does_not_overflow() {
        let a = u128::from(u32::MAX);
        assert_eq!(final_number(u32::MAX), a * a * a + 3);
    }

    // =========================================================================
    // Page scanning
    // =========================================================================

    #[test]
    fn scan_extracts_challenge_and_name() {
        let page = scan_page(&share_page("ABCD1234", 12, "my%20file.zip")).unwrap();
        assert_eq!(page.challenge, 12);
        assert_eq!(page.encoded_name, "my%20file.zip");
    }

    #[test]
    fn scan_rejects_removed_file_page() {
        let body = "<html><body>File does not exist on this server</body></html>";
        assert!(scan_page(body).is_none());
    }

    #[test]
    fn scan_rejects_changed_decoy() {
        let body = share_page("ABCD1234", 12, "a.zip").replace("substr(0, 3)", "substr(0, 4)");
        assert!(scan_page(&body).is_none());
    }

    #[test]
    fn scan_rejects_oversized_challenge() {
        let body = share_page("ABCD1234", 1, "a.zip").replace("var a = 1;", "var a = 99999999999;");
        assert!(scan_page(&body).is_none());
    }

    // =========================================================================
    // File name decoding
    // =========================================================================

    #[test]
    fn decode_percent_sequences() {
        assert_eq!(decode_file_name("my%20file.zip"), "my file.zip");
        assert_eq!(decode_file_name("%C3%A9t%C3%A9.mkv"), "été.mkv");
    }

    #[test]
    fn decode_leaves_plus_alone() {
        assert_eq!(decode_file_name("a+b.zip"), "a+b.zip");
    }

    #[test]
    fn decode_is_identity_on_plain_names() {
        assert_eq!(decode_file_name("my file.zip"), "my file.zip");
        assert_eq!(decode_file_name("100%.zip"), "100%.zip");
    }

    #[test]
    fn decode_invalid_utf8_is_lossy() {
        assert_eq!(decode_file_name("bad%FF.bin"), "bad\u{FFFD}.bin");
    }

    #[test]
    fn sanitize_strips_separators() {
        assert_eq!(sanitize_file_name("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_file_name("a\\b"), "a_b");
        assert_eq!(sanitize_file_name(".."), "download");
        assert_eq!(sanitize_file_name("plain.zip"), "plain.zip");
    }

    // =========================================================================
    // Resolution against a mock host
    // =========================================================================

    #[tokio::test]
    async fn resolve_builds_final_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v/ABCD1234/file.html"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(share_page("ABCD1234", 12, "my%20file.zip")),
            )
            .mount(&server)
            .await;

        let resolved = resolver(&server).resolve(&share("ABCD1234"), RAW).await.unwrap();
        assert_eq!(
            resolved.final_url,
            format!("{}/d/ABCD1234/1731/my%20file.zip", server.uri())
        );
        assert_eq!(resolved.file_name, "my file.zip");
        assert_eq!(resolved.referer_url, RAW);
    }

    #[test]
    fn page_requested_at_given_url_without_override() {
        let raw = "https://www012.example.com/v/ABCD1234/file.html";
        let share = UrlMatcher::new("example").match_url(raw).unwrap();
        let resolver = LinkResolver::new(
            reqwest::Client::new(),
            SiteConfig::new("example"),
            &DownloadConfig::default(),
        );

        assert_eq!(resolver.page_url(&share, raw), raw);
        assert_eq!(resolver.site.origin(&share), "https://www012.example.com");
    }

    #[tokio::test]
    async fn zero_padded_share_url_resolves() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v/ABCD1234/file.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string(share_page("ABCD1234", 3, "z.bin")))
            .expect(1)
            .mount(&server)
            .await;

        let raw = "https://www012.example.com/v/ABCD1234/file.html";
        let share = UrlMatcher::new("example").match_url(raw).unwrap();
        let resolved = resolver(&server).resolve(&share, raw).await.unwrap();

        assert_eq!(resolved.final_url, format!("{}/d/ABCD1234/30/z.bin", server.uri()));
        assert_eq!(resolved.referer_url, raw);
    }

    #[tokio::test]
    async fn resolve_missing_pattern_is_first_class_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>File has expired</html>"))
            .mount(&server)
            .await;

        let err = resolver(&server).resolve(&share("ABCD1234"), RAW).await.unwrap_err();
        assert!(matches!(err, Error::PatternNotFound { ref url } if url == RAW));
    }

    #[tokio::test]
    async fn resolve_retries_http_500() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(share_page("ABCD1234", 2, "x.bin")))
            .mount(&server)
            .await;

        let resolved = resolver(&server).resolve(&share("ABCD1234"), RAW).await.unwrap();
        assert!(resolved.final_url.ends_with("/d/ABCD1234/11/x.bin"));
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn resolve_gives_up_after_three_500s() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = resolver(&server).resolve(&share("ABCD1234"), RAW).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[tokio::test]
    async fn resolve_does_not_retry_other_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = resolver(&server).resolve(&share("ABCD1234"), RAW).await.unwrap_err();
        assert!(matches!(err, Error::Status { status, .. } if status == StatusCode::NOT_FOUND));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn final_number_is_cube_plus_three(a in 0u32..100_000) {
                let a128 = u128::from(a);
                prop_assert_eq!(final_number(a), a128.pow(3) + 3);
            }

            #[test]
            fn decoding_plain_names_is_idempotent(name in "[a-zA-Z0-9 ._()-]{1,40}") {
                let once = decode_file_name(&name);
                prop_assert_eq!(&once, &name);
                prop_assert_eq!(decode_file_name(&once), once);
            }

            #[test]
            fn encode_then_decode_restores_name(name in "[a-zA-Z0-9 ._()-]{1,40}") {
                let encoded = urlencoding::encode(&name);
                prop_assert_eq!(decode_file_name(&encoded), name);
            }

            #[test]
            fn scan_never_panics(body in "\\PC*") {
                let _ = scan_page(&body);
            }
        }
    }
}
