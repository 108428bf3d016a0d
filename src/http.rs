//! Shared HTTP client construction.

use std::time::Duration;

use crate::config::DownloadConfig;
use crate::error::Result;

/// Builds the client used for share pages, file transfers and container
/// decryption.
///
/// The proxy, when configured, only carries `https` traffic.
///
/// # Errors
///
/// Returns an error if the proxy address is not a valid URL or the TLS
/// backend cannot be initialised.
pub fn build_http_client(config: &DownloadConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .pool_idle_timeout(Duration::from_secs(60))
        .tcp_keepalive(Duration::from_secs(30));

    if let Some(proxy) = config.proxy.as_deref() {
        log::info!("Using HTTPS proxy {proxy}");
        builder = builder.proxy(reqwest::Proxy::https(proxy_url(proxy))?);
    }

    Ok(builder.build()?)
}

/// Turns a bare `<host>:<port>` into a proxy URL.
fn proxy_url(proxy: &str) -> String {
    if proxy.contains("://") {
        proxy.to_string()
    } else {
        format!("https://{proxy}")
    }
}
