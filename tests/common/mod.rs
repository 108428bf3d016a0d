//! Shared fixtures: a mock file host serving share pages and files.

#![allow(dead_code)]

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zs_dl::{AppConfig, DownloadConfig, PathConfig, SiteConfig};

/// Share page as served by the host, with the download challenge embedded.
pub fn share_page(id: &str, challenge: u32, encoded_name: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html><head><title>Share</title></head><body>
<div class="right">
<a id="dlbutton" href="#"><img src="/images/download.png"></a>
<script type="text/javascript">
    var a = {challenge};
    document.getElementById('dlbutton').omg = "asdasd".substr(0, 3);
    var b = document.getElementById('dlbutton').omg.length;
    document.getElementById('dlbutton').href = "/d/{id}/"+(Math.pow(a, 3)+b)+"/{encoded_name}";
</script>
</div>
</body></html>"##
    )
}

/// Public share URL for `id` on shard 12 of the `example` host.
pub fn share_url(id: &str) -> String {
    format!("https://www12.example.com/v/{id}/file.html")
}

/// Mounts the share page and the direct download of one file.
pub async fn mount_file(server: &MockServer, id: &str, challenge: u32, encoded_name: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/v/{id}/file.html")))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(share_page(id, challenge, encoded_name)),
        )
        .mount(server)
        .await;

    let number = u128::from(challenge).pow(3) + 3;
    Mock::given(method("GET"))
        .and(path(format!("/d/{id}/{number}/{encoded_name}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Configuration pointing every host request at `server`.
pub fn config_for(server: &MockServer, output_dir: &std::path::Path) -> AppConfig {
    AppConfig {
        download: DownloadConfig::default()
            .with_retry_delay(Duration::from_millis(1))
            .with_container_throttle(Duration::ZERO),
        site: SiteConfig::new("example")
            .with_origin_override(server.uri())
            .with_container_endpoint(format!("{}/decrypt/paste", server.uri())),
        paths: PathConfig {
            output_dir: output_dir.to_path_buf(),
            config_dir: output_dir.join("config"),
        },
    }
}
