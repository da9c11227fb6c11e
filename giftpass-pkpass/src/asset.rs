/*
Copyright 2022 Daniel Brotsky. All rights reserved.

All of the copyrighted work in this repository is licensed under the
GNU Affero General Public License, reproduced in the LICENSE-AGPL file.
*/
use std::time::Duration;

use log::{debug, warn};

/// Remote fetches are best-effort, so they get one bounded attempt.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolve an image reference to raw bytes: a single GET for `http(s)`
/// sources, a direct read for filesystem paths.  Every failure path
/// yields `None` so a missing image degrades to the template's default
/// strip image instead of failing the pass.
pub async fn fetch_image_buffer(source: Option<&str>) -> Option<Vec<u8>> {
    let source = source?.trim();
    if source.is_empty() {
        return None;
    }
    if source.starts_with("http://") || source.starts_with("https://") {
        fetch_remote(source).await
    } else {
        match std::fs::read(source) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                debug!("No image override at '{}': {}", source, err);
                None
            }
        }
    }
}

async fn fetch_remote(url: &str) -> Option<Vec<u8>> {
    let client = match reqwest::Client::builder().timeout(FETCH_TIMEOUT).build() {
        Ok(client) => client,
        Err(err) => {
            warn!("Can't build image fetch client: {}", err);
            return None;
        }
    };
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(err) => {
            warn!("Image fetch from '{}' failed: {}", url, err);
            return None;
        }
    };
    if !response.status().is_success() {
        warn!("Image fetch from '{}' returned status {}", url, response.status());
        return None;
    }
    match response.bytes().await {
        Ok(bytes) => Some(bytes.to_vec()),
        Err(err) => {
            warn!("Image fetch from '{}' was truncated: {}", url, err);
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn test_absent_and_empty_sources() {
        assert_eq!(fetch_image_buffer(None).await, None);
        assert_eq!(fetch_image_buffer(Some("")).await, None);
        assert_eq!(fetch_image_buffer(Some("   ")).await, None);
    }

    #[tokio::test]
    async fn test_local_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("strip.png");
        std::fs::write(&path, b"image bytes").unwrap();
        let bytes = fetch_image_buffer(path.to_str()).await;
        assert_eq!(bytes.as_deref(), Some(b"image bytes".as_slice()));
        let missing = dir.path().join("missing.png");
        assert_eq!(fetch_image_buffer(missing.to_str()).await, None);
    }

    #[tokio::test]
    async fn test_unreachable_url_yields_none() {
        // port 9 (discard) is not listening in the test environment
        assert_eq!(fetch_image_buffer(Some("http://127.0.0.1:9/strip.png")).await, None);
    }
}
