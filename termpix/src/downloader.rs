// ABOUTME: HTTP client for fetching remote images to a local temporary file
// ABOUTME: Implements timeouts, size limits, and content validation

use std::io::Write;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use tempfile::NamedTempFile;
use url::Url;

/// Refuse downloads larger than this; a terminal render never needs more.
const MAX_DOWNLOAD_BYTES: u64 = 20 * 1024 * 1024;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ImageDownloader {
    client: Client,
}

impl ImageDownloader {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("termpix/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(3))
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self { client })
    }

    /// Whether `input` names a remote resource rather than a local path.
    pub fn is_remote(input: &str) -> bool {
        matches!(
            Url::parse(input).map(|u| u.scheme().to_string()),
            Ok(scheme) if scheme == "http" || scheme == "https"
        )
    }

    /// Download an image URL into a temporary file for decoding.
    ///
    /// The file is deleted when the returned handle is dropped, so the
    /// caller must keep it alive until the image is decoded.
    pub fn download_to_temp(&self, url: &str) -> Result<NamedTempFile> {
        let parsed = Url::parse(url).with_context(|| format!("invalid URL: {url}"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(anyhow!("unsupported URL scheme: {}", parsed.scheme()));
        }

        let response = self
            .client
            .get(parsed.as_str())
            .send()
            .map_err(|e| anyhow!("HTTP request failed for {}: {}", url, e))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP request failed with status {}: {}",
                response.status(),
                url
            ));
        }

        if let Some(length) = response.content_length() {
            if length > MAX_DOWNLOAD_BYTES {
                return Err(anyhow!(
                    "image too large: {} bytes exceeds the {} byte limit",
                    length,
                    MAX_DOWNLOAD_BYTES
                ));
            }
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let bytes = response
            .bytes()
            .map_err(|e| anyhow!("failed to read response body from {}: {}", url, e))?;

        if bytes.len() as u64 > MAX_DOWNLOAD_BYTES {
            return Err(anyhow!(
                "image too large: {} bytes exceeds the {} byte limit",
                bytes.len(),
                MAX_DOWNLOAD_BYTES
            ));
        }

        // Servers lie about content types; accept anything whose bytes
        // look like a known image format.
        if !content_type.starts_with("image/") && image::guess_format(&bytes).is_err() {
            return Err(anyhow!(
                "{} does not look like an image (content-type {})",
                url,
                content_type
            ));
        }

        log::debug!("downloaded {} bytes from {}", bytes.len(), url);

        let mut file = NamedTempFile::new().context("failed to create temporary file")?;
        file.write_all(&bytes)
            .context("failed to write downloaded image to temporary file")?;
        file.flush()
            .context("failed to flush downloaded image to disk")?;
        Ok(file)
    }
}
