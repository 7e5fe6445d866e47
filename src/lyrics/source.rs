//! Where timing payloads come from
//!
//! A source is an http(s) URL, a file path, or `-` for stdin.

use anyhow::Context;
use std::io::Read;
use std::time::Duration;

use super::aligned::TimestampPayload;

/// Fetches timing payloads over HTTP
#[derive(Debug, Clone)]
pub struct PayloadClient {
    client: reqwest::Client,
}

impl PayloadClient {
    const USER_AGENT: &'static str = concat!("lyricblocks/", env!("CARGO_PKG_VERSION"));
    const TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(Self::USER_AGENT)
            .timeout(Self::TIMEOUT)
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }

    /// GET a payload; any non-success status is an error
    pub async fn fetch(&self, url: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("GET {url}: {status}");
        }
        response.text().await.with_context(|| format!("read body of {url}"))
    }
}

pub fn is_remote(src: &str) -> bool {
    src.starts_with("http://") || src.starts_with("https://")
}

/// Read the raw payload text from `src`
pub async fn read_source(src: &str) -> anyhow::Result<String> {
    if is_remote(src) {
        return PayloadClient::new()?.fetch(src).await;
    }

    if src == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("read stdin")?;
        return Ok(raw);
    }

    std::fs::read_to_string(src).with_context(|| format!("read {src}"))
}

/// Load and decode a timing payload from `src`
pub async fn load_payload(src: &str) -> anyhow::Result<TimestampPayload> {
    let raw = read_source(src).await?;
    let payload = TimestampPayload::from_json(&raw).with_context(|| format!("decode {src}"))?;
    tracing::debug!(src, words = payload.aligned_words.len(), "loaded timing payload");
    Ok(payload)
}
