//! Keyless translator backed by the public Google Translate web endpoint.

use super::{IndexedLine, Translator};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::trace;

/// Host serving the `translate_a/single` endpoint.
pub const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Translator that sends one request per subtitle block. No API key needed.
pub struct GoogleTranslator {
    client: Client,
    base_url: String,
}

impl GoogleTranslator {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the translator at another host (used by tests).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Translate a single piece of text.
    async fn translate_text(&self, text: &str, source: &str, target: &str) -> Result<String> {
        trace!("translate_text chars={}", text.chars().count());
        let resp = self
            .client
            .get(format!("{}/translate_a/single", self.base_url))
            .query(&[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await
            .context("translation request failed")?;
        let value: Value = resp.error_for_status()?.json().await?;
        join_segments(&value)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate_batch(
        &self,
        lines: &[IndexedLine],
        source: &str,
        target: &str,
    ) -> Result<Vec<IndexedLine>> {
        let mut out = Vec::with_capacity(lines.len());
        for line in lines {
            let text = self
                .translate_text(&line.text, source, target)
                .await
                .with_context(|| format!("block {}", line.index))?;
            out.push(IndexedLine {
                index: line.index,
                text,
            });
        }
        Ok(out)
    }
}

/// The response is `[[["translated", "original", ...], ...], ...]`; the
/// translation is the concatenation of the first field of every segment.
fn join_segments(value: &Value) -> Result<String> {
    let segments = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("unexpected translation response"))?;
    let text: String = segments
        .iter()
        .filter_map(|s| s.get(0).and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        return Err(anyhow!("empty translation"));
    }
    Ok(text)
}
