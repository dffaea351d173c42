//! OpenAI-backed translator implementation.
//! This uses a chat completion model in JSON mode, one request per batch.

use super::{IndexedLine, Translator};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

/// Host serving the chat completions API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Model used unless `OPENAI_MODEL` is set.
pub const DEFAULT_MODEL: &str = "gpt-5-nano";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

/// The JSON object the model is asked to answer with.
#[derive(Debug, Deserialize)]
struct TranslatedLines {
    lines: Vec<String>,
}

/// Translator that delegates to the OpenAI chat completion API.
pub struct OpenAiTranslator {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiTranslator {
    /// Create a new translator reading the API key from `OPENAI_API_KEY`.
    pub fn new() -> Result<Self> {
        let key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
        let mut tr = Self::with_api_key(key);
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            tr.model = model;
        }
        Ok(tr)
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Send a JSON body to the chat completions endpoint and return the parsed response.
    async fn post_chat(&self, body: Value) -> Result<ChatResponse> {
        let resp = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?;
        let resp = resp.error_for_status()?;
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl Translator for OpenAiTranslator {
    /// Translate a batch of subtitle lines, keeping order and line breaks.
    async fn translate_batch(
        &self,
        lines: &[IndexedLine],
        source: &str,
        target: &str,
    ) -> Result<Vec<IndexedLine>> {
        let curr_text = lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n----\n");
        let messages = vec![
            json!({
                "role": "system",
                "content": format!("You translate subtitles from locale {source} to locale {target} and return JSON {{\"lines\": []}}.")
            }),
            json!({
                "role": "user",
                "content": format!("Translate the following {} subtitle blocks, separated by ----. Return a JSON object with key 'lines' as an array with one entry per block, keeping order and line breaks. Blocks:\n{curr_text}", lines.len())
            }),
        ];
        let body = json!({
            "model": self.model,
            "response_format": {"type": "json_object"},
            "messages": messages,
        });
        let resp = self.post_chat(body).await?;
        let content = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("missing content"))?;
        let data: TranslatedLines =
            serde_json::from_str(&content).context("content is not a lines object")?;
        Ok(data
            .lines
            .into_iter()
            .zip(lines)
            .map(|(text, l)| IndexedLine {
                index: l.index,
                text,
            })
            .collect())
    }
}
