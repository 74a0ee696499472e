// src/extract.rs
// Title extraction: completion-service seam, the fixed extraction prompt, and
// a best-effort parser for the bracketed-list reply.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{ExtractionConfig, HttpConfig};
use crate::error::{Result, WatchError};

/// Single-turn completion call against the external text-understanding
/// service. No schema is enforced on the reply; the extractor parses it.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// OpenAI chat-completions client. Requires `OPENAI_API_KEY`.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(extraction: &ExtractionConfig, http_cfg: &HttpConfig) -> Self {
        let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
        let http = reqwest::Client::builder()
            .user_agent("jobwatch/0.1")
            .connect_timeout(Duration::from_secs(http_cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(http_cfg.request_timeout_secs))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            model: extraction.model.clone(),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(WatchError::extraction("OPENAI_API_KEY is not set"));
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| WatchError::extraction(format!("completion request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(WatchError::extraction(format!(
                "completion service returned status {status}"
            )));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| WatchError::extraction(format!("completion reply unreadable: {e}")))?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| WatchError::extraction("completion reply had no choices"))
    }
}

/// Turns rendered page text into an ordered list of job titles via one
/// completion call with fixed extraction instructions.
pub struct TitleExtractor {
    client: Arc<dyn CompletionClient>,
    language: String,
    domains: Vec<String>,
    max_page_chars: usize,
}

impl TitleExtractor {
    pub fn new(client: Arc<dyn CompletionClient>, cfg: &ExtractionConfig) -> Self {
        Self {
            client,
            language: cfg.language.clone(),
            domains: cfg.domains.clone(),
            max_page_chars: cfg.max_page_chars,
        }
    }

    pub async fn extract(&self, page_text: &str) -> Result<Vec<String>> {
        let prompt = self.build_prompt(page_text);
        let reply = self.client.complete(&prompt).await?;
        parse_title_list(&reply)
    }

    fn build_prompt(&self, page_text: &str) -> String {
        let text: String = page_text.chars().take(self.max_page_chars).collect();
        format!(
            "Extract the job titles from the following text with these rules: \
             1. Only keep job titles written in {}. \
             2. Treat identical titles as distinct occurrences; do not deduplicate. \
             3. Do not return anything apart from job titles. \
             4. Only keep job titles that align with these domains: {}. \
             5. Reply with a single bracketed list of quoted titles and no additional text.\n\n{}",
            self.language,
            self.domains.join(", "),
            text
        )
    }
}

/// Parse a reply shaped like `['Title A', "Title B"]` into its ordered titles.
///
/// The service promises a list literal but nothing enforces it, so this
/// validates bracket and quote structure and fails with an extraction error
/// instead of slicing blindly. An apostrophe inside a single-quoted title is
/// kept literal: a quote only closes when followed by a comma or the end. A
/// quote followed by another quote is a missing separator, not content.
pub fn parse_title_list(reply: &str) -> Result<Vec<String>> {
    let trimmed = reply.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| {
            WatchError::extraction(format!(
                "reply is not a bracketed list: {:.60}",
                trimmed.replace('\n', " ")
            ))
        })?;

    let chars: Vec<char> = inner.chars().collect();
    let mut titles = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        while i < chars.len() && (chars[i].is_whitespace() || chars[i] == ',') {
            i += 1;
        }
        if i >= chars.len() {
            break;
        }
        let quote = chars[i];
        if quote != '\'' && quote != '"' {
            return Err(WatchError::extraction(format!(
                "unquoted list element at offset {i}"
            )));
        }
        i += 1;

        let mut title = String::new();
        let mut end = None;
        while i < chars.len() {
            let c = chars[i];
            if c == quote {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                if j >= chars.len() || chars[j] == ',' {
                    end = Some(j);
                    break;
                }
                if chars[j] == '\'' || chars[j] == '"' {
                    return Err(WatchError::extraction(format!(
                        "missing comma between list elements at offset {j}"
                    )));
                }
            }
            title.push(c);
            i += 1;
        }
        let Some(end) = end else {
            return Err(WatchError::extraction("unterminated quoted title"));
        };
        titles.push(title);
        i = end;
    }

    Ok(titles)
}
