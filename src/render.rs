// src/render.rs
// Page rendering seam. Real browser automation lives outside the core; the
// built-in renderer does a plain GET and reduces the HTML to visible text.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::HttpConfig;
use crate::error::{Result, WatchError};

#[async_trait]
pub trait PageRenderer: Send + Sync {
    /// Visible text content of the fully loaded page at `url`.
    async fn render(&self, url: &str) -> Result<String>;
}

pub struct HttpRenderer {
    http: reqwest::Client,
}

impl HttpRenderer {
    pub fn new(cfg: &HttpConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("jobwatch/0.1")
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .expect("reqwest client");
        Self { http }
    }
}

#[async_trait]
impl PageRenderer for HttpRenderer {
    async fn render(&self, url: &str) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| WatchError::render(url, e))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(WatchError::render(url, format!("status {status}")));
        }
        let html = resp.text().await.map_err(|e| WatchError::render(url, e))?;
        Ok(visible_text(&html))
    }
}

/// Reduce an HTML document to its visible-ish text: drop script/style blocks,
/// strip tags, decode entities, collapse whitespace.
pub fn visible_text(html: &str) -> String {
    static RE_DROP: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_drop = RE_DROP.get_or_init(|| {
        regex::Regex::new(r"(?is)<(script|style|noscript)\b[^>]*>.*?</(script|style|noscript)>")
            .unwrap()
    });
    let mut out = re_drop.replace_all(html, " ").to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    out = html_escape::decode_html_entities(&out).to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_scripts() {
        let html = r#"<html><head><style>body{color:red}</style>
            <script>var x = "<b>not text</b>";</script></head>
            <body><h1>Open roles</h1><ul><li>Rust   Engineer</li></ul></body></html>"#;
        assert_eq!(visible_text(html), "Open roles Rust Engineer");
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(
            visible_text("<p>Backend &amp; Infra</p>"),
            "Backend & Infra"
        );
    }
}
