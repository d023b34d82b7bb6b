// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Article fetch for URL messages.
//!
//! The page is fetched with a bounded timeout and size cap, its `<title>` is
//! taken as the note title and the HTML is rendered to plain text.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use siphon_core::{
    AdapterType, ContentProcessor, ContentType, ExtractedContent, HealthStatus, PluginAdapter,
    ProcessorInput, SiphonError,
};
use tracing::debug;

use crate::text::{MAX_TITLE_CHARS, title_from_content};

const NAME: &str = "url";

/// Column width for rendered article text.
const RENDER_WIDTH: usize = 100;

static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://[^\s<>]+").unwrap());

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// First http(s) URL in `text`.
pub fn find_url(text: &str) -> Option<&str> {
    URL.find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ')', ';']))
}

/// Text of the page's `<title>` element, whitespace-collapsed.
pub fn html_title(html: &str) -> Option<String> {
    let raw = TITLE.captures(html)?.get(1)?.as_str();
    let title = WHITESPACE.replace_all(raw.trim(), " ");
    if title.is_empty() {
        return None;
    }
    Some(title.chars().take(MAX_TITLE_CHARS).collect())
}

/// Fetches the linked page and converts it to text.
#[derive(Debug, Clone)]
pub struct UrlProcessor {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl UrlProcessor {
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, SiphonError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("siphon/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SiphonError::Processor {
                processor: NAME.into(),
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            timeout,
            max_bytes,
        })
    }

    async fn fetch(&self, url: &str) -> Result<(String, bool), SiphonError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SiphonError::processor(
                NAME,
                format!("{url} returned {status}"),
            ));
        }
        if let Some(len) = response.content_length()
            && len as usize > self.max_bytes
        {
            return Err(SiphonError::processor(
                NAME,
                format!("page is {len} bytes, limit is {}", self.max_bytes),
            ));
        }
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_none_or(|v| v.contains("html"));

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.request_error(e))? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(SiphonError::processor(
                    NAME,
                    format!("page exceeds {} bytes", self.max_bytes),
                ));
            }
            body.extend_from_slice(&chunk);
        }
        debug!(url, bytes = body.len(), "article fetched");
        Ok((String::from_utf8_lossy(&body).into_owned(), is_html))
    }

    fn request_error(&self, e: reqwest::Error) -> SiphonError {
        if e.is_timeout() {
            return SiphonError::Timeout {
                duration: self.timeout,
            };
        }
        SiphonError::Processor {
            processor: NAME.into(),
            message: format!("fetch failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}

#[async_trait]
impl PluginAdapter for UrlProcessor {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Processor
    }

    async fn health_check(&self) -> Result<HealthStatus, SiphonError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ContentProcessor for UrlProcessor {
    fn handles(&self, content_type: ContentType) -> bool {
        content_type == ContentType::Url
    }

    async fn process(&self, input: ProcessorInput<'_>) -> Result<ExtractedContent, SiphonError> {
        let url = find_url(input.text)
            .ok_or_else(|| SiphonError::processor(NAME, "message contains no URL"))?;
        let (body, is_html) = self.fetch(url).await?;

        let (content, title) = if is_html {
            let text = html2text::from_read(body.as_bytes(), RENDER_WIDTH).map_err(|e| {
                SiphonError::Processor {
                    processor: NAME.into(),
                    message: format!("could not render page: {e}"),
                    source: Some(Box::new(e)),
                }
            })?;
            (text, html_title(&body))
        } else {
            let title = title_from_content(&body);
            (body, title)
        };

        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(SiphonError::processor(NAME, format!("{url} has no readable text")));
        }
        Ok(ExtractedContent {
            content: format!("Source: {url}\n\n{content}"),
            title: title.unwrap_or_else(|| url.to_string()),
        })
    }
}
