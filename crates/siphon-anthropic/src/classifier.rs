// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent classification through the Messages API.
//!
//! The model is asked for a single JSON object. Anything it returns is
//! normalised before it reaches the router, and every failure (transport,
//! API error, unparseable reply) is logged and reported as no opinion.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use siphon_config::model::ClassifierConfig;
use siphon_core::{
    AdapterType, Classification, ContentType, HealthStatus, HintMetadata, IntentClassifier,
    Pipeline, PluginAdapter, SiphonError,
};
use tracing::{debug, info, warn};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

const MAX_TOKENS: u32 = 300;

/// Longest caption sent to the model, in characters.
const MAX_CAPTION_CHARS: usize = 2_000;

const SYSTEM_PROMPT: &str = "You route personal content into a knowledge vault. \
Choose exactly one pipeline:\n\
- note: thoughts, ideas, reminders, meeting notes\n\
- clip: a web article or link worth saving\n\
- archive: a document to file for records (contract, lease, certificate, letter)\n\
- receipt: proof of purchase, invoice or bill\n\
- default: nothing above clearly applies\n\
Reply with one JSON object and nothing else: \
{\"pipeline\": string, \"confidence\": number between 0 and 1, \
\"metadata\": {\"type\": string|null, \"category\": string|null, \"date\": \"YYYY-MM-DD\"|null}, \
\"suggested_tags\": [string], \"reasoning\": string}. \
Category is one of HOME, WORK, CAR, HEALTH when it applies.";

/// Resolve the API key: config first, then `ANTHROPIC_API_KEY`.
pub fn resolve_api_key(config_key: &Option<String>) -> Option<String> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Some(key.clone());
    }
    std::env::var("ANTHROPIC_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    pipeline: String,
    confidence: f64,
    #[serde(default)]
    metadata: Option<RawMetadata>,
    #[serde(default, alias = "suggestedTags")]
    suggested_tags: Vec<String>,
    #[serde(default)]
    reasoning: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawMetadata {
    #[serde(default, rename = "type")]
    doc_type: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

fn upper(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_uppercase())
        .filter(|v| !v.is_empty() && v != "NULL")
}

/// Parse and normalise a model reply into a [`Classification`].
///
/// The first `{` through the last `}` is taken as the JSON object, so a
/// reply wrapped in prose or a code fence still parses.
pub fn parse_classification(reply: &str) -> Result<Classification, SiphonError> {
    let invalid = |message: String| SiphonError::Classifier {
        message,
        source: None,
    };
    let start = reply
        .find('{')
        .ok_or_else(|| invalid("reply contains no JSON object".into()))?;
    let end = reply
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| invalid("reply contains no JSON object".into()))?;
    let raw: RawClassification =
        serde_json::from_str(&reply[start..=end]).map_err(|e| SiphonError::Classifier {
            message: format!("malformed classification: {e}"),
            source: Some(Box::new(e)),
        })?;

    let pipeline = Pipeline::from_str(raw.pipeline.trim())
        .map_err(|_| invalid(format!("unknown pipeline `{}`", raw.pipeline)))?;
    if !raw.confidence.is_finite() {
        return Err(invalid("confidence is not a number".into()));
    }

    let meta = raw.metadata.unwrap_or_default();
    let metadata = HintMetadata {
        doc_type: upper(meta.doc_type),
        category: upper(meta.category),
        date: meta
            .date
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok()),
        ..HintMetadata::default()
    };

    let mut suggested_tags: Vec<String> = Vec::new();
    for tag in raw.suggested_tags {
        let tag = tag.trim().trim_start_matches('#').to_lowercase().replace(' ', "-");
        if !tag.is_empty() && !suggested_tags.contains(&tag) {
            suggested_tags.push(tag);
        }
    }

    Ok(Classification {
        pipeline,
        confidence: raw.confidence.clamp(0.0, 1.0),
        metadata,
        suggested_tags,
        reasoning: raw.reasoning.trim().to_string(),
    })
}

/// [`IntentClassifier`] backed by an Anthropic model.
#[derive(Debug, Clone)]
pub struct AnthropicClassifier {
    client: AnthropicClient,
}

impl AnthropicClassifier {
    pub fn new(client: AnthropicClient) -> Self {
        Self { client }
    }

    /// Build the classifier when enabled. A disabled classifier is `None`;
    /// an enabled one without an API key is a configuration error.
    pub fn from_config(config: &ClassifierConfig) -> Result<Option<Self>, SiphonError> {
        if !config.enabled {
            debug!("AI classifier disabled");
            return Ok(None);
        }
        let api_key = resolve_api_key(&config.api_key).ok_or_else(|| {
            SiphonError::Config(
                "classifier is enabled but no API key was found. Set classifier.api_key \
                 or the ANTHROPIC_API_KEY environment variable."
                    .into(),
            )
        })?;
        let client = AnthropicClient::new(
            &api_key,
            &config.api_version,
            config.model.clone(),
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(model = %config.model, "AI classifier enabled");
        Ok(Some(Self::new(client)))
    }

    fn request(
        &self,
        caption: &str,
        content_type: ContentType,
        filename: Option<&str>,
    ) -> MessageRequest {
        let caption: String = caption.chars().take(MAX_CAPTION_CHARS).collect();
        let mut prompt = format!("Content type: {content_type}\n");
        if let Some(filename) = filename {
            prompt.push_str(&format!("Filename: {filename}\n"));
        }
        prompt.push_str(&format!("Caption:\n{caption}"));

        MessageRequest {
            model: self.client.model().to_string(),
            messages: vec![ApiMessage::user(prompt)],
            system: Some(SYSTEM_PROMPT.to_string()),
            max_tokens: MAX_TOKENS,
            temperature: Some(0.0),
        }
    }
}

#[async_trait]
impl PluginAdapter for AnthropicClassifier {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Classifier
    }

    async fn health_check(&self) -> Result<HealthStatus, SiphonError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl IntentClassifier for AnthropicClassifier {
    async fn classify(
        &self,
        caption: &str,
        content_type: ContentType,
        filename: Option<&str>,
    ) -> Option<Classification> {
        let request = self.request(caption, content_type, filename);
        let response = match self.client.complete_message(&request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "classification request failed");
                return None;
            }
        };
        match parse_classification(&response.text()) {
            Ok(classification) => {
                debug!(
                    pipeline = %classification.pipeline,
                    confidence = classification.confidence,
                    "classification received"
                );
                Some(classification)
            }
            Err(e) => {
                warn!(error = %e, "discarding unusable classification");
                None
            }
        }
    }
}
