// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain text messages need no external tool.

use async_trait::async_trait;
use siphon_core::{
    AdapterType, ContentProcessor, ContentType, ExtractedContent, HealthStatus, PluginAdapter,
    ProcessorInput, SiphonError,
};

/// Longest title derived from content, in characters.
pub const MAX_TITLE_CHARS: usize = 60;

/// First non-empty line of `content`, without a leading markdown heading marker.
pub fn title_from_content(content: &str) -> Option<String> {
    let line = content
        .lines()
        .map(|l| l.trim().trim_start_matches('#').trim())
        .find(|l| !l.is_empty())?;
    Some(line.chars().take(MAX_TITLE_CHARS).collect::<String>().trim_end().to_string())
}

/// Passes cleaned text through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextProcessor;

#[async_trait]
impl PluginAdapter for TextProcessor {
    fn name(&self) -> &str {
        "text"
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
impl ContentProcessor for TextProcessor {
    fn handles(&self, content_type: ContentType) -> bool {
        content_type == ContentType::Text
    }

    async fn process(&self, input: ProcessorInput<'_>) -> Result<ExtractedContent, SiphonError> {
        let content = input.text.trim().to_string();
        let title = title_from_content(&content).unwrap_or_else(|| "Untitled".to_string());
        Ok(ExtractedContent { content, title })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn title_is_first_non_empty_line() {
        assert_eq!(
            title_from_content("\n\n# Shopping\n- eggs").as_deref(),
            Some("Shopping")
        );
        assert_eq!(title_from_content("   \n  "), None);
        let long = "word ".repeat(30);
        assert!(title_from_content(&long).unwrap().chars().count() <= MAX_TITLE_CHARS);
    }

    #[tokio::test]
    async fn text_passes_through() {
        let out = TextProcessor
            .process(ProcessorInput {
                content_type: ContentType::Text,
                text: "  Call the plumber\nabout the boiler  ",
                file: None,
                work_dir: Path::new("."),
            })
            .await
            .unwrap();
        assert_eq!(out.title, "Call the plumber");
        assert_eq!(out.content, "Call the plumber\nabout the boiler");
    }

    #[tokio::test]
    async fn empty_text_gets_placeholder_title() {
        let out = TextProcessor
            .process(ProcessorInput {
                content_type: ContentType::Text,
                text: "",
                file: None,
                work_dir: Path::new("."),
            })
            .await
            .unwrap();
        assert_eq!(out.title, "Untitled");
        assert!(TextProcessor.handles(ContentType::Text));
        assert!(!TextProcessor.handles(ContentType::Url));
    }
}
