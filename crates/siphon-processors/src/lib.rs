// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content processors turn a message into raw text and a title.
//!
//! Text passes through, URLs are fetched over HTTP, and files are handed to
//! external tools (speech-to-text, document conversion, OCR) with timeouts.

pub mod command;
pub mod text;
pub mod url;

use std::sync::Arc;
use std::time::Duration;

use siphon_config::model::ProcessingConfig;
use siphon_core::{ContentProcessor, ContentType, SiphonError};

pub use command::CommandProcessor;
pub use text::TextProcessor;
pub use url::UrlProcessor;

/// Processors in lookup order. The first that handles a content type wins.
#[derive(Clone, Default)]
pub struct ProcessorSet {
    processors: Vec<Arc<dyn ContentProcessor>>,
}

impl ProcessorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the standard set from configuration.
    pub fn from_config(config: &ProcessingConfig) -> Result<Self, SiphonError> {
        let secs = Duration::from_secs;
        Ok(Self::new()
            .with(Arc::new(TextProcessor))
            .with(Arc::new(UrlProcessor::new(
                secs(config.fetch_timeout_secs),
                config.max_fetch_bytes,
            )?))
            .with(Arc::new(CommandProcessor::new(
                "transcription",
                [ContentType::Voice, ContentType::Audio],
                config.transcription_command.clone(),
                secs(config.transcription_timeout_secs),
            )?))
            .with(Arc::new(CommandProcessor::new(
                "document",
                [ContentType::Document],
                config.document_command.clone(),
                secs(config.document_timeout_secs),
            )?))
            .with(Arc::new(CommandProcessor::new(
                "ocr",
                [ContentType::Photo],
                config.ocr_command.clone(),
                secs(config.ocr_timeout_secs),
            )?)))
    }

    pub fn with(mut self, processor: Arc<dyn ContentProcessor>) -> Self {
        self.processors.push(processor);
        self
    }

    pub fn for_content(&self, content_type: ContentType) -> Option<Arc<dyn ContentProcessor>> {
        self.processors
            .iter()
            .find(|p| p.handles(content_type))
            .cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ContentProcessor>> {
        self.processors.iter()
    }
}
