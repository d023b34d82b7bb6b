// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content processor trait.

use std::path::Path;

use async_trait::async_trait;

use crate::error::SiphonError;
use crate::record::ExtractedContent;
use crate::traits::adapter::PluginAdapter;
use crate::types::ContentType;

/// Input handed to a content processor.
#[derive(Debug, Clone, Copy)]
pub struct ProcessorInput<'a> {
    pub content_type: ContentType,
    /// Cleaned text or caption.
    pub text: &'a str,
    /// Downloaded attachment, for file-backed content types.
    pub file: Option<&'a Path>,
    /// Per-message scratch directory. Removed after the message is done.
    pub work_dir: &'a Path,
}

/// Turns one kind of content into text.
///
/// Implementations must bound every external call with a timeout and keep
/// intermediate files inside `work_dir`.
#[async_trait]
pub trait ContentProcessor: PluginAdapter {
    /// Whether this processor handles the given content type.
    fn handles(&self, content_type: ContentType) -> bool;

    async fn process(&self, input: ProcessorInput<'_>) -> Result<ExtractedContent, SiphonError>;
}
