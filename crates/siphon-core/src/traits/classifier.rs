// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AI intent classifier trait.

use async_trait::async_trait;

use crate::decision::Classification;
use crate::traits::adapter::PluginAdapter;
use crate::types::ContentType;

/// Optional fallback tier for pipeline resolution.
///
/// Returns `None` when unavailable or unsure; never errors.
#[async_trait]
pub trait IntentClassifier: PluginAdapter {
    async fn classify(
        &self,
        caption: &str,
        content_type: ContentType,
        filename: Option<&str>,
    ) -> Option<Classification>;
}
