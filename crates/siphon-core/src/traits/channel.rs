// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel transport trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::SiphonError;
use crate::message::{Attachment, ChannelMessage, ChannelUpdate};
use crate::traits::adapter::PluginAdapter;

/// Source of inbound messages.
///
/// Passing `offset` confirms every update below it; the channel stops
/// redelivering confirmed updates.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Fetches retained updates with ids `>= offset`, oldest first.
    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<ChannelUpdate>, SiphonError>;

    /// Sets a visible status reaction on a message. Callers treat failure as non-fatal.
    async fn set_reaction(&self, message: &ChannelMessage, emoji: &str)
    -> Result<(), SiphonError>;

    /// Downloads an attachment into `dest_dir`, returning the file path.
    async fn download(
        &self,
        attachment: &Attachment,
        dest_dir: &Path,
    ) -> Result<PathBuf, SiphonError>;
}
