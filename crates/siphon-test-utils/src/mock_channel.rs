// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` retains injected updates the way the Bot API does: an
//! update stays available until a fetch passes an offset above its id.
//! Fetches, reactions and downloads are captured for assertions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use siphon_core::{
    AdapterType, Attachment, ChannelAdapter, ChannelMessage, ChannelUpdate, HealthStatus,
    PluginAdapter, SiphonError,
};

/// Updates returned per fetch, as the Bot API does by default.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// A mock channel for testing.
pub struct MockChannel {
    retained: Arc<Mutex<Vec<ChannelUpdate>>>,
    fetches: Arc<Mutex<Vec<Option<i64>>>>,
    reactions: Arc<Mutex<Vec<(i64, String)>>>,
    downloads: Arc<Mutex<Vec<String>>>,
    failing_fetches: Arc<Mutex<usize>>,
    failing_reactions: Arc<Mutex<bool>>,
    attachment_bytes: Vec<u8>,
    page_size: usize,
}

impl MockChannel {
    /// Create a new mock channel with nothing retained.
    pub fn new() -> Self {
        Self {
            retained: Arc::new(Mutex::new(Vec::new())),
            fetches: Arc::new(Mutex::new(Vec::new())),
            reactions: Arc::new(Mutex::new(Vec::new())),
            downloads: Arc::new(Mutex::new(Vec::new())),
            failing_fetches: Arc::new(Mutex::new(0)),
            failing_reactions: Arc::new(Mutex::new(false)),
            attachment_bytes: b"mock attachment".to_vec(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Bytes written for every downloaded attachment.
    pub fn with_attachment_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.attachment_bytes = bytes.into();
        self
    }

    /// Deliver at most `n` updates per fetch.
    pub fn with_page_size(mut self, n: usize) -> Self {
        self.page_size = n.max(1);
        self
    }

    /// Inject an update carrying `message`.
    pub async fn push(&self, update_id: i64, message: ChannelMessage) {
        self.retained.lock().await.push(ChannelUpdate {
            update_id,
            message: Some(message),
        });
    }

    /// Inject an update the transport filtered out (unauthorized sender,
    /// unsupported message kind).
    pub async fn push_filtered(&self, update_id: i64) {
        self.retained.lock().await.push(ChannelUpdate {
            update_id,
            message: None,
        });
    }

    /// Drop every retained update, as if the retention window elapsed.
    pub async fn expire_all(&self) {
        self.retained.lock().await.clear();
    }

    /// Ids of the updates the channel would still deliver.
    pub async fn retained_ids(&self) -> Vec<i64> {
        self.retained.lock().await.iter().map(|u| u.update_id).collect()
    }

    /// Make the next `n` fetches fail.
    pub async fn fail_next_fetches(&self, n: usize) {
        *self.failing_fetches.lock().await = n;
    }

    /// Make every reaction call fail.
    pub async fn fail_reactions(&self) {
        *self.failing_reactions.lock().await = true;
    }

    /// Offsets passed to each `get_updates` call, including failed ones.
    pub async fn fetch_offsets(&self) -> Vec<Option<i64>> {
        self.fetches.lock().await.clone()
    }

    pub async fn fetch_count(&self) -> usize {
        self.fetches.lock().await.len()
    }

    /// Every reaction set, in order, as `(message_id, emoji)`.
    pub async fn reactions(&self) -> Vec<(i64, String)> {
        self.reactions.lock().await.clone()
    }

    /// The last reaction set on `message_id`.
    pub async fn last_reaction(&self, message_id: i64) -> Option<String> {
        self.reactions
            .lock()
            .await
            .iter()
            .rev()
            .find(|(id, _)| *id == message_id)
            .map(|(_, emoji)| emoji.clone())
    }

    /// File ids of every attachment downloaded.
    pub async fn downloads(&self) -> Vec<String> {
        self.downloads.lock().await.clone()
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, SiphonError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<ChannelUpdate>, SiphonError> {
        self.fetches.lock().await.push(offset);
        {
            let mut failing = self.failing_fetches.lock().await;
            if *failing > 0 {
                *failing -= 1;
                return Err(SiphonError::Channel {
                    message: "mock fetch failure".into(),
                    source: None,
                });
            }
        }
        let mut retained = self.retained.lock().await;
        if let Some(offset) = offset {
            retained.retain(|u| u.update_id >= offset);
        }
        Ok(retained.iter().take(self.page_size).cloned().collect())
    }

    async fn set_reaction(
        &self,
        message: &ChannelMessage,
        emoji: &str,
    ) -> Result<(), SiphonError> {
        if *self.failing_reactions.lock().await {
            return Err(SiphonError::Channel {
                message: "mock reaction failure".into(),
                source: None,
            });
        }
        self.reactions
            .lock()
            .await
            .push((message.message_id, emoji.to_string()));
        Ok(())
    }

    async fn download(
        &self,
        attachment: &Attachment,
        dest_dir: &Path,
    ) -> Result<PathBuf, SiphonError> {
        self.downloads.lock().await.push(attachment.file_id.clone());
        let name = attachment
            .file_name
            .clone()
            .unwrap_or_else(|| match attachment.extension() {
                Some(ext) => format!("{}.{ext}", attachment.file_id),
                None => attachment.file_id.clone(),
            });
        let path = dest_dir.join(name);
        tokio::fs::write(&path, &self.attachment_bytes)
            .await
            .map_err(|e| SiphonError::Channel {
                message: format!("mock download failed: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(path)
    }
}
