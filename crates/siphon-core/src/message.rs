// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound channel messages and their persisted lifecycle records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SiphonError;
use crate::types::{ContentType, FailureKind, MessageStatus};

/// A file attached to a channel message, referenced by the channel's file id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_id: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

impl Attachment {
    /// Extension used when the attachment is stored, lower-cased, no dot.
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .as_deref()
            .and_then(|name| std::path::Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .or_else(|| {
                let ext = match self.mime_type.as_deref()? {
                    "application/pdf" => "pdf",
                    "image/jpeg" => "jpg",
                    "image/png" => "png",
                    "audio/ogg" => "ogg",
                    "audio/mpeg" => "mp3",
                    "audio/mp4" | "audio/x-m4a" => "m4a",
                    _ => return None,
                };
                Some(ext.to_string())
            })
    }
}

/// One inbound unit of content, as delivered by the channel.
///
/// This is also the cached raw payload: it is serialized to JSON when the
/// message is claimed so it can be reprocessed after the channel expires it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub message_id: i64,
    pub chat_id: i64,
    pub sender_id: String,
    #[serde(default)]
    pub sender_username: Option<String>,
    pub content_type: ContentType,
    /// Message text, or the caption for media messages.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachment: Option<Attachment>,
    pub received_at: DateTime<Utc>,
}

impl ChannelMessage {
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn to_payload(&self) -> Result<String, SiphonError> {
        serde_json::to_string(self).map_err(|e| SiphonError::Internal(format!(
            "failed to serialize message {}: {e}",
            self.message_id
        )))
    }

    pub fn from_payload(payload: &str) -> Result<Self, SiphonError> {
        serde_json::from_str(payload)
            .map_err(|e| SiphonError::Internal(format!("corrupt cached payload: {e}")))
    }
}

/// A channel update: a monotonic id and an optional message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelUpdate {
    pub update_id: i64,
    pub message: Option<ChannelMessage>,
}

/// The durable per-message state record.
#[derive(Debug, Clone, Serialize)]
pub struct MessageRecord {
    pub message_id: i64,
    pub update_id: Option<i64>,
    pub chat_id: i64,
    pub sender_id: String,
    pub content_type: ContentType,
    pub status: MessageStatus,
    #[serde(skip_serializing)]
    pub cached_payload: Option<String>,
    pub output_paths: Vec<String>,
    pub last_error: Option<String>,
    pub failure_kind: Option<FailureKind>,
    pub attempts: u32,
    pub received_at: String,
    pub first_seen_at: String,
    pub processing_at: Option<String>,
    pub completed_at: Option<String>,
    pub failed_at: Option<String>,
}

impl MessageRecord {
    pub fn has_cached_payload(&self) -> bool {
        self.cached_payload.is_some()
    }
}
