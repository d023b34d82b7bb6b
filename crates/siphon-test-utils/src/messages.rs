// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel message builders.

use chrono::{TimeZone, Utc};
use siphon_core::{Attachment, ChannelMessage, ContentType};

/// Sender used by every builder.
pub const SENDER_ID: &str = "4242";

fn message(message_id: i64, content_type: ContentType, text: &str) -> ChannelMessage {
    ChannelMessage {
        message_id,
        chat_id: 4242,
        sender_id: SENDER_ID.to_string(),
        sender_username: Some("tester".to_string()),
        content_type,
        text: (!text.is_empty()).then(|| text.to_string()),
        attachment: None,
        received_at: Utc
            .with_ymd_and_hms(2024, 6, 15, 9, 30, 0)
            .single()
            .unwrap_or_else(Utc::now),
    }
}

pub fn text_message(message_id: i64, text: &str) -> ChannelMessage {
    message(message_id, ContentType::Text, text)
}

pub fn url_message(message_id: i64, url: &str) -> ChannelMessage {
    message(message_id, ContentType::Url, url)
}

/// A voice note with an optional caption.
pub fn voice_message(message_id: i64, caption: &str) -> ChannelMessage {
    ChannelMessage {
        attachment: Some(Attachment {
            file_id: format!("voice-{message_id}"),
            file_name: None,
            mime_type: Some("audio/ogg".to_string()),
            file_size: Some(2048),
        }),
        ..message(message_id, ContentType::Voice, caption)
    }
}

/// A document upload named `file_name`, captioned with `caption`.
pub fn document_message(message_id: i64, caption: &str, file_name: &str) -> ChannelMessage {
    ChannelMessage {
        attachment: Some(Attachment {
            file_id: format!("doc-{message_id}"),
            file_name: Some(file_name.to_string()),
            mime_type: None,
            file_size: Some(4096),
        }),
        ..message(message_id, ContentType::Document, caption)
    }
}

pub fn photo_message(message_id: i64, caption: &str) -> ChannelMessage {
    ChannelMessage {
        attachment: Some(Attachment {
            file_id: format!("photo-{message_id}"),
            file_name: None,
            mime_type: Some("image/jpeg".to_string()),
            file_size: Some(8192),
        }),
        ..message(message_id, ContentType::Photo, caption)
    }
}
