// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Update filtering and mapping to channel-agnostic messages.
//!
//! Updates that are not private messages from an authorized sender, or whose
//! content type is unsupported, become updates without a message so their
//! id can still be confirmed.

use siphon_core::{Attachment, ChannelMessage, ChannelUpdate, ContentType};
use teloxide::types::{ChatKind, FileMeta, Message, Update, UpdateKind};
use tracing::debug;

/// Checks whether the message sender is authorized.
///
/// Authorization passes if the sender's user ID (as string) or username
/// matches any entry in the `allowed_users` list. If `allowed_users` is
/// empty, all messages are rejected.
///
/// Messages without a sender (e.g., channel posts) always return `false`.
pub fn is_authorized(msg: &Message, allowed_users: &[String]) -> bool {
    let Some(user) = msg.from.as_ref() else {
        return false;
    };
    let user_id = user.id.0.to_string();

    allowed_users.iter().any(|allowed| {
        *allowed == user_id
            || user.username.as_deref().is_some_and(|username| {
                username.eq_ignore_ascii_case(allowed.strip_prefix('@').unwrap_or(allowed))
            })
    })
}

/// Checks whether the message is from a private (DM) chat.
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// A text message that is nothing but one http(s) URL.
pub fn is_single_url(text: &str) -> bool {
    let trimmed = text.trim();
    (trimmed.starts_with("https://") || trimmed.starts_with("http://"))
        && !trimmed.contains(char::is_whitespace)
        && trimmed.len() > "https://".len()
}

fn attachment(file: &FileMeta, file_name: Option<&str>, mime_type: Option<String>) -> Attachment {
    Attachment {
        file_id: file.id.to_string(),
        file_name: file_name.map(String::from),
        mime_type,
        file_size: Some(u64::from(file.size)),
    }
}

/// Maps a Telegram message to a [`ChannelMessage`], or `None` when the
/// content type is unsupported.
pub fn to_channel_message(msg: &Message) -> Option<ChannelMessage> {
    let (content_type, text, attachment) = if let Some(text) = msg.text() {
        let content_type = if is_single_url(text) {
            ContentType::Url
        } else {
            ContentType::Text
        };
        (content_type, Some(text.to_string()), None)
    } else if let Some(photos) = msg.photo() {
        // Telegram provides multiple sizes; the last one is the largest.
        let largest = photos.last()?;
        (
            ContentType::Photo,
            msg.caption().map(String::from),
            Some(attachment(&largest.file, None, Some("image/jpeg".into()))),
        )
    } else if let Some(doc) = msg.document() {
        (
            ContentType::Document,
            msg.caption().map(String::from),
            Some(attachment(
                &doc.file,
                doc.file_name.as_deref(),
                doc.mime_type.as_ref().map(|m| m.to_string()),
            )),
        )
    } else if let Some(voice) = msg.voice() {
        (
            ContentType::Voice,
            msg.caption().map(String::from),
            Some(attachment(
                &voice.file,
                None,
                voice.mime_type.as_ref().map(|m| m.to_string()),
            )),
        )
    } else if let Some(audio) = msg.audio() {
        (
            ContentType::Audio,
            msg.caption().map(String::from),
            Some(attachment(
                &audio.file,
                audio.file_name.as_deref(),
                audio.mime_type.as_ref().map(|m| m.to_string()),
            )),
        )
    } else {
        debug!(msg_id = msg.id.0, "ignoring unsupported message type");
        return None;
    };

    Some(ChannelMessage {
        message_id: i64::from(msg.id.0),
        chat_id: msg.chat.id.0,
        sender_id: msg
            .from
            .as_ref()
            .map(|u| u.id.0.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        sender_username: msg.from.as_ref().and_then(|u| u.username.clone()),
        content_type,
        text,
        attachment,
        received_at: msg.date,
    })
}

/// Maps an update, dropping the message unless it is an authorized DM with
/// supported content.
pub fn to_channel_update(update: &Update, allowed_users: &[String]) -> ChannelUpdate {
    let update_id = i64::from(update.id.0);
    let message = match &update.kind {
        UpdateKind::Message(msg) if !is_dm(msg) => {
            debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
            None
        }
        UpdateKind::Message(msg) if !is_authorized(msg, allowed_users) => {
            debug!(chat_id = msg.chat.id.0, "ignoring unauthorized user");
            None
        }
        UpdateKind::Message(msg) => to_channel_message(msg),
        _ => None,
    };
    ChannelUpdate { update_id, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn private_message(extra: serde_json::Value) -> Message {
        let mut json = serde_json::json!({
            "message_id": 7,
            "date": 1700000000i64,
            "chat": {
                "id": 12345i64,
                "type": "private",
                "first_name": "Test",
            },
            "from": {
                "id": 12345u64,
                "is_bot": false,
                "first_name": "Test",
                "username": "testuser",
            },
        });
        if let (Some(base), Some(extra)) = (json.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(json).expect("failed to deserialize mock message")
    }

    fn group_message(text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": -100123i64,
                "type": "supergroup",
                "title": "Test Group",
            },
            "from": {
                "id": 12345u64,
                "is_bot": false,
                "first_name": "Test",
            },
            "text": text,
        });
        serde_json::from_value(json).expect("failed to deserialize mock group message")
    }

    #[test]
    fn authorized_by_user_id_or_username() {
        let msg = private_message(serde_json::json!({"text": "hi"}));
        assert!(is_authorized(&msg, &["12345".into()]));
        assert!(is_authorized(&msg, &["@TestUser".into()]));
        assert!(!is_authorized(&msg, &["99999".into()]));
        assert!(!is_authorized(&msg, &[]));
    }

    #[test]
    fn group_chats_are_not_dms() {
        assert!(!is_dm(&group_message("hello")));
        assert!(is_dm(&private_message(serde_json::json!({"text": "hi"}))));
    }

    #[test]
    fn single_url_detection() {
        assert!(is_single_url(" https://example.com/post?id=1 "));
        assert!(!is_single_url("read https://example.com later"));
        assert!(!is_single_url("https://"));
        assert!(!is_single_url("ftp://example.com"));
    }

    #[test]
    fn text_and_url_messages() {
        let text = to_channel_message(&private_message(serde_json::json!({
            "text": "#idea /note buy milk"
        })))
        .unwrap();
        assert_eq!(text.content_type, ContentType::Text);
        assert_eq!(text.message_id, 7);
        assert_eq!(text.chat_id, 12345);
        assert_eq!(text.sender_id, "12345");
        assert_eq!(text.sender_username.as_deref(), Some("testuser"));
        assert!(text.attachment.is_none());

        let url = to_channel_message(&private_message(serde_json::json!({
            "text": "https://example.com/article"
        })))
        .unwrap();
        assert_eq!(url.content_type, ContentType::Url);
    }

    #[test]
    fn photo_uses_largest_size_and_caption() {
        let msg = to_channel_message(&private_message(serde_json::json!({
            "caption": "/receipt coffee",
            "photo": [
                {"file_id": "small", "file_unique_id": "s", "width": 90, "height": 90, "file_size": 100},
                {"file_id": "large", "file_unique_id": "l", "width": 1280, "height": 960, "file_size": 90000},
            ],
        })))
        .unwrap();
        assert_eq!(msg.content_type, ContentType::Photo);
        assert_eq!(msg.text.as_deref(), Some("/receipt coffee"));
        let attachment = msg.attachment.unwrap();
        assert_eq!(attachment.file_id, "large");
        assert_eq!(attachment.file_size, Some(90000));
    }

    #[test]
    fn document_and_voice_carry_file_metadata() {
        let doc = to_channel_message(&private_message(serde_json::json!({
            "document": {
                "file_id": "doc1",
                "file_unique_id": "d1",
                "file_name": "lease.pdf",
                "mime_type": "application/pdf",
                "file_size": 5000,
            },
        })))
        .unwrap();
        assert_eq!(doc.content_type, ContentType::Document);
        let attachment = doc.attachment.unwrap();
        assert_eq!(attachment.file_name.as_deref(), Some("lease.pdf"));
        assert_eq!(attachment.mime_type.as_deref(), Some("application/pdf"));

        let voice = to_channel_message(&private_message(serde_json::json!({
            "voice": {
                "file_id": "v1",
                "file_unique_id": "uv1",
                "duration": 4,
                "mime_type": "audio/ogg",
                "file_size": 2048,
            },
        })))
        .unwrap();
        assert_eq!(voice.content_type, ContentType::Voice);
        assert_eq!(voice.text, None);
        assert_eq!(voice.attachment.unwrap().extension().as_deref(), Some("ogg"));
    }

    #[test]
    fn unauthorized_updates_keep_their_id_but_not_the_message() {
        let update: Update = serde_json::from_str(&serde_json::json!({
            "update_id": 500,
            "message": {
                "message_id": 7,
                "date": 1700000000i64,
                "chat": {"id": 1i64, "type": "private", "first_name": "X"},
                "from": {"id": 1u64, "is_bot": false, "first_name": "X"},
                "text": "hello",
            },
        }).to_string())
        .unwrap();

        let denied = to_channel_update(&update, &["12345".into()]);
        assert_eq!(denied.update_id, 500);
        assert!(denied.message.is_none());

        let allowed = to_channel_update(&update, &["1".into()]);
        assert_eq!(allowed.message.unwrap().text.as_deref(), Some("hello"));
    }
}
