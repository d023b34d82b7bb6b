// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Which fetched updates can be confirmed to the channel.
//!
//! A confirmed update is never redelivered, so only updates that need no
//! further fetch are confirmed: completed messages, security blocks, tool
//! failures with a cached payload (retried without the channel) and updates
//! without a usable message. The first update that is still pending, or
//! failed with nothing cached, holds the watermark back.

use siphon_core::{FailureKind, MessageRecord, MessageStatus};

/// Whether an update still needs the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Settled,
    Open,
}

impl Disposition {
    /// Classify an update from the stored record of its message.
    ///
    /// `has_message` is false for updates the channel filtered out
    /// (unauthorized senders, unsupported message kinds).
    pub fn of(has_message: bool, record: Option<&MessageRecord>) -> Self {
        if !has_message {
            return Disposition::Settled;
        }
        match record {
            Some(r) if r.status == MessageStatus::Completed => Disposition::Settled,
            Some(r) if r.status == MessageStatus::Failed => {
                if r.failure_kind == Some(FailureKind::Blocked) || r.has_cached_payload() {
                    Disposition::Settled
                } else {
                    Disposition::Open
                }
            }
            _ => Disposition::Open,
        }
    }
}

/// The offset to confirm: one past the longest settled prefix.
///
/// `updates` must be in fetch order. Returns `None` when the first update is
/// still open.
pub fn confirmable_offset(updates: &[(i64, Disposition)]) -> Option<i64> {
    updates
        .iter()
        .take_while(|(_, d)| *d == Disposition::Settled)
        .last()
        .map(|(id, _)| id + 1)
}

#[cfg(test)]
mod tests {
    use siphon_core::ContentType;

    use super::*;
    use Disposition::{Open, Settled};

    fn record(status: MessageStatus, kind: Option<FailureKind>) -> MessageRecord {
        MessageRecord {
            message_id: 1,
            update_id: Some(10),
            chat_id: 1,
            sender_id: "1".into(),
            content_type: ContentType::Text,
            status,
            cached_payload: None,
            output_paths: vec![],
            last_error: None,
            failure_kind: kind,
            attempts: 1,
            received_at: String::new(),
            first_seen_at: String::new(),
            processing_at: None,
            completed_at: None,
            failed_at: None,
        }
    }

    #[test]
    fn settled_prefix_advances() {
        let updates = [(10, Settled), (11, Settled), (12, Open), (13, Settled)];
        assert_eq!(confirmable_offset(&updates), Some(12));
    }

    #[test]
    fn open_head_holds_everything() {
        assert_eq!(confirmable_offset(&[(10, Open), (11, Settled)]), None);
        assert_eq!(confirmable_offset(&[]), None);
    }

    #[test]
    fn cached_failures_and_blocks_settle() {
        let mut cached = record(MessageStatus::Failed, Some(FailureKind::Tool));
        cached.cached_payload = Some("{}".into());
        let uncached = record(MessageStatus::Failed, Some(FailureKind::Tool));
        let blocked = record(MessageStatus::Failed, Some(FailureKind::Blocked));
        let done = record(MessageStatus::Completed, None);
        let pending = record(MessageStatus::Pending, None);
        assert_eq!(Disposition::of(true, Some(&cached)), Settled);
        assert_eq!(Disposition::of(true, Some(&uncached)), Open);
        assert_eq!(Disposition::of(true, Some(&blocked)), Settled);
        assert_eq!(Disposition::of(true, Some(&done)), Settled);
        assert_eq!(Disposition::of(true, Some(&pending)), Open);
        assert_eq!(Disposition::of(false, None), Settled);
        assert_eq!(Disposition::of(true, None), Open);
    }
}
