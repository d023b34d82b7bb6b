// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot of the message store for `status`.

use serde::Serialize;
use siphon_core::{ContentType, FailureKind, MessageRecord, SiphonError};
use siphon_storage::{MessageStore, StatusCounts};

/// How many recent failures a report lists.
pub const RECENT_FAILURES: i64 = 5;

/// Longest error excerpt shown per failure.
pub const ERROR_EXCERPT_CHARS: usize = 80;

#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
    pub message_id: i64,
    pub content_type: ContentType,
    pub failure_kind: Option<FailureKind>,
    pub retry_now: bool,
    pub failed_at: Option<String>,
    pub error: String,
}

impl From<&MessageRecord> for FailureSummary {
    fn from(record: &MessageRecord) -> Self {
        Self {
            message_id: record.message_id,
            content_type: record.content_type,
            failure_kind: record.failure_kind,
            retry_now: record.has_cached_payload()
                && record.failure_kind != Some(FailureKind::Blocked),
            failed_at: record.failed_at.clone(),
            error: excerpt(record.last_error.as_deref().unwrap_or(""), ERROR_EXCERPT_CHARS),
        }
    }
}

/// Counts per state plus the most recent failures.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub counts: StatusCounts,
    pub channel_offset: Option<i64>,
    pub recent_failures: Vec<FailureSummary>,
}

impl StatusReport {
    pub async fn load(store: &MessageStore) -> Result<Self, SiphonError> {
        let counts = store.status_counts().await?;
        let channel_offset = store.get_offset().await?;
        let recent_failures = store
            .recent_failures(RECENT_FAILURES)
            .await?
            .iter()
            .map(FailureSummary::from)
            .collect();
        Ok(Self {
            counts,
            channel_offset,
            recent_failures,
        })
    }
}

/// First `max` characters of a single-line rendering of `text`.
pub fn excerpt(text: &str, max: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let mut cut: String = flat.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_is_bounded_and_single_line() {
        let long = "[tool-failure] processor `transcription` failed: exit status 1\n".repeat(4);
        let out = excerpt(&long, ERROR_EXCERPT_CHARS);
        assert_eq!(out.chars().count(), ERROR_EXCERPT_CHARS);
        assert!(out.ends_with("..."));
        assert!(!out.contains('\n'));
    }

    #[test]
    fn short_errors_are_untouched() {
        assert_eq!(excerpt("[blocked] rm-rf", 80), "[blocked] rm-rf");
    }
}
