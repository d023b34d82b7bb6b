// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status reactions shown on the source message.

use siphon_core::{ChannelAdapter, ChannelMessage};
use tracing::warn;

pub const PROCESSING: &str = "👀";
pub const COMPLETED: &str = "👍";
pub const FAILED: &str = "👎";
pub const BLOCKED: &str = "🙈";

/// Set a reaction, logging and swallowing any failure.
pub async fn react(channel: &dyn ChannelAdapter, message: &ChannelMessage, emoji: &str) {
    if let Err(e) = channel.set_reaction(message, emoji).await {
        warn!(
            message_id = message.message_id,
            emoji,
            error = %e,
            "failed to set reaction"
        );
    }
}
