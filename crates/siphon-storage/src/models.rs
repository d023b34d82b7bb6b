// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage-side aggregates. Per-message records live in `siphon-core`.

use serde::Serialize;

pub use siphon_core::{FailureKind, MessageRecord, MessageStatus};

/// Message counts per lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
    /// Failed messages that can be reprocessed from cache.
    pub retry_eligible: u64,
    /// Failed messages halted by the security validator.
    pub blocked: u64,
}

impl StatusCounts {
    pub fn total(&self) -> u64 {
        self.pending + self.processing + self.completed + self.failed
    }
}
