// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Siphon ingestion engine.

use thiserror::Error;

/// The primary error type used across all Siphon adapter traits and core operations.
#[derive(Debug, Error)]
pub enum SiphonError {
    /// Configuration errors (invalid TOML, missing required settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel transport errors (polling, reactions, downloads).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Content processor failures (nonzero exit, malformed output, fetch errors).
    #[error("processor `{processor}` failed: {message}")]
    Processor {
        processor: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Intent classifier errors. Never surfaced past the classifier boundary.
    #[error("classifier error: {message}")]
    Classifier {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Vault write errors.
    #[error("vault error: {message}")]
    Vault {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// A lifecycle transition was attempted from the wrong state.
    #[error("message {message_id}: cannot move from {from} to {to}")]
    InvalidTransition {
        message_id: i64,
        from: String,
        to: String,
    },

    /// A failed message cannot be retried: no cached payload, or it was blocked.
    #[error("message {message_id} cannot be retried: {reason}")]
    RetryUnavailable { message_id: i64, reason: String },

    /// No state record exists for the message.
    #[error("message {0} is not tracked")]
    MessageNotFound(i64),

    /// Another live worker holds the processing lease.
    #[error("another siphon worker is running ({holder})")]
    WorkerBusy { holder: String },

    /// Content or commands matched a hard-block rule.
    #[error("blocked by security policy: {}", reasons.join(", "))]
    SecurityBlocked { reasons: Vec<String> },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SiphonError {
    /// Whether this failure came from the security validator rather than a tool.
    pub fn is_security_block(&self) -> bool {
        matches!(self, SiphonError::SecurityBlocked { .. })
    }

    /// Shorthand for a processor failure without an underlying source.
    pub fn processor(processor: impl Into<String>, message: impl Into<String>) -> Self {
        SiphonError::Processor {
            processor: processor.into(),
            message: message.into(),
            source: None,
        }
    }
}
