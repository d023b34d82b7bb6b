// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The security gate run before any external tool sees a message.

use std::collections::BTreeSet;

use siphon_config::model::SecurityConfig;
use siphon_core::ContentType;
use tracing::{debug, info, warn};

use crate::redact::contains_secret;
use crate::rules;
use crate::sanitize::sanitize;

/// Audit log target. Records identifiers, tag and command names, and rule
/// names only.
pub const AUDIT_TARGET: &str = "siphon::audit";

/// What the validator looks at for one message.
#[derive(Debug, Clone, Copy)]
pub struct CheckInput<'a> {
    pub message_id: i64,
    pub sender_id: &'a str,
    pub content_type: ContentType,
    pub raw_text: &'a str,
    pub tags: &'a [String],
    pub commands: &'a [String],
}

/// Outcome of a security check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityVerdict {
    /// `false` halts the message before any external tool runs.
    pub allowed: bool,
    /// Names of the hard-block rules that fired.
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub sanitized_content: String,
    pub valid_commands: Vec<String>,
    pub blocked_commands: Vec<String>,
}

/// Command allowlist plus hard-block rules.
#[derive(Debug, Clone)]
pub struct SecurityValidator {
    allowed_commands: BTreeSet<String>,
    max_content_chars: usize,
}

impl SecurityValidator {
    pub fn new<I, S>(allowed_commands: I, max_content_chars: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_commands: allowed_commands.into_iter().map(Into::into).collect(),
            max_content_chars,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(config.allowed_commands.iter().cloned(), config.max_content_chars)
    }

    pub fn allowed_commands(&self) -> impl Iterator<Item = &str> {
        self.allowed_commands.iter().map(String::as_str)
    }

    pub fn sanitize(&self, text: &str) -> String {
        sanitize(text, self.max_content_chars)
    }

    /// Validate commands and content, then write an audit record.
    ///
    /// Commands outside the allowlist are dropped but do not block the
    /// message. A dangerous command name or a hard-block content rule does.
    pub fn check(&self, input: &CheckInput<'_>) -> SecurityVerdict {
        let mut reasons: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();
        let mut valid_commands = Vec::new();
        let mut blocked_commands = Vec::new();

        for command in input.commands {
            if rules::is_dangerous_command(command) {
                reasons.push(format!("dangerous-command:{command}"));
                blocked_commands.push(command.clone());
            } else if self.allowed_commands.contains(command) {
                valid_commands.push(command.clone());
            } else {
                blocked_commands.push(command.clone());
            }
        }
        if blocked_commands.len() > reasons.len() {
            warnings.push("unknown-commands-dropped".to_string());
        }

        reasons.extend(
            rules::hard_block_matches(input.raw_text)
                .into_iter()
                .map(String::from),
        );
        warnings.extend(
            rules::warning_matches(input.raw_text)
                .into_iter()
                .map(String::from),
        );
        if contains_secret(input.raw_text) {
            warnings.push("credential-like-content".to_string());
        }

        let sanitized_content = self.sanitize(input.raw_text);
        if sanitized_content != input.raw_text {
            warnings.push("content-sanitized".to_string());
        }

        let verdict = SecurityVerdict {
            allowed: reasons.is_empty(),
            reasons,
            warnings,
            sanitized_content,
            valid_commands,
            blocked_commands,
        };
        audit(input, &verdict);
        verdict
    }
}

fn audit(input: &CheckInput<'_>, verdict: &SecurityVerdict) {
    if !verdict.allowed {
        warn!(
            target: AUDIT_TARGET,
            message_id = input.message_id,
            sender_id = input.sender_id,
            content_type = %input.content_type,
            tags = ?input.tags,
            commands = ?input.commands,
            blocked_commands = ?verdict.blocked_commands,
            reasons = ?verdict.reasons,
            "message blocked"
        );
    } else if !verdict.blocked_commands.is_empty() || !verdict.warnings.is_empty() {
        info!(
            target: AUDIT_TARGET,
            message_id = input.message_id,
            sender_id = input.sender_id,
            content_type = %input.content_type,
            tags = ?input.tags,
            valid_commands = ?verdict.valid_commands,
            blocked_commands = ?verdict.blocked_commands,
            warnings = ?verdict.warnings,
            "message allowed with warnings"
        );
    } else {
        debug!(
            target: AUDIT_TARGET,
            message_id = input.message_id,
            sender_id = input.sender_id,
            content_type = %input.content_type,
            commands = ?verdict.valid_commands,
            "message allowed"
        );
    }
}
