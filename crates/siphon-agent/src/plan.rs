// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dry-run output: what a pass would do with a message.

use std::fmt;

use serde::Serialize;
use siphon_core::{ChannelMessage, ContentType, InlineHints, PipelineDecision};
use siphon_security::SecurityVerdict;

/// Every decision made for one message, with no tool run and nothing stored.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePlan {
    pub message_id: i64,
    pub content_type: ContentType,
    pub tags: Vec<String>,
    pub people: Vec<String>,
    /// Commands that passed the allowlist.
    pub commands: Vec<String>,
    pub blocked_commands: Vec<String>,
    pub allowed: bool,
    pub block_reasons: Vec<String>,
    pub security_warnings: Vec<String>,
    /// Absent when the message would be blocked.
    pub decision: Option<PipelineDecision>,
    pub archive_name: Option<String>,
    pub notes: Vec<String>,
}

impl MessagePlan {
    pub fn new(message: &ChannelMessage, hints: &InlineHints, verdict: &SecurityVerdict) -> Self {
        Self {
            message_id: message.message_id,
            content_type: message.content_type,
            tags: hints.tags.clone(),
            people: hints.people.clone(),
            commands: verdict.valid_commands.clone(),
            blocked_commands: verdict.blocked_commands.clone(),
            allowed: verdict.allowed,
            block_reasons: verdict.reasons.clone(),
            security_warnings: verdict.warnings.clone(),
            decision: None,
            archive_name: None,
            notes: Vec::new(),
        }
    }
}

fn list(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

impl fmt::Display for MessagePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "message {} ({})", self.message_id, self.content_type)?;
        writeln!(f, "  tags:      {}", list(&self.tags))?;
        writeln!(f, "  people:    {}", list(&self.people))?;
        write!(f, "  commands:  {}", list(&self.commands))?;
        if !self.blocked_commands.is_empty() {
            write!(f, " (dropped: {})", self.blocked_commands.join(", "))?;
        }
        writeln!(f)?;
        if self.allowed {
            writeln!(f, "  security:  allowed")?;
        } else {
            writeln!(f, "  security:  BLOCKED ({})", self.block_reasons.join(", "))?;
        }
        if !self.security_warnings.is_empty() {
            writeln!(f, "  warnings:  {}", self.security_warnings.join(", "))?;
        }
        if let Some(decision) = &self.decision {
            writeln!(
                f,
                "  pipeline:  {} via {}, scope {}",
                decision.pipeline, decision.source, decision.scope
            )?;
            if let Some(reasoning) = &decision.reasoning {
                writeln!(f, "  reason:    {reasoning}")?;
            }
            for warning in &decision.warnings {
                writeln!(f, "  policy:    {warning}")?;
            }
        }
        if let Some(name) = &self.archive_name {
            writeln!(f, "  filed as:  {name}")?;
        }
        for note in &self.notes {
            writeln!(f, "  note:      {note}")?;
        }
        Ok(())
    }
}
