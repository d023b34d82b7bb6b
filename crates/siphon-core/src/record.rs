// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Processed content and the vault record built from it.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::hints::HintMetadata;
use crate::types::{DecisionSource, Pipeline, Scope};

/// Raw text produced by a content processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub content: String,
    pub title: String,
}

/// Fields shared by every record, whatever the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct RecordCore {
    pub message_id: i64,
    pub title: String,
    pub body: String,
    pub created: DateTime<Utc>,
    pub tags: Vec<String>,
    pub people: Vec<String>,
    pub scope: Scope,
    pub decision_source: DecisionSource,
    pub metadata: HintMetadata,
    /// Original attachment to copy into the vault, if it must be retained.
    pub retain_original: Option<PathBuf>,
}

/// A filed document: its archive name and where the original was stored.
#[derive(Debug, Clone, Serialize)]
pub struct FiledDocument {
    pub archive_name: String,
}

/// Pipeline-specific part of a record.
#[derive(Debug, Clone, Serialize)]
pub enum RecordKind {
    Note,
    Clip { url: String },
    Archive(FiledDocument),
    Receipt(FiledDocument),
    Default,
}

/// What the orchestrator hands to the vault layout.
#[derive(Debug, Clone, Serialize)]
pub struct VaultRecord {
    pub core: RecordCore,
    pub kind: RecordKind,
}

impl VaultRecord {
    pub fn pipeline(&self) -> Pipeline {
        match self.kind {
            RecordKind::Note => Pipeline::Note,
            RecordKind::Clip { .. } => Pipeline::Clip,
            RecordKind::Archive(_) => Pipeline::Archive,
            RecordKind::Receipt(_) => Pipeline::Receipt,
            RecordKind::Default => Pipeline::Default,
        }
    }

    pub fn filed(&self) -> Option<&FiledDocument> {
        match &self.kind {
            RecordKind::Archive(doc) | RecordKind::Receipt(doc) => Some(doc),
            _ => None,
        }
    }
}
