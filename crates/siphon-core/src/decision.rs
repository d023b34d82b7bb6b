// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router output and classifier results.

use serde::{Deserialize, Serialize};

use crate::hints::HintMetadata;
use crate::types::{DecisionSource, Pipeline, Scope};

/// Result returned by an [`IntentClassifier`](crate::IntentClassifier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub pipeline: Pipeline,
    pub confidence: f64,
    #[serde(default)]
    pub metadata: HintMetadata,
    #[serde(default)]
    pub suggested_tags: Vec<String>,
    #[serde(default)]
    pub reasoning: String,
}

/// The router's decision for one message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineDecision {
    pub pipeline: Pipeline,
    pub source: DecisionSource,
    /// Scope after the terminal scope policy was applied.
    pub scope: Scope,
    /// Message metadata with router-derived keys filled in. User-set keys
    /// are never overwritten.
    pub metadata: HintMetadata,
    pub suggested_tags: Vec<String>,
    pub reasoning: Option<String>,
    /// Policy notes worth surfacing to the user (never block processing).
    pub warnings: Vec<String>,
}

impl PipelineDecision {
    pub fn new(pipeline: Pipeline, source: DecisionSource) -> Self {
        Self {
            pipeline,
            source,
            scope: Scope::Work,
            metadata: HintMetadata::default(),
            suggested_tags: Vec::new(),
            reasoning: None,
            warnings: Vec::new(),
        }
    }
}
