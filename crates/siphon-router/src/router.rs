// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pipeline resolution with a confidence-gated AI fallback.
//!
//! Orchestrates pipeline selection: explicit command > dictated intent > AI classifier > default.
//! The scope policy runs after whichever tier matched.

use std::sync::Arc;

use siphon_config::model::ClassifierConfig;
use siphon_core::{
    ContentType, DecisionSource, InlineHints, IntentClassifier, Pipeline, PipelineDecision, Scope,
};
use tracing::{debug, info, warn};

use crate::dictated::detect_dictated;

/// Categories that mark a filed document as personal.
const PERSONAL_CATEGORIES: &[&str] = &["HEALTH", "HOME"];

/// Everything the router looks at for one message.
#[derive(Debug, Clone, Copy)]
pub struct RouteInput<'a> {
    /// Cleaned caption or text.
    pub content: &'a str,
    pub content_type: ContentType,
    /// Hints whose commands have already passed the security allowlist.
    pub hints: &'a InlineHints,
    pub filename: Option<&'a str>,
}

/// Resolves the pipeline for a message.
pub struct PipelineRouter {
    classifier: Option<Arc<dyn IntentClassifier>>,
    confidence_threshold: f64,
}

impl PipelineRouter {
    /// Create a router with the default confidence threshold and no classifier.
    pub fn new() -> Self {
        Self {
            classifier: None,
            confidence_threshold: 0.8,
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            classifier: None,
            confidence_threshold: config.confidence_threshold,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_threshold(mut self, confidence_threshold: f64) -> Self {
        self.confidence_threshold = confidence_threshold;
        self
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// The same router without the AI tier, for plans that must not call out.
    pub fn offline(&self) -> Self {
        Self {
            classifier: None,
            confidence_threshold: self.confidence_threshold,
        }
    }

    /// Route a message to a pipeline.
    ///
    /// The returned metadata is the message metadata with router-derived
    /// keys filled in; keys the user set are never overwritten.
    pub async fn route(&self, input: &RouteInput<'_>) -> PipelineDecision {
        let mut decision = self.resolve(input).await;
        apply_scope_policy(&mut decision, input.hints.scope);
        debug!(
            pipeline = %decision.pipeline,
            source = %decision.source,
            scope = %decision.scope,
            "pipeline resolved"
        );
        decision
    }

    /// Resolve the pipeline without the scope policy.
    pub async fn resolve(&self, input: &RouteInput<'_>) -> PipelineDecision {
        let user_metadata = &input.hints.metadata;

        // 1. Explicit command
        if let Some(pipeline) = input
            .hints
            .commands
            .iter()
            .find_map(|c| Pipeline::from_command(c))
        {
            let mut decision = PipelineDecision::new(pipeline, DecisionSource::ExplicitCommand);
            decision.metadata = user_metadata.clone();
            return decision;
        }

        // 2. Dictated intent
        if let Some(intent) = detect_dictated(input.content) {
            let mut decision =
                PipelineDecision::new(intent.pipeline, DecisionSource::DictatedIntent);
            decision.metadata = user_metadata.clone();
            decision.metadata.fill_missing(&intent.metadata());
            decision.reasoning = Some(format!("dictated phrase: {}", intent.phrase));
            return decision;
        }

        // 3. AI classifier
        if let Some(classifier) = &self.classifier {
            match classifier
                .classify(input.content, input.content_type, input.filename)
                .await
            {
                Some(c) if c.confidence >= self.confidence_threshold => {
                    let mut decision =
                        PipelineDecision::new(c.pipeline, DecisionSource::AiClassified);
                    decision.metadata = user_metadata.clone();
                    decision.metadata.fill_missing(&c.metadata);
                    decision.suggested_tags = c
                        .suggested_tags
                        .into_iter()
                        .filter(|t| {
                            !input.hints.tags.iter().any(|have| have.eq_ignore_ascii_case(t))
                        })
                        .collect();
                    decision.reasoning = Some(c.reasoning);
                    return decision;
                }
                Some(c) => {
                    info!(
                        pipeline = %c.pipeline,
                        confidence = c.confidence,
                        threshold = self.confidence_threshold,
                        "classification below threshold, using default pipeline"
                    );
                }
                None => debug!("classifier returned no result"),
            }
        }

        // 4. Default
        let mut decision = PipelineDecision::new(Pipeline::Default, DecisionSource::FallbackDefault);
        decision.metadata = user_metadata.clone();
        decision
    }
}

impl Default for PipelineRouter {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal scope step: explicit scope wins, filed documents default to
/// private, everything else to work.
///
/// An explicit `~work` on a filed document with a personal category is kept
/// but reported as a warning.
pub fn apply_scope_policy(decision: &mut PipelineDecision, explicit: Option<Scope>) {
    decision.scope = match explicit {
        Some(scope) => scope,
        None if decision.pipeline.is_archival() => Scope::Private,
        None => Scope::Work,
    };

    if explicit == Some(Scope::Work)
        && decision.pipeline.is_archival()
        && let Some(category) = decision.metadata.category.as_deref()
        && PERSONAL_CATEGORIES
            .iter()
            .any(|p| p.eq_ignore_ascii_case(category))
    {
        warn!(
            pipeline = %decision.pipeline,
            category,
            "explicit work scope applied to a personal document"
        );
        decision
            .warnings
            .push(format!("work scope on {category} document"));
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use siphon_core::{
        AdapterType, Classification, HealthStatus, HintMetadata, PluginAdapter, SiphonError,
    };

    use super::*;

    struct StubClassifier {
        result: Option<Classification>,
        calls: AtomicUsize,
    }

    impl StubClassifier {
        fn new(pipeline: Pipeline, confidence: f64) -> Arc<Self> {
            Arc::new(Self {
                result: Some(Classification {
                    pipeline,
                    confidence,
                    metadata: HintMetadata {
                        category: Some("WORK".into()),
                        doc_type: Some("INVOICE".into()),
                        ..HintMetadata::default()
                    },
                    suggested_tags: vec!["finance".into(), "Project".into()],
                    reasoning: "looks like a bill".into(),
                }),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PluginAdapter for StubClassifier {
        fn name(&self) -> &str {
            "stub"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Classifier
        }
        async fn health_check(&self) -> Result<HealthStatus, SiphonError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl IntentClassifier for StubClassifier {
        async fn classify(
            &self,
            _caption: &str,
            _content_type: ContentType,
            _filename: Option<&str>,
        ) -> Option<Classification> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn hints(commands: &[&str], content: &str) -> InlineHints {
        InlineHints {
            commands: commands.iter().map(|c| c.to_string()).collect(),
            cleaned_content: content.to_string(),
            ..InlineHints::default()
        }
    }

    async fn route(router: &PipelineRouter, hints: &InlineHints) -> PipelineDecision {
        router
            .route(&RouteInput {
                content: &hints.cleaned_content,
                content_type: ContentType::Text,
                hints,
                filename: None,
            })
            .await
    }

    #[tokio::test]
    async fn explicit_command_beats_dictated_and_ai() {
        let classifier = StubClassifier::new(Pipeline::Receipt, 0.99);
        let router = PipelineRouter::new().with_classifier(classifier.clone());
        let h = hints(&["archive"], "receipt for the paid invoice");
        let decision = route(&router, &h).await;
        assert_eq!(decision.pipeline, Pipeline::Archive);
        assert_eq!(decision.source, DecisionSource::ExplicitCommand);
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_pipeline_commands_are_not_explicit() {
        let router = PipelineRouter::new();
        let decision = route(&router, &hints(&["keep", "clip"], "")).await;
        assert_eq!(decision.pipeline, Pipeline::Clip);
    }

    #[tokio::test]
    async fn dictated_intent_beats_ai() {
        let classifier = StubClassifier::new(Pipeline::Note, 0.99);
        let router = PipelineRouter::new().with_classifier(classifier.clone());
        let decision = route(&router, &hints(&[], "bought new tyres for the car")).await;
        assert_eq!(decision.pipeline, Pipeline::Receipt);
        assert_eq!(decision.source, DecisionSource::DictatedIntent);
        assert_eq!(decision.metadata.category.as_deref(), Some("CAR"));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dictated_metadata_never_overwrites_user_values() {
        let router = PipelineRouter::new();
        let mut h = hints(&[], "house lease");
        h.metadata.category = Some("WORK".into());
        let decision = route(&router, &h).await;
        assert_eq!(decision.metadata.category.as_deref(), Some("WORK"));
        assert_eq!(decision.metadata.doc_type.as_deref(), Some("LEASE"));
    }

    #[tokio::test]
    async fn confident_ai_result_is_accepted_and_merged() {
        let classifier = StubClassifier::new(Pipeline::Note, 0.85);
        let router = PipelineRouter::new().with_classifier(classifier);
        let mut h = hints(&[], "meeting thoughts");
        h.tags = vec!["project".into()];
        h.metadata.doc_type = Some("MEMO".into());
        let decision = route(&router, &h).await;
        assert_eq!(decision.pipeline, Pipeline::Note);
        assert_eq!(decision.source, DecisionSource::AiClassified);
        assert_eq!(decision.metadata.doc_type.as_deref(), Some("MEMO"));
        assert_eq!(decision.metadata.category.as_deref(), Some("WORK"));
        assert_eq!(decision.suggested_tags, vec!["finance"]);
        assert_eq!(decision.reasoning.as_deref(), Some("looks like a bill"));
    }

    #[tokio::test]
    async fn low_confidence_falls_through_to_default() {
        let classifier = StubClassifier::new(Pipeline::Receipt, 0.79);
        let router = PipelineRouter::new().with_classifier(classifier.clone());
        let decision = route(&router, &hints(&[], "meeting thoughts")).await;
        assert_eq!(decision.pipeline, Pipeline::Default);
        assert_eq!(decision.source, DecisionSource::FallbackDefault);
        assert!(decision.metadata.is_empty());
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn threshold_is_inclusive() {
        let classifier = StubClassifier::new(Pipeline::Clip, 0.8);
        let router = PipelineRouter::new().with_classifier(classifier);
        let decision = route(&router, &hints(&[], "meeting thoughts")).await;
        assert_eq!(decision.pipeline, Pipeline::Clip);
    }

    #[tokio::test]
    async fn scope_defaults_depend_on_pipeline() {
        let router = PipelineRouter::new();
        assert_eq!(route(&router, &hints(&["receipt"], "")).await.scope, Scope::Private);
        assert_eq!(route(&router, &hints(&["archive"], "")).await.scope, Scope::Private);
        assert_eq!(route(&router, &hints(&["note"], "")).await.scope, Scope::Work);
        assert_eq!(route(&router, &hints(&[], "hello")).await.scope, Scope::Work);
    }

    #[tokio::test]
    async fn explicit_scope_wins() {
        let router = PipelineRouter::new();
        let mut h = hints(&["archive"], "");
        h.scope = Some(Scope::Work);
        let decision = route(&router, &h).await;
        assert_eq!(decision.scope, Scope::Work);
        assert!(decision.warnings.is_empty());

        let mut h = hints(&["note"], "");
        h.scope = Some(Scope::Private);
        assert_eq!(route(&router, &h).await.scope, Scope::Private);
    }

    #[tokio::test]
    async fn work_scope_on_personal_document_warns() {
        let router = PipelineRouter::new();
        let mut h = hints(&["archive"], "");
        h.scope = Some(Scope::Work);
        h.metadata.category = Some("HEALTH".into());
        let decision = route(&router, &h).await;
        assert_eq!(decision.scope, Scope::Work);
        assert_eq!(decision.warnings, vec!["work scope on HEALTH document"]);
    }
}
