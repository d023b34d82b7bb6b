// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end orchestrator tests.
//!
//! `TestHarness` assembles an [`Orchestrator`] over a temp SQLite store, a
//! [`MockChannel`], scripted processors and a [`MemoryVault`], with "today"
//! pinned so archive names are stable.

use std::sync::Arc;

use chrono::NaiveDate;
use siphon_agent::{Orchestrator, PassSummary};
use siphon_config::ProfileConfig;
use siphon_config::model::StorageConfig;
use siphon_core::{ContentType, IntentClassifier, MessageStatus, SiphonError};
use siphon_processors::{ProcessorSet, TextProcessor};
use siphon_router::PipelineRouter;
use siphon_storage::MessageStore;
use siphon_vault::VaultLayout;
use tokio_util::sync::CancellationToken;

use crate::memory_vault::MemoryVault;
use crate::mock_channel::{DEFAULT_PAGE_SIZE, MockChannel};
use crate::mock_processor::MockProcessor;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    classifier: Option<Arc<dyn IntentClassifier>>,
    transcript: String,
    document_text: String,
    today: NaiveDate,
    page_size: usize,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            classifier: None,
            transcript: "this is a voice note".to_string(),
            document_text: "Document body".to_string(),
            today: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap_or_default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Attach an AI classifier to the router.
    pub fn with_classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Text the mock transcriber returns for every voice or audio message.
    pub fn with_transcript(mut self, transcript: &str) -> Self {
        self.transcript = transcript.to_string();
        self
    }

    /// Text the mock document converter and OCR return.
    pub fn with_document_text(mut self, text: &str) -> Self {
        self.document_text = text.to_string();
        self
    }

    /// Updates the mock channel returns per fetch.
    pub fn with_page_size(mut self, n: usize) -> Self {
        self.page_size = n;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Build the harness, creating a temp database and vault root.
    pub async fn build(self) -> Result<TestHarness, SiphonError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| SiphonError::Storage { source: e.into() })?;
        let storage = StorageConfig {
            database_path: temp_dir.path().join("siphon.db").to_string_lossy().into_owned(),
            wal_mode: true,
        };
        let store = MessageStore::open(&storage).await?;

        let channel = Arc::new(MockChannel::new().with_page_size(self.page_size));
        let vault = Arc::new(MemoryVault::new());
        let transcriber = Arc::new(MockProcessor::new(
            "transcription",
            &[ContentType::Voice, ContentType::Audio],
            &self.transcript,
        ));
        let document = Arc::new(MockProcessor::new(
            "document",
            &[ContentType::Document],
            &self.document_text,
        ));
        let ocr = Arc::new(MockProcessor::new(
            "ocr",
            &[ContentType::Photo],
            &self.document_text,
        ));
        let fetcher = Arc::new(
            MockProcessor::new("url", &[ContentType::Url], "Source: https://example.com/post\n\nArticle body")
                .with_title("Example article"),
        );

        let processors = ProcessorSet::new()
            .with(Arc::new(TextProcessor))
            .with(fetcher.clone())
            .with(transcriber.clone())
            .with(document.clone())
            .with(ocr.clone());

        let mut router = PipelineRouter::new();
        if let Some(classifier) = self.classifier {
            router = router.with_classifier(classifier);
        }

        let layout = VaultLayout::new(ProfileConfig {
            vault_path: temp_dir.path().join("vault").to_string_lossy().into_owned(),
            ..ProfileConfig::default()
        });

        let orchestrator = Orchestrator::new(channel.clone(), store.clone(), vault.clone(), layout)
            .with_router(router)
            .with_processors(processors)
            .with_today(self.today);

        Ok(TestHarness {
            orchestrator,
            channel,
            vault,
            store,
            transcriber,
            document,
            ocr,
            fetcher,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with mock adapters and temp storage.
pub struct TestHarness {
    pub orchestrator: Orchestrator,
    pub channel: Arc<MockChannel>,
    pub vault: Arc<MemoryVault>,
    /// Shares its connection with the orchestrator's store.
    pub store: MessageStore,
    pub transcriber: Arc<MockProcessor>,
    pub document: Arc<MockProcessor>,
    pub ocr: Arc<MockProcessor>,
    pub fetcher: Arc<MockProcessor>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Run one process pass that is never cancelled.
    pub async fn pass(&self) -> Result<PassSummary, SiphonError> {
        self.orchestrator
            .process_pass(&CancellationToken::new())
            .await
    }

    /// Current lifecycle state of a message, if tracked.
    pub async fn status_of(&self, message_id: i64) -> Option<MessageStatus> {
        self.store
            .get(message_id)
            .await
            .ok()
            .flatten()
            .map(|r| r.status)
    }
}
