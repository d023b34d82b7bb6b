// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted content processor and intent classifier.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use siphon_core::{
    AdapterType, Classification, ContentProcessor, ContentType, ExtractedContent, HealthStatus,
    IntentClassifier, PluginAdapter, ProcessorInput, SiphonError,
};

/// A processor that returns fixed content, or fails, for its content types.
pub struct MockProcessor {
    name: String,
    handles: Vec<ContentType>,
    content: String,
    title: String,
    failures: Arc<Mutex<usize>>,
    inputs: Arc<Mutex<Vec<String>>>,
}

impl MockProcessor {
    pub fn new(name: &str, handles: &[ContentType], content: &str) -> Self {
        Self {
            name: name.to_string(),
            handles: handles.to_vec(),
            content: content.to_string(),
            title: String::new(),
            failures: Arc::new(Mutex::new(0)),
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Title returned with the content. Defaults to the first line.
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    /// Fail the next `n` calls with a processor error.
    pub async fn fail_next(&self, n: usize) {
        *self.failures.lock().await = n;
    }

    /// Number of `process` calls, failed ones included.
    pub async fn calls(&self) -> usize {
        self.inputs.lock().await.len()
    }

    /// The text passed to each call.
    pub async fn inputs(&self) -> Vec<String> {
        self.inputs.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Processor
    }

    async fn health_check(&self) -> Result<HealthStatus, SiphonError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ContentProcessor for MockProcessor {
    fn handles(&self, content_type: ContentType) -> bool {
        self.handles.contains(&content_type)
    }

    async fn process(&self, input: ProcessorInput<'_>) -> Result<ExtractedContent, SiphonError> {
        self.inputs.lock().await.push(input.text.to_string());
        {
            let mut failures = self.failures.lock().await;
            if *failures > 0 {
                *failures -= 1;
                return Err(SiphonError::processor(&self.name, "exit status 1: mock failure"));
            }
        }
        if input.content_type.has_attachment() && input.file.is_none_or(|f| !f.exists()) {
            return Err(SiphonError::processor(&self.name, "input file missing"));
        }
        let title = if self.title.is_empty() {
            self.content.lines().next().unwrap_or("Untitled").to_string()
        } else {
            self.title.clone()
        };
        Ok(ExtractedContent {
            content: self.content.clone(),
            title,
        })
    }
}

/// A classifier that answers every call with the same classification.
pub struct MockClassifier {
    answer: Option<Classification>,
    calls: Arc<Mutex<usize>>,
}

impl MockClassifier {
    pub fn new(answer: Option<Classification>) -> Self {
        Self {
            answer,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub async fn calls(&self) -> usize {
        *self.calls.lock().await
    }
}

#[async_trait]
impl PluginAdapter for MockClassifier {
    fn name(&self) -> &str {
        "mock-classifier"
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
impl IntentClassifier for MockClassifier {
    async fn classify(
        &self,
        _caption: &str,
        _content_type: ContentType,
        _filename: Option<&str>,
    ) -> Option<Classification> {
        *self.calls.lock().await += 1;
        self.answer.clone()
    }
}
