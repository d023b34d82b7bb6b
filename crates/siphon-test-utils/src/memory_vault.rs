// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory vault writer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use siphon_core::{AdapterType, Frontmatter, HealthStatus, PluginAdapter, SiphonError, VaultWriter};

/// A note captured by [`MemoryVault`].
#[derive(Debug, Clone)]
pub struct StoredNote {
    pub frontmatter: Frontmatter,
    pub body: String,
}

/// Keeps notes and copied originals in maps keyed by vault-relative path.
#[derive(Default)]
pub struct MemoryVault {
    notes: Arc<Mutex<BTreeMap<PathBuf, StoredNote>>>,
    files: Arc<Mutex<BTreeMap<PathBuf, Vec<u8>>>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn notes(&self) -> BTreeMap<PathBuf, StoredNote> {
        self.notes.lock().await.clone()
    }

    pub async fn note(&self, path: impl AsRef<Path>) -> Option<StoredNote> {
        self.notes.lock().await.get(path.as_ref()).cloned()
    }

    pub async fn files(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        self.files.lock().await.clone()
    }

    pub async fn is_empty(&self) -> bool {
        self.notes.lock().await.is_empty() && self.files.lock().await.is_empty()
    }
}

#[async_trait]
impl PluginAdapter for MemoryVault {
    fn name(&self) -> &str {
        "memory-vault"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Vault
    }

    async fn health_check(&self) -> Result<HealthStatus, SiphonError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl VaultWriter for MemoryVault {
    async fn write(
        &self,
        path: &Path,
        frontmatter: &Frontmatter,
        body: &str,
    ) -> Result<PathBuf, SiphonError> {
        self.notes.lock().await.insert(
            path.to_path_buf(),
            StoredNote {
                frontmatter: frontmatter.clone(),
                body: body.to_string(),
            },
        );
        Ok(path.to_path_buf())
    }

    async fn store_file(&self, source: &Path, path: &Path) -> Result<PathBuf, SiphonError> {
        let bytes = tokio::fs::read(source).await.map_err(|e| SiphonError::Vault {
            message: format!("cannot read {}", source.display()),
            source: Some(Box::new(e)),
        })?;
        self.files.lock().await.insert(path.to_path_buf(), bytes);
        Ok(path.to_path_buf())
    }
}
