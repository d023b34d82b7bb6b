// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault writer trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::SiphonError;
use crate::traits::adapter::PluginAdapter;

/// Frontmatter as an ordered JSON-like map.
pub type Frontmatter = serde_json::Map<String, serde_json::Value>;

/// Destination for processed notes.
///
/// Paths are relative to the vault root. Writes overwrite existing files.
#[async_trait]
pub trait VaultWriter: PluginAdapter {
    async fn write(
        &self,
        path: &Path,
        frontmatter: &Frontmatter,
        body: &str,
    ) -> Result<PathBuf, SiphonError>;

    /// Copies a retained original file into the vault.
    async fn store_file(&self, source: &Path, path: &Path) -> Result<PathBuf, SiphonError>;
}
