// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Markdown files with YAML frontmatter under a vault root.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use siphon_core::{
    AdapterType, Frontmatter, HealthStatus, PluginAdapter, SiphonError, VaultWriter,
};
use tracing::debug;

fn vault_err(message: String, e: impl std::error::Error + Send + Sync + 'static) -> SiphonError {
    SiphonError::Vault {
        message,
        source: Some(Box::new(e)),
    }
}

/// `---\n<yaml>---\n\n<body>\n`.
pub fn render_note(frontmatter: &Frontmatter, body: &str) -> Result<String, SiphonError> {
    let yaml = serde_yaml::to_string(frontmatter)
        .map_err(|e| vault_err("failed to serialize frontmatter".into(), e))?;
    let mut out = String::with_capacity(yaml.len() + body.len() + 16);
    out.push_str("---\n");
    out.push_str(&yaml);
    out.push_str("---\n\n");
    out.push_str(body.trim_end());
    out.push('\n');
    Ok(out)
}

/// Writes notes and retained originals below `root`.
///
/// Paths passed in are relative to the root. Existing files are overwritten.
#[derive(Debug, Clone)]
pub struct MarkdownVault {
    root: PathBuf,
}

impl MarkdownVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative: &Path) -> Result<PathBuf, SiphonError> {
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes || relative.as_os_str().is_empty() {
            return Err(SiphonError::Vault {
                message: format!("{} is not a path inside the vault", relative.display()),
                source: None,
            });
        }
        Ok(self.root.join(relative))
    }

    async fn ensure_parent(path: &Path) -> Result<(), SiphonError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| vault_err(format!("cannot create {}", parent.display()), e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for MarkdownVault {
    fn name(&self) -> &str {
        "markdown-vault"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Vault
    }

    async fn health_check(&self) -> Result<HealthStatus, SiphonError> {
        if self.root.is_dir() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(format!(
                "{} does not exist yet",
                self.root.display()
            )))
        }
    }
}

#[async_trait]
impl VaultWriter for MarkdownVault {
    async fn write(
        &self,
        path: &Path,
        frontmatter: &Frontmatter,
        body: &str,
    ) -> Result<PathBuf, SiphonError> {
        let full = self.resolve(path)?;
        let note = render_note(frontmatter, body)?;
        Self::ensure_parent(&full).await?;
        tokio::fs::write(&full, note)
            .await
            .map_err(|e| vault_err(format!("cannot write {}", full.display()), e))?;
        debug!(path = %full.display(), "note written");
        Ok(full)
    }

    async fn store_file(&self, source: &Path, path: &Path) -> Result<PathBuf, SiphonError> {
        let full = self.resolve(path)?;
        Self::ensure_parent(&full).await?;
        tokio::fs::copy(source, &full)
            .await
            .map_err(|e| vault_err(format!("cannot store {}", full.display()), e))?;
        debug!(path = %full.display(), "original retained");
        Ok(full)
    }
}
