// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Where each record lands in a vault profile, and what its frontmatter says.

use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use siphon_config::ProfileConfig;
use siphon_core::{Frontmatter, Pipeline, RecordKind, SiphonError, VaultRecord, VaultWriter};
use siphon_router::namer::sanitize_field;
use tracing::info;

/// Folder and file naming for one vault profile.
#[derive(Debug, Clone)]
pub struct VaultLayout {
    profile: ProfileConfig,
}

impl VaultLayout {
    pub fn new(profile: ProfileConfig) -> Self {
        Self { profile }
    }

    pub fn vault_root(&self) -> PathBuf {
        PathBuf::from(&self.profile.vault_path)
    }

    pub fn folder(&self, pipeline: Pipeline) -> &str {
        match pipeline {
            Pipeline::Note | Pipeline::Default => &self.profile.inbox_folder,
            Pipeline::Clip => &self.profile.clips_folder,
            Pipeline::Archive => &self.profile.archive_folder,
            Pipeline::Receipt => &self.profile.receipts_folder,
        }
    }

    /// `<folder>/<YYYY-MM-DD> <Title>.md`, or `<folder>/<archive stem>.md`
    /// for filed documents.
    pub fn note_path(&self, record: &VaultRecord) -> PathBuf {
        let folder = Path::new(self.folder(record.pipeline()));
        let stem = match record.filed() {
            Some(doc) => strip_extension(&doc.archive_name).to_string(),
            None => dated_title(record),
        };
        folder.join(format!("{stem}.md"))
    }

    /// Destination of a retained original.
    ///
    /// Filed documents keep their archive name next to their note; other
    /// pipelines store the original under the attachments folder.
    pub fn original_path(&self, record: &VaultRecord, source: &Path) -> PathBuf {
        if let Some(doc) = record.filed() {
            return Path::new(self.folder(record.pipeline())).join(&doc.archive_name);
        }
        let mut name = dated_title(record);
        if let Some(ext) = source.extension().and_then(|e| e.to_str()) {
            name.push('.');
            name.push_str(&ext.to_ascii_lowercase());
        }
        Path::new(&self.profile.attachments_folder).join(name)
    }

    pub fn frontmatter(&self, record: &VaultRecord, original: Option<&Path>) -> Frontmatter {
        let core = &record.core;
        let mut fm = Frontmatter::new();
        fm.insert("title".into(), json!(core.title));
        fm.insert("created".into(), json!(core.created.to_rfc3339()));
        fm.insert("pipeline".into(), json!(record.pipeline().to_string()));
        fm.insert("decision_source".into(), json!(core.decision_source.to_string()));
        fm.insert("scope".into(), json!(core.scope.to_string()));
        fm.insert("tags".into(), json!(core.tags));
        fm.insert("people".into(), json!(core.people));
        fm.insert("source_message_id".into(), json!(core.message_id));

        if let Ok(Value::Object(meta)) = serde_json::to_value(&core.metadata) {
            for (key, value) in meta {
                fm.entry(key).or_insert(value);
            }
        }
        match &record.kind {
            RecordKind::Clip { url } if !url.is_empty() => {
                fm.insert("url".into(), json!(url));
            }
            RecordKind::Archive(doc) | RecordKind::Receipt(doc) => {
                fm.insert("archive_name".into(), json!(doc.archive_name));
            }
            _ => {}
        }
        if let Some(original) = original {
            fm.insert(
                "original".into(),
                json!(original.to_string_lossy().replace('\\', "/")),
            );
        }
        fm
    }

    /// Store the retained original (if any) and write the note.
    ///
    /// Returns every path written, original first.
    pub async fn file(
        &self,
        vault: &dyn VaultWriter,
        record: &VaultRecord,
    ) -> Result<Vec<PathBuf>, SiphonError> {
        let mut written = Vec::new();
        let original = match &record.core.retain_original {
            Some(source) => {
                let rel = self.original_path(record, source);
                written.push(vault.store_file(source, &rel).await?);
                Some(rel)
            }
            None => None,
        };

        let frontmatter = self.frontmatter(record, original.as_deref());
        let note = self.note_path(record);
        written.push(vault.write(&note, &frontmatter, &record.core.body).await?);
        info!(
            message_id = record.core.message_id,
            pipeline = %record.pipeline(),
            note = %note.display(),
            "record filed"
        );
        Ok(written)
    }
}

fn dated_title(record: &VaultRecord) -> String {
    let title = Some(sanitize_field(&record.core.title))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());
    format!("{} {title}", record.core.created.format("%Y-%m-%d"))
}

/// Drop a trailing `.ext` that looks like a file extension.
fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            stem
        }
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use siphon_core::{DecisionSource, FiledDocument, HintMetadata, RecordCore, Scope};

    use super::*;

    fn layout() -> VaultLayout {
        VaultLayout::new(ProfileConfig {
            vault_path: "/vault".into(),
            ..ProfileConfig::default()
        })
    }

    fn record(kind: RecordKind) -> VaultRecord {
        VaultRecord {
            core: RecordCore {
                message_id: 42,
                title: "Boiler / service notes".into(),
                body: "Serviced on Tuesday.".into(),
                created: Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap(),
                tags: vec!["home".into()],
                people: vec!["ed_overy".into()],
                scope: Scope::Private,
                decision_source: DecisionSource::ExplicitCommand,
                metadata: HintMetadata {
                    category: Some("HOME".into()),
                    ..HintMetadata::default()
                },
                retain_original: None,
            },
            kind,
        }
    }

    #[test]
    fn notes_are_dated_and_sanitized() {
        let path = layout().note_path(&record(RecordKind::Note));
        assert_eq!(path, PathBuf::from("Inbox/2024-06-15 Boiler service notes.md"));
        let clip = layout().note_path(&record(RecordKind::Clip {
            url: "https://example.com".into(),
        }));
        assert!(clip.starts_with("Clips"));
    }

    #[test]
    fn filed_documents_use_the_archive_name() {
        let rec = record(RecordKind::Receipt(FiledDocument {
            archive_name: "RECEIPT - 20240615 - Tesco v1.2 - HOME.pdf".into(),
        }));
        assert_eq!(
            layout().note_path(&rec),
            PathBuf::from("Receipts/RECEIPT - 20240615 - Tesco v1.2 - HOME.md")
        );
        assert_eq!(
            layout().original_path(&rec, Path::new("/tmp/x/file_1.pdf")),
            PathBuf::from("Receipts/RECEIPT - 20240615 - Tesco v1.2 - HOME.pdf")
        );
    }

    #[test]
    fn extensionless_archive_name_is_kept_whole() {
        assert_eq!(
            strip_extension("DOCUMENT - 20240615 - v1.2 notes - GENERAL"),
            "DOCUMENT - 20240615 - v1.2 notes - GENERAL"
        );
    }

    #[test]
    fn kept_originals_go_to_attachments() {
        let rec = record(RecordKind::Note);
        assert_eq!(
            layout().original_path(&rec, Path::new("/tmp/x/photo.JPG")),
            PathBuf::from("Attachments/2024-06-15 Boiler service notes.jpg")
        );
    }

    #[test]
    fn frontmatter_carries_decision_and_metadata() {
        let rec = record(RecordKind::Archive(FiledDocument {
            archive_name: "DOCUMENT - 20240615 - Boiler - HOME.pdf".into(),
        }));
        let fm = layout().frontmatter(&rec, Some(Path::new("Archive/DOCUMENT - 20240615 - Boiler - HOME.pdf")));
        assert_eq!(fm["pipeline"], "archive");
        assert_eq!(fm["decision_source"], "explicit-command");
        assert_eq!(fm["scope"], "private");
        assert_eq!(fm["category"], "HOME");
        assert_eq!(fm["source_message_id"], 42);
        assert_eq!(fm["archive_name"], "DOCUMENT - 20240615 - Boiler - HOME.pdf");
        assert!(fm.contains_key("original"));
        assert!(!fm.contains_key("type"));
    }
}
