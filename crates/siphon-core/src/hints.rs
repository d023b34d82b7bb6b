// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inline hint value objects produced by the hint parser.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::Scope;

/// Structured metadata carried by `[key:value]` tokens, dictated intent,
/// or classifier output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HintMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Document type, upper-cased (e.g. `INVOICE`).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    /// Document category, upper-cased (e.g. `HOME`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Processor hint, lower-cased.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor: Option<String>,
    /// Date the document refers to, which may predate receipt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl HintMetadata {
    pub fn is_empty(&self) -> bool {
        *self == HintMetadata::default()
    }

    /// Shallow merge where `other` wins for every key it sets.
    pub fn overwrite_with(&mut self, other: &HintMetadata) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field.clone();
                })*
            };
        }
        take!(source, device, user, doc_type, category, processor, date);
    }

    /// Fill only keys that are still unset; explicit values always survive.
    pub fn fill_missing(&mut self, other: &HintMetadata) {
        macro_rules! fill {
            ($($field:ident),*) => {
                $(if self.$field.is_none() {
                    self.$field = other.$field.clone();
                })*
            };
        }
        fill!(source, device, user, doc_type, category, processor, date);
    }
}

/// Hints extracted from one piece of text.
///
/// `tags`, `people` and `commands` never contain duplicates. Tags compare
/// case-insensitively but keep the casing they were first seen with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineHints {
    pub tags: Vec<String>,
    pub people: Vec<String>,
    pub commands: Vec<String>,
    pub scope: Option<Scope>,
    pub metadata: HintMetadata,
    pub cleaned_content: String,
}

impl InlineHints {
    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            self.tags.push(tag.to_string());
        }
    }

    pub fn add_person(&mut self, person: &str) {
        if !self.people.iter().any(|p| p == person) {
            self.people.push(person.to_string());
        }
    }

    pub fn add_command(&mut self, command: &str) {
        if !self.commands.iter().any(|c| c == command) {
            self.commands.push(command.to_string());
        }
    }

    /// Sets the scope unless one was already detected.
    pub fn offer_scope(&mut self, scope: Scope) {
        if self.scope.is_none() {
            self.scope = Some(scope);
        }
    }

    pub fn has_command(&self, command: &str) -> bool {
        self.commands.iter().any(|c| c == command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_dedupe_keeping_first_casing() {
        let mut hints = InlineHints::default();
        hints.add_tag("ProjectX");
        hints.add_tag("projectx");
        hints.add_tag("other");
        assert_eq!(hints.tags, vec!["ProjectX", "other"]);
    }

    #[test]
    fn offer_scope_is_first_wins() {
        let mut hints = InlineHints::default();
        hints.offer_scope(Scope::Work);
        hints.offer_scope(Scope::Private);
        assert_eq!(hints.scope, Some(Scope::Work));
    }

    #[test]
    fn fill_missing_never_overwrites() {
        let mut base = HintMetadata {
            doc_type: Some("CONTRACT".into()),
            ..Default::default()
        };
        let suggested = HintMetadata {
            doc_type: Some("INVOICE".into()),
            category: Some("HOME".into()),
            ..Default::default()
        };
        base.fill_missing(&suggested);
        assert_eq!(base.doc_type.as_deref(), Some("CONTRACT"));
        assert_eq!(base.category.as_deref(), Some("HOME"));
    }

    #[test]
    fn overwrite_with_prefers_other() {
        let mut base = HintMetadata {
            source: Some("phone".into()),
            device: Some("pixel".into()),
            ..Default::default()
        };
        let other = HintMetadata {
            source: Some("laptop".into()),
            ..Default::default()
        };
        base.overwrite_with(&other);
        assert_eq!(base.source.as_deref(), Some("laptop"));
        assert_eq!(base.device.as_deref(), Some("pixel"));
    }

    #[test]
    fn metadata_serializes_type_key() {
        let meta = HintMetadata {
            doc_type: Some("INVOICE".into()),
            date: NaiveDate::from_ymd_opt(2024, 6, 15),
            ..Default::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["type"], "INVOICE");
        assert_eq!(json["date"], "2024-06-15");
        assert!(json.get("source").is_none());
    }
}
