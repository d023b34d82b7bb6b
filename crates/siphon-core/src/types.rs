// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common enumerations shared by every stage of the ingestion engine.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Processor,
    Classifier,
    Vault,
}

/// The kind of content an inbound message carries.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Voice,
    Audio,
    Photo,
    Document,
    Url,
}

impl ContentType {
    /// Spoken content is transcribed and parsed in spoken mode.
    pub fn is_spoken(self) -> bool {
        matches!(self, ContentType::Voice | ContentType::Audio)
    }

    /// Content types delivered as a file that must be downloaded.
    pub fn has_attachment(self) -> bool {
        matches!(
            self,
            ContentType::Voice | ContentType::Audio | ContentType::Photo | ContentType::Document
        )
    }
}

/// Privacy classification controlling default visibility downstream.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Private,
    Work,
}

/// The closed set of processing routes a message can take.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    Note,
    Clip,
    Archive,
    Receipt,
    Default,
}

impl Pipeline {
    /// Pipelines that file the original document under an archive name.
    pub fn is_archival(self) -> bool {
        matches!(self, Pipeline::Archive | Pipeline::Receipt)
    }

    /// Maps an explicit command token to the pipeline it selects.
    ///
    /// `default` is not selectable by command.
    pub fn from_command(command: &str) -> Option<Self> {
        match command {
            "note" => Some(Pipeline::Note),
            "clip" => Some(Pipeline::Clip),
            "archive" => Some(Pipeline::Archive),
            "receipt" => Some(Pipeline::Receipt),
            _ => None,
        }
    }
}

/// Which resolution tier produced a pipeline decision. Audit only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum DecisionSource {
    ExplicitCommand,
    DictatedIntent,
    AiClassified,
    FallbackDefault,
}

/// Lifecycle state of a tracked message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Why a message failed. Blocked failures are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    Blocked,
    Tool,
}

impl FailureKind {
    /// Prefix written in front of the stored error text.
    pub fn prefix(self) -> &'static str {
        match self {
            FailureKind::Blocked => "[blocked]",
            FailureKind::Tool => "[tool-failure]",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn content_type_round_trips_lowercase() {
        for ct in [
            ContentType::Text,
            ContentType::Voice,
            ContentType::Audio,
            ContentType::Photo,
            ContentType::Document,
            ContentType::Url,
        ] {
            let s = ct.to_string();
            assert_eq!(s, s.to_lowercase());
            assert_eq!(ContentType::from_str(&s).unwrap(), ct);
        }
    }

    #[test]
    fn decision_source_is_kebab_case() {
        assert_eq!(DecisionSource::ExplicitCommand.to_string(), "explicit-command");
        assert_eq!(
            serde_json::to_string(&DecisionSource::FallbackDefault).unwrap(),
            "\"fallback-default\""
        );
    }

    #[test]
    fn only_four_commands_select_pipelines() {
        assert_eq!(Pipeline::from_command("archive"), Some(Pipeline::Archive));
        assert_eq!(Pipeline::from_command("receipt"), Some(Pipeline::Receipt));
        assert_eq!(Pipeline::from_command("clip"), Some(Pipeline::Clip));
        assert_eq!(Pipeline::from_command("note"), Some(Pipeline::Note));
        assert_eq!(Pipeline::from_command("default"), None);
        assert_eq!(Pipeline::from_command("keep"), None);
    }

    #[test]
    fn scope_parses_case_insensitively() {
        assert_eq!(Scope::from_str("PRIVATE").unwrap(), Scope::Private);
        assert_eq!(Scope::from_str("work").unwrap(), Scope::Work);
        assert!(Scope::from_str("personal").is_err());
    }

    #[test]
    fn spoken_and_attachment_types() {
        assert!(ContentType::Voice.is_spoken());
        assert!(ContentType::Audio.is_spoken());
        assert!(!ContentType::Document.is_spoken());
        assert!(ContentType::Photo.has_attachment());
        assert!(!ContentType::Url.has_attachment());
    }
}
