// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Siphon ingestion engine.
//!
//! Provides the error type, the domain types passed between stages, and the
//! adapter traits implemented by external collaborators.

pub mod decision;
pub mod error;
pub mod hints;
pub mod message;
pub mod record;
pub mod traits;
pub mod types;

pub use decision::{Classification, PipelineDecision};
pub use error::SiphonError;
pub use hints::{HintMetadata, InlineHints};
pub use message::{Attachment, ChannelMessage, ChannelUpdate, MessageRecord};
pub use record::{ExtractedContent, FiledDocument, RecordCore, RecordKind, VaultRecord};
pub use types::{
    AdapterType, ContentType, DecisionSource, FailureKind, HealthStatus, MessageStatus, Pipeline,
    Scope,
};

pub use traits::{
    ChannelAdapter, ContentProcessor, Frontmatter, IntentClassifier, PluginAdapter,
    ProcessorInput, VaultWriter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_channel_adapter<T: ChannelAdapter>() {}
        fn _assert_processor<T: ContentProcessor>() {}
        fn _assert_classifier<T: IntentClassifier>() {}
        fn _assert_vault<T: VaultWriter>() {}
    }

    #[test]
    fn record_kind_maps_to_pipeline() {
        let core = RecordCore {
            message_id: 1,
            title: "t".into(),
            body: String::new(),
            created: chrono::Utc::now(),
            tags: vec![],
            people: vec![],
            scope: Scope::Private,
            decision_source: DecisionSource::ExplicitCommand,
            metadata: HintMetadata::default(),
            retain_original: None,
        };
        let record = VaultRecord {
            core,
            kind: RecordKind::Receipt(FiledDocument {
                archive_name: "RECEIPT - 20240615 - Tesco - HOME.pdf".into(),
            }),
        };
        assert_eq!(record.pipeline(), Pipeline::Receipt);
        assert!(record.filed().is_some());
    }
}
