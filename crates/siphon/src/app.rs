// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring from configuration to a ready orchestrator.
//!
//! Everything that can fail on configuration (bot token, classifier key,
//! processor commands, profile name) is resolved before the state store is
//! opened, so a bad config never leaves a database behind.

use std::sync::Arc;

use siphon_agent::Orchestrator;
use siphon_anthropic::AnthropicClassifier;
use siphon_config::model::SiphonConfig;
use siphon_core::SiphonError;
use siphon_hints::HintParser;
use siphon_processors::ProcessorSet;
use siphon_router::PipelineRouter;
use siphon_security::SecurityValidator;
use siphon_storage::MessageStore;
use siphon_telegram::TelegramChannel;
use siphon_vault::{MarkdownVault, VaultLayout};
use tracing::debug;

pub async fn open_store(config: &SiphonConfig) -> Result<MessageStore, SiphonError> {
    MessageStore::open(&config.storage).await
}

/// Router with the AI classifier attached when it is enabled.
pub fn router(config: &SiphonConfig) -> Result<PipelineRouter, SiphonError> {
    let router = PipelineRouter::from_config(&config.classifier);
    Ok(match AnthropicClassifier::from_config(&config.classifier)? {
        Some(classifier) => router.with_classifier(Arc::new(classifier)),
        None => router,
    })
}

/// Build the orchestrator for `profile` (the configured default when `None`).
///
/// Nothing in the store changes here. Commands that process messages take
/// the worker lease through [`Orchestrator::start_worker`] first.
pub async fn orchestrator(
    config: &SiphonConfig,
    profile: Option<&str>,
) -> Result<Orchestrator, SiphonError> {
    let profile_name = profile.unwrap_or(&config.agent.default_profile);
    let profile = config.profile(profile).ok_or_else(|| {
        SiphonError::Config(format!("no vault profile named {profile_name:?}"))
    })?;

    let channel = Arc::new(TelegramChannel::new(config.telegram.clone())?);
    let router = router(config)?;
    let processors = ProcessorSet::from_config(&config.processing)?;
    let parser = HintParser::new().with_known_commands(config.security.allowed_commands.clone());
    let validator = SecurityValidator::from_config(&config.security);
    let vault = Arc::new(MarkdownVault::new(&profile.vault_path));
    let layout = VaultLayout::new(profile);
    debug!(
        profile = profile_name,
        vault = %vault.root().display(),
        classifier = router.has_classifier(),
        "orchestrator configured"
    );

    let store = open_store(config).await?;
    Ok(Orchestrator::new(channel, store, vault, layout)
        .with_parser(parser)
        .with_validator(validator)
        .with_router(router)
        .with_processors(processors))
}

#[cfg(test)]
mod tests {
    use siphon_agent::LEASE_TTL;
    use siphon_core::MessageStatus;
    use siphon_test_utils::messages::text_message;

    use super::*;

    #[test]
    fn router_without_classifier_by_default() {
        let config = SiphonConfig::default();
        assert!(!router(&config).unwrap().has_classifier());
    }

    #[tokio::test]
    async fn unknown_profile_is_a_config_error() {
        let mut config = SiphonConfig::default();
        config.telegram.bot_token = Some("123:abc".into());
        let err = orchestrator(&config, Some("nope")).await.err().unwrap();
        assert!(matches!(err, SiphonError::Config(ref m) if m.contains("nope")));
    }

    #[tokio::test]
    async fn missing_bot_token_fails_before_the_store_opens() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("state").join("siphon.db");
        let mut config = SiphonConfig::default();
        config.storage.database_path = db.to_string_lossy().into_owned();

        let err = orchestrator(&config, None).await.err().unwrap();
        assert!(matches!(err, SiphonError::Config(_)));
        assert!(!db.exists());
    }

    async fn status_of(store: &MessageStore) -> MessageStatus {
        store.get(7).await.unwrap().unwrap().status
    }

    #[tokio::test]
    async fn building_leaves_in_flight_messages_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SiphonConfig::default();
        config.telegram.bot_token = Some("123:abc".into());
        config.storage.database_path = dir.path().join("siphon.db").to_string_lossy().into_owned();

        let message = text_message(7, "still running elsewhere");
        let store = open_store(&config).await.unwrap();
        store.observe(&message, Some(1)).await.unwrap();
        store.claim(&message).await.unwrap();

        let orchestrator = orchestrator(&config, None).await.unwrap();
        assert_eq!(status_of(&store).await, MessageStatus::Processing);

        // A live lease keeps a second worker from recovering it.
        let other = "pid 1 since earlier";
        assert!(store.acquire_lease(other, LEASE_TTL).await.unwrap());
        let err = orchestrator.start_worker().await.err().unwrap();
        assert!(matches!(err, SiphonError::WorkerBusy { ref holder } if holder == other));
        assert_eq!(status_of(&store).await, MessageStatus::Processing);

        store.release_lease(other).await.unwrap();
        let lease = orchestrator.start_worker().await.unwrap();
        assert_eq!(status_of(&store).await, MessageStatus::Failed);
        lease.release().await.unwrap();
    }
}
