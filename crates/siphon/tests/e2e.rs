// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests from a TOML config to Markdown files on disk.
//!
//! The channel and external tools are mocked; configuration, the SQLite
//! store and the vault writer are the real ones.

use std::path::Path;
use std::sync::Arc;

use siphon_agent::{Orchestrator, Outcome, RetryTarget, StatusReport};
use siphon_config::model::SiphonConfig;
use siphon_core::{ContentType, MessageStatus};
use siphon_hints::HintParser;
use siphon_processors::{ProcessorSet, TextProcessor};
use siphon_router::PipelineRouter;
use siphon_security::SecurityValidator;
use siphon_storage::MessageStore;
use siphon_test_utils::messages::{document_message, text_message};
use siphon_test_utils::{MockChannel, MockProcessor};
use siphon_vault::{MarkdownVault, VaultLayout};
use tokio_util::sync::CancellationToken;

struct Env {
    orchestrator: Orchestrator,
    channel: Arc<MockChannel>,
    document: Arc<MockProcessor>,
    store: MessageStore,
    vault_root: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

fn config(dir: &Path) -> SiphonConfig {
    let toml = format!(
        r#"
[agent]
default_profile = "home"

[storage]
database_path = "{db}"

[profiles.home]
vault_path = "{vault}"
inbox_folder = "00 Inbox"
archive_folder = "90 Archive"

[security]
allowed_commands = ["archive", "note"]
"#,
        db = dir.join("siphon.db").display(),
        vault = dir.join("vault").display(),
    );
    siphon_config::load_and_validate_str(&toml).expect("valid config")
}

async fn env() -> Env {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let profile = config.profile(None).unwrap();
    let vault_root = Path::new(&profile.vault_path).to_path_buf();

    let store = MessageStore::open(&config.storage).await.unwrap();
    let channel = Arc::new(MockChannel::new().with_attachment_bytes(b"%PDF-1.7".to_vec()));
    let document = Arc::new(MockProcessor::new(
        "document",
        &[ContentType::Document],
        "TAX INVOICE\nInvoice No. 2231\nBoiler service",
    ));
    let processors = ProcessorSet::new()
        .with(Arc::new(TextProcessor))
        .with(document.clone());

    let orchestrator = Orchestrator::new(
        channel.clone(),
        store.clone(),
        Arc::new(MarkdownVault::new(&profile.vault_path)),
        VaultLayout::new(profile),
    )
    .with_parser(HintParser::new().with_known_commands(config.security.allowed_commands.clone()))
    .with_validator(SecurityValidator::from_config(&config.security))
    .with_router(PipelineRouter::from_config(&config.classifier))
    .with_processors(processors)
    .with_today(chrono::NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());

    Env {
        orchestrator,
        channel,
        document,
        store,
        vault_root,
        _dir: dir,
    }
}

#[tokio::test]
async fn text_message_lands_in_the_profile_inbox() {
    let env = env().await;
    env.channel
        .push(100, text_message(1, "#garden Order more compost\nand mulch"))
        .await;

    let summary = env
        .orchestrator
        .process_pass(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.completed, 1);

    let note = env.vault_root.join("00 Inbox/2024-06-15 Order more compost.md");
    let text = std::fs::read_to_string(&note).expect("note on disk");
    assert!(text.starts_with("---\n"));
    assert!(text.contains("title: Order more compost"));
    assert!(text.contains("- garden"));
    assert!(text.contains("scope: work"));
    assert!(text.ends_with("Order more compost\nand mulch\n"));

    let record = env.store.get(1).await.unwrap().unwrap();
    assert_eq!(record.output_paths, vec![note.to_string_lossy().into_owned()]);
}

#[tokio::test]
async fn archived_invoice_keeps_original_and_detects_type() {
    let env = env().await;
    env.channel
        .push(100, document_message(2, "/archive Boiler service ~private", "scan.pdf"))
        .await;

    env.orchestrator
        .process_pass(&CancellationToken::new())
        .await
        .unwrap();

    let stem = "INVOICE - 20240615 - Boiler service - GENERAL";
    let archive = env.vault_root.join("90 Archive");
    assert_eq!(
        std::fs::read(archive.join(format!("{stem}.pdf"))).unwrap(),
        b"%PDF-1.7"
    );
    let note = std::fs::read_to_string(archive.join(format!("{stem}.md"))).unwrap();
    assert!(note.contains("type: INVOICE"));
    assert!(note.contains("scope: private"));
    assert!(note.contains(&format!("{stem}.pdf")));
}

#[tokio::test]
async fn command_outside_the_allowlist_is_dropped() {
    let env = env().await;
    // `keep` is not allowlisted in this config.
    env.channel
        .push(100, document_message(3, "/keep Boiler manual", "manual.pdf"))
        .await;

    env.orchestrator
        .process_pass(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(
        env.store.get(3).await.unwrap().unwrap().status,
        MessageStatus::Completed
    );
    assert!(!env.vault_root.join("Attachments").exists());
}

#[tokio::test]
async fn failure_shows_in_status_and_retries_from_cache() {
    let env = env().await;
    env.document.fail_next(1).await;
    env.channel
        .push(100, document_message(4, "Quarterly statement", "q2.pdf"))
        .await;
    env.orchestrator
        .process_pass(&CancellationToken::new())
        .await
        .unwrap();

    let report = StatusReport::load(&env.store).await.unwrap();
    assert_eq!(report.counts.failed, 1);
    assert_eq!(report.counts.retry_eligible, 1);
    // The cached payload settles the failure, so the offset moves on.
    assert_eq!(report.channel_offset, Some(101));
    assert_eq!(report.recent_failures.len(), 1);
    assert!(report.recent_failures[0].error.starts_with("[tool-failure]"));
    assert!(report.recent_failures[0].error.chars().count() <= 80);

    env.channel.expire_all().await;
    let results = env
        .orchestrator
        .retry_now_target(RetryTarget::Message(4), &CancellationToken::new())
        .await
        .unwrap();
    assert!(matches!(results[0].outcome, Outcome::Completed { .. }));

    let report = StatusReport::load(&env.store).await.unwrap();
    assert_eq!(report.counts.completed, 1);
    assert_eq!(report.counts.failed, 0);
    assert!(
        env.vault_root
            .join("00 Inbox/2024-06-15 Quarterly statement.md")
            .exists()
    );
}

#[tokio::test]
async fn state_survives_reopening_the_store() {
    let env = env().await;
    env.channel.push(100, text_message(5, "persisted")).await;
    env.orchestrator.poll().await.unwrap();

    let config = config(env._dir.path());
    let reopened = MessageStore::open(&config.storage).await.unwrap();
    let record = reopened.get(5).await.unwrap().unwrap();
    assert_eq!(record.status, MessageStatus::Pending);
    assert_eq!(record.update_id, Some(100));
}
