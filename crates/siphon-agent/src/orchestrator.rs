// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-message processing and the sequential process pass.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use siphon_config::model::SecurityConfig;
use siphon_core::{
    Attachment, ChannelAdapter, ChannelMessage, ChannelUpdate, ContentProcessor, ContentType,
    ExtractedContent, FailureKind, FiledDocument, HintMetadata, InlineHints, MessageRecord,
    Pipeline, PipelineDecision, PluginAdapter, ProcessorInput, RecordCore, RecordKind,
    SiphonError, VaultRecord, VaultWriter,
};
use siphon_hints::{HintParser, ParseMode, merge_hints};
use siphon_processors::ProcessorSet;
use siphon_processors::text::title_from_content;
use siphon_processors::url::find_url;
use siphon_router::{ArchiveNamer, NameRequest, PipelineRouter, RouteInput, fill_document_type};
use siphon_security::{CheckInput, SecurityValidator, SecurityVerdict};
use siphon_storage::MessageStore;
use siphon_vault::VaultLayout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::lease::{LEASE_TTL, WorkerLease};
use crate::plan::MessagePlan;
use crate::reactions::{self, react};
use crate::watermark::{Disposition, confirmable_offset};

/// How one claimed message ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Outcome {
    Completed { paths: Vec<String> },
    Failed { error: String },
    Blocked { error: String },
}

/// Counters for one `poll`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PollSummary {
    pub fetched: usize,
    pub new: usize,
    pub pending: u64,
}

/// Counters for one process pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub fetched: usize,
    pub new: usize,
    pub completed: usize,
    pub failed: usize,
    pub blocked: usize,
    /// Pending messages another worker claimed first.
    pub skipped: usize,
    pub confirmed_offset: Option<i64>,
    /// The pass stopped early on a shutdown signal.
    pub interrupted: bool,
}

impl PassSummary {
    pub fn processed(&self) -> usize {
        self.completed + self.failed + self.blocked
    }

    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Completed { .. } => self.completed += 1,
            Outcome::Failed { .. } => self.failed += 1,
            Outcome::Blocked { .. } => self.blocked += 1,
        }
    }
}

/// Ties the hint parser, validator, router, processors, state store and
/// vault together. Messages are handled one at a time, in arrival order.
pub struct Orchestrator {
    channel: Arc<dyn ChannelAdapter>,
    store: MessageStore,
    vault: Arc<dyn VaultWriter>,
    layout: VaultLayout,
    parser: HintParser,
    validator: SecurityValidator,
    router: PipelineRouter,
    processors: ProcessorSet,
    today: Option<NaiveDate>,
}

impl Orchestrator {
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        store: MessageStore,
        vault: Arc<dyn VaultWriter>,
        layout: VaultLayout,
    ) -> Self {
        Self {
            channel,
            store,
            vault,
            layout,
            parser: HintParser::new(),
            validator: SecurityValidator::from_config(&SecurityConfig::default()),
            router: PipelineRouter::new(),
            processors: ProcessorSet::new(),
            today: None,
        }
    }

    pub fn with_parser(mut self, parser: HintParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_validator(mut self, validator: SecurityValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_router(mut self, router: PipelineRouter) -> Self {
        self.router = router;
        self
    }

    pub fn with_processors(mut self, processors: ProcessorSet) -> Self {
        self.processors = processors;
        self
    }

    /// Pin "today" for archive names and dictated relative dates.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self.parser = self.parser.with_today(today);
        self
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn channel(&self) -> &Arc<dyn ChannelAdapter> {
        &self.channel
    }

    /// Mark messages left in `processing` by a crashed run as failed.
    ///
    /// Only sound while holding the worker lease; see [`Self::start_worker`].
    pub async fn recover(&self) -> Result<usize, SiphonError> {
        self.store.recover_interrupted().await
    }

    /// Take the worker lease, then recover whatever a dead worker left in
    /// `processing`. Fails with `WorkerBusy` while another worker is live.
    pub async fn start_worker(&self) -> Result<WorkerLease, SiphonError> {
        let lease = WorkerLease::acquire(&self.store, LEASE_TTL).await?;
        match self.recover().await {
            Ok(0) => {}
            Ok(recovered) => info!(recovered, "interrupted messages marked failed"),
            Err(e) => warn!(error = %e, "could not recover interrupted messages"),
        }
        Ok(lease)
    }

    async fn fetch(&self) -> Result<Vec<ChannelUpdate>, SiphonError> {
        let offset = self.store.get_offset().await?;
        let updates = self.channel.get_updates(offset).await?;
        debug!(?offset, count = updates.len(), "fetched updates");
        Ok(updates)
    }

    async fn observe_all(&self, updates: &[ChannelUpdate]) -> Result<usize, SiphonError> {
        let mut new = 0;
        for update in updates {
            if let Some(message) = &update.message
                && self.store.observe(message, Some(update.update_id)).await?
            {
                new += 1;
            }
        }
        Ok(new)
    }

    /// Fetch new messages and record them as pending. Nothing is processed
    /// and no update is confirmed.
    pub async fn poll(&self) -> Result<PollSummary, SiphonError> {
        let updates = self.fetch().await?;
        let new = self.observe_all(&updates).await?;
        let pending = self.store.status_counts().await?.pending;
        info!(fetched = updates.len(), new, pending, "poll complete");
        Ok(PollSummary {
            fetched: updates.len(),
            new,
            pending,
        })
    }

    /// Fetch, then process every pending message in arrival order.
    ///
    /// Pending messages come from the store, not just this fetch: a message
    /// the channel no longer delivers runs from its cached payload, one with
    /// neither waits for a later fetch. A tool failure or security block
    /// fails only that message. The token is checked between messages; an
    /// in-flight message always finishes.
    pub async fn process_pass(&self, cancel: &CancellationToken) -> Result<PassSummary, SiphonError> {
        let updates = self.fetch().await?;
        let mut summary = PassSummary {
            fetched: updates.len(),
            new: self.observe_all(&updates).await?,
            ..PassSummary::default()
        };
        let delivered: HashMap<i64, &ChannelMessage> = updates
            .iter()
            .filter_map(|u| u.message.as_ref())
            .map(|m| (m.message_id, m))
            .collect();

        for record in self.store.pending_in_arrival_order().await? {
            if cancel.is_cancelled() {
                info!("shutdown requested, leaving remaining messages pending");
                summary.interrupted = true;
                break;
            }
            let Some(message) = pending_message(&record, &delivered) else {
                continue;
            };
            if let Err(e) = self.store.claim(&message).await {
                warn!(message_id = message.message_id, error = %e, "claim failed, skipping");
                summary.skipped += 1;
                continue;
            }
            let outcome = self.run(&message).await?;
            summary.record(&outcome);
        }

        summary.confirmed_offset = self.advance_watermark(&updates).await?;
        info!(
            fetched = summary.fetched,
            new = summary.new,
            completed = summary.completed,
            failed = summary.failed,
            blocked = summary.blocked,
            "process pass complete"
        );
        Ok(summary)
    }

    /// Confirm the settled prefix of `updates` so the channel drops them.
    async fn advance_watermark(&self, updates: &[ChannelUpdate]) -> Result<Option<i64>, SiphonError> {
        let mut dispositions = Vec::with_capacity(updates.len());
        for update in updates {
            let record = match &update.message {
                Some(message) => self.store.get(message.message_id).await?,
                None => None,
            };
            let disposition = Disposition::of(update.message.is_some(), record.as_ref());
            if disposition == Disposition::Open {
                break;
            }
            dispositions.push((update.update_id, disposition));
        }
        let Some(offset) = confirmable_offset(&dispositions) else {
            return Ok(None);
        };
        if self.store.get_offset().await?.is_some_and(|current| current >= offset) {
            return Ok(None);
        }
        self.store.set_offset(offset).await?;
        debug!(offset, "channel offset advanced");
        Ok(Some(offset))
    }

    /// Process a message already claimed into `processing` and record the outcome.
    pub(crate) async fn run(&self, message: &ChannelMessage) -> Result<Outcome, SiphonError> {
        react(self.channel.as_ref(), message, reactions::PROCESSING).await;
        let result = self.handle(message, &self.router).await;
        self.settle(message, result).await
    }

    async fn settle(
        &self,
        message: &ChannelMessage,
        result: Result<Vec<PathBuf>, SiphonError>,
    ) -> Result<Outcome, SiphonError> {
        let message_id = message.message_id;
        match result {
            Ok(paths) => {
                let paths: Vec<String> = paths
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect();
                self.store.complete(message_id, &paths).await?;
                react(self.channel.as_ref(), message, reactions::COMPLETED).await;
                info!(message_id, outputs = paths.len(), "message completed");
                Ok(Outcome::Completed { paths })
            }
            Err(e) => {
                let error = e.to_string();
                if e.is_security_block() {
                    self.store.fail(message_id, FailureKind::Blocked, &error).await?;
                    react(self.channel.as_ref(), message, reactions::BLOCKED).await;
                    warn!(message_id, "message blocked");
                    Ok(Outcome::Blocked { error })
                } else {
                    self.store.fail(message_id, FailureKind::Tool, &error).await?;
                    react(self.channel.as_ref(), message, reactions::FAILED).await;
                    warn!(message_id, error = %error, "message failed");
                    Ok(Outcome::Failed { error })
                }
            }
        }
    }

    fn check(&self, message: &ChannelMessage, text: &str, hints: &InlineHints) -> SecurityVerdict {
        self.validator.check(&CheckInput {
            message_id: message.message_id,
            sender_id: &message.sender_id,
            content_type: message.content_type,
            raw_text: text,
            tags: &hints.tags,
            commands: &hints.commands,
        })
    }

    /// Written-mode hints from the caption, gated by the validator.
    ///
    /// The returned hints carry only allowlisted commands.
    fn screen(&self, message: &ChannelMessage) -> (InlineHints, SecurityVerdict) {
        let caption = message.text_or_empty();
        let mut hints = self.parser.parse(caption, ParseMode::Written);
        let verdict = self.check(message, caption, &hints);
        hints.commands = verdict.valid_commands.clone();
        (hints, verdict)
    }

    fn processor_for(
        &self,
        content_type: ContentType,
        metadata: &HintMetadata,
    ) -> Result<Arc<dyn ContentProcessor>, SiphonError> {
        if let Some(wanted) = metadata.processor.as_deref() {
            if let Some(p) = self
                .processors
                .iter()
                .find(|p| p.name() == wanted && p.handles(content_type))
            {
                return Ok(Arc::clone(p));
            }
            warn!(processor = wanted, %content_type, "requested processor unavailable, using default");
        }
        self.processors.for_content(content_type).ok_or_else(|| {
            SiphonError::processor("none", format!("no processor handles {content_type} content"))
        })
    }

    async fn download(
        &self,
        message: &ChannelMessage,
        work_dir: &Path,
    ) -> Result<Option<PathBuf>, SiphonError> {
        if !message.content_type.has_attachment() {
            return Ok(None);
        }
        let attachment = message.attachment.as_ref().ok_or_else(|| SiphonError::Channel {
            message: format!("{} message without an attachment", message.content_type),
            source: None,
        })?;
        Ok(Some(self.channel.download(attachment, work_dir).await?))
    }

    /// Everything between claim and completion for one message.
    ///
    /// Intermediate files live in a per-message temp dir that is removed on
    /// return; retained originals are copied into the vault first.
    async fn handle(
        &self,
        message: &ChannelMessage,
        router: &PipelineRouter,
    ) -> Result<Vec<PathBuf>, SiphonError> {
        let work_dir = tempfile::Builder::new()
            .prefix("siphon-")
            .tempdir()
            .map_err(|e| SiphonError::Internal(format!("cannot create work dir: {e}")))?;

        let (mut hints, verdict) = self.screen(message);
        if !verdict.allowed {
            return Err(SiphonError::SecurityBlocked {
                reasons: verdict.reasons,
            });
        }

        let file = self.download(message, work_dir.path()).await?;
        let content_type = message.content_type;
        let caption = hints.cleaned_content.clone();

        let transcript = if content_type.is_spoken() {
            let transcriber = self.processor_for(content_type, &hints.metadata)?;
            let transcript = transcriber
                .process(ProcessorInput {
                    content_type,
                    text: &caption,
                    file: file.as_deref(),
                    work_dir: work_dir.path(),
                })
                .await?;
            let heard = self.parser.parse(&transcript.content, ParseMode::Spoken);
            hints = merge_hints(&hints, &heard);
            let verdict = self.check(message, &transcript.content, &hints);
            if !verdict.allowed {
                return Err(SiphonError::SecurityBlocked {
                    reasons: verdict.reasons,
                });
            }
            hints.commands = verdict.valid_commands;
            Some(transcript)
        } else {
            None
        };

        let filename = message.attachment.as_ref().and_then(|a| a.file_name.as_deref());
        let decision = router
            .route(&RouteInput {
                content: &hints.cleaned_content,
                content_type,
                hints: &hints,
                filename,
            })
            .await;
        for warning in &decision.warnings {
            warn!(message_id = message.message_id, warning = %warning, "routing policy");
        }

        let extracted = match transcript {
            Some(transcript) => {
                let content = self.validator.sanitize(&hints.cleaned_content);
                let title = title_from_content(&content).unwrap_or(transcript.title);
                ExtractedContent { content, title }
            }
            None => {
                // Text that routes to clip is fetched like a shared link.
                let effective = if decision.pipeline == Pipeline::Clip
                    && content_type == ContentType::Text
                    && find_url(&hints.cleaned_content).is_some()
                {
                    ContentType::Url
                } else {
                    content_type
                };
                let text = self.validator.sanitize(&hints.cleaned_content);
                self.processor_for(effective, &hints.metadata)?
                    .process(ProcessorInput {
                        content_type: effective,
                        text: &text,
                        file: file.as_deref(),
                        work_dir: work_dir.path(),
                    })
                    .await?
            }
        };

        // A caption names a file better than its extracted text does.
        let title = content_type_caption(content_type, &caption)
            .and_then(first_line)
            .unwrap_or_else(|| extracted.title.clone());
        let record = self.build_record(
            message,
            &hints,
            &caption,
            decision,
            extracted,
            title,
            file.as_deref(),
        );
        self.layout.file(self.vault.as_ref(), &record).await
    }

    #[allow(clippy::too_many_arguments)]
    fn build_record(
        &self,
        message: &ChannelMessage,
        hints: &InlineHints,
        caption: &str,
        decision: PipelineDecision,
        extracted: ExtractedContent,
        title: String,
        file: Option<&Path>,
    ) -> VaultRecord {
        let pipeline = decision.pipeline;
        let mut metadata = decision.metadata;
        fill_document_type(&mut metadata, pipeline, &extracted.content);

        let mut tagged = InlineHints::default();
        for tag in hints.tags.iter().chain(&decision.suggested_tags) {
            tagged.add_tag(tag);
        }

        let filed = pipeline.is_archival().then(|| FiledDocument {
            archive_name: self.archive_name(message, pipeline, &metadata, &title),
        });
        let kind = match (pipeline, filed) {
            (Pipeline::Archive, Some(doc)) => RecordKind::Archive(doc),
            (Pipeline::Receipt, Some(doc)) => RecordKind::Receipt(doc),
            (Pipeline::Clip, _) => RecordKind::Clip {
                url: find_url(caption)
                    .or_else(|| find_url(&extracted.content))
                    .unwrap_or_default()
                    .to_string(),
            },
            (Pipeline::Default, _) => RecordKind::Default,
            _ => RecordKind::Note,
        };

        let body = match content_type_caption(message.content_type, caption) {
            Some(caption) if caption != extracted.content.trim() => {
                format!("{caption}\n\n{}", extracted.content)
            }
            _ => extracted.content,
        };

        let retain = pipeline.is_archival() || hints.has_command("keep");
        VaultRecord {
            core: RecordCore {
                message_id: message.message_id,
                title,
                body,
                created: message.received_at,
                tags: tagged.tags,
                people: hints.people.clone(),
                scope: decision.scope,
                decision_source: decision.source,
                metadata,
                retain_original: file.filter(|_| retain).map(Path::to_path_buf),
            },
            kind,
        }
    }

    fn namer(&self) -> ArchiveNamer {
        self.today.map(ArchiveNamer::new).unwrap_or_else(ArchiveNamer::today)
    }

    fn archive_name(
        &self,
        message: &ChannelMessage,
        pipeline: Pipeline,
        metadata: &HintMetadata,
        description: &str,
    ) -> String {
        let attachment = message.attachment.as_ref();
        let extension = attachment.and_then(Attachment::extension).unwrap_or_default();
        self.namer().name(&NameRequest {
            doc_type: Some(
                metadata
                    .doc_type
                    .as_deref()
                    .unwrap_or(ArchiveNamer::default_type(pipeline)),
            ),
            date: metadata.date,
            description,
            details: None,
            category: metadata.category.as_deref(),
            extension: &extension,
            source_filename: attachment.and_then(|a| a.file_name.as_deref()),
        })
    }

    /// Plan every message a process pass would pick up, without running
    /// tools, calling the classifier or writing state.
    pub async fn dry_run(&self) -> Result<Vec<MessagePlan>, SiphonError> {
        let updates = self.fetch().await?;
        let router = self.router.offline();
        let delivered: HashMap<i64, &ChannelMessage> = updates
            .iter()
            .filter_map(|u| u.message.as_ref())
            .map(|m| (m.message_id, m))
            .collect();

        let mut plans = Vec::new();
        for record in self.store.pending_in_arrival_order().await? {
            if let Some(message) = pending_message(&record, &delivered) {
                plans.push(self.plan(&message, &router).await);
            }
        }
        // Not yet tracked: a real pass would observe these first.
        for message in updates.iter().filter_map(|u| u.message.as_ref()) {
            if self.store.get(message.message_id).await?.is_none() {
                plans.push(self.plan(message, &router).await);
            }
        }
        Ok(plans)
    }

    async fn plan(&self, message: &ChannelMessage, router: &PipelineRouter) -> MessagePlan {
        let (hints, verdict) = self.screen(message);
        let mut plan = MessagePlan::new(message, &hints, &verdict);
        if !verdict.allowed {
            plan.notes.push("processing would stop before any tool runs".into());
            return plan;
        }
        if message.content_type.is_spoken() {
            plan.notes
                .push("hints spoken in the recording are not known until transcription".into());
        }
        if self.router.has_classifier() {
            plan.notes.push("AI classifier not consulted in a dry run".into());
        }

        let decision = router
            .route(&RouteInput {
                content: &hints.cleaned_content,
                content_type: message.content_type,
                hints: &hints,
                filename: message.attachment.as_ref().and_then(|a| a.file_name.as_deref()),
            })
            .await;
        if decision.pipeline.is_archival() {
            let description = first_line(&hints.cleaned_content).unwrap_or_default();
            plan.archive_name = Some(self.archive_name(
                message,
                decision.pipeline,
                &decision.metadata,
                &description,
            ));
            if decision.metadata.doc_type.is_none() {
                plan.notes
                    .push("document type may still be detected from the extracted content".into());
            }
        }
        plan.decision = Some(decision);
        plan
    }

    /// Run process passes until `cancel` fires.
    ///
    /// A failed pass is logged and followed by `backoff` instead of
    /// `interval`. Returns the number of passes started.
    pub async fn watch(
        &self,
        interval: Duration,
        backoff: Duration,
        cancel: &CancellationToken,
    ) -> u64 {
        info!(interval_secs = interval.as_secs(), "watch started");
        let mut passes = 0;
        while !cancel.is_cancelled() {
            passes += 1;
            let pause = match self.process_pass(cancel).await {
                Ok(summary) => {
                    if summary.processed() > 0 {
                        debug!(pass = passes, processed = summary.processed(), "pass done");
                    }
                    interval
                }
                Err(e) => {
                    warn!(error = %e, backoff_secs = backoff.as_secs(), "pass failed, backing off");
                    backoff
                }
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }
        info!(passes, "watch stopped");
        passes
    }
}

/// The copy of a pending message to process: the freshly delivered one, or
/// the cached payload when the channel no longer has it.
fn pending_message(
    record: &MessageRecord,
    delivered: &HashMap<i64, &ChannelMessage>,
) -> Option<ChannelMessage> {
    if let Some(message) = delivered.get(&record.message_id) {
        return Some((*message).clone());
    }
    let payload = record.cached_payload.as_deref()?;
    match ChannelMessage::from_payload(payload) {
        Ok(message) => {
            debug!(message_id = record.message_id, "processing from cached payload");
            Some(message)
        }
        Err(e) => {
            warn!(message_id = record.message_id, error = %e, "unusable cached payload");
            None
        }
    }
}

/// Caption shown above extracted file content.
fn content_type_caption(content_type: ContentType, caption: &str) -> Option<&str> {
    let caption = caption.trim();
    (matches!(content_type, ContentType::Photo | ContentType::Document) && !caption.is_empty())
        .then_some(caption)
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}
