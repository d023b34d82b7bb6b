// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `retry`: reset failed messages for the next pass, or reprocess them now from
//! their cached payload.

use serde::Serialize;
use siphon_core::{MessageRecord, SiphonError};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::orchestrator::{Orchestrator, Outcome};

/// Which failed messages a retry applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryTarget {
    /// Every failure that is not a security block.
    AllFailed,
    Message(i64),
}

/// Result of reprocessing one message from cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetryResult {
    pub message_id: i64,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Orchestrator {
    /// Failed messages that can be reprocessed without the channel.
    pub async fn retryable(&self) -> Result<Vec<MessageRecord>, SiphonError> {
        self.store().list_retry_eligible().await
    }

    /// `failed -> pending`. The next process pass runs the message from the
    /// channel's copy, or from the cached payload once the channel dropped it.
    pub async fn reset(&self, target: RetryTarget) -> Result<usize, SiphonError> {
        match target {
            RetryTarget::AllFailed => self.store().reset_all_failed().await,
            RetryTarget::Message(message_id) => {
                self.store().reset(message_id).await?;
                info!(message_id, "message reset to pending");
                Ok(1)
            }
        }
    }

    /// `failed -> processing` from the cached payload; never fetches.
    pub async fn retry_now(&self, message_id: i64) -> Result<Outcome, SiphonError> {
        let message = self.store().claim_for_retry(message_id).await?;
        info!(message_id, "reprocessing from cached payload");
        self.run(&message).await
    }

    /// Reprocess every retry-now eligible message, oldest failure first.
    ///
    /// A message that can no longer be claimed is skipped with a warning.
    pub async fn retry_now_target(
        &self,
        target: RetryTarget,
        cancel: &CancellationToken,
    ) -> Result<Vec<RetryResult>, SiphonError> {
        let ids = match target {
            RetryTarget::Message(message_id) => vec![message_id],
            RetryTarget::AllFailed => self
                .retryable()
                .await?
                .into_iter()
                .map(|r| r.message_id)
                .collect(),
        };

        let mut results = Vec::with_capacity(ids.len());
        for message_id in ids {
            if cancel.is_cancelled() {
                info!("shutdown requested, stopping retries");
                break;
            }
            let outcome = match (target, self.retry_now(message_id).await) {
                (_, Ok(outcome)) => outcome,
                (RetryTarget::Message(_), Err(e)) => return Err(e),
                (RetryTarget::AllFailed, Err(e)) => {
                    warn!(message_id, error = %e, "retry skipped");
                    continue;
                }
            };
            results.push(RetryResult {
                message_id,
                outcome,
            });
        }
        Ok(results)
    }
}
