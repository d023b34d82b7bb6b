// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The message state store used by the orchestrator.

use std::time::Duration;

use siphon_config::model::StorageConfig;
use siphon_core::{
    ChannelMessage, FailureKind, HealthStatus, MessageRecord, MessageStatus, SiphonError,
};
use tracing::{debug, info};

use crate::database::{Database, map_tr_err};
use crate::models::StatusCounts;
use crate::queries::{channel_state, messages, worker_lease};

/// SQLite-backed message state store.
///
/// The only writer of message lifecycle state. Cloning shares the same
/// single-writer connection.
#[derive(Clone)]
pub struct MessageStore {
    db: Database,
}

impl MessageStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the store at the configured path.
    pub async fn open(config: &StorageConfig) -> Result<Self, SiphonError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "message store initialized");
        Ok(Self::new(db))
    }

    pub async fn open_in_memory() -> Result<Self, SiphonError> {
        Ok(Self::new(Database::open_in_memory().await?))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn health_check(&self) -> Result<HealthStatus, SiphonError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    pub async fn close(&self) -> Result<(), SiphonError> {
        self.db.close().await
    }

    // --- Transitions ---

    pub async fn observe(
        &self,
        message: &ChannelMessage,
        update_id: Option<i64>,
    ) -> Result<bool, SiphonError> {
        messages::observe(&self.db, message, update_id).await
    }

    pub async fn claim(&self, message: &ChannelMessage) -> Result<(), SiphonError> {
        let payload = message.to_payload()?;
        messages::claim(&self.db, message.message_id, &payload).await
    }

    pub async fn claim_for_retry(&self, message_id: i64) -> Result<ChannelMessage, SiphonError> {
        messages::claim_for_retry(&self.db, message_id).await
    }

    pub async fn complete(
        &self,
        message_id: i64,
        output_paths: &[String],
    ) -> Result<(), SiphonError> {
        messages::complete(&self.db, message_id, output_paths).await
    }

    pub async fn fail(
        &self,
        message_id: i64,
        kind: FailureKind,
        error: &str,
    ) -> Result<(), SiphonError> {
        messages::fail(&self.db, message_id, kind, error).await
    }

    pub async fn reset(&self, message_id: i64) -> Result<(), SiphonError> {
        messages::reset(&self.db, message_id).await
    }

    pub async fn reset_all_failed(&self) -> Result<usize, SiphonError> {
        let n = messages::reset_all_failed(&self.db).await?;
        info!(count = n, "failed messages reset to pending");
        Ok(n)
    }

    pub async fn recover_interrupted(&self) -> Result<usize, SiphonError> {
        let n = messages::recover_interrupted(&self.db).await?;
        if n > 0 {
            info!(count = n, "interrupted messages marked failed");
        }
        Ok(n)
    }

    // --- Queries ---

    pub async fn get(&self, message_id: i64) -> Result<Option<MessageRecord>, SiphonError> {
        messages::get(&self.db, message_id).await
    }

    pub async fn list_by_status(
        &self,
        status: MessageStatus,
        limit: Option<i64>,
    ) -> Result<Vec<MessageRecord>, SiphonError> {
        messages::list_by_status(&self.db, status, limit).await
    }

    pub async fn list_retry_eligible(&self) -> Result<Vec<MessageRecord>, SiphonError> {
        messages::list_retry_eligible(&self.db).await
    }

    pub async fn pending_in_arrival_order(&self) -> Result<Vec<MessageRecord>, SiphonError> {
        messages::pending_in_arrival_order(&self.db).await
    }

    pub async fn status_counts(&self) -> Result<StatusCounts, SiphonError> {
        messages::status_counts(&self.db).await
    }

    pub async fn recent_failures(&self, limit: i64) -> Result<Vec<MessageRecord>, SiphonError> {
        messages::recent_failures(&self.db, limit).await
    }

    // --- Channel offset ---

    pub async fn get_offset(&self) -> Result<Option<i64>, SiphonError> {
        channel_state::get_offset(&self.db).await
    }

    pub async fn set_offset(&self, offset: i64) -> Result<(), SiphonError> {
        channel_state::set_offset(&self.db, offset).await
    }

    // --- Worker lease ---

    /// Take the single-worker lease. False while another live worker holds it.
    pub async fn acquire_lease(&self, holder: &str, ttl: Duration) -> Result<bool, SiphonError> {
        worker_lease::acquire(&self.db, holder, ttl).await
    }

    pub async fn renew_lease(&self, holder: &str, ttl: Duration) -> Result<bool, SiphonError> {
        worker_lease::renew(&self.db, holder, ttl).await
    }

    pub async fn release_lease(&self, holder: &str) -> Result<(), SiphonError> {
        worker_lease::release(&self.db, holder).await
    }

    pub async fn lease_holder(&self) -> Result<Option<String>, SiphonError> {
        worker_lease::live_holder(&self.db).await
    }
}
