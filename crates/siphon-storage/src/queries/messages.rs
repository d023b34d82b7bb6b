// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message lifecycle transitions.
//!
//! Every transition is one conditional `UPDATE ... WHERE status = ?`. When no
//! row changes, the current state is read back to report why.

use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};
use siphon_core::{
    ChannelMessage, ContentType, FailureKind, MessageRecord, MessageStatus, SiphonError,
};

use crate::database::{Database, map_tr_err};
use crate::models::StatusCounts;

const COLUMNS: &str = "message_id, update_id, chat_id, sender_id, content_type, status, \
     cached_payload, output_paths, last_error, failure_kind, attempts, received_at, \
     first_seen_at, processing_at, completed_at, failed_at";

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<MessageRecord> {
    let output_paths: Option<String> = row.get(7)?;
    let output_paths = match output_paths {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?,
        None => Vec::new(),
    };
    let failure_kind = match row.get::<_, Option<String>>(9)? {
        Some(_) => Some(parse_column::<FailureKind>(row, 9)?),
        None => None,
    };
    Ok(MessageRecord {
        message_id: row.get(0)?,
        update_id: row.get(1)?,
        chat_id: row.get(2)?,
        sender_id: row.get(3)?,
        content_type: parse_column::<ContentType>(row, 4)?,
        status: parse_column::<MessageStatus>(row, 5)?,
        cached_payload: row.get(6)?,
        output_paths,
        last_error: row.get(8)?,
        failure_kind,
        attempts: row.get(10)?,
        received_at: row.get(11)?,
        first_seen_at: row.get(12)?,
        processing_at: row.get(13)?,
        completed_at: row.get(14)?,
        failed_at: row.get(15)?,
    })
}

fn current_status(
    conn: &rusqlite::Connection,
    message_id: i64,
) -> rusqlite::Result<Option<(MessageStatus, Option<FailureKind>, bool)>> {
    conn.query_row(
        "SELECT status, failure_kind, cached_payload IS NOT NULL FROM messages WHERE message_id = ?1",
        params![message_id],
        |row| {
            let kind = match row.get::<_, Option<String>>(1)? {
                Some(_) => Some(parse_column::<FailureKind>(row, 1)?),
                None => None,
            };
            Ok((parse_column::<MessageStatus>(row, 0)?, kind, row.get(2)?))
        },
    )
    .optional()
}

/// Outcome of a conditional update, resolved to an error outside the
/// connection thread.
enum Transition {
    Applied,
    NotFound,
    WrongState(MessageStatus),
    Unavailable(&'static str),
}

impl Transition {
    fn into_result(self, message_id: i64, to: MessageStatus) -> Result<(), SiphonError> {
        match self {
            Transition::Applied => Ok(()),
            Transition::NotFound => Err(SiphonError::MessageNotFound(message_id)),
            Transition::WrongState(from) => Err(SiphonError::InvalidTransition {
                message_id,
                from: from.to_string(),
                to: to.to_string(),
            }),
            Transition::Unavailable(reason) => Err(SiphonError::RetryUnavailable {
                message_id,
                reason: reason.to_string(),
            }),
        }
    }
}

fn explain(conn: &rusqlite::Connection, message_id: i64) -> rusqlite::Result<Transition> {
    Ok(match current_status(conn, message_id)? {
        None => Transition::NotFound,
        Some((MessageStatus::Failed, Some(FailureKind::Blocked), _)) => {
            Transition::Unavailable("blocked by security policy")
        }
        Some((status, _, _)) => Transition::WrongState(status),
    })
}

/// Record a newly seen channel message as `pending`.
///
/// Returns `false` when the message was already tracked; its state is left
/// untouched.
pub async fn observe(
    db: &Database,
    message: &ChannelMessage,
    update_id: Option<i64>,
) -> Result<bool, SiphonError> {
    let message_id = message.message_id;
    let chat_id = message.chat_id;
    let sender_id = message.sender_id.clone();
    let content_type = message.content_type.to_string();
    let received_at = message.received_at.to_rfc3339();
    db.connection()
        .call(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO messages \
                 (message_id, update_id, chat_id, sender_id, content_type, status, received_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6)",
                params![message_id, update_id, chat_id, sender_id, content_type, received_at],
            )?;
            Ok(inserted == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// `pending -> processing`, caching the raw payload for later retries.
pub async fn claim(db: &Database, message_id: i64, payload: &str) -> Result<(), SiphonError> {
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                &format!(
                    "UPDATE messages SET status = 'processing', cached_payload = ?2, \
                     attempts = attempts + 1, processing_at = {NOW}, updated_at = {NOW} \
                     WHERE message_id = ?1 AND status = 'pending'"
                ),
                params![message_id, payload],
            )?;
            if changed == 1 {
                Ok(Transition::Applied)
            } else {
                explain(conn, message_id)
            }
        })
        .await
        .map_err(map_tr_err)?
        .into_result(message_id, MessageStatus::Processing)
}

/// `failed -> processing` from the cached payload, without a channel fetch.
///
/// Returns the cached message. Fails when there is no cached payload or the
/// failure was a security block.
pub async fn claim_for_retry(
    db: &Database,
    message_id: i64,
) -> Result<ChannelMessage, SiphonError> {
    let (transition, payload) = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let payload: Option<String> = tx
                .query_row(
                    "SELECT cached_payload FROM messages WHERE message_id = ?1 \
                     AND status = 'failed' AND failure_kind IS NOT 'blocked'",
                    params![message_id],
                    |row| row.get(0),
                )
                .optional()?
                .flatten();

            let Some(payload) = payload else {
                let transition = match current_status(&tx, message_id)? {
                    Some((MessageStatus::Failed, Some(FailureKind::Blocked), _)) => {
                        Transition::Unavailable("blocked by security policy")
                    }
                    Some((MessageStatus::Failed, _, false)) => {
                        Transition::Unavailable("no cached payload")
                    }
                    Some((status, _, _)) => Transition::WrongState(status),
                    None => Transition::NotFound,
                };
                tx.commit()?;
                return Ok((transition, None));
            };

            tx.execute(
                &format!(
                    "UPDATE messages SET status = 'processing', attempts = attempts + 1, \
                     processing_at = {NOW}, updated_at = {NOW} \
                     WHERE message_id = ?1 AND status = 'failed'"
                ),
                params![message_id],
            )?;
            tx.commit()?;
            Ok((Transition::Applied, Some(payload)))
        })
        .await
        .map_err(map_tr_err)?;

    transition.into_result(message_id, MessageStatus::Processing)?;
    let payload = payload.ok_or_else(|| {
        SiphonError::Internal(format!("message {message_id}: claimed without payload"))
    })?;
    ChannelMessage::from_payload(&payload)
}

/// `processing -> completed` with the produced output paths.
///
/// The cached payload is dropped; completed messages are never revisited.
pub async fn complete(
    db: &Database,
    message_id: i64,
    output_paths: &[String],
) -> Result<(), SiphonError> {
    let paths = serde_json::to_string(output_paths).map_err(|e| SiphonError::Storage {
        source: Box::new(e),
    })?;
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                &format!(
                    "UPDATE messages SET status = 'completed', output_paths = ?2, \
                     cached_payload = NULL, last_error = NULL, failure_kind = NULL, \
                     completed_at = {NOW}, updated_at = {NOW} \
                     WHERE message_id = ?1 AND status = 'processing'"
                ),
                params![message_id, paths],
            )?;
            if changed == 1 {
                Ok(Transition::Applied)
            } else {
                explain(conn, message_id)
            }
        })
        .await
        .map_err(map_tr_err)?
        .into_result(message_id, MessageStatus::Completed)
}

/// `processing -> failed`. The stored error is prefixed by failure kind.
pub async fn fail(
    db: &Database,
    message_id: i64,
    kind: FailureKind,
    error: &str,
) -> Result<(), SiphonError> {
    let last_error = format!("{} {error}", kind.prefix());
    let kind = kind.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                &format!(
                    "UPDATE messages SET status = 'failed', last_error = ?2, failure_kind = ?3, \
                     failed_at = {NOW}, updated_at = {NOW} \
                     WHERE message_id = ?1 AND status = 'processing'"
                ),
                params![message_id, last_error, kind],
            )?;
            if changed == 1 {
                Ok(Transition::Applied)
            } else {
                explain(conn, message_id)
            }
        })
        .await
        .map_err(map_tr_err)?
        .into_result(message_id, MessageStatus::Failed)
}

/// `failed -> pending` so a later pass picks the message up again.
///
/// The cached payload is kept. Security-blocked failures are refused.
pub async fn reset(db: &Database, message_id: i64) -> Result<(), SiphonError> {
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                &format!(
                    "UPDATE messages SET status = 'pending', updated_at = {NOW} \
                     WHERE message_id = ?1 AND status = 'failed' \
                     AND failure_kind IS NOT 'blocked'"
                ),
                params![message_id],
            )?;
            if changed == 1 {
                Ok(Transition::Applied)
            } else {
                explain(conn, message_id)
            }
        })
        .await
        .map_err(map_tr_err)?
        .into_result(message_id, MessageStatus::Pending)
}

/// Reset every retryable failure to `pending`. Returns the number reset.
pub async fn reset_all_failed(db: &Database) -> Result<usize, SiphonError> {
    db.connection()
        .call(|conn| {
            conn.execute(
                &format!(
                    "UPDATE messages SET status = 'pending', updated_at = {NOW} \
                     WHERE status = 'failed' AND failure_kind IS NOT 'blocked'"
                ),
                [],
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Mark messages left in `processing` by an interrupted run as failed.
///
/// Their cached payload stays, so they are retry-now eligible.
pub async fn recover_interrupted(db: &Database) -> Result<usize, SiphonError> {
    let last_error = format!("{} interrupted before completion", FailureKind::Tool.prefix());
    db.connection()
        .call(move |conn| {
            conn.execute(
                &format!(
                    "UPDATE messages SET status = 'failed', last_error = ?1, \
                     failure_kind = 'tool', failed_at = {NOW}, updated_at = {NOW} \
                     WHERE status = 'processing'"
                ),
                params![last_error],
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get(db: &Database, message_id: i64) -> Result<Option<MessageRecord>, SiphonError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM messages WHERE message_id = ?1"),
                params![message_id],
                row_to_record,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

async fn select(
    db: &Database,
    filter: &'static str,
    order: &'static str,
    limit: Option<i64>,
) -> Result<Vec<MessageRecord>, SiphonError> {
    db.connection()
        .call(move |conn| {
            let sql = format!(
                "SELECT {COLUMNS} FROM messages WHERE {filter} ORDER BY {order} LIMIT ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params![limit.unwrap_or(-1)], row_to_record)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

/// Messages in one state, oldest first.
pub async fn list_by_status(
    db: &Database,
    status: MessageStatus,
    limit: Option<i64>,
) -> Result<Vec<MessageRecord>, SiphonError> {
    let filter = match status {
        MessageStatus::Pending => "status = 'pending'",
        MessageStatus::Processing => "status = 'processing'",
        MessageStatus::Completed => "status = 'completed'",
        MessageStatus::Failed => "status = 'failed'",
    };
    select(db, filter, "message_id ASC", limit).await
}

/// Exactly the failed messages that can be reprocessed from cache.
pub async fn list_retry_eligible(db: &Database) -> Result<Vec<MessageRecord>, SiphonError> {
    select(
        db,
        "status = 'failed' AND cached_payload IS NOT NULL AND failure_kind IS NOT 'blocked'",
        "message_id ASC",
        None,
    )
    .await
}

/// Most recent failures first.
pub async fn recent_failures(
    db: &Database,
    limit: i64,
) -> Result<Vec<MessageRecord>, SiphonError> {
    select(
        db,
        "status = 'failed'",
        "failed_at DESC, message_id DESC",
        Some(limit),
    )
    .await
}

/// Pending messages in channel arrival order.
/// Pending messages ordered by channel update id; untracked ids go last.
pub async fn pending_in_arrival_order(db: &Database) -> Result<Vec<MessageRecord>, SiphonError> {
    select(
        db,
        "status = 'pending'",
        "update_id IS NULL, update_id ASC, message_id ASC",
        None,
    )
    .await
}

pub async fn status_counts(db: &Database) -> Result<StatusCounts, SiphonError> {
    db.connection()
        .call(|conn| {
            let mut counts = StatusCounts::default();
            let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM messages GROUP BY status")?;
            let rows = stmt.query_map([], |row| {
                Ok((parse_column::<MessageStatus>(row, 0)?, row.get::<_, u64>(1)?))
            })?;
            for row in rows {
                let (status, n) = row?;
                match status {
                    MessageStatus::Pending => counts.pending = n,
                    MessageStatus::Processing => counts.processing = n,
                    MessageStatus::Completed => counts.completed = n,
                    MessageStatus::Failed => counts.failed = n,
                }
            }
            counts.retry_eligible = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE status = 'failed' \
                 AND cached_payload IS NOT NULL AND failure_kind IS NOT 'blocked'",
                [],
                |row| row.get(0),
            )?;
            counts.blocked = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE status = 'failed' AND failure_kind = 'blocked'",
                [],
                |row| row.get(0),
            )?;
            Ok(counts)
        })
        .await
        .map_err(map_tr_err)
}
