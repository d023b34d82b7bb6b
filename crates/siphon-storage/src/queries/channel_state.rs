// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel bookkeeping: the confirmed update offset.

use rusqlite::{OptionalExtension, params};
use siphon_core::SiphonError;

use crate::database::{Database, map_tr_err};

const OFFSET_KEY: &str = "update_offset";

/// The next update id the channel should deliver, if any was confirmed.
pub async fn get_offset(db: &Database) -> Result<Option<i64>, SiphonError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                "SELECT value FROM channel_state WHERE key = ?1",
                params![OFFSET_KEY],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Advance the confirmed offset. Never moves it backwards.
pub async fn set_offset(db: &Database, offset: i64) -> Result<(), SiphonError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO channel_state (key, value) VALUES (?1, ?2) \
                 ON CONFLICT(key) DO UPDATE SET value = MAX(value, excluded.value), \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![OFFSET_KEY, offset],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}
