// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The single-worker lease.
//!
//! One row, taken with a conditional upsert: free, expired, or already ours.
//! Timestamps use SQLite's clock so every process compares the same way.

use std::time::Duration;

use rusqlite::{OptionalExtension, params};
use siphon_core::SiphonError;

use crate::database::{Database, map_tr_err};

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

fn expiry(ttl: Duration) -> String {
    format!("strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '+{} seconds')", ttl.as_secs().max(1))
}

/// Take the lease for `holder`. Returns false while another holder's lease
/// is still live.
pub async fn acquire(db: &Database, holder: &str, ttl: Duration) -> Result<bool, SiphonError> {
    let holder = holder.to_string();
    let sql = format!(
        "INSERT INTO worker_lease (id, holder, acquired_at, expires_at) VALUES (1, ?1, {NOW}, {exp}) \
         ON CONFLICT(id) DO UPDATE SET holder = excluded.holder, \
         acquired_at = excluded.acquired_at, expires_at = excluded.expires_at \
         WHERE worker_lease.expires_at <= {NOW} OR worker_lease.holder = excluded.holder",
        exp = expiry(ttl)
    );
    db.connection()
        .call(move |conn| Ok(conn.execute(&sql, params![holder])? == 1))
        .await
        .map_err(map_tr_err)
}

/// Extend a lease `holder` still owns. Returns false if it was lost.
pub async fn renew(db: &Database, holder: &str, ttl: Duration) -> Result<bool, SiphonError> {
    let holder = holder.to_string();
    let sql = format!(
        "UPDATE worker_lease SET expires_at = {exp} WHERE id = 1 AND holder = ?1",
        exp = expiry(ttl)
    );
    db.connection()
        .call(move |conn| Ok(conn.execute(&sql, params![holder])? == 1))
        .await
        .map_err(map_tr_err)
}

pub async fn release(db: &Database, holder: &str) -> Result<(), SiphonError> {
    let holder = holder.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM worker_lease WHERE id = 1 AND holder = ?1",
                params![holder],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The holder of a live lease, if any.
pub async fn live_holder(db: &Database) -> Result<Option<String>, SiphonError> {
    let sql = format!("SELECT holder FROM worker_lease WHERE id = 1 AND expires_at > {NOW}");
    db.connection()
        .call(move |conn| conn.query_row(&sql, [], |row| row.get(0)).optional())
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn second_holder_waits_for_release() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(acquire(&db, "pid 1", TTL).await.unwrap());
        assert!(!acquire(&db, "pid 2", TTL).await.unwrap());
        assert_eq!(live_holder(&db).await.unwrap().as_deref(), Some("pid 1"));

        // Re-acquiring our own lease is allowed.
        assert!(acquire(&db, "pid 1", TTL).await.unwrap());

        release(&db, "pid 2").await.unwrap();
        assert_eq!(live_holder(&db).await.unwrap().as_deref(), Some("pid 1"));

        release(&db, "pid 1").await.unwrap();
        assert_eq!(live_holder(&db).await.unwrap(), None);
        assert!(acquire(&db, "pid 2", TTL).await.unwrap());
    }

    #[tokio::test]
    async fn expired_lease_can_be_taken_over() {
        let db = Database::open_in_memory().await.unwrap();
        assert!(acquire(&db, "pid 1", TTL).await.unwrap());
        db.connection()
            .call(|conn| {
                conn.execute(
                    "UPDATE worker_lease SET expires_at = '2000-01-01T00:00:00.000Z'",
                    [],
                )?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();

        assert_eq!(live_holder(&db).await.unwrap(), None);
        assert!(acquire(&db, "pid 2", TTL).await.unwrap());
        assert!(!renew(&db, "pid 1", TTL).await.unwrap());
        assert!(renew(&db, "pid 2", TTL).await.unwrap());
    }
}
