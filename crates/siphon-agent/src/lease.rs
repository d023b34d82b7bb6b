// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exclusive worker lease.
//!
//! Only the lease holder claims messages or recovers ones a crashed run
//! left in `processing`. A background task renews the lease while it is
//! held, so a dead worker's lease lapses after one TTL.

use std::time::Duration;

use chrono::Utc;
use siphon_core::SiphonError;
use siphon_storage::MessageStore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How long a lease survives without renewal.
pub const LEASE_TTL: Duration = Duration::from_secs(120);

/// A held worker lease. Call [`WorkerLease::release`] when done; dropping it
/// stops renewal and lets the lease lapse.
pub struct WorkerLease {
    store: MessageStore,
    holder: String,
    stop: CancellationToken,
    renewer: Option<JoinHandle<()>>,
}

impl WorkerLease {
    /// Take the lease or fail with [`SiphonError::WorkerBusy`].
    pub async fn acquire(store: &MessageStore, ttl: Duration) -> Result<Self, SiphonError> {
        let holder = format!(
            "pid {} since {}",
            std::process::id(),
            Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ")
        );
        if !store.acquire_lease(&holder, ttl).await? {
            let current = store.lease_holder().await?.unwrap_or_else(|| "unknown".into());
            return Err(SiphonError::WorkerBusy { holder: current });
        }
        debug!(holder = %holder, "worker lease acquired");

        let stop = CancellationToken::new();
        let renewer = tokio::spawn(renew_until_stopped(
            store.clone(),
            holder.clone(),
            ttl,
            stop.clone(),
        ));
        Ok(Self {
            store: store.clone(),
            holder,
            stop,
            renewer: Some(renewer),
        })
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Stop renewing and give the lease up.
    pub async fn release(mut self) -> Result<(), SiphonError> {
        self.stop.cancel();
        if let Some(renewer) = self.renewer.take() {
            let _ = renewer.await;
        }
        self.store.release_lease(&self.holder).await?;
        debug!(holder = %self.holder, "worker lease released");
        Ok(())
    }
}

impl Drop for WorkerLease {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

async fn renew_until_stopped(
    store: MessageStore,
    holder: String,
    ttl: Duration,
    stop: CancellationToken,
) {
    let every = ttl / 4;
    loop {
        tokio::select! {
            _ = stop.cancelled() => return,
            _ = tokio::time::sleep(every) => {}
        }
        match store.renew_lease(&holder, ttl).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(holder = %holder, "worker lease lost to another process");
                return;
            }
            Err(e) => warn!(error = %e, "worker lease renewal failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_worker_is_refused_until_release() {
        let store = MessageStore::open_in_memory().await.unwrap();
        let lease = WorkerLease::acquire(&store, LEASE_TTL).await.unwrap();

        // Same process, but a different holder string: still refused.
        assert!(!store.acquire_lease("pid 0 since then", LEASE_TTL).await.unwrap());
        assert_eq!(store.lease_holder().await.unwrap().as_deref(), Some(lease.holder()));

        lease.release().await.unwrap();
        assert_eq!(store.lease_holder().await.unwrap(), None);
    }

    #[tokio::test]
    async fn busy_error_names_the_holder() {
        let store = MessageStore::open_in_memory().await.unwrap();
        assert!(store.acquire_lease("pid 77 since noon", LEASE_TTL).await.unwrap());

        let err = WorkerLease::acquire(&store, LEASE_TTL).await.err().unwrap();
        assert!(matches!(err, SiphonError::WorkerBusy { ref holder } if holder == "pid 77 since noon"));
    }

    #[tokio::test]
    async fn renewal_keeps_a_short_lease_alive() {
        let store = MessageStore::open_in_memory().await.unwrap();
        let lease = WorkerLease::acquire(&store, Duration::from_secs(2)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2600)).await;
        assert_eq!(store.lease_holder().await.unwrap().as_deref(), Some(lease.holder()));
        lease.release().await.unwrap();
    }
}
