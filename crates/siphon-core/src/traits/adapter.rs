// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all external collaborators implement.

use async_trait::async_trait;

use crate::error::SiphonError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all Siphon adapters.
///
/// Every collaborator (channel, processor, classifier, vault) implements this
/// trait, which provides identity and a health check.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the type of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, SiphonError>;
}
