// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Siphon integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic tests without Telegram, external tools or the network.
//!
//! # Components
//!
//! - [`MockChannel`] - Retained updates with offset confirmation, captured reactions
//! - [`MockProcessor`] / [`MockClassifier`] - Scripted processing and classification
//! - [`MemoryVault`] - Vault writer backed by in-memory maps
//! - [`TestHarness`] - A wired orchestrator over all of the above

pub mod harness;
pub mod memory_vault;
pub mod messages;
pub mod mock_channel;
pub mod mock_processor;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use memory_vault::{MemoryVault, StoredNote};
pub use mock_channel::MockChannel;
pub use mock_processor::{MockClassifier, MockProcessor};
