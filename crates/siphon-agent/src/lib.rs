// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message orchestration for Siphon.
//!
//! The [`Orchestrator`] is the root of the ingestion engine:
//! - Fetches updates from the channel and tracks each message in the state store
//! - Runs hints, security, routing, processing and vault filing per message
//! - Confirms settled updates back to the channel
//! - Reprocesses failures from their cached payload
//! - Loops in watch mode until a shutdown signal

pub mod lease;
pub mod orchestrator;
pub mod plan;
pub mod reactions;
pub mod retry;
pub mod shutdown;
pub mod status;
pub mod watermark;

pub use lease::{LEASE_TTL, WorkerLease};
pub use orchestrator::{Orchestrator, Outcome, PassSummary, PollSummary};
pub use plan::MessagePlan;
pub use retry::{RetryResult, RetryTarget};
pub use shutdown::install_signal_handler;
pub use status::StatusReport;
