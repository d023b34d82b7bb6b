// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite message state store for the Siphon ingestion engine.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a single-writer
//! concurrency model via `tokio-rusqlite`, atomic lifecycle transitions with
//! payload caching for retry-now, and the channel offset watermark.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod store;

pub use database::Database;
pub use models::StatusCounts;
pub use store::MessageStore;
