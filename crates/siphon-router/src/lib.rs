// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pipeline routing for the Siphon ingestion engine.
//!
//! This crate provides:
//! - [`PipelineRouter`]: explicit command > dictated intent > AI classifier > default,
//!   followed by the scope policy
//! - [`dictated`]: phrase tables for pipeline, category and type detection
//! - [`doctype`]: content-based document type signatures
//! - [`ArchiveNamer`]: canonical filenames for archived and receipted documents

pub mod dictated;
pub mod doctype;
pub mod namer;
pub mod router;

pub use dictated::{DictatedIntent, detect_dictated};
pub use doctype::{classify_document, fill_document_type};
pub use namer::{ArchiveNamer, NameRequest, should_preserve_archive_name};
pub use router::{PipelineRouter, RouteInput, apply_scope_policy};
