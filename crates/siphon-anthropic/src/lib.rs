// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic-backed intent classifier.
//!
//! Consulted by the router only when neither an explicit command nor
//! dictated intent decided the pipeline.

pub mod classifier;
pub mod client;
pub mod types;

pub use classifier::{AnthropicClassifier, parse_classification, resolve_api_key};
pub use client::AnthropicClient;
