// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod classifier;
pub mod processor;
pub mod vault;

pub use adapter::PluginAdapter;
pub use channel::ChannelAdapter;
pub use classifier::IntentClassifier;
pub use processor::{ContentProcessor, ProcessorInput};
pub use vault::{Frontmatter, VaultWriter};
