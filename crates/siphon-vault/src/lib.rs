// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-based knowledge vault.
//!
//! [`VaultLayout`] maps a record to folders and frontmatter for one profile;
//! [`MarkdownVault`] writes the files.

pub mod layout;
pub mod writer;

pub use layout::VaultLayout;
pub use writer::{MarkdownVault, render_note};
