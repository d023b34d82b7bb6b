// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Security gate for untrusted message content.
//!
//! Commands found in content are checked against an allowlist, content is
//! scanned for hard-block patterns, and every decision is audit-logged
//! without the content itself. Also provides secret redaction for log output.

pub mod redact;
pub mod rules;
pub mod sanitize;
pub mod validator;

pub use redact::{RedactingWriter, SecretList, redact, register_secret};
pub use validator::{AUDIT_TARGET, CheckInput, SecurityValidator, SecurityVerdict};
