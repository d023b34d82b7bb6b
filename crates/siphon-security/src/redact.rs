// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Secret redaction for log output.
//!
//! Regex patterns catch known credential formats; exact values (the bot token,
//! the classifier API key) are registered at startup.

use std::io::Write;
use std::sync::{Arc, LazyLock, RwLock};

use regex::Regex;

/// Known credential formats.
static SECRET_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Anthropic API keys: sk-ant-api03-...
        Regex::new(r"sk-ant-[a-zA-Z0-9_\-]{20,}").unwrap(),
        Regex::new(r"sk-[a-zA-Z0-9]{20,}").unwrap(),
        Regex::new(r"Bearer\s+[a-zA-Z0-9._\-]{10,}").unwrap(),
        // Telegram bot tokens, also as they appear inside Bot API URLs.
        Regex::new(r"\d{8,10}:[a-zA-Z0-9_\-]{35}").unwrap(),
        Regex::new(r"AKIA[0-9A-Z]{16}").unwrap(),
        Regex::new(r"-----BEGIN [A-Z ]*PRIVATE KEY-----").unwrap(),
    ]
});

const REDACTED: &str = "[REDACTED]";

/// Whether `input` contains something shaped like a credential.
pub fn contains_secret(input: &str) -> bool {
    SECRET_PATTERNS.iter().any(|re| re.is_match(input))
}

/// Replace credential patterns and the given exact values with `[REDACTED]`.
pub fn redact(input: &str, known_values: &[String]) -> String {
    let mut result = input.to_string();
    for pattern in SECRET_PATTERNS.iter() {
        result = pattern.replace_all(&result, REDACTED).into_owned();
    }

    // Longest first so a value containing another is replaced whole.
    let mut values: Vec<&String> = known_values.iter().filter(|v| !v.is_empty()).collect();
    values.sort_by_key(|v| std::cmp::Reverse(v.len()));
    for value in values {
        result = result.replace(value.as_str(), REDACTED);
    }
    result
}

/// Shared list of exact values to redact.
pub type SecretList = Arc<RwLock<Vec<String>>>;

/// Register a value with a shared secret list, ignoring empties and duplicates.
pub fn register_secret(list: &SecretList, value: &str) {
    if value.is_empty() {
        return;
    }
    if let Ok(mut values) = list.write()
        && !values.iter().any(|v| v == value)
    {
        values.push(value.to_string());
    }
}

/// A writer that redacts secrets before forwarding to `inner`.
pub struct RedactingWriter<W> {
    inner: W,
    secrets: SecretList,
}

impl<W: Write> RedactingWriter<W> {
    pub fn new(inner: W, secrets: SecretList) -> Self {
        Self { inner, secrets }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let input = String::from_utf8_lossy(buf);
        let secrets = self.secrets.read().map(|v| v.clone()).unwrap_or_default();
        self.inner.write_all(redact(&input, &secrets).as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
