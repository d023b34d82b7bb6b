// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express: ranges, non-empty paths,
//! timeout ordering and command shapes.

use crate::diagnostic::ConfigError;
use crate::model::SiphonConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns every violation found rather than stopping at the first one.
pub fn validate_config(config: &SiphonConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let threshold = config.classifier.confidence_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        fail(format!(
            "classifier.confidence_threshold must be between 0 and 1, got {threshold}"
        ));
    }

    let processing = &config.processing;
    for (key, secs) in [
        ("processing.transcription_timeout_secs", processing.transcription_timeout_secs),
        ("processing.document_timeout_secs", processing.document_timeout_secs),
        ("processing.ocr_timeout_secs", processing.ocr_timeout_secs),
        ("processing.fetch_timeout_secs", processing.fetch_timeout_secs),
        ("classifier.timeout_secs", config.classifier.timeout_secs),
        ("watch.interval_secs", config.watch.interval_secs),
    ] {
        if secs == 0 {
            fail(format!("{key} must be greater than zero"));
        }
    }

    // Network collaborators answer in seconds; transcription takes minutes.
    for (key, secs) in [
        ("classifier.timeout_secs", config.classifier.timeout_secs),
        ("processing.fetch_timeout_secs", processing.fetch_timeout_secs),
    ] {
        if secs >= processing.transcription_timeout_secs {
            fail(format!(
                "{key} ({secs}s) must be shorter than processing.transcription_timeout_secs ({}s)",
                processing.transcription_timeout_secs
            ));
        }
    }

    for (key, argv) in [
        ("processing.transcription_command", &processing.transcription_command),
        ("processing.document_command", &processing.document_command),
        ("processing.ocr_command", &processing.ocr_command),
    ] {
        match argv.first() {
            None => fail(format!("{key} must not be empty")),
            Some(program) if program.trim().is_empty() => {
                fail(format!("{key} must start with a program name"))
            }
            Some(_) if !argv.iter().any(|arg| arg.contains("{input}")) => {
                fail(format!("{key} must reference `{{input}}`"))
            }
            Some(_) => {}
        }
    }

    if processing.max_fetch_bytes == 0 {
        fail("processing.max_fetch_bytes must be greater than zero".to_string());
    }

    if config.profile(None).is_none() {
        fail(format!(
            "agent.default_profile `{}` does not name a configured profile",
            config.agent.default_profile
        ));
    }

    for (name, profile) in &config.profiles {
        if profile.vault_path.trim().is_empty() {
            fail(format!("profiles.{name}.vault_path must not be empty"));
        }
    }

    for command in &config.security.allowed_commands {
        if !is_command_name(command) {
            fail(format!(
                "security.allowed_commands entry `{command}` must be lowercase letters, digits, `-` or `_`"
            ));
        }
    }

    if config.security.max_content_chars == 0 {
        fail("security.max_content_chars must be greater than zero".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_command_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}
