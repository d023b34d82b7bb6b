// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Siphon.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of silently ignored.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Name of the profile used when none is configured or selected.
pub const DEFAULT_PROFILE: &str = "default";

/// Top-level Siphon configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SiphonConfig {
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram channel settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Named vault destinations, selected with `process --profile`.
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileConfig>,

    /// External content processor commands and timeouts.
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// AI intent classifier settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    /// Watch loop timing.
    #[serde(default)]
    pub watch: WatchConfig,
}

impl SiphonConfig {
    /// Resolve a vault profile by name, falling back to `agent.default_profile`.
    ///
    /// When no profiles are configured at all, the built-in default profile
    /// is returned for the default name.
    pub fn profile(&self, name: Option<&str>) -> Option<ProfileConfig> {
        let name = name.unwrap_or(&self.agent.default_profile);
        match self.profiles.get(name) {
            Some(profile) => Some(profile.clone()),
            None if self.profiles.is_empty() && name == DEFAULT_PROFILE => {
                Some(ProfileConfig::default())
            }
            None => None,
        }
    }
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Name used in log output.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Profile used when `--profile` is not given.
    #[serde(default = "default_profile_name")]
    pub default_profile: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            default_profile: default_profile_name(),
        }
    }
}

fn default_agent_name() -> String {
    "siphon".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_profile_name() -> String {
    DEFAULT_PROFILE.to_string()
}

/// Telegram channel configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required by `poll`, `process` and `watch`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Telegram user IDs or usernames allowed to submit content.
    /// An empty list rejects everyone.
    #[serde(default)]
    pub allowed_users: Vec<String>,

    /// Long-poll timeout passed to getUpdates, in seconds.
    #[serde(default)]
    pub poll_timeout_secs: u32,
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite message state database.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("siphon").join("siphon.db"))
        .unwrap_or_else(|| PathBuf::from("siphon.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// A vault destination and its folder layout.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    /// Root directory of the vault.
    #[serde(default = "default_vault_path")]
    pub vault_path: String,

    #[serde(default = "default_inbox_folder")]
    pub inbox_folder: String,

    #[serde(default = "default_clips_folder")]
    pub clips_folder: String,

    #[serde(default = "default_archive_folder")]
    pub archive_folder: String,

    #[serde(default = "default_receipts_folder")]
    pub receipts_folder: String,

    /// Originals retained by the `keep` command for non-archival pipelines.
    #[serde(default = "default_attachments_folder")]
    pub attachments_folder: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            vault_path: default_vault_path(),
            inbox_folder: default_inbox_folder(),
            clips_folder: default_clips_folder(),
            archive_folder: default_archive_folder(),
            receipts_folder: default_receipts_folder(),
            attachments_folder: default_attachments_folder(),
        }
    }
}

fn default_vault_path() -> String {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .map(|p| p.join("Vault"))
        .unwrap_or_else(|| PathBuf::from("Vault"))
        .to_string_lossy()
        .into_owned()
}

fn default_inbox_folder() -> String {
    "Inbox".to_string()
}

fn default_clips_folder() -> String {
    "Clips".to_string()
}

fn default_archive_folder() -> String {
    "Archive".to_string()
}

fn default_receipts_folder() -> String {
    "Receipts".to_string()
}

fn default_attachments_folder() -> String {
    "Attachments".to_string()
}

/// External tool configuration.
///
/// Commands are argv arrays. `{input}` is replaced by the input file path and
/// `{output_dir}` by the per-message scratch directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Speech-to-text command for voice and audio messages.
    #[serde(default = "default_transcription_command")]
    pub transcription_command: Vec<String>,

    #[serde(default = "default_transcription_timeout_secs")]
    pub transcription_timeout_secs: u64,

    /// Document-to-markdown command.
    #[serde(default = "default_document_command")]
    pub document_command: Vec<String>,

    #[serde(default = "default_document_timeout_secs")]
    pub document_timeout_secs: u64,

    /// OCR command for photos.
    #[serde(default = "default_ocr_command")]
    pub ocr_command: Vec<String>,

    #[serde(default = "default_ocr_timeout_secs")]
    pub ocr_timeout_secs: u64,

    /// Timeout for article fetches.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Largest article body accepted, in bytes.
    #[serde(default = "default_max_fetch_bytes")]
    pub max_fetch_bytes: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            transcription_command: default_transcription_command(),
            transcription_timeout_secs: default_transcription_timeout_secs(),
            document_command: default_document_command(),
            document_timeout_secs: default_document_timeout_secs(),
            ocr_command: default_ocr_command(),
            ocr_timeout_secs: default_ocr_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            max_fetch_bytes: default_max_fetch_bytes(),
        }
    }
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn default_transcription_command() -> Vec<String> {
    argv(&[
        "whisper",
        "{input}",
        "--output_format",
        "txt",
        "--output_dir",
        "{output_dir}",
    ])
}

fn default_transcription_timeout_secs() -> u64 {
    600
}

fn default_document_command() -> Vec<String> {
    argv(&["markitdown", "{input}"])
}

fn default_document_timeout_secs() -> u64 {
    180
}

fn default_ocr_command() -> Vec<String> {
    argv(&["tesseract", "{input}", "stdout"])
}

fn default_ocr_timeout_secs() -> u64 {
    120
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_max_fetch_bytes() -> usize {
    5 * 1024 * 1024
}

/// AI intent classifier configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Whether the AI tier is consulted at all.
    #[serde(default)]
    pub enabled: bool,

    /// Anthropic API key. Falls back to `ANTHROPIC_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Minimum confidence for a classification to be accepted.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    #[serde(default = "default_classifier_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            model: default_model(),
            api_version: default_api_version(),
            confidence_threshold: default_confidence_threshold(),
            timeout_secs: default_classifier_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "claude-haiku-4-5".to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_confidence_threshold() -> f64 {
    0.8
}

fn default_classifier_timeout_secs() -> u64 {
    30
}

/// Command allowlist and content limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    /// Command names accepted from message content.
    #[serde(default = "default_allowed_commands")]
    pub allowed_commands: Vec<String>,

    /// Content longer than this is truncated during sanitization.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_commands: default_allowed_commands(),
            max_content_chars: default_max_content_chars(),
        }
    }
}

fn default_allowed_commands() -> Vec<String> {
    argv(&["archive", "receipt", "clip", "note", "keep"])
}

fn default_max_content_chars() -> usize {
    100_000
}

/// Watch loop timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Sleep between passes.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Delay after a failed poll before the next cycle.
    #[serde(default = "default_poll_backoff_secs")]
    pub poll_backoff_secs: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            poll_backoff_secs: default_poll_backoff_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_poll_backoff_secs() -> u64 {
    10
}
