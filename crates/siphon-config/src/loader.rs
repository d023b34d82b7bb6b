// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./siphon.toml` > `~/.config/siphon/siphon.toml` > `/etc/siphon/siphon.toml`,
//! with environment variable overrides via the `SIPHON_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::SiphonConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/siphon/siphon.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "siphon.toml";

/// Sections reachable through `SIPHON_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "agent",
    "telegram",
    "storage",
    "processing",
    "classifier",
    "security",
    "watch",
];

/// The user's XDG config file, if a config dir exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("siphon").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/siphon/siphon.toml`
/// 3. `~/.config/siphon/siphon.toml`
/// 4. `./siphon.toml`
/// 5. `SIPHON_*` environment variables
pub fn load_config() -> Result<SiphonConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults.
///
/// No files or environment variables are consulted.
pub fn load_config_from_str(toml_content: &str) -> Result<SiphonConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(SiphonConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
///
/// Unlike the hierarchy lookup, a missing file is an error.
pub fn load_config_from_path(path: &Path) -> Result<SiphonConfig, figment::Error> {
    if !path.is_file() {
        return Err(figment::Error::from(format!(
            "config file `{}` does not exist",
            path.display()
        )));
    }
    Figment::new()
        .merge(Serialized::defaults(SiphonConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(SiphonConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH));
    if let Some(user) = user_config_path() {
        figment = figment.merge(Toml::file(user));
    }
    figment
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Maps `SIPHON_TELEGRAM_BOT_TOKEN` to `telegram.bot_token`.
///
/// Only the first underscore after a known section becomes a dot, because
/// key names themselves contain underscores.
fn env_provider() -> Env {
    Env::prefixed("SIPHON_").map(|key| {
        // Keys arrive with the environment's casing.
        let key = key.as_str().to_ascii_lowercase();
        for section in ENV_SECTIONS {
            if let Some(rest) = key
                .strip_prefix(section)
                .and_then(|r| r.strip_prefix('_'))
            {
                return format!("{section}.{rest}").into();
            }
        }
        key.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_nested_keys_with_underscores() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[agent]\nname = \"from-file\"\n")?;
            jail.set_env("SIPHON_TELEGRAM_BOT_TOKEN", "123:abc");
            jail.set_env("SIPHON_CLASSIFIER_CONFIDENCE_THRESHOLD", "0.9");
            jail.set_env("SIPHON_WATCH_INTERVAL_SECS", "15");

            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.agent.name, "from-file");
            assert_eq!(config.telegram.bot_token.as_deref(), Some("123:abc"));
            assert_eq!(config.classifier.confidence_threshold, 0.9);
            assert_eq!(config.watch.interval_secs, 15);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_apply_to_the_hierarchy() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(LOCAL_CONFIG_FILE, "[storage]\nwal_mode = true\n")?;
            jail.set_env("SIPHON_STORAGE_WAL_MODE", "false");
            jail.set_env("SIPHON_AGENT_DEFAULT_PROFILE", "default");

            let config = load_config()?;
            assert!(!config.storage.wal_mode);
            assert_eq!(config.agent.default_profile, "default");
            Ok(())
        });
    }

    #[test]
    fn explicit_path_must_exist() {
        figment::Jail::expect_with(|_jail| {
            assert!(load_config_from_path(Path::new("missing.toml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn local_file_is_picked_up() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(LOCAL_CONFIG_FILE, "[watch]\npoll_backoff_secs = 3\n")?;
            let config = load_config()?;
            assert_eq!(config.watch.poll_backoff_secs, 3);
            Ok(())
        });
    }
}
