// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Siphon.
//!
//! TOML parsing with strict key checking, XDG file lookup, `SIPHON_*`
//! environment overrides, semantic validation, and miette diagnostics.
//!
//! ```no_run
//! use siphon_config::load_and_validate;
//!
//! let config = load_and_validate(None).expect("config errors");
//! println!("database: {}", config.storage.database_path);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{ProfileConfig, SiphonConfig};

/// Load configuration and validate it.
///
/// With `path`, only that file (plus env overrides) is read; otherwise the
/// standard hierarchy is used. Figment errors become diagnostics with
/// source spans where the offending file can be found.
pub fn load_and_validate(path: Option<&Path>) -> Result<SiphonConfig, Vec<ConfigError>> {
    let loaded = match path {
        Some(path) => loader::load_config_from_path(path),
        None => loader::load_config(),
    };
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = match path {
                Some(path) => read_sources(&[path.to_path_buf()]),
                None => read_sources(&hierarchy_paths()),
            };
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<SiphonConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

fn hierarchy_paths() -> Vec<std::path::PathBuf> {
    let mut paths = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(loader::LOCAL_CONFIG_FILE));
    }
    if let Some(user) = loader::user_config_path() {
        paths.push(user);
    }
    paths.push(loader::SYSTEM_CONFIG_PATH.into());
    paths
}

fn read_sources(paths: &[std::path::PathBuf]) -> Vec<(String, String)> {
    paths
        .iter()
        .filter_map(|path| {
            std::fs::read_to_string(path)
                .ok()
                .map(|content| (path.display().to_string(), content))
        })
        .collect()
}
