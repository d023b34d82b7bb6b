// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attachment downloads into a per-message working directory.

use std::path::{Path, PathBuf};

use siphon_core::{Attachment, SiphonError};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::FileId;
use tracing::debug;

/// Local filename for an attachment: its own name reduced to the final path
/// component, or the file id plus an extension.
pub fn local_file_name(attachment: &Attachment) -> String {
    let own = attachment
        .file_name
        .as_deref()
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.starts_with('.'));
    match (own, attachment.extension()) {
        (Some(name), _) => name.to_string(),
        (None, Some(ext)) => format!("{}.{ext}", safe_id(&attachment.file_id)),
        (None, None) => safe_id(&attachment.file_id),
    }
}

fn safe_id(file_id: &str) -> String {
    file_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect()
}

/// Resolves the file with `getFile` and streams it into `dest_dir`.
pub async fn download_to(
    bot: &Bot,
    attachment: &Attachment,
    dest_dir: &Path,
) -> Result<PathBuf, SiphonError> {
    let file = bot
        .get_file(FileId(attachment.file_id.clone()))
        .await
        .map_err(|e| SiphonError::Channel {
            message: format!("failed to get file info: {e}"),
            source: Some(Box::new(e)),
        })?;

    let path = dest_dir.join(local_file_name(attachment));
    let mut dst = tokio::fs::File::create(&path)
        .await
        .map_err(|e| SiphonError::Channel {
            message: format!("failed to create {}: {e}", path.display()),
            source: Some(Box::new(e)),
        })?;

    bot.download_file(&file.path, &mut dst)
        .await
        .map_err(|e| SiphonError::Channel {
            message: format!("failed to download file: {e}"),
            source: Some(Box::new(e)),
        })?;

    debug!(
        file_id = %attachment.file_id,
        size = file.size,
        path = %path.display(),
        "downloaded file from Telegram"
    );
    Ok(path)
}
