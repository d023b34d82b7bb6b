// SPDX-FileCopyrightText: 2026 Siphon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel transport for Siphon.
//!
//! Implements [`ChannelAdapter`] over the Telegram Bot API via teloxide:
//! offset-based `getUpdates` polling, status reactions, and attachment
//! downloads. Nothing is confirmed to Telegram except through the offset the
//! caller passes in.

pub mod handler;
pub mod media;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use siphon_config::model::TelegramConfig;
use siphon_core::{
    AdapterType, Attachment, ChannelAdapter, ChannelMessage, ChannelUpdate, HealthStatus,
    PluginAdapter, SiphonError,
};
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, MessageId, ReactionType};
use tracing::debug;

/// Telegram channel adapter implementing [`ChannelAdapter`].
pub struct TelegramChannel {
    bot: Bot,
    config: TelegramConfig,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: TelegramConfig) -> Result<Self, SiphonError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            SiphonError::Config("telegram.bot_token is required for Telegram adapter".into())
        })?;

        if token.is_empty() {
            return Err(SiphonError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        Ok(Self {
            bot: Bot::new(token),
            config,
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

fn channel_err(context: &str, e: teloxide::RequestError) -> SiphonError {
    SiphonError::Channel {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, SiphonError> {
        // Check if the bot token is valid by calling getMe.
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<ChannelUpdate>, SiphonError> {
        let mut request = self
            .bot
            .get_updates()
            .timeout(self.config.poll_timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message]);
        if let Some(offset) = offset {
            let offset = i32::try_from(offset).map_err(|_| SiphonError::Channel {
                message: format!("update offset {offset} out of range"),
                source: None,
            })?;
            request = request.offset(offset);
        }

        let updates = request
            .await
            .map_err(|e| channel_err("getUpdates failed", e))?;
        debug!(count = updates.len(), ?offset, "fetched Telegram updates");

        Ok(updates
            .iter()
            .map(|u| handler::to_channel_update(u, &self.config.allowed_users))
            .collect())
    }

    async fn set_reaction(
        &self,
        message: &ChannelMessage,
        emoji: &str,
    ) -> Result<(), SiphonError> {
        let message_id = i32::try_from(message.message_id).map_err(|_| SiphonError::Channel {
            message: format!("message id {} out of range", message.message_id),
            source: None,
        })?;
        self.bot
            .set_message_reaction(ChatId(message.chat_id), MessageId(message_id))
            .reaction(vec![ReactionType::Emoji {
                emoji: emoji.to_string(),
            }])
            .await
            .map_err(|e| channel_err("setMessageReaction failed", e))?;
        Ok(())
    }

    async fn download(
        &self,
        attachment: &Attachment,
        dest_dir: &Path,
    ) -> Result<PathBuf, SiphonError> {
        media::download_to(&self.bot, attachment, dest_dir).await
    }
}
