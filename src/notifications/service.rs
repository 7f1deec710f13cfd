use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::message::AlertMessage;
use super::models::ChannelConfig;
use super::senders::{NotificationSender, SenderError, discord::DiscordSender};
use crate::alerting::clock::Clock;
use crate::alerting::stores::{ChannelStore, StoreError};

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Channel not found: {0}")]
    NotFound(i32),
    #[error("Channel {0} has no usable configuration")]
    UnusableChannel(i32),
    #[error("Sender error: {0}")]
    Sender(#[from] SenderError),
}

impl NotificationError {
    pub fn sender_error(&self) -> Option<&SenderError> {
        match self {
            Self::Sender(e) => Some(e),
            _ => None,
        }
    }
}

/// Dispatches each decoded channel configuration to the sender for its
/// variant. Adding a channel type adds a variant and a sender field here.
pub struct NotificationService {
    discord: Arc<dyn NotificationSender>,
    channels: Arc<dyn ChannelStore>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    /// Builds the service with the HTTP senders.
    pub fn new(
        channels: Arc<dyn ChannelStore>,
        clock: Arc<dyn Clock>,
        webhook_timeout: Duration,
    ) -> Result<Self, SenderError> {
        let discord = Arc::new(DiscordSender::new(webhook_timeout)?);
        Ok(Self::with_senders(channels, clock, discord))
    }

    pub fn with_senders(
        channels: Arc<dyn ChannelStore>,
        clock: Arc<dyn Clock>,
        discord: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            discord,
            channels,
            clock,
        }
    }

    /// Delivers one message to one channel.
    pub async fn send(
        &self,
        config: &ChannelConfig,
        message: &AlertMessage,
    ) -> Result<(), NotificationError> {
        let sender = match config {
            ChannelConfig::Discord(_) => &self.discord,
        };
        sender.send(config, message).await?;
        Ok(())
    }

    /// Sends a test message to an unsaved webhook URL from the settings form.
    pub async fn test_webhook(
        &self,
        webhook: &str,
        mentions: Option<&str>,
    ) -> Result<(), NotificationError> {
        let webhook = webhook.trim();
        if webhook.is_empty() {
            let err = SenderError::InvalidConfiguration("Webhook URL is empty".to_string());
            return Err(err.into());
        }
        let message = AlertMessage::test(mentions, self.clock.now());
        self.send(&ChannelConfig::discord(webhook), &message).await
    }

    /// Sends a test message through a saved channel.
    pub async fn test_channel(&self, channel_id: i32) -> Result<(), NotificationError> {
        let channel = self
            .channels
            .get_by_id(channel_id)
            .await?
            .ok_or(NotificationError::NotFound(channel_id))?;
        let config = channel
            .config
            .ok_or(NotificationError::UnusableChannel(channel_id))?;
        debug!(channel_id, channel_type = %channel.channel_type, "Sending test notification.");
        let message = AlertMessage::test(None, self.clock.now());
        self.send(&config, &message).await
    }
}
