use serde::{Deserialize, Serialize};

use crate::notifications::models::{AlertChannel, ChannelConfig};

pub mod alert_models;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsEnabledPayload {
    pub enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAccepted {
    pub accepted: bool,
    pub server_id: i32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResponse {
    pub id: i32,
    pub name: String,
    pub channel_type: String,
    pub enabled: bool,
    /// False when the stored configuration cannot be used for delivery.
    pub configured: bool,
    pub webhook: Option<String>,
}

impl From<AlertChannel> for ChannelResponse {
    fn from(channel: AlertChannel) -> Self {
        let webhook = match &channel.config {
            Some(ChannelConfig::Discord(discord)) => Some(discord.webhook.clone()),
            None => None,
        };
        Self {
            id: channel.id,
            name: channel.name,
            channel_type: channel.channel_type,
            enabled: channel.enabled,
            configured: channel.config.is_some(),
            webhook,
        }
    }
}
