use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DISCORD_CHANNEL_TYPE: &str = "discord";

/// Typed configuration for a notification channel, decoded from the
/// schema-less `config_json` column at the data-access boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelConfig {
    Discord(DiscordConfig),
}

/// Stored as `{"webhook": "<url>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub webhook: String,
}

#[derive(Debug, Deserialize)]
struct RawDiscordConfig {
    #[serde(default)]
    webhook: Option<String>,
}

#[derive(Error, Debug)]
pub enum ChannelConfigError {
    #[error("Unsupported channel type: {0}")]
    UnsupportedType(String),
    #[error("Malformed channel configuration: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Channel configuration is missing `{0}`")]
    MissingField(&'static str),
}

impl ChannelConfig {
    pub fn discord(webhook: impl Into<String>) -> Self {
        Self::Discord(DiscordConfig {
            webhook: webhook.into(),
        })
    }

    pub fn channel_type(&self) -> &'static str {
        match self {
            Self::Discord(_) => DISCORD_CHANNEL_TYPE,
        }
    }

    pub fn decode(channel_type: &str, config_json: &str) -> Result<Self, ChannelConfigError> {
        match channel_type {
            DISCORD_CHANNEL_TYPE => {
                let raw: RawDiscordConfig = serde_json::from_str(config_json)?;
                let webhook = raw
                    .webhook
                    .map(|w| w.trim().to_string())
                    .filter(|w| !w.is_empty())
                    .ok_or(ChannelConfigError::MissingField("webhook"))?;
                Ok(Self::discord(webhook))
            }
            other => Err(ChannelConfigError::UnsupportedType(other.to_string())),
        }
    }

    /// Canonical JSON blob for storage. Channels are deduplicated on
    /// (type, blob), so the encoding must be stable.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Discord(config) => serde_json::to_string(config),
        }
    }
}

/// A notification channel row as seen by the evaluator. `config` is `None`
/// when the stored type is unknown or its configuration is unusable.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertChannel {
    pub id: i32,
    pub name: String,
    pub channel_type: String,
    pub enabled: bool,
    pub config: Option<ChannelConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestWebhookRequest {
    pub webhook: String,
    pub mentions: Option<String>,
}
