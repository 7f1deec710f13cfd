use async_trait::async_trait;
use thiserror::Error;

use super::message::AlertMessage;
use super::models::ChannelConfig;

pub mod discord;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("Nothing to send: message has neither content nor embed")]
    EmptyPayload,
    #[error("Failed to encode payload: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid configuration for sender: {0}")]
    InvalidConfiguration(String),
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Webhook credential invalid or revoked (HTTP {status}): {body}")]
    InvalidCredential { status: u16, body: String },
    #[error("Webhook not found (HTTP {status}): {body}")]
    NotFound { status: u16, body: String },
    #[error("Remote service error (HTTP {status}): {body}")]
    RemoteServer { status: u16, body: String },
    #[error("Webhook rejected the message (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

impl SenderError {
    /// HTTP status returned by the destination, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::InvalidCredential { status, .. }
            | Self::NotFound { status, .. }
            | Self::RemoteServer { status, .. }
            | Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Errors that will not go away until an operator fixes the configuration.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::EmptyPayload
                | Self::Serialization(_)
                | Self::InvalidConfiguration(_)
                | Self::InvalidCredential { .. }
                | Self::NotFound { .. }
        )
    }

    /// Short machine-readable tag for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyPayload => "empty_payload",
            Self::Serialization(_) => "serialization",
            Self::InvalidConfiguration(_) => "invalid_configuration",
            Self::Transport(_) => "transport",
            Self::InvalidCredential { .. } => "invalid_credential",
            Self::NotFound { .. } => "not_found",
            Self::RemoteServer { .. } => "remote_server",
            Self::Rejected { .. } => "rejected",
        }
    }
}

/// A trait for delivering one alert to one destination of a given channel type.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Sends a single alert.
    ///
    /// # Arguments
    ///
    /// * `config` - The decoded configuration for this channel.
    /// * `message` - The alert to deliver.
    async fn send(&self, config: &ChannelConfig, message: &AlertMessage)
    -> Result<(), SenderError>;
}
