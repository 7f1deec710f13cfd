use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::Serialize;
use std::time::Duration;

use super::{NotificationSender, SenderError};
use crate::notifications::message::{AlertMessage, Embed};
use crate::notifications::models::ChannelConfig;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY: usize = 2048;

/// A sender for pushing alerts to Discord-compatible webhooks.
pub struct DiscordSender {
    client: Client,
}

impl DiscordSender {
    pub fn new(timeout: Duration) -> Result<Self, SenderError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Posts `message` to `webhook_url`. Success is exactly `204 No Content`.
    pub async fn post(&self, webhook_url: &str, message: &AlertMessage) -> Result<(), SenderError> {
        let payload = WebhookPayload::from_message(message)?;
        let body = serde_json::to_vec(&payload)?;

        let response = self
            .client
            .post(webhook_url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::NO_CONTENT {
            return Ok(());
        }

        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read error body".to_string());
        Err(classify_response(status.as_u16(), truncate(error_body)))
    }
}

#[async_trait]
impl NotificationSender for DiscordSender {
    async fn send(
        &self,
        config: &ChannelConfig,
        message: &AlertMessage,
    ) -> Result<(), SenderError> {
        let ChannelConfig::Discord(discord) = config;
        if discord.webhook.trim().is_empty() {
            return Err(SenderError::InvalidConfiguration(
                "Discord channel has no webhook URL".to_string(),
            ));
        }
        self.post(&discord.webhook, message).await
    }
}

/// Maps a non-204 webhook response onto the error taxonomy.
pub fn classify_response(status: u16, body: String) -> SenderError {
    match status {
        401 | 403 => SenderError::InvalidCredential { status, body },
        404 => SenderError::NotFound { status, body },
        s if s >= 500 => SenderError::RemoteServer { status, body },
        _ => SenderError::Rejected { status, body },
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}

#[derive(Serialize, Debug)]
struct WebhookPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allowed_mentions: Option<AllowedMentions>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<EmbedPayload<'a>>,
}

#[derive(Serialize, Debug)]
struct AllowedMentions {
    parse: [&'static str; 3],
}

#[derive(Serialize, Debug)]
struct EmbedPayload<'a> {
    title: &'a str,
    description: Option<&'a str>,
    color: u32,
    fields: Vec<FieldPayload<'a>>,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    footer: Option<FooterPayload<'a>>,
}

#[derive(Serialize, Debug)]
struct FieldPayload<'a> {
    name: &'a str,
    value: &'a str,
    inline: bool,
}

#[derive(Serialize, Debug)]
struct FooterPayload<'a> {
    text: &'a str,
}

impl<'a> WebhookPayload<'a> {
    fn from_message(message: &'a AlertMessage) -> Result<Self, SenderError> {
        if message.is_empty() {
            return Err(SenderError::EmptyPayload);
        }

        let content = message.content.as_deref().filter(|c| !c.is_empty());
        Ok(Self {
            content,
            allowed_mentions: content.map(|_| AllowedMentions {
                parse: ["roles", "users", "everyone"],
            }),
            embeds: message.embed.iter().map(EmbedPayload::from_embed).collect(),
        })
    }
}

impl<'a> EmbedPayload<'a> {
    fn from_embed(embed: &'a Embed) -> Self {
        Self {
            title: &embed.title,
            description: embed.description.as_deref(),
            color: embed.color & 0x00FF_FFFF,
            fields: embed
                .fields
                .iter()
                .map(|f| FieldPayload {
                    name: &f.name,
                    value: &f.value,
                    inline: f.inline,
                })
                .collect(),
            timestamp: embed.timestamp.to_rfc3339(),
            footer: embed.footer.as_deref().map(|text| FooterPayload { text }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::message::EmbedField;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn card() -> Embed {
        Embed {
            title: "CPU alert on web-01".into(),
            description: None,
            color: 0xE74C3C,
            fields: vec![EmbedField {
                name: "Value".into(),
                value: "95".into(),
                inline: true,
            }],
            footer: Some("fleetwatch".into()),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn payload_with_mentions_allows_them() {
        let message = AlertMessage {
            content: Some("<@&1>".into()),
            embed: Some(card()),
        };
        let value = serde_json::to_value(WebhookPayload::from_message(&message).unwrap()).unwrap();

        assert_eq!(value["content"], "<@&1>");
        assert_eq!(
            value["allowed_mentions"],
            json!({"parse": ["roles", "users", "everyone"]})
        );
        assert_eq!(value["embeds"][0]["title"], "CPU alert on web-01");
        assert_eq!(value["embeds"][0]["description"], serde_json::Value::Null);
        assert_eq!(value["embeds"][0]["color"], 0xE74C3C);
        assert_eq!(
            value["embeds"][0]["fields"][0],
            json!({"name": "Value", "value": "95", "inline": true})
        );
        assert_eq!(value["embeds"][0]["footer"], json!({"text": "fleetwatch"}));
        assert_eq!(value["embeds"][0]["timestamp"], "2026-01-02T03:04:05+00:00");
    }

    #[test]
    fn payload_without_mentions_omits_content() {
        let message = AlertMessage {
            content: None,
            embed: Some(card()),
        };
        let value = serde_json::to_value(WebhookPayload::from_message(&message).unwrap()).unwrap();
        assert!(value.get("content").is_none());
        assert!(value.get("allowed_mentions").is_none());
    }

    #[test]
    fn empty_message_fails_fast() {
        let message = AlertMessage {
            content: None,
            embed: None,
        };
        assert!(matches!(
            WebhookPayload::from_message(&message),
            Err(SenderError::EmptyPayload)
        ));
    }

    #[test]
    fn statuses_are_classified() {
        let classify = |status| classify_response(status, String::new());
        assert!(matches!(classify(401), SenderError::InvalidCredential { status: 401, .. }));
        assert!(matches!(classify(403), SenderError::InvalidCredential { status: 403, .. }));
        assert!(matches!(classify(404), SenderError::NotFound { .. }));
        assert!(matches!(classify(502), SenderError::RemoteServer { status: 502, .. }));
        assert!(matches!(classify(429), SenderError::Rejected { status: 429, .. }));
        assert!(matches!(classify(200), SenderError::Rejected { status: 200, .. }));
    }

    #[test]
    fn permanence_follows_classification() {
        assert!(classify_response(401, String::new()).is_permanent());
        assert!(classify_response(404, String::new()).is_permanent());
        assert!(!classify_response(503, String::new()).is_permanent());
        assert!(!classify_response(400, String::new()).is_permanent());
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = truncate("é".repeat(MAX_ERROR_BODY));
        assert!(body.len() <= MAX_ERROR_BODY + 3);
        assert!(body.ends_with("..."));
    }
}
