use chrono::{DateTime, Utc};

use super::mentions::parse_mentions;
use crate::alerting::models::{ActiveRule, MetricsReport};

pub const DEFAULT_ALERT_COLOR: u32 = 0xE7_4C_3C;
pub const TEST_MESSAGE_COLOR: u32 = 0x34_98_DB;
const FOOTER_PREFIX: &str = "fleetwatch";

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    fn inline(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            inline: true,
        }
    }
}

/// A single alert card.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub title: String,
    pub description: Option<String>,
    /// 24-bit RGB.
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Channel-agnostic alert: optional mention content plus an optional card.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertMessage {
    pub content: Option<String>,
    pub embed: Option<Embed>,
}

impl AlertMessage {
    pub fn for_rule(
        rule: &ActiveRule,
        report: &MetricsReport,
        value: f64,
        now: DateTime<Utc>,
    ) -> Self {
        let title = rule
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} alert on {}", rule.metric.label(), report.hostname));
        let description = rule
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        let ip = if report.ip.is_empty() {
            "unknown".to_string()
        } else {
            report.ip.clone()
        };

        let embed = Embed {
            title,
            description,
            color: rule.color.unwrap_or(DEFAULT_ALERT_COLOR),
            fields: vec![
                EmbedField::inline("Server", report.hostname.clone()),
                EmbedField::inline("IP", ip),
                EmbedField::inline("Metric", rule.metric.label()),
                EmbedField::inline("Value", format_value(value, rule.threshold)),
                EmbedField::inline(
                    "Threshold",
                    format!("{} {}", rule.operator, format_number(rule.threshold)),
                ),
            ],
            footer: Some(format!("{FOOTER_PREFIX} · rule #{}", rule.id)),
            timestamp: now,
        };

        Self {
            content: rule.mentions.as_deref().and_then(parse_mentions),
            embed: Some(embed),
        }
    }

    /// The message sent by the settings page "test webhook" button.
    pub fn test(mentions: Option<&str>, now: DateTime<Utc>) -> Self {
        Self {
            content: mentions.and_then(parse_mentions),
            embed: Some(Embed {
                title: "Test notification".to_string(),
                description: Some(
                    "This webhook is configured correctly and will receive fleetwatch alerts."
                        .to_string(),
                ),
                color: TEST_MESSAGE_COLOR,
                fields: Vec::new(),
                footer: Some(FOOTER_PREFIX.to_string()),
                timestamp: now,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.as_deref().is_none_or(str::is_empty) && self.embed.is_none()
    }
}

/// Parses a `#RRGGBB` color override into a 24-bit integer.
pub fn parse_color(raw: &str) -> Option<u32> {
    let hex = raw.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        trim_fixed(value, 2)
    }
}

/// Formats a reading so it never prints as equal to a threshold it differs
/// from: precision grows past two decimals until the two are distinguishable.
fn format_value(value: f64, threshold: f64) -> String {
    let shown = format_number(value);
    if value == threshold || shown != format_number(threshold) {
        return shown;
    }
    for decimals in 3..=6 {
        let shown = trim_fixed(value, decimals);
        if shown.parse::<f64>().ok() != Some(threshold) {
            return shown;
        }
    }
    value.to_string()
}

fn trim_fixed(value: f64, decimals: usize) -> String {
    let fixed = format!("{value:.decimals$}");
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}
