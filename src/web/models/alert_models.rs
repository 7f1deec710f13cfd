use serde::{Deserialize, Serialize};

use crate::db::entities::{alert, alert_rule};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    pub title: String,
    pub description: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAlertRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub enabled: bool,
}

/// Settings form for one rule. Saving replaces the target server set and the
/// channel binding wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRuleRequest {
    pub metric: String,
    pub operator: String,
    pub threshold: f64,
    pub cooldown_seconds: Option<i32>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub mentions: Option<String>,
    #[serde(default)]
    pub server_ids: Vec<i32>,
    /// Discord webhook URL; empty or missing unbinds the rule.
    pub webhook: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertRuleResponse {
    pub id: i32,
    pub alert_id: i32,
    pub metric: String,
    pub operator: String,
    pub threshold: f64,
    pub cooldown_seconds: i32,
    pub enabled: bool,
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub mentions: Option<String>,
    pub server_ids: Vec<i32>,
    pub channel_ids: Vec<i32>,
}

impl AlertRuleResponse {
    pub fn from_model(
        model: alert_rule::Model,
        server_ids: Vec<i32>,
        channel_ids: Vec<i32>,
    ) -> Self {
        Self {
            id: model.id,
            alert_id: model.alert_id,
            metric: model.metric,
            operator: model.operator,
            threshold: model.threshold,
            cooldown_seconds: model.cooldown_seconds,
            enabled: model.enabled,
            title: model.title,
            description: model.description,
            color: model.color,
            mentions: model.mentions,
            server_ids,
            channel_ids,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertResponse {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub rules: Vec<AlertRuleResponse>,
}

impl AlertResponse {
    pub fn from_model(model: alert::Model, rules: Vec<AlertRuleResponse>) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            enabled: model.enabled,
            rules,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStateResponse {
    pub rule_id: i32,
    pub server_id: i32,
    pub last_sent_at: i64,
    pub last_value: f64,
}
