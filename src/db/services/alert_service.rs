use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::channel_service::find_or_create_channel;
use crate::alerting::models::{ComparisonOperator, MetricKind};
use crate::db::entities::{alert, alert_rule, alert_rule_channel, alert_rule_target, alert_state};
use crate::notifications::message::parse_color;
use crate::notifications::models::ChannelConfig;
use crate::web::error::AppError;
use crate::web::models::alert_models::{
    AlertResponse, AlertRuleResponse, CreateAlertRequest, SaveRuleRequest, UpdateAlertRequest,
};

pub const DEFAULT_COOLDOWN_SECONDS: i32 = 300;

/// Write side of the alert tables, used by the settings pages.
#[derive(Clone)]
pub struct AlertService {
    db: Arc<DatabaseConnection>,
}

/// A rule form that passed validation.
#[derive(Debug, Clone, PartialEq)]
struct ValidatedRule {
    metric: MetricKind,
    operator: ComparisonOperator,
    threshold: f64,
    cooldown_seconds: i32,
    title: Option<String>,
    description: Option<String>,
    color: Option<String>,
    mentions: Option<String>,
    server_ids: BTreeSet<i32>,
    webhook: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_rule(form: SaveRuleRequest) -> Result<ValidatedRule, AppError> {
    let metric = MetricKind::parse(&form.metric)
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown metric: {}", form.metric)))?;
    let operator = ComparisonOperator::parse(&form.operator)
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown operator: {}", form.operator)))?;
    if !form.threshold.is_finite() {
        return Err(AppError::InvalidInput("Threshold must be a finite number".to_string()));
    }
    let cooldown_seconds = form.cooldown_seconds.unwrap_or(DEFAULT_COOLDOWN_SECONDS);
    if cooldown_seconds < 0 {
        return Err(AppError::InvalidInput("Cooldown must not be negative".to_string()));
    }
    let color = non_empty(form.color);
    if let Some(c) = &color {
        if parse_color(c).is_none() {
            return Err(AppError::InvalidInput(format!("Color must look like #RRGGBB, got {c}")));
        }
    }
    if let Some(bad) = form.server_ids.iter().find(|id| **id <= 0) {
        return Err(AppError::InvalidInput(format!("Invalid server id: {bad}")));
    }

    Ok(ValidatedRule {
        metric,
        operator,
        threshold: form.threshold,
        cooldown_seconds,
        title: non_empty(form.title),
        description: non_empty(form.description),
        color,
        mentions: non_empty(form.mentions),
        server_ids: form.server_ids.into_iter().collect(),
        webhook: non_empty(form.webhook),
    })
}

impl AlertService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn create_alert(
        &self,
        payload: CreateAlertRequest,
    ) -> Result<AlertResponse, AppError> {
        let title = payload.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::InvalidInput("Alert title is required".to_string()));
        }
        let now = Utc::now();
        let model = alert::ActiveModel {
            title: Set(title),
            description: Set(non_empty(payload.description)),
            enabled: Set(payload.enabled.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;
        Ok(AlertResponse::from_model(model, Vec::new()))
    }

    pub async fn list_alerts(&self) -> Result<Vec<AlertResponse>, AppError> {
        let alerts = alert::Entity::find()
            .order_by_asc(alert::Column::Id)
            .all(&*self.db)
            .await?;
        let mut responses = Vec::with_capacity(alerts.len());
        for model in alerts {
            let rules = self.rules_for_alert(model.id).await?;
            responses.push(AlertResponse::from_model(model, rules));
        }
        Ok(responses)
    }

    pub async fn get_alert(&self, alert_id: i32) -> Result<AlertResponse, AppError> {
        let model = self.find_alert(&*self.db, alert_id).await?;
        let rules = self.rules_for_alert(alert_id).await?;
        Ok(AlertResponse::from_model(model, rules))
    }

    pub async fn update_alert(
        &self,
        alert_id: i32,
        payload: UpdateAlertRequest,
    ) -> Result<AlertResponse, AppError> {
        let mut active = self.find_alert(&*self.db, alert_id).await?.into_active_model();
        if let Some(title) = payload.title {
            let title = title.trim().to_string();
            if title.is_empty() {
                return Err(AppError::InvalidInput("Alert title is required".to_string()));
            }
            active.title = Set(title);
        }
        if payload.description.is_some() {
            active.description = Set(non_empty(payload.description));
        }
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;
        self.get_alert(alert_id).await
    }

    pub async fn set_alert_enabled(
        &self,
        alert_id: i32,
        enabled: bool,
    ) -> Result<AlertResponse, AppError> {
        let mut active = self.find_alert(&*self.db, alert_id).await?.into_active_model();
        active.enabled = Set(enabled);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;
        self.get_alert(alert_id).await
    }

    /// Deletes an alert together with its rules, their targets, channel
    /// bindings and cooldown rows.
    pub async fn delete_alert(&self, alert_id: i32) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        self.find_alert(&txn, alert_id).await?;

        let rule_ids: Vec<i32> = alert_rule::Entity::find()
            .filter(alert_rule::Column::AlertId.eq(alert_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        delete_rule_children(&txn, &rule_ids).await?;
        alert_rule::Entity::delete_many()
            .filter(alert_rule::Column::AlertId.eq(alert_id))
            .exec(&txn)
            .await?;
        alert::Entity::delete_by_id(alert_id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Creates (`rule_id = None`) or updates a rule from the settings form.
    ///
    /// Saving always re-enables the rule; targets and the channel binding are
    /// deleted and reinserted rather than diffed.
    pub async fn save_rule(
        &self,
        alert_id: i32,
        rule_id: Option<i32>,
        form: SaveRuleRequest,
    ) -> Result<AlertRuleResponse, AppError> {
        let rule = validate_rule(form)?;
        let txn = self.db.begin().await?;
        self.find_alert(&txn, alert_id).await?;

        let now = Utc::now();
        let mut active = match rule_id {
            Some(id) => {
                let existing = alert_rule::Entity::find_by_id(id)
                    .filter(alert_rule::Column::AlertId.eq(alert_id))
                    .one(&txn)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Alert rule {id} not found")))?;
                existing.into_active_model()
            }
            None => alert_rule::ActiveModel {
                alert_id: Set(alert_id),
                created_at: Set(now),
                ..Default::default()
            },
        };
        active.metric = Set(rule.metric.as_str().to_string());
        active.operator = Set(rule.operator.as_str().to_string());
        active.threshold = Set(rule.threshold);
        active.cooldown_seconds = Set(rule.cooldown_seconds);
        active.enabled = Set(true);
        active.title = Set(rule.title.clone());
        active.description = Set(rule.description.clone());
        active.color = Set(rule.color.clone());
        active.mentions = Set(rule.mentions.clone());
        active.updated_at = Set(now);

        let saved = match rule_id {
            Some(_) => active.update(&txn).await?,
            None => active.insert(&txn).await?,
        };

        alert_rule_target::Entity::delete_many()
            .filter(alert_rule_target::Column::RuleId.eq(saved.id))
            .exec(&txn)
            .await?;
        if !rule.server_ids.is_empty() {
            alert_rule_target::Entity::insert_many(rule.server_ids.iter().map(|server_id| {
                alert_rule_target::ActiveModel {
                    rule_id: Set(saved.id),
                    server_id: Set(*server_id),
                }
            }))
            .exec_without_returning(&txn)
            .await?;
        }

        alert_rule_channel::Entity::delete_many()
            .filter(alert_rule_channel::Column::RuleId.eq(saved.id))
            .exec(&txn)
            .await?;
        if let Some(webhook) = &rule.webhook {
            let config = ChannelConfig::discord(webhook.clone());
            let channel_id = find_or_create_channel(&txn, &config, "Discord").await?;
            alert_rule_channel::ActiveModel {
                rule_id: Set(saved.id),
                channel_id: Set(channel_id),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        self.get_rule(saved.id).await
    }

    pub async fn get_rule(&self, rule_id: i32) -> Result<AlertRuleResponse, AppError> {
        let model = alert_rule::Entity::find_by_id(rule_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Alert rule {rule_id} not found")))?;
        self.rule_response(model).await
    }

    pub async fn set_rule_enabled(
        &self,
        rule_id: i32,
        enabled: bool,
    ) -> Result<AlertRuleResponse, AppError> {
        let model = alert_rule::Entity::find_by_id(rule_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Alert rule {rule_id} not found")))?;
        let mut active = model.into_active_model();
        active.enabled = Set(enabled);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;
        self.rule_response(updated).await
    }

    pub async fn delete_rule(&self, rule_id: i32) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        delete_rule_children(&txn, &[rule_id]).await?;
        let result = alert_rule::Entity::delete_by_id(rule_id).exec(&txn).await?;
        if result.rows_affected == 0 {
            txn.rollback().await?;
            return Err(AppError::NotFound(format!("Alert rule {rule_id} not found")));
        }
        txn.commit().await?;
        Ok(())
    }

    async fn find_alert<C: ConnectionTrait>(
        &self,
        db: &C,
        alert_id: i32,
    ) -> Result<alert::Model, AppError> {
        alert::Entity::find_by_id(alert_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Alert {alert_id} not found")))
    }

    async fn rules_for_alert(&self, alert_id: i32) -> Result<Vec<AlertRuleResponse>, AppError> {
        let models = alert_rule::Entity::find()
            .filter(alert_rule::Column::AlertId.eq(alert_id))
            .order_by_asc(alert_rule::Column::Id)
            .all(&*self.db)
            .await?;
        let mut rules = Vec::with_capacity(models.len());
        for model in models {
            rules.push(self.rule_response(model).await?);
        }
        Ok(rules)
    }

    async fn rule_response(&self, model: alert_rule::Model) -> Result<AlertRuleResponse, AppError> {
        let server_ids = alert_rule_target::Entity::find()
            .filter(alert_rule_target::Column::RuleId.eq(model.id))
            .order_by_asc(alert_rule_target::Column::ServerId)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|t| t.server_id)
            .collect();
        let channel_ids = alert_rule_channel::Entity::find()
            .filter(alert_rule_channel::Column::RuleId.eq(model.id))
            .order_by_asc(alert_rule_channel::Column::ChannelId)
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|c| c.channel_id)
            .collect();
        Ok(AlertRuleResponse::from_model(model, server_ids, channel_ids))
    }
}

async fn delete_rule_children<C: ConnectionTrait>(
    db: &C,
    rule_ids: &[i32],
) -> Result<(), AppError> {
    if rule_ids.is_empty() {
        return Ok(());
    }
    let ids = rule_ids.to_vec();
    alert_state::Entity::delete_many()
        .filter(alert_state::Column::RuleId.is_in(ids.clone()))
        .exec(db)
        .await?;
    alert_rule_channel::Entity::delete_many()
        .filter(alert_rule_channel::Column::RuleId.is_in(ids.clone()))
        .exec(db)
        .await?;
    alert_rule_target::Entity::delete_many()
        .filter(alert_rule_target::Column::RuleId.is_in(ids))
        .exec(db)
        .await?;
    Ok(())
}
