use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};
use std::sync::Arc;
use tracing::debug;

use crate::alerting::models::{ActiveRule, ComparisonOperator, MetricKind};
use crate::alerting::stores::{RuleStore, StoreError};
use crate::db::entities::{alert, alert_rule, alert_rule_target};
use crate::notifications::message::parse_color;

/// Read side of the rule tables, feeding the evaluator.
#[derive(Clone)]
pub struct RuleService {
    db: Arc<DatabaseConnection>,
}

impl RuleService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Rows where both the rule and its parent alert are enabled and the rule
    /// targets `server_id`.
    pub async fn find_active_rule_models(
        &self,
        server_id: i32,
    ) -> Result<Vec<alert_rule::Model>, StoreError> {
        let rules = alert_rule::Entity::find()
            .join(JoinType::InnerJoin, alert_rule::Relation::Alert.def())
            .join(JoinType::InnerJoin, alert_rule::Relation::AlertRuleTarget.def())
            .filter(alert_rule::Column::Enabled.eq(true))
            .filter(alert::Column::Enabled.eq(true))
            .filter(alert_rule_target::Column::ServerId.eq(server_id))
            .order_by_asc(alert_rule::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(rules)
    }
}

/// Decodes a stored rule, dropping it when metric or operator are unknown.
pub fn decode_rule(model: alert_rule::Model) -> Option<ActiveRule> {
    let Some(metric) = MetricKind::parse(&model.metric) else {
        debug!(rule_id = model.id, metric = %model.metric, "Skipping rule with unknown metric.");
        return None;
    };
    let Some(operator) = ComparisonOperator::parse(&model.operator) else {
        debug!(
            rule_id = model.id,
            operator = %model.operator,
            "Skipping rule with unknown operator."
        );
        return None;
    };

    Some(ActiveRule {
        id: model.id,
        alert_id: model.alert_id,
        metric,
        operator,
        threshold: model.threshold,
        cooldown_seconds: i64::from(model.cooldown_seconds.max(0)),
        color: model.color.as_deref().and_then(parse_color),
        title: model.title,
        description: model.description,
        mentions: model.mentions,
    })
}

#[async_trait]
impl RuleStore for RuleService {
    async fn get_active_rules_for_server(
        &self,
        server_id: i32,
    ) -> Result<Vec<ActiveRule>, StoreError> {
        let models = self.find_active_rule_models(server_id).await?;
        Ok(models.into_iter().filter_map(decode_rule).collect())
    }
}
