use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, sea_query::OnConflict,
};
use std::sync::Arc;

use crate::alerting::clock::Clock;
use crate::alerting::stores::{CooldownStore, StoreError};
use crate::db::entities::alert_state;

/// Cooldown ledger over `alert_states`.
#[derive(Clone)]
pub struct CooldownService {
    db: Arc<DatabaseConnection>,
    clock: Arc<dyn Clock>,
}

impl CooldownService {
    pub fn new(db: Arc<DatabaseConnection>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    pub async fn get_state(
        &self,
        rule_id: i32,
        server_id: i32,
    ) -> Result<Option<alert_state::Model>, StoreError> {
        Ok(alert_state::Entity::find_by_id((rule_id, server_id))
            .one(&*self.db)
            .await?)
    }

    pub async fn states_for_rule(
        &self,
        rule_id: i32,
    ) -> Result<Vec<alert_state::Model>, StoreError> {
        Ok(alert_state::Entity::find()
            .filter(alert_state::Column::RuleId.eq(rule_id))
            .all(&*self.db)
            .await?)
    }

    /// Forgets the last send so the next match notifies immediately.
    /// Returns whether a row existed.
    pub async fn reset(&self, rule_id: i32, server_id: i32) -> Result<bool, StoreError> {
        let result = alert_state::Entity::delete_by_id((rule_id, server_id))
            .exec(&*self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl CooldownStore for CooldownService {
    async fn can_send(
        &self,
        rule_id: i32,
        server_id: i32,
        cooldown_seconds: i64,
    ) -> Result<bool, StoreError> {
        let Some(state) = self.get_state(rule_id, server_id).await? else {
            return Ok(true);
        };
        let elapsed = self.clock.unix_now() - state.last_sent_at;
        Ok(elapsed >= cooldown_seconds.max(0))
    }

    async fn mark_sent(&self, rule_id: i32, server_id: i32, value: f64) -> Result<(), StoreError> {
        let row = alert_state::ActiveModel {
            rule_id: Set(rule_id),
            server_id: Set(server_id),
            last_sent_at: Set(self.clock.unix_now()),
            last_value: Set(value),
        };
        alert_state::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([alert_state::Column::RuleId, alert_state::Column::ServerId])
                    .update_columns([
                        alert_state::Column::LastSentAt,
                        alert_state::Column::LastValue,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;
        Ok(())
    }
}
