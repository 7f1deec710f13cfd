use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, sea_query::OnConflict,
};
use std::sync::Arc;
use tracing::debug;

use crate::alerting::stores::{ChannelStore, StoreError};
use crate::db::entities::{alert_channel, alert_rule_channel};
use crate::notifications::models::{AlertChannel, ChannelConfig};

/// Channel registry: resolves the channels bound to a rule and owns the
/// (type, config) deduplication of channel rows.
#[derive(Clone)]
pub struct ChannelService {
    db: Arc<DatabaseConnection>,
}

impl ChannelService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list_channels(&self) -> Result<Vec<AlertChannel>, StoreError> {
        let models = alert_channel::Entity::find()
            .order_by_asc(alert_channel::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(models.into_iter().map(decode_channel).collect())
    }
}

/// Decodes `config_json` into the typed configuration for the row's type.
pub fn decode_channel(model: alert_channel::Model) -> AlertChannel {
    let config = match ChannelConfig::decode(&model.channel_type, &model.config_json) {
        Ok(config) => Some(config),
        Err(e) => {
            debug!(
                channel_id = model.id,
                channel_type = %model.channel_type,
                error = %e,
                "Channel configuration is unusable."
            );
            None
        }
    };
    AlertChannel {
        id: model.id,
        name: model.name,
        channel_type: model.channel_type,
        enabled: model.enabled,
        config,
    }
}

/// Returns the id of the channel with exactly this configuration, creating
/// it if needed. The unique (type, config) index makes concurrent callers
/// converge on one row.
pub async fn find_or_create_channel<C: ConnectionTrait>(
    db: &C,
    config: &ChannelConfig,
    name: &str,
) -> Result<i32, StoreError> {
    let channel_type = config.channel_type();
    let config_json = config.encode()?;

    if let Some(existing) = find_by_config(db, channel_type, &config_json).await? {
        return Ok(existing.id);
    }

    let now = Utc::now();
    let new_channel = alert_channel::ActiveModel {
        channel_type: Set(channel_type.to_string()),
        name: Set(name.to_string()),
        config_json: Set(config_json.clone()),
        enabled: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    alert_channel::Entity::insert(new_channel)
        .on_conflict(
            OnConflict::columns([
                alert_channel::Column::ChannelType,
                alert_channel::Column::ConfigJson,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    let channel = find_by_config(db, channel_type, &config_json)
        .await?
        .ok_or_else(|| {
            StoreError::Database(sea_orm::DbErr::RecordNotFound(format!(
                "{channel_type} channel vanished after insert"
            )))
        })?;
    Ok(channel.id)
}

async fn find_by_config<C: ConnectionTrait>(
    db: &C,
    channel_type: &str,
    config_json: &str,
) -> Result<Option<alert_channel::Model>, StoreError> {
    Ok(alert_channel::Entity::find()
        .filter(alert_channel::Column::ChannelType.eq(channel_type))
        .filter(alert_channel::Column::ConfigJson.eq(config_json))
        .one(db)
        .await?)
}

/// Enables or disables a channel for every rule bound to it.
pub async fn set_channel_enabled<C: ConnectionTrait>(
    db: &C,
    channel_id: i32,
    enabled: bool,
) -> Result<Option<AlertChannel>, StoreError> {
    let Some(model) = alert_channel::Entity::find_by_id(channel_id).one(db).await? else {
        return Ok(None);
    };
    let mut active: alert_channel::ActiveModel = model.into();
    active.enabled = Set(enabled);
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;
    Ok(Some(decode_channel(updated)))
}

#[async_trait]
impl ChannelStore for ChannelService {
    async fn get_channels_for_rule(&self, rule_id: i32) -> Result<Vec<AlertChannel>, StoreError> {
        let models = alert_channel::Entity::find()
            .join(
                JoinType::InnerJoin,
                alert_channel::Relation::AlertRuleChannel.def(),
            )
            .filter(alert_rule_channel::Column::RuleId.eq(rule_id))
            .filter(alert_channel::Column::Enabled.eq(true))
            .order_by_asc(alert_channel::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(models.into_iter().map(decode_channel).collect())
    }

    async fn get_by_id(&self, channel_id: i32) -> Result<Option<AlertChannel>, StoreError> {
        let model = alert_channel::Entity::find_by_id(channel_id)
            .one(&*self.db)
            .await?;
        Ok(model.map(decode_channel))
    }
}
