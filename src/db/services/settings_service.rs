use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, Set, sea_query::OnConflict};
use std::sync::Arc;

use crate::alerting::stores::{SettingsStore, StoreError};
use crate::db::entities::setting;

pub const ALERTS_ENABLED_KEY: &str = "alerts_enabled";

#[derive(Clone)]
pub struct SettingsService {
    db: Arc<DatabaseConnection>,
}

impl SettingsService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Retrieves a setting by its key.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = setting::Entity::find_by_id(key.to_owned())
            .one(&*self.db)
            .await?;
        Ok(row.map(|s| s.value))
    }

    /// Creates or updates a setting.
    pub async fn update_setting(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let row = setting::ActiveModel {
            key: Set(key.to_owned()),
            value: Set(value.to_owned()),
            updated_at: Set(Utc::now()),
        };
        setting::Entity::insert(row)
            .on_conflict(
                OnConflict::column(setting::Column::Key)
                    .update_columns([setting::Column::Value, setting::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(&*self.db)
            .await?;
        Ok(())
    }

    pub async fn set_alerts_enabled(&self, enabled: bool) -> Result<(), StoreError> {
        self.update_setting(ALERTS_ENABLED_KEY, if enabled { "1" } else { "0" })
            .await
    }
}

/// Interprets a stored flag. Anything that is not an explicit "off" counts as on.
pub fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    )
}

#[async_trait]
impl SettingsStore for SettingsService {
    async fn is_alerts_enabled(&self) -> Result<bool, StoreError> {
        Ok(self
            .get_setting(ALERTS_ENABLED_KEY)
            .await?
            .as_deref()
            .is_none_or(parse_flag))
    }
}
