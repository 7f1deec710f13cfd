//! Read/write seams the evaluator depends on.
//!
//! The SeaORM services under `crate::db::services` implement these traits in
//! production; tests substitute in-memory doubles.

use async_trait::async_trait;
use sea_orm::DbErr;
use thiserror::Error;

use super::models::ActiveRule;
use crate::notifications::models::AlertChannel;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Enabled rules whose parent alert is also enabled and which target
    /// `server_id`, ordered by rule id.
    async fn get_active_rules_for_server(&self, server_id: i32)
    -> Result<Vec<ActiveRule>, StoreError>;
}

#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// Enabled channels bound to `rule_id`, ordered by channel id.
    async fn get_channels_for_rule(&self, rule_id: i32) -> Result<Vec<AlertChannel>, StoreError>;

    async fn get_by_id(&self, channel_id: i32) -> Result<Option<AlertChannel>, StoreError>;
}

#[async_trait]
pub trait CooldownStore: Send + Sync {
    async fn can_send(
        &self,
        rule_id: i32,
        server_id: i32,
        cooldown_seconds: i64,
    ) -> Result<bool, StoreError>;

    async fn mark_sent(&self, rule_id: i32, server_id: i32, value: f64) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Global kill switch; unset means enabled.
    async fn is_alerts_enabled(&self) -> Result<bool, StoreError>;
}
