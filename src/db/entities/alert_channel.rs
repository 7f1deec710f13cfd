use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "alert_channels")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub channel_type: String, // e.g. "discord"
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub config_json: String, // {"webhook": "..."} for discord
    pub enabled: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::alert_rule_channel::Entity")]
    AlertRuleChannel,
}

impl Related<super::alert_rule_channel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertRuleChannel.def()
    }
}

// AlertChannel -> AlertRuleChannel -> AlertRule
impl Related<super::alert_rule::Entity> for Entity {
    fn to() -> RelationDef {
        super::alert_rule_channel::Relation::AlertRule.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::alert_rule_channel::Relation::AlertChannel.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
