use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "alert_rules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub alert_id: i32,
    pub metric: String,              // one of cpu, ram, disk, network
    pub operator: String,            // one of >, >=, <, <=
    pub threshold: f64,
    pub cooldown_seconds: i32,
    pub enabled: bool,
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,       // "#RRGGBB"
    pub mentions: Option<String>,    // role ids, @here or @everyone
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::alert::Entity",
        from = "Column::AlertId",
        to = "super::alert::Column::Id",
        on_delete = "Cascade",
        on_update = "Cascade"
    )]
    Alert,
    #[sea_orm(has_many = "super::alert_rule_target::Entity")]
    AlertRuleTarget,
    #[sea_orm(has_many = "super::alert_rule_channel::Entity")]
    AlertRuleChannel,
    #[sea_orm(has_many = "super::alert_state::Entity")]
    AlertState,
}

impl Related<super::alert::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Alert.def()
    }
}

impl Related<super::alert_rule_target::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertRuleTarget.def()
    }
}

impl Related<super::alert_state::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertState.def()
    }
}

// Rule -> AlertRuleChannel -> AlertChannel
impl Related<super::alert_channel::Entity> for Entity {
    fn to() -> RelationDef {
        super::alert_rule_channel::Relation::AlertChannel.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::alert_rule_channel::Relation::AlertRule.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
