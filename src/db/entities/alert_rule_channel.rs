use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "alert_rule_channels")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub rule_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub channel_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::alert_rule::Entity",
        from = "Column::RuleId",
        to = "super::alert_rule::Column::Id",
        on_delete = "Cascade",
        on_update = "Cascade"
    )]
    AlertRule,
    #[sea_orm(
        belongs_to = "super::alert_channel::Entity",
        from = "Column::ChannelId",
        to = "super::alert_channel::Column::Id",
        on_delete = "Cascade",
        on_update = "Cascade"
    )]
    AlertChannel,
}

impl Related<super::alert_rule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertRule.def()
    }
}

impl Related<super::alert_channel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AlertChannel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
