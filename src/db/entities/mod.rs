//! SeaORM entities for the alerting tables.

pub mod alert;
pub mod alert_channel;
pub mod alert_rule;
pub mod alert_rule_channel;
pub mod alert_rule_target;
pub mod alert_state;
pub mod setting;
