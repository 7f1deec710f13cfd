//! Data access for the alerting tables. Each service owns one concern and
//! implements the matching store trait from `crate::alerting::stores` where
//! the evaluator reads through it.

pub mod alert_service;
pub mod channel_service;
pub mod cooldown_service;
pub mod rule_service;
pub mod settings_service;

pub use alert_service::AlertService;
pub use channel_service::ChannelService;
pub use cooldown_service::CooldownService;
pub use rule_service::RuleService;
pub use settings_service::SettingsService;
