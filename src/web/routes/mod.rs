pub mod alert_routes;
pub mod notification_routes;
pub mod report_routes;
pub mod settings_routes;
