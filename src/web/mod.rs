use axum::{Router, http::Method, routing::get};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::alerting::evaluation_service::EvaluationService;
use crate::db::services::{AlertService, ChannelService, CooldownService, SettingsService};
use crate::notifications::service::NotificationService;
use crate::web::routes::*;

pub use error::AppError;

pub mod error;
pub mod models;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub evaluation_service: Arc<EvaluationService>,
    pub notification_service: Arc<NotificationService>,
    pub alert_service: Arc<AlertService>,
    pub channel_service: Arc<ChannelService>,
    pub cooldown_service: Arc<CooldownService>,
    pub settings_service: Arc<SettingsService>,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check_handler))
        .nest("/api/report", report_routes::create_report_router())
        .nest("/api/alerts", alert_routes::create_alert_router())
        .nest("/api/alert-rules", alert_routes::create_alert_rule_router())
        .nest(
            "/api/alert-channels",
            notification_routes::create_channel_router(),
        )
        .nest("/api/settings", settings_routes::create_settings_router())
        .layer(cors)
        .with_state(app_state)
}
