use axum::{Json, Router, extract::State, routing::get};
use std::sync::Arc;
use tracing::info;

use crate::alerting::stores::SettingsStore;
use crate::web::{AppError, AppState, models::AlertsEnabledPayload};

// Mounted under /api/settings
pub fn create_settings_router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/alerts-enabled",
        get(get_alerts_enabled).put(update_alerts_enabled),
    )
}

async fn get_alerts_enabled(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<AlertsEnabledPayload>, AppError> {
    let enabled = app_state.settings_service.is_alerts_enabled().await?;
    Ok(Json(AlertsEnabledPayload { enabled }))
}

async fn update_alerts_enabled(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<AlertsEnabledPayload>,
) -> Result<Json<AlertsEnabledPayload>, AppError> {
    app_state
        .settings_service
        .set_alerts_enabled(payload.enabled)
        .await?;
    info!(enabled = payload.enabled, "Global alerting switch updated.");
    Ok(Json(payload))
}
