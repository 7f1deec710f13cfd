use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use std::sync::Arc;

use crate::db::services::channel_service;
use crate::notifications::models::TestWebhookRequest;
use crate::web::{
    AppError, AppState,
    models::{ChannelResponse, alert_models::UpdateStatusRequest},
};

pub fn create_channel_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_channels))
        .route("/test", post(test_webhook))
        .route("/{id}/status", put(update_channel_status))
        .route("/{id}/test", post(test_channel))
}

async fn list_channels(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<ChannelResponse>>, AppError> {
    let channels = app_state.channel_service.list_channels().await?;
    Ok(Json(channels.into_iter().map(ChannelResponse::from).collect()))
}

async fn update_channel_status(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<ChannelResponse>, AppError> {
    let channel = channel_service::set_channel_enabled(&*app_state.db, id, payload.enabled)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Channel {id} not found")))?;
    Ok(Json(channel.into()))
}

// Handler to send a test message to a webhook URL that has not been saved yet
async fn test_webhook(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<TestWebhookRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    app_state
        .notification_service
        .test_webhook(&payload.webhook, payload.mentions.as_deref())
        .await?;
    Ok(Json(serde_json::json!({ "message": "Test message sent." })))
}

// Handler to send a test message through a saved channel
async fn test_channel(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    app_state.notification_service.test_channel(id).await?;
    Ok(Json(serde_json::json!({ "message": "Test message sent." })))
}
