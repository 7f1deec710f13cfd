use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use std::sync::Arc;

use crate::web::{
    AppError, AppState,
    models::alert_models::{
        AlertResponse, AlertRuleResponse, AlertStateResponse, CreateAlertRequest,
        SaveRuleRequest, UpdateAlertRequest, UpdateStatusRequest,
    },
};

pub fn create_alert_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_alerts).post(create_alert))
        .route(
            "/{id}",
            get(get_alert).put(update_alert).delete(delete_alert),
        )
        .route("/{id}/status", put(update_alert_status))
        .route("/{id}/rules", post(create_rule))
}

pub fn create_alert_rule_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/{id}", get(get_rule).put(update_rule).delete(delete_rule))
        .route("/{id}/status", put(update_rule_status))
        .route("/{id}/states", get(list_rule_states))
        .route("/{id}/state/{server_id}", delete(reset_rule_state))
}

async fn list_alerts(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<AlertResponse>>, AppError> {
    Ok(Json(app_state.alert_service.list_alerts().await?))
}

async fn create_alert(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateAlertRequest>,
) -> Result<(StatusCode, Json<AlertResponse>), AppError> {
    let alert = app_state.alert_service.create_alert(payload).await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

async fn get_alert(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<AlertResponse>, AppError> {
    Ok(Json(app_state.alert_service.get_alert(id).await?))
}

async fn update_alert(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateAlertRequest>,
) -> Result<Json<AlertResponse>, AppError> {
    Ok(Json(app_state.alert_service.update_alert(id, payload).await?))
}

async fn delete_alert(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    app_state.alert_service.delete_alert(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_alert_status(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<AlertResponse>, AppError> {
    Ok(Json(
        app_state
            .alert_service
            .set_alert_enabled(id, payload.enabled)
            .await?,
    ))
}

async fn create_rule(
    State(app_state): State<Arc<AppState>>,
    Path(alert_id): Path<i32>,
    Json(payload): Json<SaveRuleRequest>,
) -> Result<(StatusCode, Json<AlertRuleResponse>), AppError> {
    let rule = app_state
        .alert_service
        .save_rule(alert_id, None, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

async fn get_rule(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<AlertRuleResponse>, AppError> {
    Ok(Json(app_state.alert_service.get_rule(id).await?))
}

async fn update_rule(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<SaveRuleRequest>,
) -> Result<Json<AlertRuleResponse>, AppError> {
    let existing = app_state.alert_service.get_rule(id).await?;
    let rule = app_state
        .alert_service
        .save_rule(existing.alert_id, Some(id), payload)
        .await?;
    Ok(Json(rule))
}

async fn delete_rule(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    app_state.alert_service.delete_rule(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_rule_status(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<AlertRuleResponse>, AppError> {
    Ok(Json(
        app_state
            .alert_service
            .set_rule_enabled(id, payload.enabled)
            .await?,
    ))
}

async fn list_rule_states(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<AlertStateResponse>>, AppError> {
    let states = app_state
        .cooldown_service
        .states_for_rule(id)
        .await?
        .into_iter()
        .map(|s| AlertStateResponse {
            rule_id: s.rule_id,
            server_id: s.server_id,
            last_sent_at: s.last_sent_at,
            last_value: s.last_value,
        })
        .collect();
    Ok(Json(states))
}

async fn reset_rule_state(
    State(app_state): State<Arc<AppState>>,
    Path((id, server_id)): Path<(i32, i32)>,
) -> Result<StatusCode, AppError> {
    if app_state.cooldown_service.reset(id, server_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "No cooldown state for rule {id} on server {server_id}"
        )))
    }
}
