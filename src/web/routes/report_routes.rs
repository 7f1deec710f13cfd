use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use std::sync::Arc;
use tracing::debug;

use crate::alerting::models::MetricsReport;
use crate::web::{AppState, models::ReportAccepted};

pub fn create_report_router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(receive_report))
}

// The agent is acknowledged before any rule is evaluated; evaluation
// failures are logged by the spawned task and never reach the agent.
async fn receive_report(
    State(app_state): State<Arc<AppState>>,
    Json(report): Json<MetricsReport>,
) -> (StatusCode, Json<ReportAccepted>) {
    let server_id = report.server_id;
    debug!(server_id, metrics = report.metrics.len(), "Metrics report received.");
    app_state.evaluation_service.spawn_evaluation(report);
    (
        StatusCode::ACCEPTED,
        Json(ReportAccepted {
            accepted: true,
            server_id,
        }),
    )
}
