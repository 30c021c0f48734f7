//! JSON control API
//!
//! ## Endpoints
//! - GET  /api/status  - Snapshot of pool, daemons and cache
//! - POST /api/setup   - Save settings, regenerate, start
//! - POST /api/restart - Regenerate from saved settings, restart
//! - POST /api/stop    - Stop the pool process
//!
//! Refused requests answer 400 with `{ok:false, errors}`, failures while
//! carrying them out answer 500 with the same shape.

#![forbid(unsafe_code)]

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use poolwarden_core::PoolSettings;
use tracing::{error, info};

use crate::controller::{OperationOutcome, OrchestrationController};
use crate::errors::Result;
use crate::probe::StatusProbes;
use crate::status::StatusSnapshot;

type Shared<P> = Arc<OrchestrationController<P>>;

/// Creates the control API router.
pub fn router<P>(controller: Shared<P>) -> Router
where
    P: StatusProbes + 'static,
{
    Router::new()
        .route("/api/status", get(status::<P>))
        .route("/api/setup", post(setup::<P>))
        .route("/api/restart", post(restart::<P>))
        .route("/api/stop", post(stop::<P>))
        .with_state(controller)
}

async fn status<P: StatusProbes + 'static>(State(controller): State<Shared<P>>) -> Json<StatusSnapshot> {
    Json(controller.status().await)
}

async fn setup<P: StatusProbes + 'static>(
    State(controller): State<Shared<P>>,
    body: std::result::Result<Json<PoolSettings>, JsonRejection>,
) -> Response {
    info!("POST /api/setup");
    let settings = match body {
        Ok(Json(settings)) => settings,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(OperationOutcome::rejected(vec![rejection.body_text()])),
            )
                .into_response();
        }
    };
    respond(controller.setup(settings).await)
}

async fn restart<P: StatusProbes + 'static>(State(controller): State<Shared<P>>) -> Response {
    info!("POST /api/restart");
    respond(controller.restart().await)
}

async fn stop<P: StatusProbes + 'static>(State(controller): State<Shared<P>>) -> Json<OperationOutcome> {
    info!("POST /api/stop");
    Json(controller.stop().await)
}

fn respond(result: Result<OperationOutcome>) -> Response {
    match result {
        Ok(outcome) if outcome.ok => (StatusCode::OK, Json(outcome)).into_response(),
        Ok(outcome) => (StatusCode::BAD_REQUEST, Json(outcome)).into_response(),
        Err(e) => {
            error!(error = %e, "operation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(OperationOutcome::rejected(vec![e.to_string()]))).into_response()
        }
    }
}
