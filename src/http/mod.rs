use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::error::Result;
use crate::scheduler::{JobRegistry, Task};

#[derive(Clone)]
pub struct HttpState {
    pub registry: Arc<JobRegistry>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}

/// Routes exposed to clients: `POST /add` and `GET /get`.
pub fn router(state: HttpState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/add", post(add_job_handler))
        .route("/get", get(list_jobs_handler))
        .layer(cors)
        .with_state(state)
}

/// Serve the API on `addr` until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn run_server(
    addr: SocketAddr,
    state: HttpState,
    shutdown: CancellationToken,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Starting HTTP server");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!("HTTP server shut down");
    Ok(())
}

async fn add_job_handler(
    State(state): State<HttpState>,
    payload: std::result::Result<Json<Task>, JsonRejection>,
) -> Response {
    let task = match payload {
        Ok(Json(task)) => task,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected malformed task");
            return bad_request(rejection.body_text());
        }
    };

    if let Err(e) = task.validate() {
        tracing::debug!(error = %e, "Rejected invalid task");
        return bad_request(e.to_string());
    }

    let job = state.registry.submit(task).await;
    (StatusCode::OK, Json(job)).into_response()
}

async fn list_jobs_handler(State(state): State<HttpState>) -> impl IntoResponse {
    Json(state.registry.list().await)
}
