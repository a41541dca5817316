//! Axum front end for the admin form.
//!
//! - `POST /api/create-md`: decode the JSON submission and run the publishing workflow
//! - `GET /health`: liveness probe

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use folio_publish_core::contract::{ContentStore, ImageEncoder};
use folio_publish_core::error::{PublishError, PublishErrorKind, PublishStage};
use folio_publish_core::publish::{CommitReport, Publisher};
use folio_publish_core::submission::SubmissionPayload;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::load_config::ServerSettings;

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub status: &'static str,
    pub files: Vec<String>,
    #[serde(rename = "assetsPath")]
    pub assets_path: String,
}

impl From<CommitReport> for SuccessResponse {
    fn from(report: CommitReport) -> Self {
        Self {
            status: "success",
            files: report.created_files,
            assets_path: report.assets_path,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<PublishStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

/// HTTP status for a failed publish.
pub fn status_for(err: &PublishError) -> StatusCode {
    match &err.kind {
        PublishErrorKind::Validation(_) => StatusCode::BAD_REQUEST,
        PublishErrorKind::Decode(_) if err.stage == PublishStage::Validating => {
            StatusCode::BAD_REQUEST
        }
        PublishErrorKind::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PublishErrorKind::Store(_) | PublishErrorKind::DirectoryMissing { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn publish_error_response(err: PublishError) -> Response {
    let body = ErrorResponse {
        error: err.summary(),
        details: err.details(),
        stage: Some(err.stage),
        index: err.index,
    };
    (status_for(&err), Json(body)).into_response()
}

/// Builds the application router around a shared publisher.
pub fn create_router<S, E>(publisher: Arc<Publisher<S, E>>, settings: &ServerSettings) -> Router
where
    S: ContentStore + 'static,
    E: ImageEncoder + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/create-md", post(create_md::<S, E>))
        .layer(DefaultBodyLimit::max(settings.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(publisher)
}

/// Serves `router` on the configured address until the process is stopped.
pub async fn serve(router: Router, settings: &ServerSettings) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(settings.bind).await?;
    info!(bind = %settings.bind, "Listening for submissions");
    axum::serve(listener, router).await?;
    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

/// POST /api/create-md
async fn create_md<S, E>(
    State(publisher): State<Arc<Publisher<S, E>>>,
    payload: Result<Json<SubmissionPayload>, JsonRejection>,
) -> Response
where
    S: ContentStore + 'static,
    E: ImageEncoder + 'static,
{
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            error!(error = %rejection, "Rejected malformed submission body");
            let body = ErrorResponse {
                error: "Invalid request body".to_string(),
                details: Some(rejection.body_text()),
                stage: None,
                index: None,
            };
            return (rejection.status(), Json(body)).into_response();
        }
    };
    info!(
        category = %payload.category,
        images = payload.images.len(),
        tags = payload.tags.len(),
        "Received submission"
    );

    let submission = match payload.into_submission() {
        Ok(submission) => submission,
        Err(e) => return publish_error_response(e),
    };

    match publisher.publish(&submission).await {
        Ok(report) => (StatusCode::OK, Json(SuccessResponse::from(report))).into_response(),
        Err(e) => {
            error!(error = %e, stage = %e.stage, index = ?e.index, "Submission failed");
            publish_error_response(e)
        }
    }
}
