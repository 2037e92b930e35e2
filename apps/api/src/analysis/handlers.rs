use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::analysis::AnalysisReport;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct JobAnalysisRequest {
    pub job_post: Option<String>,
}

/// POST /api/v1/job-analysis
/// Runs the six-section analysis against the configured providers.
pub async fn handle_job_analysis(
    State(state): State<AppState>,
    body: Result<Json<JobAnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisReport>, AppError> {
    // An absent or undecodable body counts as a missing job post.
    let job_post = body
        .map_err(|rejection| warn!("Rejected job analysis body: {rejection}"))
        .ok()
        .and_then(|Json(req)| req.job_post)
        .ok_or_else(|| AppError::Validation("Job post is required".to_string()))?;

    info!(
        chars = job_post.chars().count(),
        embedding_model = state.analyzer.embedding_model(),
        inference_model = state.analyzer.inference_model(),
        "Analyzing job post"
    );

    let report = state.analyzer.analyze(&job_post).await?;
    Ok(Json(report))
}
