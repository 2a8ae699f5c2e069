use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use chrono::Utc;
use validator::Validate;

use crate::dto::submission_dto::{SubmitAttemptRequest, SubmitAttemptResponse};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::AppState;

/// `POST /api/student/submissions`
#[axum::debug_handler]
pub async fn submit_attempt(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: std::result::Result<Json<SubmitAttemptRequest>, JsonRejection>,
) -> Result<Json<SubmitAttemptResponse>> {
    let Json(req) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;
    req.validate()?;
    let student_id = claims.user_id()?;

    tracing::info!(
        %student_id,
        test_id = %req.test_id,
        retest_assignment_id = ?req.retest_assignment_id,
        "submission received"
    );

    let outcome = state
        .submission_service
        .submit(student_id, req, Utc::now())
        .await?;
    Ok(Json(outcome.into_response()))
}
