use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::retest_dto::{BestResultsResponse, CreateRetestRequest, CreateRetestResponse};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::AppState;

/// `POST /api/teacher/retests`
#[axum::debug_handler]
pub async fn create_retest(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: std::result::Result<Json<CreateRetestRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(req) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;
    req.validate()?;
    let teacher_id = claims.user_id()?;

    let (assignment, targets_created) = state
        .retest_service
        .create_assignment(teacher_id, req)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateRetestResponse {
            success: true,
            assignment,
            targets_created,
        }),
    ))
}

/// `GET /api/teacher/retests/:id`
pub async fn get_retest(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let detail = state
        .retest_service
        .get_detail(id, claims.user_id()?, claims.is_admin())
        .await?;
    Ok(Json(detail))
}

/// `GET /api/teacher/retests/:id/best-results`
pub async fn get_best_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let assignment = state
        .retest_service
        .get_assignment_for_viewer(id, claims.user_id()?, claims.is_admin())
        .await?;
    let results = state
        .best_score_service
        .list_for_assignment(assignment.id)
        .await?;
    Ok(Json(BestResultsResponse {
        retest_assignment_id: assignment.id,
        results,
    }))
}

/// `GET /api/student/retests`
pub async fn list_my_retests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let retests = state
        .retest_service
        .list_for_student(claims.user_id()?, Utc::now())
        .await?;
    Ok(Json(retests))
}
