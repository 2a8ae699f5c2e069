pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod telemetry;

use crate::services::{
    best_score_service::BestScoreService, retest_service::RetestService,
    submission_service::SubmissionService,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub submission_service: SubmissionService,
    pub retest_service: RetestService,
    pub best_score_service: BestScoreService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let submission_service = SubmissionService::new(pool.clone());
        let retest_service = RetestService::new(pool.clone());
        let best_score_service = BestScoreService::new(pool.clone());

        Self {
            pool,
            submission_service,
            retest_service,
            best_score_service,
        }
    }
}

/// Full HTTP surface. Role guards sit on the route groups, so handlers can
/// rely on `Extension<Claims>` being present.
pub fn app(state: AppState) -> Router {
    let student_api = Router::new()
        .route(
            "/api/student/submissions",
            post(routes::submission::submit_attempt),
        )
        .route("/api/student/retests", get(routes::retest::list_my_retests))
        .route_layer(axum::middleware::from_fn(
            crate::middleware::auth::require_student,
        ));

    let teacher_api = Router::new()
        .route("/api/teacher/retests", post(routes::retest::create_retest))
        .route("/api/teacher/retests/:id", get(routes::retest::get_retest))
        .route(
            "/api/teacher/retests/:id/best-results",
            get(routes::retest::get_best_results),
        )
        .route_layer(axum::middleware::from_fn(
            crate::middleware::auth::require_teacher,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(student_api)
        .merge(teacher_api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
