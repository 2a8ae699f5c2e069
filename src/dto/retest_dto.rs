use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::best_retest_result::BestRetestResult;
use crate::models::retest_assignment::{RetestAssignment, ScoringPolicy};
use crate::models::retest_target::{RetestStatus, RetestTarget};
use crate::models::test_attempt::TestAttempt;

fn default_passing_threshold() -> f64 {
    50.0
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRetestRequest {
    #[validate(length(min = 1, max = 64))]
    pub test_type: String,
    pub original_test_id: Uuid,
    pub subject_id: Uuid,
    #[serde(default = "default_passing_threshold")]
    #[validate(range(min = 0.0, max = 100.0, message = "passing_threshold must be between 0 and 100"))]
    pub passing_threshold: f64,
    #[serde(default)]
    pub scoring_policy: ScoringPolicy,
    #[validate(range(min = 1, max = 100, message = "max_attempts must be at least 1"))]
    pub max_attempts: i32,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    #[validate(length(min = 1, message = "at least one student is required"))]
    pub student_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateRetestResponse {
    pub success: bool,
    pub assignment: RetestAssignment,
    pub targets_created: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetestAssignmentDetail {
    pub assignment: RetestAssignment,
    pub targets: Vec<RetestTarget>,
    pub attempts: Vec<TestAttempt>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BestResultsResponse {
    pub retest_assignment_id: Uuid,
    pub results: Vec<BestRetestResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentRetestSummary {
    pub retest_assignment_id: Uuid,
    pub original_test_id: Uuid,
    pub subject_id: Uuid,
    pub test_type: String,
    pub passing_threshold: Decimal,
    pub max_attempts: i32,
    pub attempt_number: i32,
    pub remaining_attempts: i32,
    pub status: RetestStatus,
    pub is_completed: bool,
    pub passed: bool,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub eligible: bool,
    pub ineligible_reason: Option<&'static str>,
}
