use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

use crate::models::retest_target::RetestStatus;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitAttemptRequest {
    pub test_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "test_name must not be empty"))]
    pub test_name: String,
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
    #[validate(range(min = 0.0, max = 99_999_999.99, message = "score must be between 0 and 99999999.99"))]
    pub score: f64,
    #[serde(rename = "maxScore")]
    #[validate(range(min = 0.0, max = 99_999_999.99, message = "maxScore must be between 0 and 99999999.99"))]
    pub max_score: f64,
    pub answers: JsonValue,
    #[serde(default)]
    pub retest_assignment_id: Option<Uuid>,
    #[serde(default)]
    pub parent_test_id: Option<Uuid>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub time_taken: Option<i32>,
    #[serde(default)]
    pub caught_cheating: Option<bool>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub visibility_change_times: Option<i32>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub answers_by_id: Option<JsonValue>,
    #[serde(default)]
    pub question_order: Option<JsonValue>,
}

impl SubmitAttemptRequest {
    /// Rules spanning several fields, checked after the derived ones.
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.answers.is_null() {
            return Err("answers is required".to_string());
        }
        if self.max_score > 0.0 && self.score > self.max_score {
            return Err("score must not exceed maxScore".to_string());
        }
        if let (Some(started), Some(submitted)) = (self.started_at, self.submitted_at) {
            if submitted < started {
                return Err("submitted_at must not be before started_at".to_string());
            }
        }
        if self.parent_test_id.is_some() && self.retest_assignment_id.is_none() {
            return Err("parent_test_id is only valid with retest_assignment_id".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetestProgress {
    pub retest_assignment_id: Uuid,
    pub attempt_number: i32,
    pub max_attempts: i32,
    pub remaining_attempts: i32,
    pub status: RetestStatus,
    pub is_completed: bool,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAttemptResponse {
    pub success: bool,
    pub result_id: Uuid,
    pub score: f64,
    pub max_score: f64,
    pub percentage_score: f64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retest: Option<RetestProgress>,
}
