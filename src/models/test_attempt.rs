use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TestAttempt {
    pub id: Uuid,
    pub student_id: Uuid,
    /// Parent test id for retest attempts, the test itself otherwise.
    pub test_id: Uuid,
    pub test_name: String,
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
    pub attempt_number: i32,
    pub score: Decimal,
    pub max_score: Decimal,
    pub percentage: Decimal,
    pub answers: JsonValue,
    pub answers_by_id: Option<JsonValue>,
    pub question_order: Option<JsonValue>,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub time_taken: Option<i32>,
    pub caught_cheating: bool,
    pub visibility_change_times: i32,
    pub is_completed: bool,
    pub retest_assignment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
