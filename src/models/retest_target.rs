use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "retest_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetestStatus {
    InProgress,
    Passed,
    Failed,
}

impl RetestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RetestStatus::InProgress)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RetestTarget {
    pub retest_assignment_id: Uuid,
    pub student_id: Uuid,
    pub attempt_number: i32,
    pub attempt_count: i32,
    pub max_attempts: Option<i32>,
    pub is_completed: bool,
    pub passed: bool,
    pub status: RetestStatus,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A target row joined with the assignment it belongs to. This is what the
/// submission path locks and reasons about.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TargetWithAssignment {
    pub retest_assignment_id: Uuid,
    pub student_id: Uuid,
    pub attempt_number: i32,
    pub target_max_attempts: Option<i32>,
    pub is_completed: bool,
    pub passed: bool,
    pub status: RetestStatus,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub teacher_id: Uuid,
    pub test_type: String,
    pub original_test_id: Uuid,
    pub subject_id: Uuid,
    pub passing_threshold: Decimal,
    pub scoring_policy: String,
    pub assignment_max_attempts: i32,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

impl TargetWithAssignment {
    /// Per-student override first, assignment value otherwise.
    pub fn effective_max_attempts(&self) -> i32 {
        self.target_max_attempts
            .unwrap_or(self.assignment_max_attempts)
            .max(1)
    }

    /// The window is inclusive on both ends.
    pub fn window_contains(&self, now: DateTime<Utc>) -> bool {
        self.window_start <= now && now <= self.window_end
    }

    pub fn remaining_attempts(&self) -> i32 {
        (self.effective_max_attempts() - self.attempt_number).max(0)
    }
}

/// Column list matching [`TargetWithAssignment`]; the query must alias the
/// target as `t` and the assignment as `a`.
pub const TARGET_WITH_ASSIGNMENT_COLUMNS: &str = r#"
    t.retest_assignment_id, t.student_id, t.attempt_number,
    t.max_attempts AS target_max_attempts,
    t.is_completed, t.passed, t.status, t.last_attempt_at, t.completed_at,
    a.teacher_id, a.test_type, a.original_test_id, a.subject_id,
    a.passing_threshold, a.scoring_policy,
    a.max_attempts AS assignment_max_attempts,
    a.window_start, a.window_end
"#;
