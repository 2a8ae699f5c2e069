use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::retest_target::RetestStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetestTransition {
    pub attempt_number: i32,
    pub passed: bool,
    pub is_completed: bool,
    pub status: RetestStatus,
}

/// Next target state after an attempt that did (or did not) pass.
///
/// A pass consumes every remaining attempt, so the counter reads
/// `max_attempts` and the target completes as PASSED. A fail advances the
/// counter by one and completes as FAILED once the counter reaches the limit.
pub fn next_state(current_attempt: i32, max_attempts: i32, passed: bool) -> RetestTransition {
    let attempt_number = if passed {
        max_attempts
    } else {
        current_attempt + 1
    };
    let exhausted = attempt_number >= max_attempts;
    let status = if passed {
        RetestStatus::Passed
    } else if exhausted {
        RetestStatus::Failed
    } else {
        RetestStatus::InProgress
    };

    RetestTransition {
        attempt_number,
        passed,
        is_completed: passed || exhausted,
        status,
    }
}

/// Writes `transition` to the target. The row must still be open; a completed
/// or missing target affects no rows and is reported as a conflict.
#[tracing::instrument(skip(conn, transition), fields(status = ?transition.status))]
pub async fn apply_transition(
    conn: &mut PgConnection,
    retest_assignment_id: Uuid,
    student_id: Uuid,
    transition: &RetestTransition,
    now: DateTime<Utc>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE retest_targets
        SET attempt_number = $3,
            last_attempt_at = $4,
            passed = $5,
            is_completed = $6,
            completed_at = CASE WHEN completed_at IS NULL AND $6 THEN $4 ELSE completed_at END,
            status = $7,
            updated_at = $4
        WHERE retest_assignment_id = $1
          AND student_id = $2
          AND is_completed = FALSE
        "#,
    )
    .bind(retest_assignment_id)
    .bind(student_id)
    .bind(transition.attempt_number)
    .bind(now)
    .bind(transition.passed)
    .bind(transition.is_completed)
    .bind(transition.status)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        tracing::warn!(
            %retest_assignment_id,
            %student_id,
            "retest target update matched no open row"
        );
        return Err(Error::ConcurrencyConflict(
            "Retest target was completed or removed by another request".to_string(),
        ));
    }

    tracing::info!(
        %retest_assignment_id,
        %student_id,
        attempt_number = transition.attempt_number,
        completed = transition.is_completed,
        "retest target updated"
    );
    Ok(())
}
