use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::Result;
use crate::models::retest_target::{TargetWithAssignment, TARGET_WITH_ASSIGNMENT_COLUMNS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EligibilityError {
    #[error("No retest is assigned to this student for the given assignment")]
    NotFound,
    #[error("The retest window is closed")]
    WindowClosed,
    #[error("This retest has already been completed")]
    AlreadyCompleted,
    #[error("Maximum number of retest attempts reached")]
    MaxAttemptsReached,
}

impl EligibilityError {
    pub fn code(&self) -> &'static str {
        match self {
            EligibilityError::NotFound => "retest_not_found",
            EligibilityError::WindowClosed => "retest_window_closed",
            EligibilityError::AlreadyCompleted => "retest_already_completed",
            EligibilityError::MaxAttemptsReached => "max_attempts_reached",
        }
    }
}

/// Decides whether one more attempt may be recorded against `record` at `now`.
pub fn check_eligibility(
    record: &TargetWithAssignment,
    now: DateTime<Utc>,
) -> std::result::Result<(), EligibilityError> {
    if !record.window_contains(now) {
        return Err(EligibilityError::WindowClosed);
    }
    if record.is_completed {
        return Err(EligibilityError::AlreadyCompleted);
    }
    if record.attempt_number >= record.effective_max_attempts() {
        return Err(EligibilityError::MaxAttemptsReached);
    }
    Ok(())
}

/// Loads the target joined with its assignment and holds a row lock on the
/// target until the surrounding transaction ends.
#[tracing::instrument(skip(conn))]
pub async fn load_target_for_update(
    conn: &mut PgConnection,
    retest_assignment_id: Uuid,
    student_id: Uuid,
) -> Result<TargetWithAssignment> {
    let sql = format!(
        r#"SELECT {}
           FROM retest_targets t
           JOIN retest_assignments a ON a.id = t.retest_assignment_id
           WHERE t.retest_assignment_id = $1 AND t.student_id = $2
           FOR UPDATE OF t"#,
        TARGET_WITH_ASSIGNMENT_COLUMNS
    );
    let record = sqlx::query_as::<_, TargetWithAssignment>(&sql)
        .bind(retest_assignment_id)
        .bind(student_id)
        .fetch_optional(&mut *conn)
        .await?;

    record.ok_or_else(|| EligibilityError::NotFound.into())
}

/// Locks the target, then runs [`check_eligibility`]. Nothing is written.
pub async fn check_locked(
    conn: &mut PgConnection,
    retest_assignment_id: Uuid,
    student_id: Uuid,
    now: DateTime<Utc>,
) -> Result<TargetWithAssignment> {
    let record = load_target_for_update(conn, retest_assignment_id, student_id).await?;
    if let Err(reason) = check_eligibility(&record, now) {
        tracing::warn!(
            %retest_assignment_id,
            %student_id,
            attempt_number = record.attempt_number,
            reason = reason.code(),
            "retest submission rejected"
        );
        return Err(reason.into());
    }
    Ok(record)
}
