use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveInput {
    /// Attempts consumed so far according to the retest target.
    pub current_attempt: i32,
    pub max_attempts: i32,
    /// Highest attempt_number already stored for the student and parent test.
    pub max_stored: Option<i32>,
    pub passed: bool,
}

/// Picks the attempt_number the recorder writes.
///
/// Failing attempts take the larger of the two counters so a stale target or a
/// stored row from an earlier request never gets overwritten. A passing attempt
/// jumps to the final slot, but still never below the next free stored number.
pub fn resolve_attempt_number(input: ResolveInput) -> i32 {
    let next_from_target = input.current_attempt + 1;
    let next_from_store = input.max_stored.unwrap_or(0) + 1;

    if input.passed {
        input.max_attempts.max(next_from_store)
    } else {
        next_from_store.max(next_from_target)
    }
}

/// Highest slot stored for the pair across every row: the plain original
/// result and rows of any assignment on the same test. Retest rows land above
/// all of them; the target counter, not the slot, drives eligibility.
pub async fn max_stored_attempt_number(
    conn: &mut PgConnection,
    student_id: Uuid,
    parent_test_id: Uuid,
) -> Result<Option<i32>> {
    let max: Option<i32> = sqlx::query_scalar(
        r#"SELECT MAX(attempt_number) FROM test_attempts WHERE student_id = $1 AND test_id = $2"#,
    )
    .bind(student_id)
    .bind(parent_test_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(max)
}
