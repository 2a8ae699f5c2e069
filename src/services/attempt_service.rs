use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::test_attempt::TestAttempt;

/// Everything the recorder persists for one attempt slot.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub student_id: Uuid,
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
}

#[derive(Clone)]
pub struct AttemptService {
    pool: PgPool,
}

impl AttemptService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts the row for (student, test, attempt_number) and returns its id.
    ///
    /// Repeating the call with the same key rewrites the row in place, so a
    /// retried request never trips the unique constraint. A slot owned by a
    /// different assignment (or by a plain result, for retest writes) is left
    /// untouched and reported as a conflict.
    #[tracing::instrument(
        skip(conn, attempt, now),
        fields(
            student_id = %attempt.student_id,
            test_id = %attempt.test_id,
            attempt_number = attempt.attempt_number
        )
    )]
    pub async fn record_attempt(
        conn: &mut PgConnection,
        attempt: &NewAttempt,
        now: DateTime<Utc>,
    ) -> Result<Uuid> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"
            INSERT INTO test_attempts (
                student_id, test_id, test_name, teacher_id, subject_id, attempt_number,
                score, max_score, percentage, answers, answers_by_id, question_order,
                started_at, submitted_at, time_taken, caught_cheating, visibility_change_times,
                is_completed, retest_assignment_id, created_at, updated_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6,
                $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17,
                $18, $19, $20, $20
            )
            ON CONFLICT ON CONSTRAINT test_attempts_student_test_attempt_key DO UPDATE SET
                test_name = EXCLUDED.test_name,
                score = EXCLUDED.score,
                max_score = EXCLUDED.max_score,
                percentage = EXCLUDED.percentage,
                answers = EXCLUDED.answers,
                answers_by_id = EXCLUDED.answers_by_id,
                question_order = EXCLUDED.question_order,
                started_at = EXCLUDED.started_at,
                submitted_at = EXCLUDED.submitted_at,
                time_taken = EXCLUDED.time_taken,
                caught_cheating = EXCLUDED.caught_cheating,
                visibility_change_times = EXCLUDED.visibility_change_times,
                is_completed = EXCLUDED.is_completed,
                updated_at = EXCLUDED.updated_at
            WHERE test_attempts.retest_assignment_id IS NOT DISTINCT FROM EXCLUDED.retest_assignment_id
            RETURNING id
            "#,
        )
        .bind(attempt.student_id)
        .bind(attempt.test_id)
        .bind(&attempt.test_name)
        .bind(attempt.teacher_id)
        .bind(attempt.subject_id)
        .bind(attempt.attempt_number)
        .bind(attempt.score)
        .bind(attempt.max_score)
        .bind(attempt.percentage)
        .bind(&attempt.answers)
        .bind(&attempt.answers_by_id)
        .bind(&attempt.question_order)
        .bind(attempt.started_at)
        .bind(attempt.submitted_at)
        .bind(attempt.time_taken)
        .bind(attempt.caught_cheating)
        .bind(attempt.visibility_change_times)
        .bind(attempt.is_completed)
        .bind(attempt.retest_assignment_id)
        .bind(now)
        .fetch_optional(&mut *conn)
        .await?;

        match id {
            Some(id) => {
                tracing::debug!(%id, "attempt recorded");
                Ok(id)
            }
            None => Err(Error::ConcurrencyConflict(format!(
                "Attempt slot {} for this test is owned by another submission",
                attempt.attempt_number
            ))),
        }
    }

    pub async fn list_for_assignment(&self, retest_assignment_id: Uuid) -> Result<Vec<TestAttempt>> {
        let rows = sqlx::query_as::<_, TestAttempt>(
            r#"
            SELECT * FROM test_attempts
            WHERE retest_assignment_id = $1
            ORDER BY student_id, attempt_number
            "#,
        )
        .bind(retest_assignment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_for_student_test(
        &self,
        student_id: Uuid,
        test_id: Uuid,
    ) -> Result<Vec<TestAttempt>> {
        let rows = sqlx::query_as::<_, TestAttempt>(
            r#"
            SELECT * FROM test_attempts
            WHERE student_id = $1 AND test_id = $2
            ORDER BY attempt_number
            "#,
        )
        .bind(student_id)
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
