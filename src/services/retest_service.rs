use chrono::{DateTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::dto::retest_dto::{CreateRetestRequest, RetestAssignmentDetail, StudentRetestSummary};
use crate::error::{Error, Result};
use crate::models::retest_assignment::RetestAssignment;
use crate::models::retest_target::{RetestTarget, TargetWithAssignment, TARGET_WITH_ASSIGNMENT_COLUMNS};
use crate::services::attempt_service::AttemptService;
use crate::services::audit_service::AuditService;
use crate::services::eligibility_service::check_eligibility;

#[derive(Clone)]
pub struct RetestService {
    pool: PgPool,
    attempts: AttemptService,
}

impl RetestService {
    pub fn new(pool: PgPool) -> Self {
        let attempts = AttemptService::new(pool.clone());
        Self { pool, attempts }
    }

    /// Creates the assignment and one fresh target per distinct student in a
    /// single transaction.
    #[tracing::instrument(skip(self, req), fields(original_test_id = %req.original_test_id))]
    pub async fn create_assignment(
        &self,
        teacher_id: Uuid,
        req: CreateRetestRequest,
    ) -> Result<(RetestAssignment, usize)> {
        if req.window_end < req.window_start {
            return Err(Error::BadRequest(
                "window_end must not be before window_start".to_string(),
            ));
        }
        let passing_threshold = Decimal::from_f64(req.passing_threshold)
            .ok_or_else(|| Error::BadRequest("Invalid passing_threshold".to_string()))?
            .round_dp(2);
        let students: BTreeSet<Uuid> = req.student_ids.iter().copied().collect();

        let mut tx = self.pool.begin().await?;

        let assignment = sqlx::query_as::<_, RetestAssignment>(
            r#"
            INSERT INTO retest_assignments (
                teacher_id, test_type, original_test_id, subject_id, passing_threshold,
                scoring_policy, max_attempts, window_start, window_end
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(teacher_id)
        .bind(req.test_type.trim())
        .bind(req.original_test_id)
        .bind(req.subject_id)
        .bind(passing_threshold)
        .bind(req.scoring_policy.as_str())
        .bind(req.max_attempts)
        .bind(req.window_start)
        .bind(req.window_end)
        .fetch_one(&mut *tx)
        .await?;

        for student_id in &students {
            sqlx::query(
                r#"
                INSERT INTO retest_targets (retest_assignment_id, student_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(assignment.id)
            .bind(student_id)
            .execute(&mut *tx)
            .await?;
        }

        AuditService::log(
            &mut tx,
            Some(teacher_id),
            "create_retest",
            "retest_assignment",
            assignment.id,
            Some(json!({
                "original_test_id": assignment.original_test_id,
                "max_attempts": assignment.max_attempts,
                "students": students.len(),
            })),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            retest_assignment_id = %assignment.id,
            students = students.len(),
            "retest assignment created"
        );
        Ok((assignment, students.len()))
    }

    pub async fn get_assignment(&self, id: Uuid) -> Result<RetestAssignment> {
        let assignment =
            sqlx::query_as::<_, RetestAssignment>(r#"SELECT * FROM retest_assignments WHERE id = $1"#)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        assignment.ok_or_else(|| Error::NotFound("Retest assignment not found".to_string()))
    }

    /// Only the owning teacher or an admin may read an assignment.
    pub async fn get_assignment_for_viewer(
        &self,
        id: Uuid,
        viewer_id: Uuid,
        viewer_is_admin: bool,
    ) -> Result<RetestAssignment> {
        let assignment = self.get_assignment(id).await?;
        if !viewer_is_admin && assignment.teacher_id != viewer_id {
            return Err(Error::Forbidden(
                "Retest assignment belongs to another teacher".to_string(),
            ));
        }
        Ok(assignment)
    }

    /// Assignment with all targets and attempts.
    pub async fn get_detail(
        &self,
        id: Uuid,
        viewer_id: Uuid,
        viewer_is_admin: bool,
    ) -> Result<RetestAssignmentDetail> {
        let assignment = self
            .get_assignment_for_viewer(id, viewer_id, viewer_is_admin)
            .await?;
        let targets = self.list_targets(id).await?;
        let attempts = self.attempts.list_for_assignment(id).await?;
        Ok(RetestAssignmentDetail {
            assignment,
            targets,
            attempts,
        })
    }

    pub async fn list_targets(&self, retest_assignment_id: Uuid) -> Result<Vec<RetestTarget>> {
        let rows = sqlx::query_as::<_, RetestTarget>(
            r#"
            SELECT * FROM retest_targets
            WHERE retest_assignment_id = $1
            ORDER BY student_id
            "#,
        )
        .bind(retest_assignment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_target(
        &self,
        retest_assignment_id: Uuid,
        student_id: Uuid,
    ) -> Result<RetestTarget> {
        let row = sqlx::query_as::<_, RetestTarget>(
            r#"SELECT * FROM retest_targets WHERE retest_assignment_id = $1 AND student_id = $2"#,
        )
        .bind(retest_assignment_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or_else(|| Error::NotFound("Retest target not found".to_string()))
    }

    /// Every retest assigned to the student, newest window first, with the
    /// result of the eligibility check at `now`.
    pub async fn list_for_student(
        &self,
        student_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<StudentRetestSummary>> {
        let sql = format!(
            r#"SELECT {}
               FROM retest_targets t
               JOIN retest_assignments a ON a.id = t.retest_assignment_id
               WHERE t.student_id = $1
               ORDER BY a.window_end DESC"#,
            TARGET_WITH_ASSIGNMENT_COLUMNS
        );
        let rows = sqlx::query_as::<_, TargetWithAssignment>(&sql)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|r| summarize(r, now)).collect())
    }
}

fn summarize(record: &TargetWithAssignment, now: DateTime<Utc>) -> StudentRetestSummary {
    let eligibility = check_eligibility(record, now);
    StudentRetestSummary {
        retest_assignment_id: record.retest_assignment_id,
        original_test_id: record.original_test_id,
        subject_id: record.subject_id,
        test_type: record.test_type.clone(),
        passing_threshold: record.passing_threshold,
        max_attempts: record.effective_max_attempts(),
        attempt_number: record.attempt_number,
        remaining_attempts: record.remaining_attempts(),
        status: record.status,
        is_completed: record.is_completed,
        passed: record.passed,
        window_start: record.window_start,
        window_end: record.window_end,
        completed_at: record.completed_at,
        eligible: eligibility.is_ok(),
        ineligible_reason: eligibility.err().map(|e| e.code()),
    }
}
