use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::submission_dto::{RetestProgress, SubmitAttemptRequest, SubmitAttemptResponse};
use crate::error::{Error, Result};
use crate::services::attempt_resolver::{max_stored_attempt_number, resolve_attempt_number, ResolveInput};
use crate::services::attempt_service::{AttemptService, NewAttempt};
use crate::services::audit_service::AuditService;
use crate::services::best_score_service::BestScoreService;
use crate::services::eligibility_service;
use crate::services::grading_service::GradingService;
use crate::services::retest_state::{apply_transition, next_state};

/// Plain (non-retest) submissions always occupy this slot.
pub const PLAIN_ATTEMPT_NUMBER: i32 = 1;

#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub result_id: Uuid,
    pub score: Decimal,
    pub max_score: Decimal,
    pub percentage: Decimal,
    pub retest: Option<RetestProgress>,
}

impl SubmissionOutcome {
    pub fn into_response(self) -> SubmitAttemptResponse {
        let message = match &self.retest {
            None => "Test submitted successfully".to_string(),
            Some(p) if p.passed => "Retest passed".to_string(),
            Some(p) if p.is_completed => "Retest finished without a passing score".to_string(),
            Some(p) => format!(
                "Retest attempt recorded, {} attempt(s) remaining",
                p.remaining_attempts
            ),
        };
        SubmitAttemptResponse {
            success: true,
            result_id: self.result_id,
            score: self.score.to_f64().unwrap_or(0.0),
            max_score: self.max_score.to_f64().unwrap_or(0.0),
            percentage_score: self.percentage.to_f64().unwrap_or(0.0),
            message,
            retest: self.retest,
        }
    }
}

#[derive(Clone)]
pub struct SubmissionService {
    pool: PgPool,
    best_scores: BestScoreService,
}

impl SubmissionService {
    pub fn new(pool: PgPool) -> Self {
        let best_scores = BestScoreService::new(pool.clone());
        Self { pool, best_scores }
    }

    /// Records one submission for `student_id` at `now`.
    ///
    /// Payload shape is expected to be validated already; this checks the
    /// cross-field rules, grades, and routes to the retest or plain path.
    pub async fn submit(
        &self,
        student_id: Uuid,
        req: SubmitAttemptRequest,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome> {
        req.check_consistency().map_err(Error::BadRequest)?;

        let score = GradingService::score_from_f64(req.score, "score")?;
        let max_score = GradingService::score_from_f64(req.max_score, "maxScore")?;
        let percentage = GradingService::percentage(score, max_score);
        let graded = Graded {
            score,
            max_score,
            percentage,
        };

        match req.retest_assignment_id {
            Some(retest_assignment_id) => {
                self.submit_retest(student_id, retest_assignment_id, req, graded, now)
                    .await
            }
            None => self.submit_plain(student_id, req, graded, now).await,
        }
    }

    #[tracing::instrument(skip(self, req, graded, now), fields(test_id = %req.test_id))]
    async fn submit_plain(
        &self,
        student_id: Uuid,
        req: SubmitAttemptRequest,
        graded: Graded,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome> {
        let attempt = build_attempt(student_id, req.test_id, PLAIN_ATTEMPT_NUMBER, None, &req, &graded);

        let mut tx = self.pool.begin().await?;
        let result_id = AttemptService::record_attempt(&mut tx, &attempt, now).await?;
        AuditService::log(
            &mut tx,
            Some(student_id),
            "submit_attempt",
            "test_attempt",
            result_id,
            Some(json!({ "percentage": graded.percentage })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(%result_id, percentage = %graded.percentage, "test result recorded");
        Ok(graded.outcome(result_id, None))
    }

    /// Retest path. The target row stays locked from the eligibility check to
    /// the commit, so concurrent submissions for one student serialize here.
    #[tracing::instrument(skip(self, req, graded, now))]
    async fn submit_retest(
        &self,
        student_id: Uuid,
        retest_assignment_id: Uuid,
        req: SubmitAttemptRequest,
        graded: Graded,
        now: DateTime<Utc>,
    ) -> Result<SubmissionOutcome> {
        let mut tx = self.pool.begin().await?;

        let record =
            eligibility_service::check_locked(&mut tx, retest_assignment_id, student_id, now).await?;

        let parent_test_id = record.original_test_id;
        if let Some(claimed) = req.parent_test_id {
            if claimed != parent_test_id {
                return Err(Error::BadRequest(
                    "parent_test_id does not match the retest assignment".to_string(),
                ));
            }
        }

        let max_attempts = record.effective_max_attempts();
        let passed = GradingService::is_passing(graded.percentage, record.passing_threshold);
        let max_stored = max_stored_attempt_number(&mut tx, student_id, parent_test_id).await?;
        let attempt_number = resolve_attempt_number(ResolveInput {
            current_attempt: record.attempt_number,
            max_attempts,
            max_stored,
            passed,
        });

        let attempt = build_attempt(
            student_id,
            parent_test_id,
            attempt_number,
            Some(retest_assignment_id),
            &req,
            &graded,
        );
        let result_id = AttemptService::record_attempt(&mut tx, &attempt, now).await?;

        let transition = next_state(record.attempt_number, max_attempts, passed);
        apply_transition(&mut tx, retest_assignment_id, student_id, &transition, now).await?;

        AuditService::log(
            &mut tx,
            Some(student_id),
            "submit_retest_attempt",
            "test_attempt",
            result_id,
            Some(json!({
                "retest_assignment_id": retest_assignment_id,
                "attempt_number": attempt_number,
                "percentage": graded.percentage,
                "status": transition.status,
            })),
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            %result_id,
            attempt_number,
            percentage = %graded.percentage,
            status = ?transition.status,
            "retest attempt recorded"
        );

        // Target state is durable at this point; a failed recompute must not
        // turn the submission into an error the client would retry.
        if let Err(e) = self.best_scores.recompute(student_id, parent_test_id).await {
            tracing::warn!(
                error = ?e,
                %student_id,
                %parent_test_id,
                "best retest values recompute failed"
            );
        }

        let progress = RetestProgress {
            retest_assignment_id,
            attempt_number: transition.attempt_number,
            max_attempts,
            remaining_attempts: (max_attempts - transition.attempt_number).max(0),
            status: transition.status,
            is_completed: transition.is_completed,
            passed: transition.passed,
        };
        Ok(graded.outcome(result_id, Some(progress)))
    }
}

#[derive(Debug, Clone, Copy)]
struct Graded {
    score: Decimal,
    max_score: Decimal,
    percentage: Decimal,
}

impl Graded {
    fn outcome(self, result_id: Uuid, retest: Option<RetestProgress>) -> SubmissionOutcome {
        SubmissionOutcome {
            result_id,
            score: self.score,
            max_score: self.max_score,
            percentage: self.percentage,
            retest,
        }
    }
}

fn build_attempt(
    student_id: Uuid,
    test_id: Uuid,
    attempt_number: i32,
    retest_assignment_id: Option<Uuid>,
    req: &SubmitAttemptRequest,
    graded: &Graded,
) -> NewAttempt {
    NewAttempt {
        student_id,
        test_id,
        test_name: req.test_name.trim().to_string(),
        teacher_id: req.teacher_id,
        subject_id: req.subject_id,
        attempt_number,
        score: graded.score,
        max_score: graded.max_score,
        percentage: graded.percentage,
        answers: req.answers.clone(),
        answers_by_id: req.answers_by_id.clone(),
        question_order: req.question_order.clone(),
        started_at: req.started_at,
        submitted_at: req.submitted_at,
        time_taken: req.time_taken,
        caught_cheating: req.caught_cheating.unwrap_or(false),
        visibility_change_times: req.visibility_change_times.unwrap_or(0),
        is_completed: req.is_completed.unwrap_or(true),
        retest_assignment_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::retest_target::RetestStatus;

    fn progress(remaining: i32, status: RetestStatus) -> RetestProgress {
        RetestProgress {
            retest_assignment_id: Uuid::new_v4(),
            attempt_number: 3 - remaining,
            max_attempts: 3,
            remaining_attempts: remaining,
            status,
            is_completed: status.is_terminal(),
            passed: status == RetestStatus::Passed,
        }
    }

    fn outcome(retest: Option<RetestProgress>) -> SubmissionOutcome {
        SubmissionOutcome {
            result_id: Uuid::new_v4(),
            score: Decimal::new(7, 0),
            max_score: Decimal::new(10, 0),
            percentage: Decimal::new(7000, 2),
            retest,
        }
    }

    #[test]
    fn response_carries_numbers_as_floats() {
        let resp = outcome(None).into_response();
        assert!(resp.success);
        assert_eq!(resp.score, 7.0);
        assert_eq!(resp.max_score, 10.0);
        assert_eq!(resp.percentage_score, 70.0);
        assert!(resp.retest.is_none());
    }

    #[test]
    fn message_follows_retest_progress() {
        let passed = outcome(Some(progress(0, RetestStatus::Passed))).into_response();
        assert_eq!(passed.message, "Retest passed");

        let pending = outcome(Some(progress(2, RetestStatus::InProgress))).into_response();
        assert!(pending.message.contains("2 attempt(s) remaining"));

        let failed = outcome(Some(progress(0, RetestStatus::Failed))).into_response();
        assert!(failed.message.contains("without a passing score"));
    }
}
