use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::best_retest_result::BestRetestResult;

/// Front for the `update_best_retest_values` routine that keeps
/// `best_retest_results` in step with `test_attempts`.
///
/// The routine is idempotent and a no-op for a pair without attempts. It runs
/// after the submission transaction commits, on its own connection.
#[derive(Clone)]
pub struct BestScoreService {
    pool: PgPool,
}

impl BestScoreService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self))]
    pub async fn recompute(&self, student_id: Uuid, parent_test_id: Uuid) -> Result<()> {
        sqlx::query("SELECT update_best_retest_values($1, $2)")
            .bind(student_id)
            .bind(parent_test_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get(&self, student_id: Uuid, test_id: Uuid) -> Result<Option<BestRetestResult>> {
        let row = sqlx::query_as::<_, BestRetestResult>(
            r#"SELECT * FROM best_retest_results WHERE student_id = $1 AND test_id = $2"#,
        )
        .bind(student_id)
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Best results on the assignment's original test for every assigned student.
    pub async fn list_for_assignment(&self, retest_assignment_id: Uuid) -> Result<Vec<BestRetestResult>> {
        let rows = sqlx::query_as::<_, BestRetestResult>(
            r#"
            SELECT b.*
            FROM best_retest_results b
            JOIN retest_assignments a ON a.original_test_id = b.test_id
            JOIN retest_targets t
              ON t.retest_assignment_id = a.id AND t.student_id = b.student_id
            WHERE a.id = $1
            ORDER BY b.best_percentage DESC, b.student_id
            "#,
        )
        .bind(retest_assignment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
