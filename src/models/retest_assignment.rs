use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How the dashboard picks the score shown for a retest. Only `BEST` exists
/// today; the column is text so new policies need no enum migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoringPolicy {
    #[default]
    Best,
}

impl ScoringPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringPolicy::Best => "BEST",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RetestAssignment {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub test_type: String,
    pub original_test_id: Uuid,
    pub subject_id: Uuid,
    pub passing_threshold: Decimal,
    pub scoring_policy: String,
    pub max_attempts: i32,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
