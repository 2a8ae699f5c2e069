use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BestRetestResult {
    pub student_id: Uuid,
    pub test_id: Uuid,
    pub best_attempt_id: Uuid,
    pub best_score: Decimal,
    pub best_max_score: Decimal,
    pub best_percentage: Decimal,
    pub attempts_count: i32,
    pub updated_at: DateTime<Utc>,
}
