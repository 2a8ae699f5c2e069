use serde_json::Value as JsonValue;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::Result;

pub struct AuditService;

impl AuditService {
    /// Appends an audit row on the caller's connection, so it commits or rolls
    /// back together with the change it describes.
    pub async fn log(
        conn: &mut PgConnection,
        user_id: Option<Uuid>,
        action: &str,
        entity_type: &str,
        entity_id: Uuid,
        changes: Option<JsonValue>,
    ) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO audit_logs (user_id, action, entity_type, entity_id, changes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(action)
        .bind(entity_type)
        .bind(entity_id)
        .bind(changes)
        .fetch_one(&mut *conn)
        .await?;
        Ok(id)
    }
}
