//! Session operations

use chrono::Utc;

use crate::error::DbError;
use crate::models::{NewSession, SessionRecord};

use super::Database;

impl Database {
    /// Create a new session
    pub async fn insert_session(&self, session: NewSession) -> Result<SessionRecord, DbError> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(SessionRecord {
                id: session.id,
                user_id: session.user_id,
                created_at: now,
            }),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DbError::Duplicate("session id already issued".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a session by ID
    pub async fn get_session(&self, id: &str) -> Result<Option<SessionRecord>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, user_id, created_at
            FROM sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result
            .map(|row| SessionRecord::try_from(&row).map_err(DbError::from))
            .transpose()
    }

    /// Delete a session
    pub async fn delete_session(&self, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every session owned by a user, returning how many were removed
    pub async fn delete_sessions_for_user(&self, user_id: &str) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
