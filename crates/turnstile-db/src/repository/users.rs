//! User operations

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{NewUser, User};
use crate::repository::Database;
use crate::utils::normalize_email;

impl Database {
    // ==================== User Operations ====================

    /// Insert a new user
    pub async fn insert_user(&self, user: NewUser) -> Result<User, DbError> {
        let now = Utc::now();
        let email = normalize_email(&user.email);

        // Check if user already exists
        let existing = self.get_user_by_email(&email).await?;
        if existing.is_some() {
            return Err(DbError::Duplicate(format!("User {} already exists", email)));
        }

        let id = Uuid::new_v4().to_string();

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&email)
        .bind(&user.password_hash)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(User {
                id,
                email,
                password_hash: user.password_hash,
                created_at: now,
                updated_at: now,
            }),
            // Lost a race with a concurrent registration
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DbError::Duplicate(format!("User {} already exists", email)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, id: &str) -> Result<Option<User>, DbError> {
        let result = sqlx::query(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        result.map(|row| User::try_from(&row).map_err(DbError::from)).transpose()
    }

    /// List all users
    pub async fn list_users(&self) -> Result<Vec<User>, DbError> {
        let rows = sqlx::query(
            r#"
            SELECT id, email, password_hash, created_at, updated_at
            FROM users
            ORDER BY email
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| User::try_from(row).map_err(DbError::from))
            .collect()
    }

    /// Delete a user, failing with [`DbError::NotFound`] if there is none
    pub async fn delete_user(&self, id: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    /// Count registered users
    pub async fn count_users(&self) -> Result<i64, DbError> {
        let result = sqlx::query("SELECT COUNT(*) as count FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(result.get("count"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup_user() {
        let db = Database::in_memory().await.unwrap();

        let user = db.insert_user(new_user("a@b.com")).await.unwrap();
        assert!(!user.id.is_empty());

        let by_email = db.get_user_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let by_id = db.get_user_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@b.com");
        assert_eq!(by_id.password_hash, "hash");

        assert!(db.get_user_by_email("nobody@b.com").await.unwrap().is_none());
        assert!(db.get_user_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = Database::in_memory().await.unwrap();

        db.insert_user(new_user("a@b.com")).await.unwrap();
        let result = db.insert_user(new_user("A@B.com")).await;
        assert!(matches!(result, Err(DbError::Duplicate(_))));
        assert_eq!(db.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let db = Database::in_memory().await.unwrap();
        let user = db.insert_user(new_user("a@b.com")).await.unwrap();

        db.delete_user(&user.id).await.unwrap();
        assert!(matches!(
            db.delete_user(&user.id).await,
            Err(DbError::NotFound(_))
        ));
        assert_eq!(db.count_users().await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registration_reports_duplicate() {
        let db = Database::in_memory().await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move { db.insert_user(new_user("a@b.com")).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(DbError::Duplicate(_)) => {}
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(db.count_users().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_users_sorted_by_email() {
        let db = Database::in_memory().await.unwrap();
        db.insert_user(new_user("zed@b.com")).await.unwrap();
        db.insert_user(new_user("amy@b.com")).await.unwrap();

        let users = db.list_users().await.unwrap();
        let emails: Vec<_> = users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["amy@b.com", "zed@b.com"]);
    }
}
