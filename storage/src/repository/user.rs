use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{User, UserRole};

const USER_COLUMNS: &str =
    "user_id, role, first_name, last_name, email, student_number, created_at";

/// Repository for User database operations
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("user"))?;

        Ok(user)
    }

    pub async fn create(
        &self,
        role: UserRole,
        first_name: &str,
        last_name: &str,
        email: &str,
        student_number: Option<&str>,
    ) -> Result<User> {
        User::validate_student_number(role, student_number)?;

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (role, first_name, last_name, email, student_number)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(role)
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(student_number)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                StorageError::Conflict(
                    "a user with this email or student number already exists".to_string(),
                )
            } else {
                err
            }
        })?;

        Ok(user)
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }
}
