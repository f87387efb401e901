use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{Result, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Teacher,
    Student,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub user_id: Uuid,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub student_number: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_student(&self) -> bool {
        self.role == UserRole::Student
    }

    /// Students must carry a student number; teachers must not.
    pub fn validate_student_number(
        role: UserRole,
        student_number: Option<&str>,
    ) -> Result<()> {
        match (role, student_number) {
            (UserRole::Student, None) => Err(StorageError::Validation(
                "student number is required for students".to_string(),
            )),
            (UserRole::Student, Some(number)) if number.trim().is_empty() => Err(
                StorageError::Validation("student number must not be empty".to_string()),
            ),
            (UserRole::Teacher, Some(_)) => Err(StorageError::Validation(
                "teachers must not have a student number".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn student_requires_number() {
        assert!(User::validate_student_number(UserRole::Student, None).is_err());
        assert!(User::validate_student_number(UserRole::Student, Some("  ")).is_err());
        assert!(User::validate_student_number(UserRole::Student, Some("s123456")).is_ok());
    }

    #[test]
    fn teacher_must_not_have_number() {
        assert!(User::validate_student_number(UserRole::Teacher, Some("s123456")).is_err());
        assert!(User::validate_student_number(UserRole::Teacher, None).is_ok());
    }
}
