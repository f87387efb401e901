use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::badge::CreateBadgeRequest;
use crate::error::{Result, StorageError};
use crate::models::{Badge, BadgeType};

const BADGE_COLUMNS: &str = "badge_id, name, description, points, badge_type, recipient_type, \
     trigger_condition, is_active, created_at";

/// Repository for Badge database operations
pub struct BadgeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BadgeRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Badge> {
        let badge = sqlx::query_as::<_, Badge>(&format!(
            "SELECT {BADGE_COLUMNS} FROM badges WHERE badge_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("badge"))?;

        Ok(badge)
    }

    pub async fn create(&self, req: &CreateBadgeRequest) -> Result<Badge> {
        let trigger = req
            .trigger_condition
            .as_ref()
            .map(|c| serde_json::to_value(c))
            .transpose()
            .map_err(|e| StorageError::Validation(format!("invalid trigger condition: {e}")))?;

        let badge = sqlx::query_as::<_, Badge>(&format!(
            r#"
            INSERT INTO badges (name, description, points, badge_type, recipient_type, trigger_condition)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {BADGE_COLUMNS}
            "#
        ))
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.points)
        .bind(req.badge_type)
        .bind(req.recipient_type)
        .bind(trigger)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                StorageError::Conflict(format!("a badge named '{}' already exists", req.name))
            } else {
                err
            }
        })?;

        Ok(badge)
    }

    pub async fn list(&self) -> Result<Vec<Badge>> {
        let badges = sqlx::query_as::<_, Badge>(&format!(
            "SELECT {BADGE_COLUMNS} FROM badges ORDER BY name"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(badges)
    }

    /// Active AUTOMATIC badges, the candidate set for trigger evaluation.
    pub async fn list_active_automatic(&self) -> Result<Vec<Badge>> {
        let badges = sqlx::query_as::<_, Badge>(&format!(
            "SELECT {BADGE_COLUMNS} FROM badges \
             WHERE badge_type = $1 AND is_active ORDER BY name"
        ))
        .bind(BadgeType::Automatic)
        .fetch_all(self.pool)
        .await?;

        Ok(badges)
    }

    /// The activation toggle is the only mutation allowed once a badge has
    /// been awarded.
    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<()> {
        let result = sqlx::query("UPDATE badges SET is_active = $2 WHERE badge_id = $1")
            .bind(id)
            .bind(is_active)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("badge"));
        }
        Ok(())
    }

    /// Deleting a badge with achievements is refused; deactivate instead.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let referenced = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM achievements WHERE badge_id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        if referenced {
            return Err(StorageError::Conflict(
                "badge has awarded achievements; deactivate it instead".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM badges WHERE badge_id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("badge"));
        }
        Ok(())
    }
}
