use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Achievement, Recipient};

const ACHIEVEMENT_COLUMNS: &str = "achievement_id, badge_id, awarded_to_user, awarded_to_team, \
     project_id, sprint_id, awarded_by, reason, awarded_at";

/// Repository for Achievement database operations.
///
/// The duplicate-award rules are enforced twice: by the `holds_badge`
/// pre-check and by partial unique indexes, so a concurrent double award
/// loses with a unique violation rather than succeeding silently.
pub struct AchievementRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AchievementRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Achievement> {
        let achievement = sqlx::query_as::<_, Achievement>(&format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE achievement_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("achievement"))?;

        Ok(achievement)
    }

    /// Whether the recipient already holds the badge: per project for
    /// users, globally for teams.
    pub async fn holds_badge(
        &self,
        recipient: Recipient,
        badge_id: Uuid,
        project_id: Uuid,
    ) -> Result<bool> {
        let exists = match recipient {
            Recipient::User(user_id) => {
                sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM achievements \
                     WHERE awarded_to_user = $1 AND badge_id = $2 AND project_id = $3)",
                )
                .bind(user_id)
                .bind(badge_id)
                .bind(project_id)
                .fetch_one(self.pool)
                .await?
            }
            Recipient::Team(team_id) => {
                sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM achievements \
                     WHERE awarded_to_team = $1 AND badge_id = $2)",
                )
                .bind(team_id)
                .bind(badge_id)
                .fetch_one(self.pool)
                .await?
            }
        };

        Ok(exists)
    }

    pub async fn insert(
        &self,
        badge_id: Uuid,
        recipient: Recipient,
        project_id: Uuid,
        sprint_id: Option<Uuid>,
        awarded_by: Option<Uuid>,
        reason: Option<&str>,
    ) -> Result<Achievement> {
        let achievement = sqlx::query_as::<_, Achievement>(&format!(
            r#"
            INSERT INTO achievements
                (badge_id, awarded_to_user, awarded_to_team, project_id, sprint_id, awarded_by, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ACHIEVEMENT_COLUMNS}
            "#
        ))
        .bind(badge_id)
        .bind(recipient.user_id())
        .bind(recipient.team_id())
        .bind(project_id)
        .bind(sprint_id)
        .bind(awarded_by)
        .bind(reason)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                StorageError::Conflict("recipient already has this badge".to_string())
            } else {
                err
            }
        })?;

        Ok(achievement)
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM achievements WHERE achievement_id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("achievement"));
        }
        Ok(())
    }

    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Achievement>> {
        self.list_where("awarded_to_user", user_id).await
    }

    pub async fn list_by_team(&self, team_id: Uuid) -> Result<Vec<Achievement>> {
        self.list_where("awarded_to_team", team_id).await
    }

    pub async fn list_by_project(&self, project_id: Uuid) -> Result<Vec<Achievement>> {
        self.list_where("project_id", project_id).await
    }

    pub async fn list_by_sprint(&self, sprint_id: Uuid) -> Result<Vec<Achievement>> {
        self.list_where("sprint_id", sprint_id).await
    }

    async fn list_where(&self, column: &str, id: Uuid) -> Result<Vec<Achievement>> {
        let achievements = sqlx::query_as::<_, Achievement>(&format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements \
             WHERE {column} = $1 ORDER BY awarded_at DESC"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(achievements)
    }

    /// Badge points a user earned individually, optionally scoped to one
    /// project.
    pub async fn user_individual_points(
        &self,
        user_id: Uuid,
        project_id: Option<Uuid>,
    ) -> Result<i64> {
        let points = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(b.points), 0)::bigint
            FROM achievements a
            JOIN badges b ON a.badge_id = b.badge_id
            WHERE a.awarded_to_user = $1
              AND ($2::uuid IS NULL OR a.project_id = $2)
            "#,
        )
        .bind(user_id)
        .bind(project_id)
        .fetch_one(self.pool)
        .await?;

        Ok(points)
    }

    /// Total badge points held by a team.
    pub async fn team_points(&self, team_id: Uuid) -> Result<i64> {
        let points = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(b.points), 0)::bigint
            FROM achievements a
            JOIN badges b ON a.badge_id = b.badge_id
            WHERE a.awarded_to_team = $1
            "#,
        )
        .bind(team_id)
        .fetch_one(self.pool)
        .await?;

        Ok(points)
    }

    pub async fn count_by_badge(&self, badge_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM achievements WHERE badge_id = $1",
        )
        .bind(badge_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    pub async fn count_by_team(&self, team_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM achievements WHERE awarded_to_team = $1",
        )
        .bind(team_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}
