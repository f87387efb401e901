use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::team::{AddTeamMemberRequest, CreateTeamRequest};
use crate::error::{Result, StorageError};
use crate::models::{Team, TeamMember};

const MEMBER_COLUMNS: &str =
    "team_member_id, team_id, user_id, role, is_active, joined_at, left_at";

/// Repository for Team and TeamMember database operations
pub struct TeamRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TeamRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Team> {
        let team = sqlx::query_as::<_, Team>(
            "SELECT team_id, name, created_at FROM teams WHERE team_id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("team"))?;

        Ok(team)
    }

    pub async fn create(&self, req: &CreateTeamRequest) -> Result<Team> {
        let team = sqlx::query_as::<_, Team>(
            "INSERT INTO teams (name) VALUES ($1) RETURNING team_id, name, created_at",
        )
        .bind(&req.name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                StorageError::Conflict(format!("a team named '{}' already exists", req.name))
            } else {
                err
            }
        })?;

        Ok(team)
    }

    /// Adds a member, enforcing one active membership per user and at most
    /// one active SCRUM_MASTER / PRODUCT_OWNER per team.
    pub async fn add_member(&self, team_id: Uuid, req: &AddTeamMemberRequest) -> Result<TeamMember> {
        let already_member = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM team_members \
             WHERE team_id = $1 AND user_id = $2 AND is_active)",
        )
        .bind(team_id)
        .bind(req.user_id)
        .fetch_one(self.pool)
        .await?;

        if already_member {
            return Err(StorageError::Conflict(
                "user is already an active member of this team".to_string(),
            ));
        }

        if req.role.is_single_seat() {
            let seat_taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM team_members \
                 WHERE team_id = $1 AND role = $2 AND is_active)",
            )
            .bind(team_id)
            .bind(req.role)
            .fetch_one(self.pool)
            .await?;

            if seat_taken {
                return Err(StorageError::Conflict(format!(
                    "team already has an active {:?}",
                    req.role
                )));
            }
        }

        let member = sqlx::query_as::<_, TeamMember>(&format!(
            r#"
            INSERT INTO team_members (team_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(team_id)
        .bind(req.user_id)
        .bind(req.role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                StorageError::Conflict(
                    "user is already an active member of this team".to_string(),
                )
            } else {
                err
            }
        })?;

        Ok(member)
    }

    /// Soft delete: the membership row stays for historical records.
    pub async fn leave_team(&self, team_id: Uuid, user_id: Uuid) -> Result<TeamMember> {
        let member = sqlx::query_as::<_, TeamMember>(&format!(
            r#"
            UPDATE team_members
            SET is_active = FALSE, left_at = $3
            WHERE team_id = $1 AND user_id = $2 AND is_active
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(team_id)
        .bind(user_id)
        .bind(Utc::now().naive_utc())
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("active team membership"))?;

        Ok(member)
    }

    pub async fn active_members(&self, team_id: Uuid) -> Result<Vec<TeamMember>> {
        let members = sqlx::query_as::<_, TeamMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members \
             WHERE team_id = $1 AND is_active ORDER BY joined_at"
        ))
        .bind(team_id)
        .fetch_all(self.pool)
        .await?;

        Ok(members)
    }

    pub async fn active_member_count(&self, team_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM team_members WHERE team_id = $1 AND is_active",
        )
        .bind(team_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    pub async fn is_active_member(&self, team_id: Uuid, user_id: Uuid) -> Result<bool> {
        let active = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM team_members \
             WHERE team_id = $1 AND user_id = $2 AND is_active)",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(active)
    }

    /// A user's active memberships across all teams; feeds the team-share
    /// part of the global score.
    pub async fn active_memberships_for_user(&self, user_id: Uuid) -> Result<Vec<TeamMember>> {
        let memberships = sqlx::query_as::<_, TeamMember>(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members \
             WHERE user_id = $1 AND is_active ORDER BY joined_at"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(memberships)
    }

    pub async fn teams_for_project(&self, project_id: Uuid) -> Result<Vec<Team>> {
        let teams = sqlx::query_as::<_, Team>(
            r#"
            SELECT t.team_id, t.name, t.created_at
            FROM teams t
            JOIN project_teams pt ON pt.team_id = t.team_id
            WHERE pt.project_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(project_id)
        .fetch_all(self.pool)
        .await?;

        Ok(teams)
    }

    /// Teams with achievements are historical records and cannot be
    /// hard-deleted.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let has_achievements = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM achievements WHERE awarded_to_team = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        if has_achievements {
            return Err(StorageError::Conflict(
                "team has achievements and cannot be deleted".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM teams WHERE team_id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound("team"));
        }
        Ok(())
    }
}
