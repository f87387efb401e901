use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::ProgressMetric;
use crate::repository::user_story::StoryRollup;

const METRIC_COLUMNS: &str = "metric_id, sprint_id, team_id, recorded_date, completed_tasks, \
     total_tasks, story_points_completed, total_story_points, velocity, team_mood, notes, \
     created_at";

/// Repository for ProgressMetric database operations
pub struct ProgressMetricRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProgressMetricRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Upsert the daily row for (sprint, team, day). The unique index on
    /// the composite key makes this the only row for the day; recomputing
    /// with unchanged inputs rewrites identical values. Mood and notes are
    /// untouched on update so recomputation never wipes them.
    pub async fn upsert_daily(
        &self,
        sprint_id: Uuid,
        team_id: Uuid,
        day: NaiveDate,
        rollup: &StoryRollup,
        velocity: Decimal,
    ) -> Result<ProgressMetric> {
        let metric = sqlx::query_as::<_, ProgressMetric>(&format!(
            r#"
            INSERT INTO progress_metrics
                (sprint_id, team_id, recorded_date, completed_tasks, total_tasks,
                 story_points_completed, total_story_points, velocity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (sprint_id, team_id, recorded_date) DO UPDATE
            SET completed_tasks = EXCLUDED.completed_tasks,
                total_tasks = EXCLUDED.total_tasks,
                story_points_completed = EXCLUDED.story_points_completed,
                total_story_points = EXCLUDED.total_story_points,
                velocity = EXCLUDED.velocity
            RETURNING {METRIC_COLUMNS}
            "#
        ))
        .bind(sprint_id)
        .bind(team_id)
        .bind(day)
        .bind(rollup.completed_tasks as i32)
        .bind(rollup.total_tasks as i32)
        .bind(rollup.story_points_completed as i32)
        .bind(rollup.total_story_points as i32)
        .bind(velocity)
        .fetch_one(self.pool)
        .await?;

        Ok(metric)
    }

    /// Record the qualitative fields on today's row, creating it if the
    /// aggregator has not run yet.
    pub async fn record_mood(
        &self,
        sprint_id: Uuid,
        team_id: Uuid,
        day: NaiveDate,
        team_mood: Option<&str>,
        notes: Option<&str>,
    ) -> Result<ProgressMetric> {
        let metric = sqlx::query_as::<_, ProgressMetric>(&format!(
            r#"
            INSERT INTO progress_metrics (sprint_id, team_id, recorded_date, team_mood, notes)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (sprint_id, team_id, recorded_date) DO UPDATE
            SET team_mood = EXCLUDED.team_mood,
                notes = EXCLUDED.notes
            RETURNING {METRIC_COLUMNS}
            "#
        ))
        .bind(sprint_id)
        .bind(team_id)
        .bind(day)
        .bind(team_mood)
        .bind(notes)
        .fetch_one(self.pool)
        .await?;

        Ok(metric)
    }

    pub async fn get_by_sprint_and_team(
        &self,
        sprint_id: Uuid,
        team_id: Uuid,
    ) -> Result<Vec<ProgressMetric>> {
        let metrics = sqlx::query_as::<_, ProgressMetric>(&format!(
            "SELECT {METRIC_COLUMNS} FROM progress_metrics \
             WHERE sprint_id = $1 AND team_id = $2 ORDER BY recorded_date DESC"
        ))
        .bind(sprint_id)
        .bind(team_id)
        .fetch_all(self.pool)
        .await?;

        Ok(metrics)
    }

    pub async fn find_by_day(
        &self,
        sprint_id: Uuid,
        team_id: Uuid,
        day: NaiveDate,
    ) -> Result<ProgressMetric> {
        let metric = sqlx::query_as::<_, ProgressMetric>(&format!(
            "SELECT {METRIC_COLUMNS} FROM progress_metrics \
             WHERE sprint_id = $1 AND team_id = $2 AND recorded_date = $3"
        ))
        .bind(sprint_id)
        .bind(team_id)
        .bind(day)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound("progress metric"))?;

        Ok(metric)
    }

    /// Newest metric a team has in any sprint; feeds trigger evaluation.
    pub async fn latest_for_team(&self, team_id: Uuid) -> Result<Option<ProgressMetric>> {
        let metric = sqlx::query_as::<_, ProgressMetric>(&format!(
            "SELECT {METRIC_COLUMNS} FROM progress_metrics \
             WHERE team_id = $1 ORDER BY recorded_date DESC, created_at DESC LIMIT 1"
        ))
        .bind(team_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(metric)
    }
}
