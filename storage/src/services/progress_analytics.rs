use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::dto::analytics::{ProgressMetricResponse, RecordTeamMoodRequest};
use crate::error::Result;
use crate::models::{ProgressMetric, Sprint};
use crate::repository::{
    ProgressMetricRepository, SprintRepository, TeamRepository, UserStoryRepository,
};

/// Recompute today's analytics row for one (sprint, team) from the current
/// set of user stories and upsert it. Idempotent: a second run on the same
/// day with unchanged stories rewrites identical values into the same row.
pub async fn update_daily_analytic(
    pool: &PgPool,
    sprint_id: Uuid,
    team_id: Uuid,
) -> Result<ProgressMetric> {
    update_daily_analytic_on(pool, sprint_id, team_id, Utc::now().date_naive()).await
}

pub async fn update_daily_analytic_on(
    pool: &PgPool,
    sprint_id: Uuid,
    team_id: Uuid,
    day: NaiveDate,
) -> Result<ProgressMetric> {
    let sprint = SprintRepository::new(pool).find_by_id(sprint_id).await?;
    TeamRepository::new(pool).find_by_id(team_id).await?;

    let rollup = UserStoryRepository::new(pool).rollup(sprint_id, team_id).await?;
    let velocity = sprint_velocity(&sprint, day, rollup.story_points_completed as i32);

    ProgressMetricRepository::new(pool)
        .upsert_daily(sprint_id, team_id, day, &rollup, velocity)
        .await
}

/// Daily metric history for a (sprint, team), newest first, with derived
/// percentages and the on-track flag attached.
pub async fn get_by_sprint_and_team(
    pool: &PgPool,
    sprint_id: Uuid,
    team_id: Uuid,
) -> Result<Vec<ProgressMetricResponse>> {
    let sprint = SprintRepository::new(pool).find_by_id(sprint_id).await?;
    let metrics = ProgressMetricRepository::new(pool)
        .get_by_sprint_and_team(sprint_id, team_id)
        .await?;

    Ok(metrics
        .into_iter()
        .map(|metric| with_derived(&sprint, metric))
        .collect())
}

pub async fn record_team_mood(
    pool: &PgPool,
    sprint_id: Uuid,
    team_id: Uuid,
    req: &RecordTeamMoodRequest,
) -> Result<ProgressMetric> {
    req.validate()?;
    SprintRepository::new(pool).find_by_id(sprint_id).await?;
    TeamRepository::new(pool).find_by_id(team_id).await?;

    ProgressMetricRepository::new(pool)
        .record_mood(
            sprint_id,
            team_id,
            Utc::now().date_naive(),
            req.team_mood.as_deref(),
            req.notes.as_deref(),
        )
        .await
}

/// Velocity for a day's snapshot. Zero-duration sprints never accrue
/// velocity, even when the snapshot lands after their single day.
fn sprint_velocity(sprint: &Sprint, day: NaiveDate, story_points_completed: i32) -> Decimal {
    if sprint.duration_days() == 0 {
        return Decimal::ZERO;
    }
    ProgressMetric::compute_velocity(story_points_completed, (day - sprint.start_date).num_days())
}

fn with_derived(sprint: &Sprint, metric: ProgressMetric) -> ProgressMetricResponse {
    let time_progress = sprint.time_progress_percentage(metric.recorded_date);
    ProgressMetricResponse::from_metric(metric, time_progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SprintStatus;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sprint(start: NaiveDate, end: NaiveDate) -> Sprint {
        Sprint {
            sprint_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            sprint_number: 1,
            name: "Sprint 1".to_string(),
            goal: None,
            start_date: start,
            end_date: end,
            status: SprintStatus::InProgress,
            completed_at: None,
            created_at: start.and_hms_opt(9, 0, 0).unwrap(),
        }
    }

    fn metric(sprint: &Sprint, day: NaiveDate) -> ProgressMetric {
        ProgressMetric {
            metric_id: Uuid::new_v4(),
            sprint_id: sprint.sprint_id,
            team_id: Uuid::new_v4(),
            recorded_date: day,
            completed_tasks: 5,
            total_tasks: 10,
            story_points_completed: 10,
            total_story_points: 20,
            velocity: ProgressMetric::compute_velocity(10, (day - sprint.start_date).num_days()),
            team_mood: None,
            notes: None,
            created_at: day.and_hms_opt(18, 0, 0).unwrap(),
        }
    }

    #[test]
    fn two_week_sprint_at_its_end_date() {
        // 14-day sprint ending today, 10 of 20 points and 5 of 10 tasks done.
        let end = date(2025, 9, 22);
        let start = end - chrono::Duration::days(14);
        let s = sprint(start, end);
        let response = with_derived(&s, metric(&s, end));

        assert_eq!(response.completion_percentage, Decimal::from(50));
        assert_eq!(s.time_progress_percentage(end), Decimal::from(100));
        assert!(response.is_on_track);
        // 10 points over 14 elapsed days
        assert_eq!(response.velocity, Decimal::new(71, 2));
    }

    #[test]
    fn zero_duration_sprint_never_accrues_velocity() {
        let day = date(2025, 9, 22);
        let s = sprint(day, day);

        assert_eq!(sprint_velocity(&s, day, 10), Decimal::ZERO);
        // Even recomputed after its single day has elapsed.
        assert_eq!(
            sprint_velocity(&s, day + chrono::Duration::days(1), 10),
            Decimal::ZERO
        );

        let normal = sprint(day, day + chrono::Duration::days(14));
        assert_eq!(
            sprint_velocity(&normal, day + chrono::Duration::days(14), 10),
            Decimal::new(71, 2)
        );
    }

    #[test]
    fn behind_schedule_team_is_flagged() {
        let end = date(2025, 9, 22);
        let start = end - chrono::Duration::days(14);
        let s = sprint(start, end);

        let mut m = metric(&s, end);
        m.completed_tasks = 4;
        let response = with_derived(&s, m);
        assert!(!response.is_on_track);
    }
}
