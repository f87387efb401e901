use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::round2;

/// One daily snapshot of a team's task/story-point completion within a
/// sprint. At most one row exists per (sprint, team, recorded_date);
/// recomputation on the same day updates the row in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProgressMetric {
    pub metric_id: Uuid,
    pub sprint_id: Uuid,
    pub team_id: Uuid,
    pub recorded_date: NaiveDate,
    pub completed_tasks: i32,
    pub total_tasks: i32,
    pub story_points_completed: i32,
    pub total_story_points: i32,
    pub velocity: Decimal,
    pub team_mood: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

impl ProgressMetric {
    /// completed/total tasks as a percentage, 0 when there are no tasks.
    pub fn completion_percentage(&self) -> Decimal {
        percentage(self.completed_tasks, self.total_tasks)
    }

    pub fn story_points_completion(&self) -> Decimal {
        percentage(self.story_points_completed, self.total_story_points)
    }

    pub fn all_tasks_completed(&self) -> bool {
        self.total_tasks > 0 && self.completed_tasks == self.total_tasks
    }

    /// A team is flagged as off track only when more than half the sprint
    /// time has passed with under half the work done.
    pub fn is_on_track(&self, time_progress: Decimal) -> bool {
        time_progress <= Decimal::from(50) || self.completion_percentage() >= Decimal::from(50)
    }

    /// Story points completed per elapsed sprint day; 0 until the sprint
    /// has been running for at least a day.
    pub fn compute_velocity(story_points_completed: i32, days_elapsed: i64) -> Decimal {
        if days_elapsed <= 0 {
            return Decimal::ZERO;
        }
        round2(Decimal::from(story_points_completed) / Decimal::from(days_elapsed))
    }
}

fn percentage(completed: i32, total: i32) -> Decimal {
    if total <= 0 {
        return Decimal::ZERO;
    }
    round2(Decimal::from(completed as i64 * 100) / Decimal::from(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(completed_tasks: i32, total_tasks: i32, points_done: i32, points_total: i32) -> ProgressMetric {
        let day = NaiveDate::from_ymd_opt(2025, 9, 22).unwrap();
        ProgressMetric {
            metric_id: Uuid::new_v4(),
            sprint_id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            recorded_date: day,
            completed_tasks,
            total_tasks,
            story_points_completed: points_done,
            total_story_points: points_total,
            velocity: Decimal::ZERO,
            team_mood: None,
            notes: None,
            created_at: day.and_hms_opt(18, 0, 0).unwrap(),
        }
    }

    #[test]
    fn completion_percentage_rounds_half_up() {
        assert_eq!(metric(1, 2, 0, 0).completion_percentage(), Decimal::from(50));
        // 1/3 = 33.333... → 33.33
        assert_eq!(metric(1, 3, 0, 0).completion_percentage(), Decimal::new(3333, 2));
        // 1/16 = 6.25 exactly
        assert_eq!(metric(1, 16, 0, 0).completion_percentage(), Decimal::new(625, 2));
        // 5/8 points = 62.5 → 62.50 (midpoint stays)
        assert_eq!(metric(0, 0, 5, 8).story_points_completion(), Decimal::new(625, 1));
    }

    #[test]
    fn zero_totals_yield_zero_not_panic() {
        assert_eq!(metric(0, 0, 0, 0).completion_percentage(), Decimal::ZERO);
        assert_eq!(metric(0, 0, 0, 0).story_points_completion(), Decimal::ZERO);
        assert!(!metric(0, 0, 0, 0).all_tasks_completed());
    }

    #[test]
    fn velocity_is_zero_before_the_sprint_runs() {
        assert_eq!(ProgressMetric::compute_velocity(10, 0), Decimal::ZERO);
        assert_eq!(ProgressMetric::compute_velocity(10, -3), Decimal::ZERO);
        assert_eq!(ProgressMetric::compute_velocity(10, 4), Decimal::new(25, 1));
        // 10/3 = 3.333... → 3.33
        assert_eq!(ProgressMetric::compute_velocity(10, 3), Decimal::new(333, 2));
    }

    #[test]
    fn on_track_in_first_half_regardless_of_completion() {
        let m = metric(0, 10, 0, 20);
        assert!(m.is_on_track(Decimal::from(50)));
        assert!(!m.is_on_track(Decimal::new(5001, 2)));
    }

    #[test]
    fn on_track_when_half_the_work_is_done() {
        let m = metric(5, 10, 10, 20);
        assert!(m.is_on_track(Decimal::from(100)));
        let behind = metric(4, 10, 8, 20);
        assert!(!behind.is_on_track(Decimal::from(100)));
    }
}
