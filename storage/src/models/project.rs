use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::round2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "project_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Planning,
    Active,
    Completed,
    Cancelled,
    Archived,
}

/// A course project. `progress` is a cached derived value, recomputed
/// synchronously from story points whenever a user story changes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Project {
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ProjectStatus,
    pub progress: Decimal,
    pub course_id: Option<Uuid>,
    pub created_at: NaiveDateTime,
}

impl Project {
    /// Completed vs. total story points across all the project's sprints,
    /// as a percentage. 0 when the project has no pointed stories yet.
    pub fn progress_from_points(completed_points: i64, total_points: i64) -> Decimal {
        if total_points <= 0 {
            return Decimal::ZERO;
        }
        round2(Decimal::from(completed_points * 100) / Decimal::from(total_points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_handles_empty_projects() {
        assert_eq!(Project::progress_from_points(0, 0), Decimal::ZERO);
        assert_eq!(Project::progress_from_points(10, 0), Decimal::ZERO);
    }

    #[test]
    fn progress_rounds_to_two_decimals() {
        assert_eq!(Project::progress_from_points(10, 20), Decimal::from(50));
        assert_eq!(Project::progress_from_points(2, 3), Decimal::new(6667, 2));
    }
}
