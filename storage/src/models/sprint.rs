use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::round2;
use crate::error::{Result, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "sprint_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SprintStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

/// A sprint with a date-gated lifecycle:
/// PLANNED → IN_PROGRESS → COMPLETED, with CANCELLED reachable from
/// PLANNED and IN_PROGRESS. COMPLETED and CANCELLED are terminal.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Sprint {
    pub sprint_id: Uuid,
    pub project_id: Uuid,
    pub sprint_number: i32,
    pub name: String,
    pub goal: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SprintStatus,
    pub completed_at: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

impl Sprint {
    pub fn can_start(&self, today: NaiveDate) -> bool {
        self.status == SprintStatus::Planned && today >= self.start_date
    }

    pub fn start(&mut self, today: NaiveDate) -> Result<()> {
        if self.status != SprintStatus::Planned {
            return Err(StorageError::InvalidState(format!(
                "cannot start sprint {} in status {:?}",
                self.sprint_number, self.status
            )));
        }
        if today < self.start_date {
            return Err(StorageError::InvalidState(format!(
                "sprint {} does not start until {}",
                self.sprint_number, self.start_date
            )));
        }
        self.status = SprintStatus::InProgress;
        Ok(())
    }

    pub fn can_complete(&self, today: NaiveDate) -> bool {
        self.status == SprintStatus::InProgress && today >= self.end_date
    }

    pub fn complete(&mut self, today: NaiveDate, completion_date: Option<NaiveDate>) -> Result<()> {
        if self.status != SprintStatus::InProgress {
            return Err(StorageError::InvalidState(format!(
                "cannot complete sprint {} in status {:?}",
                self.sprint_number, self.status
            )));
        }
        if today < self.end_date {
            return Err(StorageError::InvalidState(format!(
                "sprint {} does not end until {}",
                self.sprint_number, self.end_date
            )));
        }
        self.status = SprintStatus::Completed;
        self.completed_at = Some(completion_date.unwrap_or(today));
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<()> {
        match self.status {
            SprintStatus::Planned | SprintStatus::InProgress => {
                self.status = SprintStatus::Cancelled;
                Ok(())
            }
            _ => Err(StorageError::InvalidState(format!(
                "cannot cancel sprint {} in status {:?}",
                self.sprint_number, self.status
            ))),
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == SprintStatus::InProgress && today > self.end_date
    }

    /// Completed no later than its planned end date.
    pub fn completed_on_time(&self) -> bool {
        self.status == SprintStatus::Completed
            && self.completed_at.is_some_and(|date| date <= self.end_date)
    }

    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    /// Share of the sprint's calendar window that has elapsed, as a
    /// percentage: 0 before the start date, 100 from the end date on,
    /// 2-decimal half-up in between. Zero-duration sprints report 100 from
    /// their start date.
    pub fn time_progress_percentage(&self, today: NaiveDate) -> Decimal {
        if today < self.start_date {
            return Decimal::ZERO;
        }
        if today >= self.end_date {
            return Decimal::from(100);
        }
        let elapsed = (today - self.start_date).num_days();
        let duration = self.duration_days();
        round2(Decimal::from(elapsed * 100) / Decimal::from(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sprint(start: NaiveDate, end: NaiveDate, status: SprintStatus) -> Sprint {
        Sprint {
            sprint_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            sprint_number: 1,
            name: "Sprint 1".to_string(),
            goal: None,
            start_date: start,
            end_date: end,
            status,
            completed_at: None,
            created_at: start.and_hms_opt(9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn start_is_gated_on_status_and_date() {
        let start = date(2025, 9, 8);
        let end = date(2025, 9, 22);

        let mut s = sprint(start, end, SprintStatus::Planned);
        assert!(s.start(start - chrono::Duration::days(1)).is_err());
        assert_eq!(s.status, SprintStatus::Planned);

        s.start(start).unwrap();
        assert_eq!(s.status, SprintStatus::InProgress);

        let mut completed = sprint(start, end, SprintStatus::Completed);
        assert!(completed.start(end).is_err());
    }

    #[test]
    fn complete_requires_in_progress_past_end() {
        let start = date(2025, 9, 8);
        let end = date(2025, 9, 22);

        let mut s = sprint(start, end, SprintStatus::InProgress);
        assert!(s.complete(end - chrono::Duration::days(1), None).is_err());

        s.complete(end, None).unwrap();
        assert_eq!(s.status, SprintStatus::Completed);
        assert_eq!(s.completed_at, Some(end));

        let mut planned = sprint(start, end, SprintStatus::Planned);
        assert!(planned.complete(end, None).is_err());
    }

    #[test]
    fn complete_honors_explicit_completion_date() {
        let start = date(2025, 9, 8);
        let end = date(2025, 9, 22);
        let mut s = sprint(start, end, SprintStatus::InProgress);
        let today = end + chrono::Duration::days(3);

        s.complete(today, Some(end)).unwrap();
        assert_eq!(s.completed_at, Some(end));
        assert!(s.completed_on_time());
    }

    #[test]
    fn cancel_only_from_planned_or_in_progress() {
        let start = date(2025, 9, 8);
        let end = date(2025, 9, 22);

        let mut planned = sprint(start, end, SprintStatus::Planned);
        planned.cancel().unwrap();
        assert_eq!(planned.status, SprintStatus::Cancelled);
        assert!(planned.cancel().is_err());

        let mut running = sprint(start, end, SprintStatus::InProgress);
        running.cancel().unwrap();

        let mut completed = sprint(start, end, SprintStatus::Completed);
        assert!(completed.cancel().is_err());
    }

    #[test]
    fn overdue_means_running_past_end() {
        let start = date(2025, 9, 8);
        let end = date(2025, 9, 22);
        let s = sprint(start, end, SprintStatus::InProgress);

        assert!(!s.is_overdue(end));
        assert!(s.is_overdue(end + chrono::Duration::days(1)));

        let done = sprint(start, end, SprintStatus::Completed);
        assert!(!done.is_overdue(end + chrono::Duration::days(1)));
    }

    #[test]
    fn time_progress_clamps_and_rounds() {
        let start = date(2025, 9, 8);
        let end = start + chrono::Duration::days(14);
        let s = sprint(start, end, SprintStatus::InProgress);

        assert_eq!(s.time_progress_percentage(start - chrono::Duration::days(1)), Decimal::ZERO);
        assert_eq!(s.time_progress_percentage(start), Decimal::ZERO);
        assert_eq!(s.time_progress_percentage(end), Decimal::from(100));
        assert_eq!(s.time_progress_percentage(end + chrono::Duration::days(5)), Decimal::from(100));
        assert_eq!(s.time_progress_percentage(start + chrono::Duration::days(7)), Decimal::from(50));
        // 1/14 = 7.142857... rounds half-up to 7.14
        assert_eq!(
            s.time_progress_percentage(start + chrono::Duration::days(1)),
            Decimal::new(714, 2)
        );
    }

    #[test]
    fn zero_duration_sprint_never_divides_by_zero() {
        let day = date(2025, 9, 8);
        let s = sprint(day, day, SprintStatus::Planned);
        assert_eq!(s.duration_days(), 0);
        assert_eq!(s.time_progress_percentage(day - chrono::Duration::days(1)), Decimal::ZERO);
        assert_eq!(s.time_progress_percentage(day), Decimal::from(100));
    }
}
