mod achievement;
mod badge;
mod progress_metric;
mod project;
mod sprint;
mod team;
mod team_member;
mod trigger;
mod user;
mod user_story;

pub use achievement::{Achievement, Recipient};
pub use badge::{Badge, BadgeType, RecipientType};
pub use progress_metric::ProgressMetric;
pub use project::{Project, ProjectStatus};
pub use sprint::{Sprint, SprintStatus};
pub use team::Team;
pub use team_member::{TeamMember, TeamRole};
pub use trigger::{TriggerCondition, TriggerContext};
pub use user::{User, UserRole};
pub use user_story::{StoryPriority, StoryStatus, UserStory};

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 decimal places, half-up (away from zero on midpoints).
pub(crate) fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
