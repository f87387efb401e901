mod achievement;
mod badge;
mod metrics;
mod project;
mod sprint;
mod team;
mod user;
mod user_story;

pub use achievement::AchievementRepository;
pub use badge::BadgeRepository;
pub use metrics::ProgressMetricRepository;
pub use project::ProjectRepository;
pub use sprint::SprintRepository;
pub use team::TeamRepository;
pub use user::UserRepository;
pub use user_story::{StoryRollup, UserStoryRepository};
