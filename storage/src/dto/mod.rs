pub mod achievement;
pub mod analytics;
pub mod badge;
pub mod sprint;
pub mod team;
pub mod user_story;
