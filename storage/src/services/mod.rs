pub mod progress_analytics;
pub mod scoring;
pub mod sprint_lifecycle;
pub mod story_workflow;
