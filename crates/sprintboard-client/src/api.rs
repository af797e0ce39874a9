//! The planning backend as seen by the board

use async_trait::async_trait;
use sprintboard_core::models::{BacklogFilter, Issue, IssueDraft, Sprint, SprintDraft};

use crate::Result;

/// Remote operations the planning board depends on.
/// Real implementation: [`crate::ApiClient`].
#[async_trait]
pub trait PlanningApi: Send + Sync {
    /// Sprints of a project, each with its issues embedded
    async fn list_sprints(&self, project_id: &str) -> Result<Vec<Sprint>>;

    async fn list_backlog(&self, project_id: &str, filter: &BacklogFilter) -> Result<Vec<Issue>>;

    /// Assign `issue_ids` to a sprint, or back to the backlog when `sprint_id` is `None`
    async fn assign_sprint(&self, sprint_id: Option<&str>, issue_ids: &[String]) -> Result<()>;

    async fn start_sprint(&self, sprint_id: &str) -> Result<()>;

    async fn complete_sprint(&self, sprint_id: &str) -> Result<()>;

    async fn delete_sprint(&self, sprint_id: &str) -> Result<()>;

    async fn delete_issue(&self, issue_id: &str) -> Result<()>;

    async fn create_sprint(&self, project_id: &str, draft: &SprintDraft) -> Result<Sprint>;

    async fn update_sprint(&self, sprint_id: &str, draft: &SprintDraft) -> Result<Sprint>;

    async fn create_issue(&self, project_id: &str, draft: &IssueDraft) -> Result<Issue>;
}
