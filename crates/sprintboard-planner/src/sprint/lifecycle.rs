//! Client-side guards for sprint status changes

use sprintboard_core::models::SprintStatus;

use crate::board::BoardStore;

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Sprint not found: {0}")]
    SprintNotFound(String),

    #[error("Sprint {0} is already active")]
    AlreadyActive(String),

    #[error("Sprint {0} is already active; complete it before starting another")]
    AnotherSprintActive(String),

    #[error("Cannot change sprint {sprint_id} from {} to {}", from.as_str(), to.as_str())]
    InvalidTransition {
        sprint_id: String,
        from: SprintStatus,
        to: SprintStatus,
    },
}

pub type Result<T> = std::result::Result<T, LifecycleError>;

fn check_transition(store: &BoardStore, sprint_id: &str, to: SprintStatus) -> Result<SprintStatus> {
    let sprint = store
        .sprint(sprint_id)
        .ok_or_else(|| LifecycleError::SprintNotFound(sprint_id.to_string()))?;

    if !sprint.status.can_transition_to(to) {
        return Err(LifecycleError::InvalidTransition {
            sprint_id: sprint_id.to_string(),
            from: sprint.status,
            to,
        });
    }
    Ok(sprint.status)
}

/// A sprint may start only from planned, and only while no other sprint
/// of the project is active. Returns the status to restore on failure.
pub fn check_start(store: &BoardStore, sprint_id: &str) -> Result<SprintStatus> {
    if let Some(active) = store.active_sprint() {
        if active.id == sprint_id {
            return Err(LifecycleError::AlreadyActive(sprint_id.to_string()));
        }
        if store.sprint(sprint_id).is_some() {
            return Err(LifecycleError::AnotherSprintActive(active.id.clone()));
        }
    }
    check_transition(store, sprint_id, SprintStatus::Active)
}

pub fn check_complete(store: &BoardStore, sprint_id: &str) -> Result<SprintStatus> {
    check_transition(store, sprint_id, SprintStatus::Completed)
}
