//! Drag session: which issue is in flight and where it lands

use sprintboard_core::models::Container;

use crate::board::BoardStore;

#[derive(Debug, thiserror::Error)]
pub enum DragError {
    #[error("Issue not on the board: {0}")]
    UnknownIssue(String),

    #[error("Already dragging issue {0}")]
    AlreadyDragging(String),
}

pub type Result<T> = std::result::Result<T, DragError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging {
        issue_id: String,
        origin: Container,
        /// Droppable id currently under the pointer or keyboard focus
        hover: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// A drop that actually changes the issue's container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropResolution {
    pub issue_id: String,
    pub from: Container,
    pub to: Container,
}

#[derive(Debug)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self {
            state: DragState::Idle,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn dragged_issue(&self) -> Option<&str> {
        match &self.state {
            DragState::Dragging { issue_id, .. } => Some(issue_id),
            DragState::Idle => None,
        }
    }

    pub fn start(&mut self, store: &BoardStore, issue_id: &str) -> Result<()> {
        if let DragState::Dragging { issue_id, .. } = &self.state {
            return Err(DragError::AlreadyDragging(issue_id.clone()));
        }

        let origin = store
            .container_of(issue_id)
            .cloned()
            .ok_or_else(|| DragError::UnknownIssue(issue_id.to_string()))?;

        tracing::debug!("Drag started for {} in {}", issue_id, origin);
        self.state = DragState::Dragging {
            issue_id: issue_id.to_string(),
            origin,
            hover: None,
        };
        Ok(())
    }

    /// Record the droppable id under the pointer
    pub fn hover(&mut self, over_id: impl Into<String>) {
        if let DragState::Dragging { hover, .. } = &mut self.state {
            *hover = Some(over_id.into());
        }
    }

    /// Keyboard dragging: move focus to the next or previous container in
    /// board order, wrapping around. Returns the newly focused container.
    pub fn nudge(&mut self, store: &BoardStore, direction: Direction) -> Option<Container> {
        let DragState::Dragging { origin, hover, .. } = &mut self.state else {
            return None;
        };

        let containers = store.containers();
        let current = hover
            .as_deref()
            .and_then(|id| store.resolve_droppable(id))
            .unwrap_or_else(|| origin.clone());
        let position = containers.iter().position(|c| *c == current).unwrap_or(0);

        let len = containers.len();
        let next = match direction {
            Direction::Next => (position + 1) % len,
            Direction::Previous => (position + len - 1) % len,
        };

        let target = containers[next].clone();
        *hover = Some(target.droppable_id().to_string());
        Some(target)
    }

    pub fn cancel(&mut self) {
        if let DragState::Dragging { issue_id, .. } = &self.state {
            tracing::debug!("Drag cancelled for {}", issue_id);
        }
        self.state = DragState::Idle;
    }

    /// End the session. `over_id` falls back to the last hovered id.
    /// Returns `None` (no-op) when either end is unresolved or both ends
    /// are the same container. Always leaves the controller idle.
    pub fn drop(&mut self, store: &BoardStore, over_id: Option<&str>) -> Option<DropResolution> {
        let DragState::Dragging {
            issue_id, hover, ..
        } = std::mem::replace(&mut self.state, DragState::Idle)
        else {
            return None;
        };

        let from = store.container_of(&issue_id).cloned();
        let to = over_id
            .or(hover.as_deref())
            .and_then(|id| store.resolve_droppable(id));

        match (from, to) {
            (Some(from), Some(to)) if from != to => Some(DropResolution { issue_id, from, to }),
            (from, to) => {
                tracing::debug!(
                    "Drop of {} is a no-op (from {:?}, to {:?})",
                    issue_id,
                    from,
                    to
                );
                None
            }
        }
    }
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}
