//! Drag-and-drop containers: the backlog or one sprint

use serde::{Deserialize, Serialize};
use std::fmt;

/// Droppable id of the backlog zone
pub const BACKLOG_ID: &str = "backlog";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Container {
    Backlog,
    Sprint(String),
}

impl Container {
    /// Build from an issue's sprint reference
    pub fn from_sprint_id(sprint_id: Option<&str>) -> Self {
        match sprint_id {
            Some(id) => Container::Sprint(id.to_string()),
            None => Container::Backlog,
        }
    }

    /// Sprint reference sent to the assign endpoint, `None` for the backlog
    pub fn sprint_id(&self) -> Option<&str> {
        match self {
            Container::Backlog => None,
            Container::Sprint(id) => Some(id),
        }
    }

    /// Id of the drop zone rendered for this container
    pub fn droppable_id(&self) -> &str {
        match self {
            Container::Backlog => BACKLOG_ID,
            Container::Sprint(id) => id,
        }
    }

    pub fn is_backlog(&self) -> bool {
        matches!(self, Container::Backlog)
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Backlog => write!(f, "backlog"),
            Container::Sprint(id) => write!(f, "sprint {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprint_reference() {
        assert_eq!(Container::from_sprint_id(None), Container::Backlog);
        let sprint = Container::from_sprint_id(Some("s1"));
        assert_eq!(sprint.sprint_id(), Some("s1"));
        assert_eq!(Container::Backlog.sprint_id(), None);
    }

    #[test]
    fn test_droppable_id() {
        assert_eq!(Container::Backlog.droppable_id(), BACKLOG_ID);
        assert_eq!(Container::Sprint("s9".to_string()).droppable_id(), "s9");
    }
}
