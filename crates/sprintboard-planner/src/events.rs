use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sprintboard_core::models::{Container, SprintStatus};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardEvent {
    pub event_type: BoardEventType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoardEventType {
    Loaded {
        project_id: String,
        sprint_count: usize,
        backlog_count: usize,
    },
    BacklogRefreshed {
        project_id: String,
        count: usize,
    },
    IssueMoved {
        issue_id: String,
        from: Container,
        to: Container,
    },
    /// A failed move was undone; `from`/`to` describe the original move
    MoveReverted {
        issue_id: String,
        from: Container,
        to: Container,
    },
    IssueCreated {
        issue_id: String,
    },
    IssueDeleted {
        issue_id: String,
    },
    IssueRestored {
        issue_id: String,
    },
    SprintCreated {
        sprint_id: String,
    },
    SprintUpdated {
        sprint_id: String,
    },
    SprintStatusChanged {
        sprint_id: String,
        status: SprintStatus,
    },
    SprintDeleted {
        sprint_id: String,
    },
    SprintRestored {
        sprint_id: String,
    },
    Notice(Notice),
}

/// Transient user-facing message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notice {
    pub id: Uuid,
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

impl BoardEvent {
    pub fn new(event_type: BoardEventType) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
        }
    }

    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self::new(BoardEventType::Notice(Notice {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
        }))
    }

    pub fn as_notice(&self) -> Option<&Notice> {
        match &self.event_type {
            BoardEventType::Notice(notice) => Some(notice),
            _ => None,
        }
    }
}
