//! Issue data model

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub key: String,
    pub title: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    /// `None` while the issue sits in the backlog
    #[serde(default)]
    pub sprint_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    Bug,
    Feature,
    Task,
    Story,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

/// Payload used to create an issue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueDraft {
    pub title: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub sprint_id: Option<String>,
}

impl Issue {
    /// Validate the issue data
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("Issue ID cannot be empty".to_string()));
        }

        if self.key.trim().is_empty() {
            return Err(Error::Validation("Issue key cannot be empty".to_string()));
        }

        if self.title.trim().is_empty() {
            return Err(Error::Validation("Issue title cannot be empty".to_string()));
        }

        Ok(())
    }

    pub fn points(&self) -> u32 {
        self.story_points.unwrap_or(0)
    }
}

impl IssueDraft {
    pub fn new(title: impl Into<String>, issue_type: IssueType, priority: Priority) -> Self {
        Self {
            title: title.into(),
            issue_type,
            priority,
            story_points: None,
            assignee_id: None,
            sprint_id: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::Validation("Issue title cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl IssueType {
    pub const ALL: [Self; 4] = [Self::Bug, Self::Feature, Self::Task, Self::Story];

    /// Wire name, as used in query strings
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Bug => "BUG",
            IssueType::Feature => "FEATURE",
            IssueType::Task => "TASK",
            IssueType::Story => "STORY",
        }
    }
}

impl std::str::FromStr for IssueType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        IssueType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation(format!("Unknown issue type '{}'", s)))
    }
}

impl Priority {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Validation(format!("Unknown priority '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Issue {
        Issue {
            id: "i1".to_string(),
            key: "PM-1".to_string(),
            title: "Login fails".to_string(),
            issue_type: IssueType::Bug,
            priority: Priority::High,
            story_points: Some(3),
            assignee_id: None,
            sprint_id: None,
        }
    }

    #[test]
    fn test_validate() {
        assert!(sample().validate().is_ok());

        let mut issue = sample();
        issue.title = "   ".to_string();
        assert!(issue.validate().is_err());

        let mut issue = sample();
        issue.key = String::new();
        assert!(issue.validate().is_err());
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["type"], "BUG");
        assert_eq!(json["priority"], "HIGH");
        assert_eq!(json["storyPoints"], 3);
        assert!(json["sprintId"].is_null());
        assert!(json.get("assigneeId").is_none());
    }

    #[test]
    fn test_deserialize_minimal() {
        let issue: Issue = serde_json::from_str(
            r#"{"id":"i2","key":"PM-2","title":"Story","type":"STORY","priority":"LOW","sprintId":"s1"}"#,
        )
        .unwrap();
        assert_eq!(issue.issue_type, IssueType::Story);
        assert_eq!(issue.sprint_id.as_deref(), Some("s1"));
        assert_eq!(issue.points(), 0);
    }

    #[test]
    fn test_parse_type_and_priority() {
        assert_eq!("story".parse::<IssueType>().unwrap(), IssueType::Story);
        assert_eq!("Critical".parse::<Priority>().unwrap(), Priority::Critical);
        assert!("epic".parse::<IssueType>().is_err());
    }

    #[test]
    fn test_draft_validation() {
        let draft = IssueDraft::new("", IssueType::Task, Priority::Low);
        assert!(draft.validate().is_err());
        let draft = IssueDraft::new("Write docs", IssueType::Task, Priority::Low);
        assert!(draft.validate().is_ok());
    }
}
