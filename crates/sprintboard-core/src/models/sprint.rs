//! Sprint data model

use crate::models::Issue;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SprintStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    /// Embedded by the list endpoint. The board store moves these into its
    /// own per-sprint lists, so a stored sprint always has this empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SprintStatus {
    Planned,
    Active,
    Completed,
}

/// Create/edit form payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SprintDraft {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
}

fn validate_fields(
    name: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    capacity: Option<u32>,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation("Sprint name cannot be empty".to_string()));
    }

    if end_date < start_date {
        return Err(Error::Validation(format!(
            "Sprint end date {} is before start date {}",
            end_date, start_date
        )));
    }

    if capacity == Some(0) {
        return Err(Error::Validation(
            "Sprint capacity must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

impl Sprint {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("Sprint ID cannot be empty".to_string()));
        }
        validate_fields(&self.name, self.start_date, self.end_date, self.capacity)
    }

    pub fn is_active(&self) -> bool {
        self.status == SprintStatus::Active
    }

    /// Number of calendar days covered, both ends included
    pub fn duration_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Copy the editable fields of a draft onto this sprint
    pub fn apply_draft(&mut self, draft: &SprintDraft) -> Result<()> {
        draft.validate()?;
        self.name = draft.name.clone();
        self.start_date = draft.start_date;
        self.end_date = draft.end_date;
        self.capacity = draft.capacity;
        self.goal = draft.goal.clone();
        Ok(())
    }
}

impl SprintDraft {
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.name, self.start_date, self.end_date, self.capacity)
    }
}

impl SprintStatus {
    /// Transitions are one-way: planned, then active, then completed
    pub fn can_transition_to(&self, next: SprintStatus) -> bool {
        matches!(
            (self, next),
            (SprintStatus::Planned, SprintStatus::Active)
                | (SprintStatus::Active, SprintStatus::Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SprintStatus::Planned => "Planned",
            SprintStatus::Active => "Active",
            SprintStatus::Completed => "Completed",
        }
    }
}
