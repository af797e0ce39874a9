//! Fixtures and an in-memory `PlanningApi` for planner tests

use async_trait::async_trait;
use chrono::NaiveDate;
use sprintboard_client::{Error, PlanningApi, Result};
use sprintboard_core::models::{
    BacklogFilter, Issue, IssueDraft, IssueType, Priority, Sprint, SprintDraft, SprintStatus,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub fn issue(id: &str, issue_type: IssueType) -> Issue {
    Issue {
        id: id.to_string(),
        key: format!("PM-{}", id),
        title: format!("Issue {}", id),
        issue_type,
        priority: Priority::Medium,
        story_points: Some(3),
        assignee_id: None,
        sprint_id: None,
    }
}

pub fn sprint(id: &str, status: SprintStatus) -> Sprint {
    Sprint {
        id: id.to_string(),
        name: format!("Sprint {}", id),
        start_date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 3, 13).unwrap(),
        status,
        capacity: Some(5),
        goal: None,
        issues: vec![],
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ListSprints(String),
    ListBacklog(String, BacklogFilter),
    Assign {
        sprint_id: Option<String>,
        issue_ids: Vec<String>,
    },
    Start(String),
    Complete(String),
    DeleteSprint(String),
    DeleteIssue(String),
    CreateSprint(String),
    UpdateSprint(String),
    CreateIssue(String),
}

#[derive(Default)]
struct FakeState {
    sprints: HashMap<String, Vec<Sprint>>,
    backlog: HashMap<String, Vec<Issue>>,
    calls: Vec<ApiCall>,
    failing: HashSet<&'static str>,
    malformed: bool,
    next_id: u32,
}

/// Records every call; operations named in `fail_on` return a 500
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project(self, project_id: &str, sprints: Vec<Sprint>, backlog: Vec<Issue>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.sprints.insert(project_id.to_string(), sprints);
            state.backlog.insert(project_id.to_string(), backlog);
        }
        self
    }

    pub fn fail_on(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.remove(operation);
    }

    /// Created entities come back failing local validation
    pub fn return_malformed(&self) {
        self.state.lock().unwrap().malformed = true;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn assign_calls(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, ApiCall::Assign { .. }))
            .collect()
    }

    fn record(&self, operation: &'static str, call: ApiCall) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if state.failing.contains(operation) {
            return Err(Error::Api {
                status: 500,
                message: format!("{} failed", operation),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PlanningApi for FakeApi {
    async fn list_sprints(&self, project_id: &str) -> Result<Vec<Sprint>> {
        self.record("list_sprints", ApiCall::ListSprints(project_id.to_string()))?;
        let state = self.state.lock().unwrap();
        Ok(state.sprints.get(project_id).cloned().unwrap_or_default())
    }

    async fn list_backlog(&self, project_id: &str, filter: &BacklogFilter) -> Result<Vec<Issue>> {
        self.record(
            "list_backlog",
            ApiCall::ListBacklog(project_id.to_string(), filter.clone()),
        )?;
        let state = self.state.lock().unwrap();
        let backlog = state.backlog.get(project_id).cloned().unwrap_or_default();
        Ok(filter.apply(&backlog).into_iter().cloned().collect())
    }

    async fn assign_sprint(&self, sprint_id: Option<&str>, issue_ids: &[String]) -> Result<()> {
        self.record(
            "assign_sprint",
            ApiCall::Assign {
                sprint_id: sprint_id.map(str::to_string),
                issue_ids: issue_ids.to_vec(),
            },
        )
    }

    async fn start_sprint(&self, sprint_id: &str) -> Result<()> {
        self.record("start_sprint", ApiCall::Start(sprint_id.to_string()))
    }

    async fn complete_sprint(&self, sprint_id: &str) -> Result<()> {
        self.record("complete_sprint", ApiCall::Complete(sprint_id.to_string()))
    }

    async fn delete_sprint(&self, sprint_id: &str) -> Result<()> {
        self.record("delete_sprint", ApiCall::DeleteSprint(sprint_id.to_string()))
    }

    async fn delete_issue(&self, issue_id: &str) -> Result<()> {
        self.record("delete_issue", ApiCall::DeleteIssue(issue_id.to_string()))
    }

    async fn create_sprint(&self, project_id: &str, draft: &SprintDraft) -> Result<Sprint> {
        self.record("create_sprint", ApiCall::CreateSprint(project_id.to_string()))?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        Ok(Sprint {
            id: format!("new-s{}", state.next_id),
            name: draft.name.clone(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: SprintStatus::Planned,
            capacity: if state.malformed { Some(0) } else { draft.capacity },
            goal: draft.goal.clone(),
            issues: vec![],
        })
    }

    async fn update_sprint(&self, sprint_id: &str, draft: &SprintDraft) -> Result<Sprint> {
        self.record("update_sprint", ApiCall::UpdateSprint(sprint_id.to_string()))?;
        let mut updated = sprint(sprint_id, SprintStatus::Planned);
        updated.apply_draft(draft)?;
        Ok(updated)
    }

    async fn create_issue(&self, project_id: &str, draft: &IssueDraft) -> Result<Issue> {
        self.record("create_issue", ApiCall::CreateIssue(project_id.to_string()))?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        Ok(Issue {
            id: format!("new-i{}", state.next_id),
            key: if state.malformed {
                String::new()
            } else {
                format!("PM-{}", 100 + state.next_id)
            },
            title: draft.title.clone(),
            issue_type: draft.issue_type,
            priority: draft.priority,
            story_points: draft.story_points,
            assignee_id: draft.assignee_id.clone(),
            sprint_id: draft.sprint_id.clone(),
        })
    }
}
