//! Board state: backlog, sprints and the issue lists they own

use std::collections::HashMap;

use sprintboard_core::models::{Container, Issue, Sprint, SprintStatus, BACKLOG_ID};

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("Issue not found: {0}")]
    IssueNotFound(String),

    #[error("Sprint not found: {0}")]
    SprintNotFound(String),

    #[error("Issue {issue_id} is not in {container}")]
    NotInContainer {
        issue_id: String,
        container: Container,
    },

    #[error("Issue already on the board: {0}")]
    DuplicateIssue(String),

    #[error("Sprint already on the board: {0}")]
    DuplicateSprint(String),

    #[error("Invalid data: {0}")]
    Invalid(#[from] sprintboard_core::Error),
}

pub type Result<T> = std::result::Result<T, BoardError>;

/// Issued when a fetch starts; a result is only applied if its ticket is
/// still current when it arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub project_id: String,
    generation: u64,
    backlog_seq: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Default)]
pub struct BoardSnapshot {
    pub sprints: Vec<Sprint>,
    pub backlog: Vec<Issue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Sprints applied; the backlog was refreshed more recently and kept
    BacklogKept,
    Stale,
}

/// Inverse of one optimistic move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub issue_id: String,
    pub from: Container,
    pub to: Container,
    pub from_index: usize,
}

#[derive(Debug, Clone)]
pub struct RemovedIssue {
    pub issue: Issue,
    pub container: Container,
    pub index: usize,
}

#[derive(Debug, Clone)]
pub struct RemovedSprint {
    pub sprint: Sprint,
    pub index: usize,
    /// Issues that were sent back to the backlog, in sprint order
    pub issue_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SprintSummary {
    pub issue_count: usize,
    /// Summed in `u64` so large server-side estimates cannot overflow
    pub story_points: u64,
    pub capacity: Option<u32>,
    pub over_capacity: bool,
}

/// Single owner of the planning board. Every mutation goes through a named
/// transition that keeps `index` in step with the lists, so each issue id
/// lives in exactly one container.
#[derive(Debug, Default)]
pub struct BoardStore {
    project_id: Option<String>,
    backlog: Vec<Issue>,
    sprints: Vec<Sprint>,
    sprint_issues: HashMap<String, Vec<Issue>>,
    index: HashMap<String, Container>,
    generation: u64,
    backlog_seq: u64,
}

impl BoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Start a full load; supersedes every load issued before it
    pub fn begin_load(&mut self, project_id: &str) -> LoadTicket {
        self.generation += 1;
        self.backlog_seq += 1;
        tracing::debug!(
            "Load {} started for project {}",
            self.generation,
            project_id
        );
        LoadTicket {
            project_id: project_id.to_string(),
            generation: self.generation,
            backlog_seq: self.backlog_seq,
        }
    }

    /// Start a backlog-only refresh; supersedes earlier backlog results
    pub fn begin_backlog_load(&mut self, project_id: &str) -> LoadTicket {
        self.backlog_seq += 1;
        LoadTicket {
            project_id: project_id.to_string(),
            generation: self.generation,
            backlog_seq: self.backlog_seq,
        }
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Replace the board with a fetched snapshot
    pub fn apply_snapshot(&mut self, ticket: &LoadTicket, snapshot: BoardSnapshot) -> ApplyOutcome {
        if !self.is_current(ticket) {
            tracing::warn!(
                "Discarding stale load {} for project {} (current load is {})",
                ticket.generation,
                ticket.project_id,
                self.generation
            );
            return ApplyOutcome::Stale;
        }

        let keep_backlog = ticket.backlog_seq != self.backlog_seq
            && self.project_id.as_deref() == Some(ticket.project_id.as_str());

        let backlog = if keep_backlog {
            std::mem::take(&mut self.backlog)
        } else {
            snapshot.backlog
        };

        self.project_id = Some(ticket.project_id.clone());
        self.sprints.clear();
        self.sprint_issues.clear();
        self.backlog.clear();
        self.index.clear();

        for mut sprint in snapshot.sprints {
            if self.sprint_issues.contains_key(&sprint.id) {
                tracing::warn!("Ignoring duplicate sprint {} in snapshot", sprint.id);
                continue;
            }
            let issues = std::mem::take(&mut sprint.issues);
            let container = Container::Sprint(sprint.id.clone());
            let list = self.dedup_into(container, issues);
            self.sprint_issues.insert(sprint.id.clone(), list);
            self.sprints.push(sprint);
        }

        self.backlog = self.dedup_into(Container::Backlog, backlog);

        if keep_backlog {
            ApplyOutcome::BacklogKept
        } else {
            ApplyOutcome::Applied
        }
    }

    /// Replace the backlog list with a fetched one. The server is
    /// authoritative: an issue it reports as backlog leaves any sprint list.
    pub fn apply_backlog(&mut self, ticket: &LoadTicket, issues: Vec<Issue>) -> ApplyOutcome {
        if !self.is_current(ticket)
            || ticket.backlog_seq != self.backlog_seq
            || self.project_id.as_deref() != Some(ticket.project_id.as_str())
        {
            tracing::warn!(
                "Discarding stale backlog result for project {}",
                ticket.project_id
            );
            return ApplyOutcome::Stale;
        }

        for issue in self.backlog.drain(..) {
            self.index.remove(&issue.id);
        }

        for issue in &issues {
            if let Some(Container::Sprint(sprint_id)) = self.index.get(&issue.id).cloned() {
                if let Some(list) = self.sprint_issues.get_mut(&sprint_id) {
                    list.retain(|i| i.id != issue.id);
                }
                self.index.remove(&issue.id);
            }
        }

        self.backlog = self.dedup_into(Container::Backlog, issues);
        ApplyOutcome::Applied
    }

    fn dedup_into(&mut self, container: Container, issues: Vec<Issue>) -> Vec<Issue> {
        let mut list = Vec::with_capacity(issues.len());
        for mut issue in issues {
            if let Some(existing) = self.index.get(&issue.id) {
                tracing::warn!(
                    "Issue {} listed in both {} and {}, keeping the first",
                    issue.id,
                    existing,
                    container
                );
                continue;
            }
            issue.sprint_id = container.sprint_id().map(str::to_string);
            self.index.insert(issue.id.clone(), container.clone());
            list.push(issue);
        }
        list
    }

    pub fn backlog(&self) -> &[Issue] {
        &self.backlog
    }

    pub fn sprints(&self) -> &[Sprint] {
        &self.sprints
    }

    pub fn sprint(&self, sprint_id: &str) -> Option<&Sprint> {
        self.sprints.iter().find(|s| s.id == sprint_id)
    }

    pub fn active_sprint(&self) -> Option<&Sprint> {
        self.sprints.iter().find(|s| s.is_active())
    }

    pub fn sprint_issues(&self, sprint_id: &str) -> &[Issue] {
        self.sprint_issues
            .get(sprint_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Issues of a container, `None` for an unknown sprint
    pub fn issues_in(&self, container: &Container) -> Option<&[Issue]> {
        match container {
            Container::Backlog => Some(&self.backlog),
            Container::Sprint(id) => self.sprint_issues.get(id).map(Vec::as_slice),
        }
    }

    fn list_mut(&mut self, container: &Container) -> Option<&mut Vec<Issue>> {
        match container {
            Container::Backlog => Some(&mut self.backlog),
            Container::Sprint(id) => self.sprint_issues.get_mut(id),
        }
    }

    pub fn issue(&self, issue_id: &str) -> Option<&Issue> {
        let container = self.index.get(issue_id)?;
        self.issues_in(container)?
            .iter()
            .find(|i| i.id == issue_id)
    }

    pub fn issue_count(&self) -> usize {
        self.index.len()
    }

    pub fn container_of(&self, issue_id: &str) -> Option<&Container> {
        self.index.get(issue_id)
    }

    pub fn has_container(&self, container: &Container) -> bool {
        match container {
            Container::Backlog => true,
            Container::Sprint(id) => self.sprint_issues.contains_key(id),
        }
    }

    /// Drop zones in board order: backlog first, then sprints
    pub fn containers(&self) -> Vec<Container> {
        std::iter::once(Container::Backlog)
            .chain(self.sprints.iter().map(|s| Container::Sprint(s.id.clone())))
            .collect()
    }

    /// Resolve the id under the pointer to a container. Container ids win;
    /// an issue id resolves to the container currently holding that issue.
    pub fn resolve_droppable(&self, over_id: &str) -> Option<Container> {
        if over_id == BACKLOG_ID {
            return Some(Container::Backlog);
        }
        if self.sprint_issues.contains_key(over_id) {
            return Some(Container::Sprint(over_id.to_string()));
        }
        self.index.get(over_id).cloned()
    }

    /// Human label for notices
    pub fn container_label(&self, container: &Container) -> String {
        match container {
            Container::Backlog => "Backlog".to_string(),
            Container::Sprint(id) => self
                .sprint(id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| id.clone()),
        }
    }

    /// Optimistic cut-and-paste of an issue: removed from `from`, prepended
    /// to `to`. Returns `None` when both containers are the same.
    pub fn move_issue(
        &mut self,
        issue_id: &str,
        from: &Container,
        to: &Container,
    ) -> Result<Option<MoveRecord>> {
        if from == to {
            return Ok(None);
        }

        match self.index.get(issue_id) {
            None => return Err(BoardError::IssueNotFound(issue_id.to_string())),
            Some(current) if current != from => {
                return Err(BoardError::NotInContainer {
                    issue_id: issue_id.to_string(),
                    container: from.clone(),
                })
            }
            Some(_) => {}
        }

        if !self.has_container(to) {
            return Err(BoardError::SprintNotFound(
                to.sprint_id().unwrap_or_default().to_string(),
            ));
        }

        let (from_index, mut issue) = self.take_issue(from, issue_id)?;
        issue.sprint_id = to.sprint_id().map(str::to_string);
        self.place(to, 0, issue)?;

        tracing::info!("Moved issue {} from {} to {}", issue_id, from, to);

        Ok(Some(MoveRecord {
            issue_id: issue_id.to_string(),
            from: from.clone(),
            to: to.clone(),
            from_index,
        }))
    }

    /// Undo a move if the issue is still where the move put it
    pub fn revert_move(&mut self, record: &MoveRecord) -> bool {
        if self.index.get(&record.issue_id) != Some(&record.to) || !self.has_container(&record.from)
        {
            tracing::warn!(
                "Cannot revert move of {}: board changed since the move",
                record.issue_id
            );
            return false;
        }

        let Ok((_, mut issue)) = self.take_issue(&record.to, &record.issue_id) else {
            return false;
        };
        issue.sprint_id = record.from.sprint_id().map(str::to_string);
        let restored = self.place(&record.from, record.from_index, issue).is_ok();
        if restored {
            tracing::info!("Reverted move of {} back to {}", record.issue_id, record.from);
        }
        restored
    }

    fn take_issue(&mut self, container: &Container, issue_id: &str) -> Result<(usize, Issue)> {
        let list = self
            .list_mut(container)
            .ok_or_else(|| BoardError::SprintNotFound(container.to_string()))?;
        let position = list
            .iter()
            .position(|i| i.id == issue_id)
            .ok_or_else(|| BoardError::IssueNotFound(issue_id.to_string()))?;
        let issue = list.remove(position);
        self.index.remove(issue_id);
        Ok((position, issue))
    }

    /// Insert at `position` (clamped to the list length)
    fn place(&mut self, container: &Container, position: usize, issue: Issue) -> Result<()> {
        let id = issue.id.clone();
        let list = self
            .list_mut(container)
            .ok_or_else(|| BoardError::SprintNotFound(container.to_string()))?;
        let position = position.min(list.len());
        list.insert(position, issue);
        self.index.insert(id, container.clone());
        Ok(())
    }

    /// Add a newly created issue at the top of its container
    pub fn insert_issue(&mut self, issue: Issue) -> Result<()> {
        issue.validate()?;
        if self.index.contains_key(&issue.id) {
            return Err(BoardError::DuplicateIssue(issue.id));
        }
        let container = Container::from_sprint_id(issue.sprint_id.as_deref());
        if !self.has_container(&container) {
            return Err(BoardError::SprintNotFound(container.to_string()));
        }
        self.place(&container, 0, issue)
    }

    pub fn remove_issue(&mut self, issue_id: &str) -> Result<RemovedIssue> {
        let container = self
            .index
            .get(issue_id)
            .cloned()
            .ok_or_else(|| BoardError::IssueNotFound(issue_id.to_string()))?;
        let (index, issue) = self.take_issue(&container, issue_id)?;
        Ok(RemovedIssue {
            issue,
            container,
            index,
        })
    }

    pub fn restore_issue(&mut self, removed: RemovedIssue) -> Result<()> {
        if self.index.contains_key(&removed.issue.id) {
            return Err(BoardError::DuplicateIssue(removed.issue.id));
        }
        self.place(&removed.container, removed.index, removed.issue)
    }

    /// Append a sprint; embedded issues are placed in it
    pub fn insert_sprint(&mut self, mut sprint: Sprint) -> Result<()> {
        sprint.validate()?;
        if self.sprint_issues.contains_key(&sprint.id) {
            return Err(BoardError::DuplicateSprint(sprint.id));
        }
        let issues = std::mem::take(&mut sprint.issues);
        let list = self.dedup_into(Container::Sprint(sprint.id.clone()), issues);
        self.sprint_issues.insert(sprint.id.clone(), list);
        self.sprints.push(sprint);
        Ok(())
    }

    /// Replace sprint metadata, keeping its issue list. Returns the old value.
    pub fn replace_sprint(&mut self, mut sprint: Sprint) -> Result<Sprint> {
        sprint.validate()?;
        sprint.issues.clear();
        let slot = self
            .sprints
            .iter_mut()
            .find(|s| s.id == sprint.id)
            .ok_or_else(|| BoardError::SprintNotFound(sprint.id.clone()))?;
        Ok(std::mem::replace(slot, sprint))
    }

    /// Remove a sprint; its issues go to the end of the backlog
    pub fn remove_sprint(&mut self, sprint_id: &str) -> Result<RemovedSprint> {
        let index = self
            .sprints
            .iter()
            .position(|s| s.id == sprint_id)
            .ok_or_else(|| BoardError::SprintNotFound(sprint_id.to_string()))?;
        let sprint = self.sprints.remove(index);
        let issues = self.sprint_issues.remove(sprint_id).unwrap_or_default();

        let mut issue_ids = Vec::with_capacity(issues.len());
        for mut issue in issues {
            issue.sprint_id = None;
            issue_ids.push(issue.id.clone());
            self.index.insert(issue.id.clone(), Container::Backlog);
            self.backlog.push(issue);
        }

        Ok(RemovedSprint {
            sprint,
            index,
            issue_ids,
        })
    }

    /// Put a removed sprint back, reclaiming its issues that are still in the backlog
    pub fn restore_sprint(&mut self, removed: RemovedSprint) -> Result<()> {
        if self.sprint_issues.contains_key(&removed.sprint.id) {
            return Err(BoardError::DuplicateSprint(removed.sprint.id));
        }

        let sprint_id = removed.sprint.id.clone();
        let position = removed.index.min(self.sprints.len());
        self.sprints.insert(position, removed.sprint);
        self.sprint_issues.insert(sprint_id.clone(), Vec::new());

        let container = Container::Sprint(sprint_id);
        for issue_id in &removed.issue_ids {
            if self.index.get(issue_id) != Some(&Container::Backlog) {
                continue;
            }
            let (_, mut issue) = self.take_issue(&Container::Backlog, issue_id)?;
            issue.sprint_id = container.sprint_id().map(str::to_string);
            let end = self.issues_in(&container).map_or(0, <[Issue]>::len);
            self.place(&container, end, issue)?;
        }
        Ok(())
    }

    /// Set a sprint's status, returning the previous one
    pub fn set_sprint_status(&mut self, sprint_id: &str, status: SprintStatus) -> Result<SprintStatus> {
        let sprint = self
            .sprints
            .iter_mut()
            .find(|s| s.id == sprint_id)
            .ok_or_else(|| BoardError::SprintNotFound(sprint_id.to_string()))?;
        Ok(std::mem::replace(&mut sprint.status, status))
    }

    pub fn sprint_summary(&self, sprint_id: &str) -> Option<SprintSummary> {
        let sprint = self.sprint(sprint_id)?;
        let issues = self.sprint_issues(sprint_id);
        let story_points: u64 = issues.iter().map(|i| u64::from(i.points())).sum();
        Some(SprintSummary {
            issue_count: issues.len(),
            story_points,
            capacity: sprint.capacity,
            over_capacity: sprint.capacity.is_some_and(|c| story_points > u64::from(c)),
        })
    }

    /// Every issue id appears exactly once and the index agrees with the lists
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        let mut seen = HashMap::new();
        for container in self.containers() {
            for issue in self.issues_in(&container).unwrap() {
                assert!(
                    seen.insert(issue.id.clone(), container.clone()).is_none(),
                    "issue {} appears twice",
                    issue.id
                );
                assert_eq!(issue.sprint_id.as_deref(), container.sprint_id());
            }
        }
        assert_eq!(seen, self.index);
    }
}
