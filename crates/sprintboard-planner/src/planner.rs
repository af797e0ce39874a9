//! Planner facade
//!
//! Owns the board store, the drag session, the committer and the filter
//! projector, and is the only writer of board state. Every remote call is
//! awaited through `&mut self`, so mutations never interleave.

use std::sync::Arc;

use sprintboard_client::PlanningApi;
use sprintboard_core::models::{
    BacklogFilter, Container, Issue, IssueDraft, IssueType, PlannerConfig, Priority, Sprint,
    SprintDraft, SprintStatus,
};

use crate::board::{
    ApplyOutcome, BoardError, BoardStore, FetchedBacklog, FetchedBoard, MoveRecord,
    PendingBacklog, PendingLoad,
};
use crate::commit::{CommitError, Inverse, ReassignmentCommitter};
use crate::drag::{Direction, DragController, DragError, DragState};
use crate::event_manager::EventManager;
use crate::events::BoardEventType;
use crate::filter::{BacklogQuery, FilterProjector};
use crate::sprint::{check_complete, check_start, LifecycleError};

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("No project loaded")]
    NoProject,

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Drag(#[from] DragError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Api(#[from] sprintboard_client::Error),

    #[error(transparent)]
    Invalid(#[from] sprintboard_core::Error),
}

pub type Result<T> = std::result::Result<T, PlannerError>;

pub struct Planner<A: PlanningApi> {
    api: Arc<A>,
    store: BoardStore,
    drag: DragController,
    committer: ReassignmentCommitter,
    projector: FilterProjector,
    events: Arc<EventManager>,
    config: PlannerConfig,
}

impl<A: PlanningApi> Planner<A> {
    pub fn new(api: Arc<A>, config: PlannerConfig) -> Self {
        let events = Arc::new(EventManager::new());
        Self {
            api,
            store: BoardStore::new(),
            drag: DragController::new(),
            committer: ReassignmentCommitter::new(config.rollback_on_failure, events.clone()),
            projector: FilterProjector::new(config.debounce()),
            events,
            config,
        }
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    pub fn events(&self) -> &Arc<EventManager> {
        &self.events
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    pub fn filter(&self) -> &BacklogFilter {
        self.projector.filter()
    }

    fn project_id(&self) -> Result<String> {
        self.store
            .project_id()
            .map(str::to_string)
            .ok_or(PlannerError::NoProject)
    }

    /// Report a client-side rejection the same way a failed remote call is
    fn reject(&self, err: impl Into<PlannerError>) -> PlannerError {
        let err = err.into();
        self.events.notify_error(err.to_string());
        err
    }

    // ---- Loading ----

    /// Ticket a full load. Switching project drops any pending filter query
    /// and any drag in progress.
    pub fn begin_load(&mut self, project_id: &str) -> PendingLoad<A> {
        if self.projector.project_id() != Some(project_id) {
            tracing::info!("Switching to project {}", project_id);
            self.drag.cancel();
            self.projector
                .set_project(project_id, self.config.reset_filters_on_project_switch);
        }

        let ticket = self.store.begin_load(project_id);
        PendingLoad::new(self.api.clone(), ticket, self.projector.filter().clone())
    }

    /// Apply a fetched board. A failed fetch leaves the board untouched.
    pub fn finish_load(&mut self, fetched: FetchedBoard) -> Result<ApplyOutcome> {
        let FetchedBoard { ticket, result } = fetched;

        let snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) if !self.store.is_current(&ticket) => {
                tracing::debug!(
                    "Ignoring failure of superseded load {}: {}",
                    ticket.generation(),
                    e
                );
                return Ok(ApplyOutcome::Stale);
            }
            Err(e) => {
                self.events.notify_error(format!(
                    "Failed to load board for {}: {}",
                    ticket.project_id, e
                ));
                return Err(e.into());
            }
        };

        let outcome = self.store.apply_snapshot(&ticket, snapshot);
        if outcome != ApplyOutcome::Stale {
            tracing::info!(
                "Loaded project {}: {} sprints, {} backlog issues",
                ticket.project_id,
                self.store.sprints().len(),
                self.store.backlog().len()
            );
            self.events.emit(BoardEventType::Loaded {
                project_id: ticket.project_id,
                sprint_count: self.store.sprints().len(),
                backlog_count: self.store.backlog().len(),
            });
        }
        Ok(outcome)
    }

    /// Load (or reload) a project's sprints and backlog
    pub async fn load(&mut self, project_id: &str) -> Result<ApplyOutcome> {
        let fetched = self.begin_load(project_id).fetch().await;
        self.finish_load(fetched)
    }

    /// Ticket a backlog re-query. `None` when the query targets a project
    /// that is no longer on the board.
    pub fn begin_backlog_refresh(&mut self, query: BacklogQuery) -> Option<PendingBacklog<A>> {
        if self.store.project_id() != Some(query.project_id.as_str()) {
            tracing::debug!(
                "Dropping backlog query for inactive project {}",
                query.project_id
            );
            return None;
        }
        let ticket = self.store.begin_backlog_load(&query.project_id);
        Some(PendingBacklog::new(self.api.clone(), ticket, query.filter))
    }

    pub fn finish_backlog_refresh(&mut self, fetched: FetchedBacklog) -> Result<ApplyOutcome> {
        let FetchedBacklog { ticket, result } = fetched;

        let issues = match result {
            Ok(issues) => issues,
            Err(e) if !self.store.is_current(&ticket) => {
                tracing::debug!("Ignoring failure of superseded backlog query: {}", e);
                return Ok(ApplyOutcome::Stale);
            }
            Err(e) => {
                self.events
                    .notify_error(format!("Failed to load backlog: {}", e));
                return Err(e.into());
            }
        };

        let outcome = self.store.apply_backlog(&ticket, issues);
        if outcome == ApplyOutcome::Applied {
            self.events.emit(BoardEventType::BacklogRefreshed {
                project_id: ticket.project_id,
                count: self.store.backlog().len(),
            });
        }
        Ok(outcome)
    }

    pub async fn refresh_backlog(&mut self, query: BacklogQuery) -> Result<ApplyOutcome> {
        let Some(pending) = self.begin_backlog_refresh(query) else {
            return Ok(ApplyOutcome::Stale);
        };
        let fetched = pending.fetch().await;
        self.finish_backlog_refresh(fetched)
    }

    /// Wait for the next debounced filter query
    pub async fn next_query(&mut self) -> Option<BacklogQuery> {
        self.projector.next_query().await
    }

    /// A debounced filter query that is already due, if any
    pub fn try_next_query(&mut self) -> Option<BacklogQuery> {
        self.projector.try_next_query()
    }

    // ---- Filters ----

    pub fn set_search(&mut self, text: impl Into<String>) -> bool {
        self.projector.set_search(text)
    }

    pub fn set_issue_type(&mut self, issue_type: Option<IssueType>) -> bool {
        self.projector.set_issue_type(issue_type)
    }

    pub fn set_priority(&mut self, priority: Option<Priority>) -> bool {
        self.projector.set_priority(priority)
    }

    pub fn set_filter(&mut self, filter: BacklogFilter) -> bool {
        self.projector.set_filter(filter)
    }

    pub fn clear_filters(&mut self) -> bool {
        self.projector.clear()
    }

    /// Backlog as currently filtered
    pub fn visible_backlog(&self) -> Vec<&Issue> {
        self.projector.project(self.store.backlog())
    }

    // ---- Drag and drop ----

    pub fn drag_start(&mut self, issue_id: &str) -> Result<()> {
        self.drag.start(&self.store, issue_id)?;
        Ok(())
    }

    pub fn drag_over(&mut self, over_id: &str) {
        self.drag.hover(over_id);
    }

    pub fn drag_nudge(&mut self, direction: Direction) -> Option<Container> {
        self.drag.nudge(&self.store, direction)
    }

    pub fn drag_cancel(&mut self) {
        self.drag.cancel();
    }

    /// End the drag over `over_id` (or the last hovered zone) and commit the
    /// move. `Ok(None)` when the drop changes nothing.
    pub async fn drop_on(&mut self, over_id: Option<&str>) -> Result<Option<MoveRecord>> {
        let Some(resolution) = self.drag.drop(&self.store, over_id) else {
            return Ok(None);
        };

        let record = self
            .committer
            .commit(
                self.api.as_ref(),
                &mut self.store,
                &resolution.issue_id,
                &resolution.from,
                &resolution.to,
            )
            .await?;
        Ok(record)
    }

    /// Move without a drag session
    pub async fn move_issue(&mut self, issue_id: &str, to: &Container) -> Result<Option<MoveRecord>> {
        let from = self
            .store
            .container_of(issue_id)
            .cloned()
            .ok_or_else(|| self.reject(BoardError::IssueNotFound(issue_id.to_string())))?;

        if !self.store.has_container(to) {
            return Err(self.reject(BoardError::SprintNotFound(to.to_string())));
        }

        let record = self
            .committer
            .commit(self.api.as_ref(), &mut self.store, issue_id, &from, to)
            .await?;
        Ok(record)
    }

    // ---- Sprint lifecycle ----

    pub async fn start_sprint(&mut self, sprint_id: &str) -> Result<()> {
        let previous = check_start(&self.store, sprint_id).map_err(|e| self.reject(e))?;
        self.change_status(sprint_id, previous, SprintStatus::Active)
            .await
    }

    pub async fn complete_sprint(&mut self, sprint_id: &str) -> Result<()> {
        let previous = check_complete(&self.store, sprint_id).map_err(|e| self.reject(e))?;
        self.change_status(sprint_id, previous, SprintStatus::Completed)
            .await
    }

    async fn change_status(
        &mut self,
        sprint_id: &str,
        previous: SprintStatus,
        status: SprintStatus,
    ) -> Result<()> {
        let name = self
            .store
            .container_label(&Container::Sprint(sprint_id.to_string()));

        self.store.set_sprint_status(sprint_id, status)?;
        self.events.emit(BoardEventType::SprintStatusChanged {
            sprint_id: sprint_id.to_string(),
            status,
        });

        let (result, verb) = match status {
            SprintStatus::Completed => (self.api.complete_sprint(sprint_id).await, "complete"),
            _ => (self.api.start_sprint(sprint_id).await, "start"),
        };

        let inverse = Inverse::SprintStatus {
            sprint_id: sprint_id.to_string(),
            previous,
        };
        self.committer.settle(
            &mut self.store,
            inverse,
            result,
            format!("{} is now {}", name, status.as_str().to_lowercase()),
            format!("Failed to {} {}", verb, name),
        )?;
        Ok(())
    }

    /// Delete a sprint; its issues return to the backlog
    pub async fn delete_sprint(&mut self, sprint_id: &str) -> Result<()> {
        let removed = self
            .store
            .remove_sprint(sprint_id)
            .map_err(|e| self.reject(e))?;
        let name = removed.sprint.name.clone();
        self.events.emit(BoardEventType::SprintDeleted {
            sprint_id: sprint_id.to_string(),
        });

        let result = self.api.delete_sprint(sprint_id).await;
        self.committer.settle(
            &mut self.store,
            Inverse::RestoreSprint(removed),
            result,
            format!("{} deleted", name),
            format!("Failed to delete {}", name),
        )?;
        Ok(())
    }

    pub async fn delete_issue(&mut self, issue_id: &str) -> Result<()> {
        let removed = self
            .store
            .remove_issue(issue_id)
            .map_err(|e| self.reject(e))?;
        let key = removed.issue.key.clone();
        self.events.emit(BoardEventType::IssueDeleted {
            issue_id: issue_id.to_string(),
        });

        let result = self.api.delete_issue(issue_id).await;
        self.committer.settle(
            &mut self.store,
            Inverse::RestoreIssue(removed),
            result,
            format!("{} deleted", key),
            format!("Failed to delete {}", key),
        )?;
        Ok(())
    }

    // ---- Creation and edits (server assigns ids, so not optimistic) ----

    pub async fn create_sprint(&mut self, draft: SprintDraft) -> Result<Sprint> {
        let project_id = self.project_id()?;
        draft.validate().map_err(|e| self.reject(e))?;

        let sprint = match self.api.create_sprint(&project_id, &draft).await {
            Ok(sprint) => sprint,
            Err(e) => {
                self.events
                    .notify_error(format!("Failed to create {}: {}", draft.name, e));
                return Err(e.into());
            }
        };

        self.store
            .insert_sprint(sprint.clone())
            .map_err(|e| self.reject(e))?;
        tracing::info!("Created sprint {} ({})", sprint.name, sprint.id);
        self.events.emit(BoardEventType::SprintCreated {
            sprint_id: sprint.id.clone(),
        });
        self.events
            .notify_success(format!("{} created", sprint.name));
        Ok(sprint)
    }

    pub async fn update_sprint(&mut self, sprint_id: &str, draft: SprintDraft) -> Result<Sprint> {
        if self.store.sprint(sprint_id).is_none() {
            return Err(self.reject(BoardError::SprintNotFound(sprint_id.to_string())));
        }
        draft.validate().map_err(|e| self.reject(e))?;

        let sprint = match self.api.update_sprint(sprint_id, &draft).await {
            Ok(sprint) => sprint,
            Err(e) => {
                self.events
                    .notify_error(format!("Failed to update {}: {}", draft.name, e));
                return Err(e.into());
            }
        };

        self.store
            .replace_sprint(sprint.clone())
            .map_err(|e| self.reject(e))?;
        self.events.emit(BoardEventType::SprintUpdated {
            sprint_id: sprint.id.clone(),
        });
        self.events
            .notify_success(format!("{} updated", sprint.name));
        Ok(sprint)
    }

    pub async fn create_issue(&mut self, draft: IssueDraft) -> Result<Issue> {
        let project_id = self.project_id()?;
        draft.validate().map_err(|e| self.reject(e))?;
        let container = Container::from_sprint_id(draft.sprint_id.as_deref());
        if !self.store.has_container(&container) {
            return Err(self.reject(BoardError::SprintNotFound(container.to_string())));
        }

        let issue = match self.api.create_issue(&project_id, &draft).await {
            Ok(issue) => issue,
            Err(e) => {
                self.events
                    .notify_error(format!("Failed to create issue: {}", e));
                return Err(e.into());
            }
        };

        self.store
            .insert_issue(issue.clone())
            .map_err(|e| self.reject(e))?;
        tracing::info!("Created issue {} in {}", issue.key, container);
        self.events.emit(BoardEventType::IssueCreated {
            issue_id: issue.id.clone(),
        });
        self.events.notify_success(format!("{} created", issue.key));
        Ok(issue)
    }
}
