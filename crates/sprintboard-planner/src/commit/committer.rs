//! Optimistic mutations persisted through the API, with compensation on failure

use std::sync::Arc;

use sprintboard_client::PlanningApi;
use sprintboard_core::models::{Container, SprintStatus};

use crate::board::{BoardError, BoardStore, MoveRecord, RemovedIssue, RemovedSprint};
use crate::event_manager::EventManager;
use crate::events::BoardEventType;

#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("{context}: {source}")]
    Remote {
        context: String,
        #[source]
        source: sprintboard_client::Error,
        rolled_back: bool,
    },
}

pub type Result<T> = std::result::Result<T, CommitError>;

/// Undo information for one optimistic mutation
#[derive(Debug, Clone)]
pub enum Inverse {
    Move(MoveRecord),
    SprintStatus {
        sprint_id: String,
        previous: SprintStatus,
    },
    RestoreIssue(RemovedIssue),
    RestoreSprint(RemovedSprint),
}

impl Inverse {
    /// Apply the compensation and announce it. Returns false when the board
    /// has moved on and the inverse no longer applies.
    pub fn apply(self, store: &mut BoardStore, events: &EventManager) -> bool {
        match self {
            Inverse::Move(record) => {
                if !store.revert_move(&record) {
                    return false;
                }
                events.emit(BoardEventType::MoveReverted {
                    issue_id: record.issue_id,
                    from: record.from,
                    to: record.to,
                });
                true
            }
            Inverse::SprintStatus {
                sprint_id,
                previous,
            } => match store.set_sprint_status(&sprint_id, previous) {
                Ok(_) => {
                    events.emit(BoardEventType::SprintStatusChanged {
                        sprint_id,
                        status: previous,
                    });
                    true
                }
                Err(e) => {
                    tracing::warn!("Cannot restore status of {}: {}", sprint_id, e);
                    false
                }
            },
            Inverse::RestoreIssue(removed) => {
                let issue_id = removed.issue.id.clone();
                match store.restore_issue(removed) {
                    Ok(()) => {
                        events.emit(BoardEventType::IssueRestored { issue_id });
                        true
                    }
                    Err(e) => {
                        tracing::warn!("Cannot restore issue {}: {}", issue_id, e);
                        false
                    }
                }
            }
            Inverse::RestoreSprint(removed) => {
                let sprint_id = removed.sprint.id.clone();
                match store.restore_sprint(removed) {
                    Ok(()) => {
                        events.emit(BoardEventType::SprintRestored { sprint_id });
                        true
                    }
                    Err(e) => {
                        tracing::warn!("Cannot restore sprint {}: {}", sprint_id, e);
                        false
                    }
                }
            }
        }
    }
}

/// A move applied locally and announced, awaiting the remote call
#[derive(Debug)]
pub struct PendingMove {
    record: MoveRecord,
}

impl PendingMove {
    pub fn record(&self) -> &MoveRecord {
        &self.record
    }
}

pub struct ReassignmentCommitter {
    rollback_on_failure: bool,
    events: Arc<EventManager>,
}

impl ReassignmentCommitter {
    pub fn new(rollback_on_failure: bool, events: Arc<EventManager>) -> Self {
        Self {
            rollback_on_failure,
            events,
        }
    }

    /// Move the issue locally and announce it before any network call.
    /// `None` when `from == to`.
    pub fn stage(
        &self,
        store: &mut BoardStore,
        issue_id: &str,
        from: &Container,
        to: &Container,
    ) -> Result<Option<PendingMove>> {
        let Some(record) = store.move_issue(issue_id, from, to)? else {
            return Ok(None);
        };

        self.events.emit(BoardEventType::IssueMoved {
            issue_id: record.issue_id.clone(),
            from: record.from.clone(),
            to: record.to.clone(),
        });

        Ok(Some(PendingMove { record }))
    }

    /// One assign call for the single moved issue
    pub async fn persist<A: PlanningApi + ?Sized>(
        &self,
        api: &A,
        pending: &PendingMove,
    ) -> sprintboard_client::Result<()> {
        let record = &pending.record;
        api.assign_sprint(record.to.sprint_id(), std::slice::from_ref(&record.issue_id))
            .await
    }

    pub fn settle_move(
        &self,
        store: &mut BoardStore,
        pending: PendingMove,
        result: sprintboard_client::Result<()>,
    ) -> Result<MoveRecord> {
        let record = pending.record;
        let key = store
            .issue(&record.issue_id)
            .map(|i| i.key.clone())
            .unwrap_or_else(|| record.issue_id.clone());
        let target = store.container_label(&record.to);

        self.settle(
            store,
            Inverse::Move(record.clone()),
            result,
            format!("{} moved to {}", key, target),
            format!("Failed to move {} to {}", key, target),
        )?;
        Ok(record)
    }

    /// Stage, persist and settle a move
    pub async fn commit<A: PlanningApi + ?Sized>(
        &self,
        api: &A,
        store: &mut BoardStore,
        issue_id: &str,
        from: &Container,
        to: &Container,
    ) -> Result<Option<MoveRecord>> {
        let Some(pending) = self.stage(store, issue_id, from, to)? else {
            return Ok(None);
        };
        let result = self.persist(api, &pending).await;
        self.settle_move(store, pending, result).map(Some)
    }

    /// Finish an optimistic mutation with its remote result. On failure the
    /// inverse is applied (when rollback is enabled) and an error notice shown.
    pub fn settle(
        &self,
        store: &mut BoardStore,
        inverse: Inverse,
        result: sprintboard_client::Result<()>,
        success: String,
        context: String,
    ) -> Result<()> {
        match result {
            Ok(()) => {
                self.events.notify_success(success);
                Ok(())
            }
            Err(source) => {
                let rolled_back = self.rollback_on_failure && inverse.apply(store, &self.events);
                if !rolled_back {
                    tracing::warn!("{}: local board may differ from the server", context);
                }
                self.events.notify_error(format!("{}: {}", context, source));
                Err(CommitError::Remote {
                    context,
                    source,
                    rolled_back,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardSnapshot;
    use crate::events::NoticeLevel;
    use crate::test_support::{issue, sprint, ApiCall, FakeApi};
    use sprintboard_core::models::IssueType;

    fn store() -> BoardStore {
        let mut store = BoardStore::new();
        let ticket = store.begin_load("p1");
        store.apply_snapshot(
            &ticket,
            BoardSnapshot {
                sprints: vec![sprint("s1", SprintStatus::Planned)],
                backlog: vec![issue("i1", IssueType::Bug), issue("i2", IssueType::Story)],
            },
        );
        store
    }

    fn s1() -> Container {
        Container::Sprint("s1".to_string())
    }

    #[tokio::test]
    async fn test_commit_assigns_sprint_once() {
        let api = FakeApi::new();
        let events = Arc::new(EventManager::new());
        let mut rx = events.subscribe();
        let committer = ReassignmentCommitter::new(true, events);
        let mut store = store();

        let record = committer
            .commit(&api, &mut store, "i1", &Container::Backlog, &s1())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.to, s1());
        assert_eq!(
            api.calls(),
            vec![ApiCall::Assign {
                sprint_id: Some("s1".to_string()),
                issue_ids: vec!["i1".to_string()],
            }]
        );

        let moved = rx.recv().await.unwrap();
        assert!(matches!(moved.event_type, BoardEventType::IssueMoved { .. }));
        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.as_notice().unwrap().level, NoticeLevel::Success);
        assert_eq!(notice.as_notice().unwrap().message, "PM-i1 moved to Sprint s1");
    }

    #[tokio::test]
    async fn test_same_container_makes_no_call() {
        let api = FakeApi::new();
        let committer = ReassignmentCommitter::new(true, Arc::new(EventManager::new()));
        let mut store = store();

        let result = committer
            .commit(&api, &mut store, "i1", &Container::Backlog, &Container::Backlog)
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_commit_rolls_back() {
        let api = FakeApi::new();
        api.fail_on("assign_sprint");
        let events = Arc::new(EventManager::new());
        let mut rx = events.subscribe();
        let committer = ReassignmentCommitter::new(true, events);
        let mut store = store();

        let err = committer
            .commit(&api, &mut store, "i2", &Container::Backlog, &s1())
            .await
            .unwrap_err();

        assert!(matches!(err, CommitError::Remote { rolled_back: true, .. }));
        let backlog: Vec<&str> = store.backlog().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(backlog, vec!["i1", "i2"]);
        assert!(store.sprint_issues("s1").is_empty());
        store.assert_consistent();

        let kinds: Vec<BoardEventType> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| e.event_type)
            .collect();
        assert!(matches!(kinds[0], BoardEventType::IssueMoved { .. }));
        assert!(matches!(kinds[1], BoardEventType::MoveReverted { .. }));
        assert!(matches!(&kinds[2], BoardEventType::Notice(n) if n.level == NoticeLevel::Error));
    }

    #[tokio::test]
    async fn test_failed_commit_without_rollback_keeps_local_move() {
        let api = FakeApi::new();
        api.fail_on("assign_sprint");
        let committer = ReassignmentCommitter::new(false, Arc::new(EventManager::new()));
        let mut store = store();

        let err = committer
            .commit(&api, &mut store, "i1", &Container::Backlog, &s1())
            .await
            .unwrap_err();

        assert!(matches!(err, CommitError::Remote { rolled_back: false, .. }));
        assert_eq!(store.container_of("i1"), Some(&s1()));
    }

    #[tokio::test]
    async fn test_stage_applies_before_persist() {
        let api = FakeApi::new();
        let committer = ReassignmentCommitter::new(true, Arc::new(EventManager::new()));
        let mut store = store();

        let pending = committer
            .stage(&mut store, "i1", &Container::Backlog, &s1())
            .unwrap()
            .unwrap();
        assert_eq!(store.container_of("i1"), Some(&s1()));
        assert!(api.calls().is_empty());

        let result = committer.persist(&api, &pending).await;
        committer.settle_move(&mut store, pending, result).unwrap();
        assert_eq!(api.assign_calls().len(), 1);
    }

    #[test]
    fn test_status_inverse() {
        let events = EventManager::new();
        let mut store = store();
        store.set_sprint_status("s1", SprintStatus::Active).unwrap();

        let inverse = Inverse::SprintStatus {
            sprint_id: "s1".to_string(),
            previous: SprintStatus::Planned,
        };
        assert!(inverse.apply(&mut store, &events));
        assert_eq!(store.sprint("s1").unwrap().status, SprintStatus::Planned);

        let missing = Inverse::SprintStatus {
            sprint_id: "gone".to_string(),
            previous: SprintStatus::Planned,
        };
        assert!(!missing.apply(&mut store, &events));
    }
}
