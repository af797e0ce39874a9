//! Turns search text and categorical filters into debounced backlog queries

use std::time::Duration;

use sprintboard_core::models::{BacklogFilter, Issue, IssueType, Priority};
use tokio::sync::mpsc;

use super::debounce::Debouncer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklogQuery {
    pub project_id: String,
    pub filter: BacklogFilter,
}

pub struct FilterProjector {
    filter: BacklogFilter,
    project_id: Option<String>,
    debouncer: Debouncer,
    query_tx: mpsc::UnboundedSender<BacklogQuery>,
    query_rx: mpsc::UnboundedReceiver<BacklogQuery>,
}

impl FilterProjector {
    pub fn new(debounce: Duration) -> Self {
        let (query_tx, query_rx) = mpsc::unbounded_channel();
        Self {
            filter: BacklogFilter::default(),
            project_id: None,
            debouncer: Debouncer::new(debounce),
            query_tx,
            query_rx,
        }
    }

    pub fn filter(&self) -> &BacklogFilter {
        &self.filter
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Point the projector at another project. Any query still waiting on
    /// the debounce timer is dropped; the filter survives unless
    /// `reset_filters` is set and a previous project was selected.
    pub fn set_project(&mut self, project_id: &str, reset_filters: bool) {
        self.debouncer.cancel();
        while self.query_rx.try_recv().is_ok() {}

        if reset_filters && self.project_id.is_some() {
            self.filter = BacklogFilter::default();
        }
        self.project_id = Some(project_id.to_string());
    }

    pub fn set_search(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        let search = if text.is_empty() { None } else { Some(text) };
        self.update(|f| f.search = search)
    }

    pub fn set_issue_type(&mut self, issue_type: Option<IssueType>) -> bool {
        self.update(|f| f.issue_type = issue_type)
    }

    pub fn set_priority(&mut self, priority: Option<Priority>) -> bool {
        self.update(|f| f.priority = priority)
    }

    pub fn set_filter(&mut self, filter: BacklogFilter) -> bool {
        self.update(|f| *f = filter)
    }

    pub fn clear(&mut self) -> bool {
        self.update(|f| *f = BacklogFilter::default())
    }

    /// Apply a change; a query is scheduled only if the filter actually
    /// changed and a project is selected. Returns whether one was scheduled.
    fn update(&mut self, change: impl FnOnce(&mut BacklogFilter)) -> bool {
        let before = self.filter.clone();
        change(&mut self.filter);
        if self.filter == before {
            return false;
        }

        let Some(query) = self.current_query() else {
            return false;
        };

        tracing::debug!(
            "Scheduling backlog query in {:?}: {:?}",
            self.debouncer.delay(),
            query.filter
        );
        self.debouncer.schedule(self.query_tx.clone(), query);
        true
    }

    /// Query for the current project and filter, without waiting
    pub fn current_query(&self) -> Option<BacklogQuery> {
        Some(BacklogQuery {
            project_id: self.project_id.clone()?,
            filter: self.filter.clone(),
        })
    }

    /// Wait for the next debounced query
    pub async fn next_query(&mut self) -> Option<BacklogQuery> {
        self.query_rx.recv().await
    }

    pub fn try_next_query(&mut self) -> Option<BacklogQuery> {
        self.query_rx.try_recv().ok()
    }

    /// Local filtered view of already loaded issues
    pub fn project<'a>(&self, issues: &'a [Issue]) -> Vec<&'a Issue> {
        self.filter.apply(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::issue;

    fn projector() -> FilterProjector {
        let mut projector = FilterProjector::new(Duration::from_millis(500));
        projector.set_project("p1", false);
        projector
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystrokes_collapse_into_one_query() {
        let mut projector = projector();
        projector.set_search("l");
        projector.set_search("lo");
        projector.set_search("login");

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(projector.try_next_query().is_none());

        let query = projector.next_query().await.unwrap();
        assert_eq!(query.project_id, "p1");
        assert_eq!(query.filter.search.as_deref(), Some("login"));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(projector.try_next_query().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_filter_schedules_nothing() {
        let mut projector = projector();
        assert!(projector.set_issue_type(Some(IssueType::Bug)));
        let _ = projector.next_query().await;

        assert!(!projector.set_issue_type(Some(IssueType::Bug)));
        assert!(!projector.set_search(""));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(projector.try_next_query().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_project_no_query() {
        let mut projector = FilterProjector::new(Duration::from_millis(500));
        assert!(!projector.set_priority(Some(Priority::High)));
        assert_eq!(projector.filter().priority, Some(Priority::High));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(projector.try_next_query().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_project_switch_keeps_filters_and_drops_pending_query() {
        let mut projector = projector();
        projector.set_issue_type(Some(IssueType::Story));
        projector.set_project("p2", false);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(projector.try_next_query().is_none());

        let query = projector.current_query().unwrap();
        assert_eq!(query.project_id, "p2");
        assert_eq!(query.filter.issue_type, Some(IssueType::Story));
    }

    #[tokio::test(start_paused = true)]
    async fn test_project_switch_can_reset_filters() {
        let mut projector = projector();
        projector.set_search("crash");
        projector.set_project("p2", true);
        assert!(projector.filter().is_empty());
    }

    #[test]
    fn test_first_project_keeps_preset_filter() {
        let mut projector = FilterProjector::new(Duration::from_millis(500));
        projector.set_search("crash");
        projector.set_project("p1", true);
        assert_eq!(projector.filter().search.as_deref(), Some("crash"));
    }

    #[tokio::test]
    async fn test_identical_filters_give_identical_queries() {
        let mut projector = projector();
        projector.set_priority(Some(Priority::Low));
        let first = projector.current_query();
        projector.set_priority(Some(Priority::Low));
        assert_eq!(first, projector.current_query());
    }

    #[test]
    fn test_local_projection() {
        let mut projector = FilterProjector::new(Duration::from_millis(500));
        projector.set_issue_type(Some(IssueType::Story));
        let issues = vec![issue("I1", IssueType::Bug), issue("I2", IssueType::Story)];
        let view: Vec<&str> = projector
            .project(&issues)
            .iter()
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(view, vec!["I2"]);
    }
}
