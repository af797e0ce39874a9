//! Remote fetches that populate the board store

use std::sync::Arc;

use sprintboard_client::PlanningApi;
use sprintboard_core::models::{BacklogFilter, Issue};

use super::store::{BoardSnapshot, LoadTicket};

/// A full board load that has been ticketed but not fetched yet.
/// Owns everything it needs, so it can be moved into a spawned task.
pub struct PendingLoad<A: PlanningApi> {
    api: Arc<A>,
    ticket: LoadTicket,
    filter: BacklogFilter,
}

pub struct FetchedBoard {
    pub ticket: LoadTicket,
    pub result: sprintboard_client::Result<BoardSnapshot>,
}

impl<A: PlanningApi> PendingLoad<A> {
    pub(crate) fn new(api: Arc<A>, ticket: LoadTicket, filter: BacklogFilter) -> Self {
        Self {
            api,
            ticket,
            filter,
        }
    }

    pub fn ticket(&self) -> &LoadTicket {
        &self.ticket
    }

    /// Fetch sprints and backlog concurrently; either failure fails the load
    pub async fn fetch(self) -> FetchedBoard {
        let project_id = self.ticket.project_id.as_str();
        let result = tokio::try_join!(
            self.api.list_sprints(project_id),
            self.api.list_backlog(project_id, &self.filter),
        )
        .map(|(sprints, backlog)| BoardSnapshot { sprints, backlog });

        FetchedBoard {
            ticket: self.ticket,
            result,
        }
    }
}

pub struct PendingBacklog<A: PlanningApi> {
    api: Arc<A>,
    ticket: LoadTicket,
    filter: BacklogFilter,
}

pub struct FetchedBacklog {
    pub ticket: LoadTicket,
    pub result: sprintboard_client::Result<Vec<Issue>>,
}

impl<A: PlanningApi> PendingBacklog<A> {
    pub(crate) fn new(api: Arc<A>, ticket: LoadTicket, filter: BacklogFilter) -> Self {
        Self {
            api,
            ticket,
            filter,
        }
    }

    pub fn ticket(&self) -> &LoadTicket {
        &self.ticket
    }

    pub async fn fetch(self) -> FetchedBacklog {
        let result = self
            .api
            .list_backlog(&self.ticket.project_id, &self.filter)
            .await;
        FetchedBacklog {
            ticket: self.ticket,
            result,
        }
    }
}
