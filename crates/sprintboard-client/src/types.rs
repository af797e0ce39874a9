//! Wire types that only exist on the HTTP boundary

use serde::{Deserialize, Serialize};

/// Body of `PUT /issues/sprint`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AssignSprintRequest {
    /// `None` sends the issues back to the backlog
    pub sprint_id: Option<String>,
    pub issue_ids: Vec<String>,
}

/// Error body returned by the backend on non-2xx responses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(alias = "error")]
    pub message: String,
}
