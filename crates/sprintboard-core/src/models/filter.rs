//! Backlog search and categorical filters

use crate::models::{Issue, IssueType, Priority};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl BacklogFilter {
    pub fn is_empty(&self) -> bool {
        self.search_term().is_none() && self.issue_type.is_none() && self.priority.is_none()
    }

    /// Trimmed search text, `None` when blank
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Case-insensitive search over key and title, exact match on type and priority
    pub fn matches(&self, issue: &Issue) -> bool {
        if let Some(issue_type) = self.issue_type {
            if issue.issue_type != issue_type {
                return false;
            }
        }

        if let Some(priority) = self.priority {
            if issue.priority != priority {
                return false;
            }
        }

        match self.search_term() {
            Some(term) => {
                let term = term.to_lowercase();
                issue.title.to_lowercase().contains(&term)
                    || issue.key.to_lowercase().contains(&term)
            }
            None => true,
        }
    }

    /// Filtered view, preserving input order
    pub fn apply<'a>(&self, issues: &'a [Issue]) -> Vec<&'a Issue> {
        issues.iter().filter(|issue| self.matches(issue)).collect()
    }

    /// Query parameters for the backlog endpoint
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(term) = self.search_term() {
            pairs.push(("search", term.to_string()));
        }
        if let Some(issue_type) = self.issue_type {
            pairs.push(("type", issue_type.as_str().to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.as_str().to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(id: &str, title: &str, issue_type: IssueType, priority: Priority) -> Issue {
        Issue {
            id: id.to_string(),
            key: format!("PM-{}", id),
            title: title.to_string(),
            issue_type,
            priority,
            story_points: None,
            assignee_id: None,
            sprint_id: None,
        }
    }

    fn backlog() -> Vec<Issue> {
        vec![
            issue("1", "Crash on login", IssueType::Bug, Priority::High),
            issue("2", "Login with SSO", IssueType::Story, Priority::Medium),
            issue("3", "Export report", IssueType::Story, Priority::High),
        ]
    }

    #[test]
    fn test_type_filter() {
        let issues = vec![
            issue("1", "A", IssueType::Bug, Priority::Low),
            issue("2", "B", IssueType::Story, Priority::Low),
        ];
        let filter = BacklogFilter {
            issue_type: Some(IssueType::Story),
            ..Default::default()
        };
        let ids: Vec<&str> = filter.apply(&issues).iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn test_search_is_case_insensitive_and_matches_key() {
        let issues = backlog();
        let filter = BacklogFilter {
            search: Some("LOGIN".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&issues).len(), 2);

        let filter = BacklogFilter {
            search: Some("pm-3".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.apply(&issues)[0].id, "3");
    }

    #[test]
    fn test_type_filter_independent_of_search_order() {
        let mut issues = backlog();
        let filter = BacklogFilter {
            issue_type: Some(IssueType::Story),
            ..Default::default()
        };
        let forward: Vec<String> = filter.apply(&issues).iter().map(|i| i.id.clone()).collect();
        issues.reverse();
        let mut reversed: Vec<String> =
            filter.apply(&issues).iter().map(|i| i.id.clone()).collect();
        reversed.reverse();
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_combined_filters() {
        let issues = backlog();
        let filter = BacklogFilter {
            search: Some("login".to_string()),
            issue_type: Some(IssueType::Story),
            priority: Some(Priority::Medium),
        };
        let result = filter.apply(&issues);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "2");
    }

    #[test]
    fn test_blank_search_is_empty() {
        let filter = BacklogFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(filter.is_empty());
        assert!(filter.query_pairs().is_empty());
        assert_eq!(filter.apply(&backlog()).len(), 3);
    }

    #[test]
    fn test_query_pairs() {
        let filter = BacklogFilter {
            search: Some(" sso ".to_string()),
            issue_type: Some(IssueType::Bug),
            priority: Some(Priority::Critical),
        };
        assert_eq!(
            filter.query_pairs(),
            vec![
                ("search", "sso".to_string()),
                ("type", "BUG".to_string()),
                ("priority", "CRITICAL".to_string()),
            ]
        );
    }
}
