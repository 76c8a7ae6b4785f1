//! Issues and comments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trk_core::Id;

/// Issue lifecycle status.
///
/// Toggling cycles through the three states in a fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    Working,
    Resolved,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::Working => "working",
            IssueStatus::Resolved => "resolved",
        }
    }

    /// Parse a stored status; unknown values fall back to `Open`.
    pub fn parse(value: &str) -> Self {
        match value {
            "working" => IssueStatus::Working,
            "resolved" => IssueStatus::Resolved,
            _ => IssueStatus::Open,
        }
    }

    /// Next status in the toggle cycle: open -> working -> resolved -> open
    pub fn next(&self) -> Self {
        match self {
            IssueStatus::Open => IssueStatus::Working,
            IssueStatus::Working => IssueStatus::Resolved,
            IssueStatus::Resolved => IssueStatus::Open,
        }
    }
}

impl std::fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An issue scoped to a team
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Issue {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub status: String,
    pub user_id: Id,
    pub team_id: Id,
    pub created_at: DateTime<Utc>,
}

impl Issue {
    pub fn status(&self) -> IssueStatus {
        IssueStatus::parse(&self.status)
    }
}

/// A comment on an issue
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Id,
    pub content: String,
    pub user_id: Id,
    pub issue_id: Id,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_cycle() {
        assert_eq!(IssueStatus::Open.next(), IssueStatus::Working);
        assert_eq!(IssueStatus::Working.next(), IssueStatus::Resolved);
        assert_eq!(IssueStatus::Resolved.next(), IssueStatus::Open);
    }

    #[test]
    fn test_status_parse_roundtrip() {
        for status in [IssueStatus::Open, IssueStatus::Working, IssueStatus::Resolved] {
            assert_eq!(IssueStatus::parse(status.as_str()), status);
        }
    }

    #[test]
    fn test_unknown_status_defaults_to_open() {
        assert_eq!(IssueStatus::parse("archived"), IssueStatus::Open);
    }
}
