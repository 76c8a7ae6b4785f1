//! Teams and memberships

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trk_core::Id;

/// A team; the multi-tenancy boundary for issues.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    pub id: Id,
    pub name: String,
    /// Random code handed out for join-by-code flows
    pub invite_code: String,
    pub created_at: DateTime<Utc>,
}

/// Membership of a user in a team
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamMember {
    pub id: Id,
    pub user_id: Id,
    pub team_id: Id,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

/// Membership role within a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    Manager,
    Member,
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Manager => "manager",
            TeamRole::Member => "member",
        }
    }
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_strings() {
        assert_eq!(TeamRole::Manager.as_str(), "manager");
        assert_eq!(TeamRole::Member.to_string(), "member");
    }
}
