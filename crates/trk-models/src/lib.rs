//! # trk-models
//!
//! Domain models for Tracker RS: users, teams, issues, comments, and the
//! token-lifecycle entities.

pub mod issue;
pub mod team;
pub mod token;
pub mod user;

pub use issue::{Comment, Issue, IssueStatus};
pub use team::{Team, TeamMember, TeamRole};
pub use token::{RevokedToken, TokenKind};
pub use user::User;
