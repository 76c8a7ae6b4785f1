//! # trk-db
//!
//! PostgreSQL persistence for Tracker RS, built on SQLx.
//!
//! Each entity gets a repository struct holding a pool handle; uniqueness is
//! enforced by database constraints and surfaced as
//! [`RepositoryError::Conflict`], never by application-level locking.

pub mod comments;
pub mod issues;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod revoked_tokens;
pub mod teams;
pub mod users;

pub use comments::{CommentRepository, CommentWithAuthor, CreateCommentDto};
pub use issues::{CreateIssueDto, IssueFilter, IssueRepository, IssueSort, IssueWithAuthor, SortOrder};
pub use pool::{Database, DatabaseConfig};
pub use repository::{Pagination, PaginatedResult, RepositoryError, RepositoryResult};
pub use revoked_tokens::RevokedTokenRepository;
pub use teams::{TeamMembership, TeamRepository};
pub use users::{CreateUserDto, UserRepository};
