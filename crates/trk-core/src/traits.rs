//! Core type aliases

/// Primary key type used across all entities
pub type Id = i64;
