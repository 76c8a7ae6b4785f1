//! # trk-core
//!
//! Core types shared across all Tracker RS crates:
//! - Environment-driven configuration
//! - Core type aliases (`Id`)

pub mod config;
pub mod traits;

pub use config::AppConfig;
pub use traits::Id;
