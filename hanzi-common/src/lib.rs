//! # Hanzi Common Library
//!
//! Shared code for the hanzi tutor crates including:
//! - Database schema initialization and row models
//! - Event types (TutorEvent enum) and the EventBus
//! - Configuration and root folder resolution
//! - Time helpers (epoch millis, local-midnight boundary)

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
