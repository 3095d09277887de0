//! Error handling.
//!
//! This module provides:
//! - Configuration and initialization error types
//! - Categorization of failed probe requests
//!
//! Probe request failures are never surfaced as `Err`; they become
//! `ProbeOutcome::Failure` values carrying the message built here.

mod categorization;
mod types;

// Re-export public API
pub use categorization::describe_reqwest_error;
pub use types::{ConfigError, InitializationError};
