//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, status codes, block signatures)
//! - HTTP header name constants
//! - CLI option types and the validated run configuration

mod constants;
mod headers;
mod types;

// Re-export all constants
pub use constants::*;
pub use headers::*;
pub use types::{LogFormat, LogLevel, Opt, RunConfig};
