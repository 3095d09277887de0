//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources of a run:
//! - Logger
//! - HTTP client
//! - Jitter source

mod client;
mod logger;

use log::debug;
use rand::rngs::StdRng;

use crate::probe::UniformJitter;

// Re-export public API
pub use client::init_client;
pub use logger::init_logger_with;

/// Initializes the jitter source.
///
/// With a seed the sleep schedule is reproducible across runs; without one the
/// RNG is seeded from the operating system.
pub fn init_jitter(seed: Option<u64>) -> UniformJitter<StdRng> {
    match seed {
        Some(seed) => {
            debug!("Jitter RNG seeded with {seed}");
            UniformJitter::seeded(seed)
        }
        None => UniformJitter::from_os_rng(),
    }
}
