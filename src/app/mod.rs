//! Main application modules.
//!
//! This module provides the operator event stream, target URL validation,
//! interrupt handling, and the plan/summary output used around the probe loop.

pub mod logging;
pub mod shutdown;
pub mod statistics;
pub mod url;

// Re-export public API
pub use logging::{format_event_line, ConsoleSink, EventSink};
pub use shutdown::spawn_interrupt_listener;
pub use statistics::{emit_parameters, emit_plan, emit_summary, project_plan, PlanProjection};
pub use self::url::normalize_target_url;
