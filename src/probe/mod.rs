//! The probe loop and its parts.
//!
//! - `schedule`: how long to wait before the next request
//! - `request`: sending one request and capturing the response
//! - `classify`: whether a response means the target started blocking
//! - `runner`: the loop tying them together

mod classify;
mod outcome;
mod request;
mod runner;
mod schedule;

pub use classify::{classify, BlockSignatures, Verdict};
pub use outcome::{HaltReason, ProbeOutcome, ProbeReport, ProbeResponse};
pub use request::{rate_limit_headers, HttpRequester, Requester};
pub use runner::ProbeLoop;
pub use schedule::{sleep_duration, JitterSource, NoJitter, Schedule, UniformJitter};
