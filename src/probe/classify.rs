//! Response classification.
//!
//! Decides from a status code and body whether the target has started
//! blocking. Anything that is not a recognized blocking signal lets the run
//! continue, including server errors and redirects that ended elsewhere.

use regex::{RegexSet, RegexSetBuilder};

use super::outcome::HaltReason;
use crate::config::{
    BLOCK_SIGNATURES, HTTP_STATUS_FORBIDDEN, HTTP_STATUS_OK, HTTP_STATUS_TOO_MANY_REQUESTS,
    HTTP_STATUS_UNAUTHORIZED,
};

/// Case-insensitive substring matcher over block page signatures.
///
/// Patterns are literal text; they are escaped before being compiled into a
/// `RegexSet`, so `.` or `(` in a signature have no special meaning.
#[derive(Debug, Clone)]
pub struct BlockSignatures {
    patterns: Vec<String>,
    set: RegexSet,
}

impl BlockSignatures {
    /// Builds a matcher over the built-in signatures plus `extra`.
    ///
    /// # Errors
    ///
    /// Returns a `regex::Error` only if the compiled set exceeds the regex size
    /// limit, which would take an absurd number of extra patterns.
    pub fn new<S: AsRef<str>>(extra: &[S]) -> Result<Self, regex::Error> {
        let patterns: Vec<String> = BLOCK_SIGNATURES
            .iter()
            .map(|p| p.to_string())
            .chain(extra.iter().map(|p| p.as_ref().to_string()))
            .collect();
        let set = RegexSetBuilder::new(patterns.iter().map(|p| regex::escape(p)))
            .case_insensitive(true)
            .build()?;
        Ok(BlockSignatures { patterns, set })
    }

    /// All signatures, built-ins first.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Returns the first signature (in list order) found in `body`.
    pub fn find(&self, body: &str) -> Option<&str> {
        self.set
            .matches(body)
            .iter()
            .next()
            .map(|index| self.patterns[index].as_str())
    }

    /// Whether any signature occurs in `body`.
    pub fn is_match(&self, body: &str) -> bool {
        self.set.is_match(body)
    }
}

/// Decision for one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// No blocking signal; keep probing.
    Continue,
    /// Blocking detected; stop the run.
    Halt(HaltReason),
}

/// Classifies a response by status code and body.
///
/// - 429 halts as rate limited.
/// - 401 and 403 halt as blocked or authentication required.
/// - 200 with a body containing a block signature halts as a WAF block.
/// - Everything else continues.
pub fn classify(status: u16, body: &str, signatures: &BlockSignatures) -> Verdict {
    match status {
        HTTP_STATUS_TOO_MANY_REQUESTS => Verdict::Halt(HaltReason::RateLimited),
        HTTP_STATUS_UNAUTHORIZED | HTTP_STATUS_FORBIDDEN => {
            Verdict::Halt(HaltReason::BlockedOrAuth(status))
        }
        HTTP_STATUS_OK => match signatures.find(body) {
            Some(signature) => Verdict::Halt(HaltReason::WafBlock {
                signature: signature.to_string(),
            }),
            None => Verdict::Continue,
        },
        _ => Verdict::Continue,
    }
}
