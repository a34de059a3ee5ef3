// ABOUTME: Error type for conformance scenarios.
// ABOUTME: Assertion failures, backend errors, and poll timeouts, all fail-fast.

use crate::runtime::{ImageError, RuntimeError};
use crate::suite::wait::PollError;
use crate::types::ParseImageRefError;
use std::time::Duration;

/// A scenario's failure reason. Scenarios fail fast: the first error aborts
/// the scenario, and there is deliberately no retry (registry flakiness is
/// treated as an environment problem, not something to paper over).
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// An observed value diverged from the contract.
    #[error("check failed: {0}")]
    Check(String),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("invalid image reference: {0}")]
    Reference(#[from] ParseImageRefError),

    /// A bounded poll ran out of time before the expected transition.
    #[error("timed out after {waited:?}; last observed state: {last}")]
    Timeout { waited: Duration, last: String },
}

impl<E: Into<ScenarioError>> From<PollError<E>> for ScenarioError {
    fn from(err: PollError<E>) -> Self {
        match err {
            PollError::Op(inner) => inner.into(),
            PollError::Timeout { waited, last } => ScenarioError::Timeout { waited, last },
        }
    }
}

/// Assert a scenario invariant, failing the scenario with `detail` otherwise.
pub fn check(condition: bool, detail: impl Into<String>) -> Result<(), ScenarioError> {
    if condition {
        Ok(())
    } else {
        Err(ScenarioError::Check(detail.into()))
    }
}
