//! Waiting on batches of launches
//!
//! A batch is only complete when every launch in it is terminal. Failures
//! are gathered rather than short-circuited so the caller learns about all
//! of them, not just the first.

use crate::dispatcher::DispatchedLaunch;
use fanout_types::{FanoutError, LaunchFailure, LaunchOutcome, Result};
use tracing::{debug, warn};

/// Outcomes of a batch, in submission order
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub outcomes: Vec<LaunchOutcome>,
    failures: Vec<LaunchFailure>,
}

impl BatchOutcome {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[LaunchFailure] {
        &self.failures
    }

    /// Convert into the outcomes, or a partial execution error carrying
    /// every failure
    pub fn into_result(self) -> Result<Vec<LaunchOutcome>> {
        if self.failures.is_empty() {
            Ok(self.outcomes)
        } else {
            Err(FanoutError::partial_execution(
                self.failures,
                self.outcomes.len(),
            ))
        }
    }
}

/// Block until every launch of the batch is terminal
pub fn collect(batch: &[DispatchedLaunch]) -> BatchOutcome {
    let mut outcomes = Vec::with_capacity(batch.len());
    let mut failures = Vec::new();

    for dispatched in batch {
        let outcome = dispatched.launch.wait();
        if let Some(message) = outcome.error_message() {
            warn!(
                launch = %outcome.launch,
                context = %dispatched.context,
                partition = %dispatched.partition,
                error = %message,
                "launch failed"
            );
            failures.push(LaunchFailure {
                launch: outcome.launch,
                context: dispatched.context,
                device: dispatched.device,
                partition: dispatched.partition,
                kernel: outcome.kernel.clone(),
                message: message.to_string(),
            });
        }
        outcomes.push(outcome);
    }

    debug!(
        launches = outcomes.len(),
        failed = failures.len(),
        "batch complete"
    );
    BatchOutcome { outcomes, failures }
}

/// Block until the batch is terminal; fail if any launch failed
pub fn await_all(batch: &[DispatchedLaunch]) -> Result<Vec<LaunchOutcome>> {
    collect(batch).into_result()
}
