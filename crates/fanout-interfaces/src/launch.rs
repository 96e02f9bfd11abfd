//! Launch completion handles
//!
//! A [`Launch`] is the caller's view of one asynchronous kernel submission.
//! The backend keeps the matching [`LaunchCompleter`] and resolves it exactly
//! once, from whatever thread executes the kernel. Terminal states never
//! change afterwards.

use fanout_types::{LaunchId, LaunchOutcome, LaunchStatus, LaunchTiming};
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct LaunchState {
    status: LaunchStatus,
    timing: Option<LaunchTiming>,
}

struct LaunchInner {
    id: LaunchId,
    kernel: String,
    global_size: usize,
    state: Mutex<LaunchState>,
    terminal: Condvar,
    observed: AtomicBool,
}

/// Caller-side handle of a submitted kernel
#[derive(Clone)]
pub struct Launch {
    inner: Arc<LaunchInner>,
}

impl Launch {
    /// Create a pending launch and the completer that resolves it
    pub fn new(
        id: LaunchId,
        kernel: impl Into<String>,
        global_size: usize,
    ) -> (Launch, LaunchCompleter) {
        let inner = Arc::new(LaunchInner {
            id,
            kernel: kernel.into(),
            global_size,
            state: Mutex::new(LaunchState {
                status: LaunchStatus::Pending,
                timing: None,
            }),
            terminal: Condvar::new(),
            observed: AtomicBool::new(false),
        });
        (
            Launch {
                inner: inner.clone(),
            },
            LaunchCompleter {
                inner,
                resolved: false,
            },
        )
    }

    pub fn id(&self) -> LaunchId {
        self.inner.id
    }

    pub fn kernel(&self) -> &str {
        &self.inner.kernel
    }

    /// Number of work items the launch covers
    pub fn global_size(&self) -> usize {
        self.inner.global_size
    }

    /// Current status without blocking
    pub fn status(&self) -> LaunchStatus {
        self.inner.state.lock().status.clone()
    }

    pub fn is_terminal(&self) -> bool {
        self.inner.state.lock().status.is_terminal()
    }

    /// Device timestamps, present once a profiled launch is terminal
    pub fn timing(&self) -> Option<LaunchTiming> {
        self.inner.state.lock().timing
    }

    /// Block until the launch is terminal and return its outcome.
    ///
    /// Waiting marks the launch as observed, so its failure is no longer
    /// reported through the asynchronous error channel.
    pub fn wait(&self) -> LaunchOutcome {
        let mut state = self.inner.state.lock();
        while !state.status.is_terminal() {
            self.inner.terminal.wait(&mut state);
        }
        self.mark_observed();
        self.outcome(&state)
    }

    /// Whether someone has already waited on this launch
    pub fn is_observed(&self) -> bool {
        self.inner.observed.load(Ordering::Acquire)
    }

    fn mark_observed(&self) {
        self.inner.observed.store(true, Ordering::Release);
    }

    fn outcome(&self, state: &LaunchState) -> LaunchOutcome {
        LaunchOutcome {
            launch: self.inner.id,
            kernel: self.inner.kernel.clone(),
            status: state.status.clone(),
            timing: state.timing,
        }
    }
}

impl std::fmt::Debug for Launch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launch")
            .field("id", &self.inner.id)
            .field("kernel", &self.inner.kernel)
            .field("status", &self.status())
            .finish()
    }
}

/// Backend-side half of a launch
pub struct LaunchCompleter {
    inner: Arc<LaunchInner>,
    resolved: bool,
}

impl LaunchCompleter {
    pub fn id(&self) -> LaunchId {
        self.inner.id
    }

    /// Resolve as completed
    pub fn complete(mut self, timing: Option<LaunchTiming>) {
        self.resolve(LaunchStatus::Completed, timing);
    }

    /// Resolve as failed
    pub fn fail(mut self, message: impl Into<String>, timing: Option<LaunchTiming>) {
        self.resolve(
            LaunchStatus::Failed {
                message: message.into(),
            },
            timing,
        );
    }

    fn resolve(&mut self, status: LaunchStatus, timing: Option<LaunchTiming>) {
        let mut state = self.inner.state.lock();
        if !state.status.is_terminal() {
            state.status = status;
            state.timing = timing;
        }
        self.resolved = true;
        drop(state);
        self.inner.terminal.notify_all();
    }
}

impl Drop for LaunchCompleter {
    fn drop(&mut self) {
        if !self.resolved {
            tracing::warn!(launch = %self.inner.id, "launch dropped by backend before completion");
            self.resolve(
                LaunchStatus::Failed {
                    message: "launch dropped by backend before completion".to_string(),
                },
                None,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_wait_blocks_until_completion() {
        let (launch, completer) = Launch::new(LaunchId(1), "k", 8);
        assert_eq!(launch.status(), LaunchStatus::Pending);

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            completer.complete(None);
        });
        let outcome = launch.wait();
        handle.join().unwrap();

        assert!(outcome.is_success());
        assert!(launch.is_observed());
    }

    #[test]
    fn test_terminal_state_is_immutable() {
        let (launch, completer) = Launch::new(LaunchId(2), "k", 8);
        completer.fail("first", None);
        assert!(launch.status().is_failed());
        assert_eq!(launch.wait().error_message(), Some("first"));
    }

    #[test]
    fn test_dropped_completer_fails_launch() {
        let (launch, completer) = Launch::new(LaunchId(3), "k", 8);
        drop(completer);
        assert!(launch.wait().error_message().unwrap().contains("dropped"));
    }
}
