//! Thread-safe FIFO of pending evaluation requests
//!
//! The queue tracks whether an evaluation is in flight so that only the
//! submission that moves it out of `Idle` starts processing. Execution
//! itself never happens under the lock.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::error::EvalError;
use crate::reply::ReplyHandle;

/// Lifecycle of an [`EvalQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// Nothing in flight
    Idle,
    /// One request has been handed out and its response is pending
    Executing,
    /// The owning window is gone; terminal
    Closed,
}

/// What a submission did to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The queue was idle; the caller must schedule processing on the UI thread
    Start,
    /// Another request is in flight; this one waits its turn
    Queued,
    /// The queue is closed; the handle was already answered with `WindowClosed`
    Rejected,
}

/// A script waiting to run, with the handle that receives its result
pub struct PendingEval<H> {
    pub script: String,
    pub handle: H,
}

struct QueueInner<H> {
    pending: VecDeque<PendingEval<H>>,
    state: QueueState,
}

/// FIFO of evaluation requests owned by one window
pub struct EvalQueue<H> {
    inner: Mutex<QueueInner<H>>,
    liveness: CancellationToken,
}

impl<H: ReplyHandle> Default for EvalQueue<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ReplyHandle> EvalQueue<H> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                pending: VecDeque::new(),
                state: QueueState::Idle,
            }),
            liveness: CancellationToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner<H>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a request to the tail of the queue.
    pub fn submit(&self, script: impl Into<String>, handle: H) -> Submission {
        let mut inner = self.lock();
        match inner.state {
            QueueState::Closed => {
                drop(inner);
                handle.reply(Err(EvalError::WindowClosed));
                Submission::Rejected
            }
            QueueState::Idle => {
                inner.pending.push_back(PendingEval {
                    script: script.into(),
                    handle,
                });
                inner.state = QueueState::Executing;
                Submission::Start
            }
            QueueState::Executing => {
                inner.pending.push_back(PendingEval {
                    script: script.into(),
                    handle,
                });
                Submission::Queued
            }
        }
    }

    /// Pop the head of the queue for execution.
    ///
    /// Returns `None` and goes back to `Idle` once the queue is drained, or
    /// stays `Closed` if the window is gone.
    pub fn take_next(&self) -> Option<PendingEval<H>> {
        let mut inner = self.lock();
        if inner.state == QueueState::Closed {
            return None;
        }
        match inner.pending.pop_front() {
            Some(next) => {
                inner.state = QueueState::Executing;
                Some(next)
            }
            None => {
                inner.state = QueueState::Idle;
                None
            }
        }
    }

    /// Invalidate the queue and fail everything still waiting.
    ///
    /// The liveness token is cancelled before the queue is drained, so an
    /// in-flight completion racing with this call always sees the window as
    /// gone. Returns how many queued requests were failed.
    pub fn close(&self) -> usize {
        self.liveness.cancel();
        let drained = {
            let mut inner = self.lock();
            inner.state = QueueState::Closed;
            std::mem::take(&mut inner.pending)
        };

        let count = drained.len();
        for request in drained {
            request.handle.reply(Err(EvalError::WindowClosed));
        }
        count
    }

    /// Token cancelled when the owning window goes away
    pub fn liveness(&self) -> CancellationToken {
        self.liveness.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.liveness.is_cancelled()
    }

    pub fn state(&self) -> QueueState {
        self.lock().state
    }

    /// Number of requests waiting (not counting one in flight)
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
