use crate::signal::Signal;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct QueueState {
    signals: VecDeque<Signal>,
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<QueueState>,
    wake: Condvar,
}

/// Unbounded FIFO between the listener thread and the application loop.
///
/// The condition variable only signals that something happened (a push or
/// a close); data always travels through the deque.
#[derive(Debug, Clone, Default)]
pub struct SignalQueue {
    shared: Arc<Shared>,
}

impl SignalQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueues a signal and wakes the consumer. Never blocks on capacity;
    /// signals pushed after [`SignalQueue::close`] are dropped.
    pub fn push(&self, signal: Signal) {
        {
            let mut state = self.lock();
            if state.closed {
                return;
            }
            state.signals.push_back(signal);
        }
        self.shared.wake.notify_one();
    }

    /// Dequeues at most one signal.
    pub fn pop(&self) -> Option<Signal> {
        self.lock().signals.pop_front()
    }

    /// Blocks until a signal is available, the queue is closed, or `timeout`
    /// elapses, whichever comes first. Returns immediately if a signal is
    /// already queued, so a notify sent before the wait is never lost.
    pub fn wait(&self, timeout: Duration) {
        let guard = self.lock();
        let _ = self
            .shared
            .wake
            .wait_timeout_while(guard, timeout, |state| {
                state.signals.is_empty() && !state.closed
            })
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Marks the queue closed and wakes the consumer so it can exit.
    pub fn close(&self) {
        self.lock().closed = true;
        self.shared.wake.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Drops queued signals, e.g. strokes drawn between two training sessions.
    pub fn clear(&self) -> usize {
        let mut state = self.lock();
        let dropped = state.signals.len();
        state.signals.clear();
        dropped
    }

    pub fn len(&self) -> usize {
        self.lock().signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
