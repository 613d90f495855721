//! Single-assignment readiness gate.
//!
//! A [`ReadinessGate`] resolves at most once. Consumers either register a
//! callback with [`ReadinessGate::when_ready`] or await
//! [`ReadinessGate::wait`]; both observe the same value no matter whether
//! they arrive before or after resolution.
//!
//! ```
//! use map_sync::ReadinessGate;
//!
//! let gate = ReadinessGate::new();
//! assert!(gate.resolve(7));
//! assert!(!gate.resolve(8));
//! assert_eq!(gate.get(), Some(7));
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

use crate::locks::lock;

type ReadyCallback<T> = Box<dyn FnOnce(T) + Send>;

struct GateState<T> {
    value: Option<T>,
    callbacks: Vec<ReadyCallback<T>>,
    wakers: Vec<Waker>,
}

/// Clones share the same underlying gate.
pub struct ReadinessGate<T> {
    state: Arc<Mutex<GateState<T>>>,
}

impl<T> Clone for ReadinessGate<T> {
    fn clone(&self) -> Self {
        ReadinessGate {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Clone + Send + 'static> Default for ReadinessGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> ReadinessGate<T> {
    pub fn new() -> Self {
        ReadinessGate {
            state: Arc::new(Mutex::new(GateState {
                value: None,
                callbacks: Vec::new(),
                wakers: Vec::new(),
            })),
        }
    }

    /// Resolve the gate. Returns `false`, leaving the first value in place,
    /// if it was already resolved.
    ///
    /// Pending callbacks run on the calling thread in registration order,
    /// after the internal lock is released.
    pub fn resolve(&self, value: T) -> bool {
        let (callbacks, wakers) = {
            let mut state = lock(&self.state);
            if state.value.is_some() {
                tracing::warn!("readiness gate resolved twice; keeping the first value");
                return false;
            }
            state.value = Some(value.clone());
            (
                std::mem::take(&mut state.callbacks),
                std::mem::take(&mut state.wakers),
            )
        };

        tracing::debug!(callbacks = callbacks.len(), "readiness gate resolved");
        for callback in callbacks {
            callback(value.clone());
        }
        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// Run `callback` once the gate resolves, or immediately if it already has.
    pub fn when_ready<F>(&self, callback: F)
    where
        F: FnOnce(T) + Send + 'static,
    {
        let value = {
            let mut state = lock(&self.state);
            match state.value.clone() {
                Some(value) => value,
                None => {
                    state.callbacks.push(Box::new(callback));
                    return;
                }
            }
        };

        callback(value);
    }

    /// Snapshot of the resolved value, if any.
    pub fn get(&self) -> Option<T> {
        lock(&self.state).value.clone()
    }

    pub fn is_resolved(&self) -> bool {
        lock(&self.state).value.is_some()
    }

    /// Number of callbacks waiting for resolution.
    pub fn pending_callbacks(&self) -> usize {
        lock(&self.state).callbacks.len()
    }

    /// A future resolving to the gate's value.
    pub fn wait(&self) -> WaitReady<T> {
        WaitReady { gate: self.clone() }
    }
}

impl<T> fmt::Debug for ReadinessGate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("ReadinessGate")
            .field("resolved", &state.value.is_some())
            .field("callbacks", &state.callbacks.len())
            .finish()
    }
}

/// Future returned by [`ReadinessGate::wait`].
pub struct WaitReady<T> {
    gate: ReadinessGate<T>,
}

impl<T: Clone> Future for WaitReady<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut state = lock(&self.gate.state);
        if let Some(value) = &state.value {
            return Poll::Ready(value.clone());
        }
        if !state.wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
            state.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}
