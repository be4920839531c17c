//! Request lifecycle state shared by both flows
//!
//! Each flow owns one `FlowLifecycle`: the idle/pending gate that keeps at
//! most one request in flight, the mounted/detached flag, and the revision
//! counter the UI watches to know when to re-render.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
}

impl RequestState {
    pub fn is_pending(self) -> bool {
        self == RequestState::Pending
    }
}

pub struct FlowLifecycle {
    pending: AtomicBool,
    detached: AtomicBool,
    revision: watch::Sender<u64>,
}

impl FlowLifecycle {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            pending: AtomicBool::new(false),
            detached: AtomicBool::new(false),
            revision,
        }
    }

    pub fn request_state(&self) -> RequestState {
        if self.pending.load(Ordering::Acquire) {
            RequestState::Pending
        } else {
            RequestState::Idle
        }
    }

    /// Move Idle -> Pending. Returns `None` when a request is already in
    /// flight; the returned guard moves back to Idle when dropped.
    pub fn try_begin(&self) -> Option<PendingGuard<'_>> {
        self.pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.notify();
        Some(PendingGuard { lifecycle: self })
    }

    /// Mark the owning view as gone; late responses must not be applied
    pub fn detach(&self) {
        self.detached.store(true, Ordering::Release);
        self.notify();
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    /// Bump the revision so subscribers re-render
    pub fn notify(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}

impl Default for FlowLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Held for the whole of one request; releases the gate on every exit path
pub struct PendingGuard<'a> {
    lifecycle: &'a FlowLifecycle,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.lifecycle.pending.store(false, Ordering::Release);
        self.lifecycle.notify();
    }
}
