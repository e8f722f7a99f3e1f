// SPDX-License-Identifier: MIT

//! Subscriber notification types.

use kestrel_core::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What happened to a topic that a subscriber is being notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhatHappened {
    /// Fired synchronously when a subscriber registers against a topic
    /// that already holds a non-null value.
    Initialized,
    /// Fired on every accepted `setValue`/`mergeMap` write.
    Changed,
    /// Fired when the topic itself is removed from the tree.
    Removed,
}

/// A subscriber callback: `(what, new_value)`.
pub type Subscriber = Arc<dyn Fn(WhatHappened, &Any) + Send + Sync>;

/// Wraps a subscriber so that a burst of changes delivered before the
/// publish queue drains coalesces into a single notification carrying
/// the topic's value *at delivery time*, not the value captured when
/// each individual change was enqueued.
///
/// Construct once per subscriber registration and enqueue
/// `batched.notify_job(topic)` instead of a job that closes over a
/// stale value.
pub struct BatchedSubscriber {
    inner: Subscriber,
    pending: AtomicBool,
}

impl BatchedSubscriber {
    pub fn new(inner: Subscriber) -> Arc<Self> {
        Arc::new(Self {
            inner,
            pending: AtomicBool::new(false),
        })
    }

    /// Returns `true` if this call should enqueue a delivery job (i.e. no
    /// delivery is currently pending on the queue), `false` if a pending
    /// job will already pick up this change once it runs.
    pub fn mark_pending(&self) -> bool {
        !self.pending.swap(true, Ordering::AcqRel)
    }

    /// Clears the pending flag and invokes the wrapped subscriber with
    /// whatever value the caller reads at delivery time.
    pub fn deliver(&self, what: WhatHappened, current: &Any) {
        self.pending.store(false, Ordering::Release);
        (self.inner)(what, current);
    }
}

/// A plain (non-batching) subscriber wrapper, kept for symmetry with
/// `BatchedSubscriber` and used where every change must be observed
/// individually (e.g. transaction log writers).
pub struct ImmediateSubscriber {
    inner: Subscriber,
}

impl ImmediateSubscriber {
    pub fn new(inner: Subscriber) -> Arc<Self> {
        Arc::new(Self { inner })
    }

    pub fn deliver(&self, what: WhatHappened, value: &Any) {
        (self.inner)(what, value);
    }
}

/// Either flavor of subscriber, as stored on a topic.
pub(crate) enum Registration {
    Immediate(Arc<ImmediateSubscriber>),
    Batched(Arc<BatchedSubscriber>),
}

#[cfg(test)]
#[path = "subscriber_tests.rs"]
mod tests;
