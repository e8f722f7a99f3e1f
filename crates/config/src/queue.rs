// SPDX-License-Identifier: MIT

//! The publish queue: a single-consumer, ordered channel that serializes
//! every configuration-change notification.
//!
//! Subscribers run serially on the queue's worker thread; a subscriber
//! that blocks blocks all subsequent notifications. This guarantees that
//! an observer of one topic cannot see a later state of another topic
//! without having first seen every intermediate notification for the one
//! it watches.

use std::thread::JoinHandle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

type Job = Box<dyn FnOnce() + Send>;

/// Ordered background worker that drains notification jobs one at a time.
///
/// The tree can be constructed from plain synchronous code (most of this
/// crate's own tests) as well as from inside an already-running Tokio
/// runtime (the daemon), so the worker carries its own single-threaded
/// runtime on a dedicated background thread rather than assuming one is
/// already on the stack; the channel itself is `tokio::sync::mpsc`,
/// matching how the rest of the kernel moves work between tasks.
pub struct PublishQueue {
    tx: Option<UnboundedSender<Job>>,
    handle: Option<JoinHandle<()>>,
}

impl PublishQueue {
    pub fn new() -> Self {
        let (tx, mut rx): (UnboundedSender<Job>, UnboundedReceiver<Job>) = mpsc::unbounded_channel();
        let handle = std::thread::Builder::new()
            .name("kestrel-publish-queue".into())
            .spawn(move || {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .expect("failed to build publish queue runtime");
                rt.block_on(async move {
                    while let Some(job) = rx.recv().await {
                        job();
                    }
                });
            })
            .expect("failed to spawn publish queue worker");
        Self { tx: Some(tx), handle: Some(handle) }
    }

    /// Enqueue a notification job. Never blocks the caller on subscriber work.
    pub fn enqueue(&self, job: Job) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(job);
        }
    }

    /// Block until every job enqueued before this call has run.
    pub fn wait_for_clear(&self) {
        let (done_tx, done_rx) = std::sync::mpsc::channel::<()>();
        self.enqueue(Box::new(move || {
            let _ = done_tx.send(());
        }));
        let _ = done_rx.recv();
    }
}

impl Default for PublishQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PublishQueue {
    fn drop(&mut self) {
        // Drop the sender first so the worker's `rx.recv()` loop ends once
        // the queue drains, then join so no notification is left running
        // in the background past the tree's lifetime.
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
