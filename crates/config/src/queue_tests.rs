// SPDX-License-Identifier: MIT

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn jobs_run_in_order() {
    let q = PublishQueue::new();
    let order = Arc::new(parking_lot::Mutex::new(Vec::new()));
    for i in 0..20 {
        let order = order.clone();
        q.enqueue(Box::new(move || order.lock().push(i)));
    }
    q.wait_for_clear();
    assert_eq!(*order.lock(), (0..20).collect::<Vec<_>>());
}

#[test]
fn wait_for_clear_waits_for_enqueued_jobs() {
    let q = PublishQueue::new();
    let counter = Arc::new(AtomicUsize::new(0));
    for _ in 0..50 {
        let counter = counter.clone();
        q.enqueue(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }
    q.wait_for_clear();
    assert_eq!(counter.load(Ordering::SeqCst), 50);
}

#[test]
fn drop_joins_worker_without_hanging() {
    let q = PublishQueue::new();
    q.enqueue(Box::new(|| {}));
    drop(q);
}
