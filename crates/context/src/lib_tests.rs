// SPDX-License-Identifier: MIT

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, PartialEq)]
struct Greeting(String);

#[test]
fn put_then_get_round_trips() {
    let ctx = Context::new();
    ctx.put(Greeting("hello".to_string()));
    let got = ctx.get::<Greeting>().unwrap();
    assert_eq!(got.0, "hello");
}

#[test]
fn get_named_distinguishes_instances_of_same_type() {
    let ctx = Context::new();
    ctx.put_named(Some("a"), Greeting("first".to_string()));
    ctx.put_named(Some("b"), Greeting("second".to_string()));

    assert_eq!(ctx.get_named::<Greeting>(Some("a")).unwrap().0, "first");
    assert_eq!(ctx.get_named::<Greeting>(Some("b")).unwrap().0, "second");
    assert!(ctx.get::<Greeting>().is_none());
}

#[test]
fn compute_if_empty_only_runs_factory_once() {
    let ctx = Context::new();
    let calls = std::sync::atomic::AtomicUsize::new(0);

    let first = ctx
        .compute_if_empty::<Greeting>(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Greeting("built".to_string())
        })
        .unwrap();
    let second = ctx
        .compute_if_empty::<Greeting>(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            Greeting("built-again".to_string())
        })
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(first.0, "built");
    assert_eq!(second.0, "built");
}

#[test]
fn compute_if_empty_detects_reentrant_construction_cycle() {
    let ctx = Context::new();
    let result = ctx.compute_if_empty::<Greeting>(|ctx| {
        let _ = ctx.compute_if_empty::<Greeting>(|_| Greeting("inner".to_string()));
        Greeting("outer".to_string())
    });
    assert!(matches!(result, Err(ContextError::ConstructionCycle(_))));
}

#[test]
fn for_each_visits_every_named_instance() {
    let ctx = Context::new();
    ctx.put_named(Some("a"), Greeting("1".to_string()));
    ctx.put_named(Some("b"), Greeting("2".to_string()));

    let seen = AtomicUsize::new(0);
    ctx.for_each::<Greeting>(|_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

struct Wired {
    seen_peer: Mutex<bool>,
}

impl PostInject for Wired {
    fn post_inject(&self, ctx: &Context) {
        *self.seen_peer.lock() = ctx.contains::<Greeting>();
    }
}

#[test]
fn put_with_post_inject_runs_hook_immediately() {
    let ctx = Context::new();
    ctx.put(Greeting("dep".to_string()));
    ctx.put_with_post_inject(Wired {
        seen_peer: Mutex::new(false),
    });

    let wired = ctx.get::<Wired>().unwrap();
    assert!(*wired.seen_peer.lock());
}

#[test]
fn notify_reruns_post_inject_for_late_registrations() {
    let ctx = Context::new();
    ctx.put_with_post_inject(Wired {
        seen_peer: Mutex::new(false),
    });
    assert!(!*ctx.get::<Wired>().unwrap().seen_peer.lock());

    ctx.put(Greeting("late".to_string()));
    ctx.notify::<Wired>();

    assert!(*ctx.get::<Wired>().unwrap().seen_peer.lock());
}
