// SPDX-License-Identifier: MIT

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex as StdMutex;

#[test]
fn lookup_creates_intermediate_topics_and_leaf() {
    let tree = ConfigTree::new();
    let path = Path::from("services.docker.port");
    let topic = tree.lookup(&path).unwrap();
    assert!(topic.is_topic());
    assert_eq!(topic.value().unwrap(), Any::Null);

    let services = tree.find(&Path::from("services")).unwrap();
    assert!(services.is_topics());
}

fn wait_for_clear_and_value(tree: &ConfigTree, topic: &Node) -> Any {
    tree.wait_for_clear();
    topic.value().unwrap()
}

#[test]
fn set_value_updates_and_bumps_modtime() {
    let tree = ConfigTree::new();
    let topic = tree.lookup(&Path::from("a.b")).unwrap();
    assert_eq!(topic.modtime(), 0);

    let changed = tree.set_value(&topic, 5, Any::Int(1)).unwrap();
    assert!(changed);
    assert_eq!(wait_for_clear_and_value(&tree, &topic), Any::Int(1));
    assert!(topic.modtime() >= 5);
}

#[test]
fn set_value_is_noop_when_modtime_not_newer_and_value_unchanged() {
    let tree = ConfigTree::new();
    let topic = tree.lookup(&Path::from("a.b")).unwrap();
    tree.set_value(&topic, 5, Any::Int(1)).unwrap();
    let mt_before = topic.modtime();

    let changed = tree.set_value(&topic, 1, Any::Int(1)).unwrap();
    assert!(!changed);
    assert_eq!(topic.modtime(), mt_before);
}

#[test]
fn set_value_rejected_by_validator_leaves_topic_untouched() {
    struct Rejects;
    impl Validator for Rejects {
        fn validate(&self, _value: &Any) -> Result<(), String> {
            Err("nope".to_string())
        }
    }

    let tree = ConfigTree::new();
    let topic = tree.lookup(&Path::from("a.b")).unwrap();
    topic.set_validator(Arc::new(Rejects)).unwrap();

    let err = tree.set_value(&topic, 1, Any::Int(7)).unwrap_err();
    assert!(matches!(err, ConfigError::Rejected(_, _)));
    assert_eq!(topic.value().unwrap(), Any::Null);
}

#[test]
fn subscribe_immediate_fires_initialized_synchronously_for_nonnull_value() {
    let tree = ConfigTree::new();
    let topic = tree.lookup(&Path::from("a.b")).unwrap();
    tree.set_value(&topic, 1, Any::Int(9)).unwrap();
    tree.wait_for_clear();

    let seen = Arc::new(StdMutex::new(Vec::new()));
    let seen2 = seen.clone();
    tree.subscribe_immediate(
        &topic,
        Arc::new(move |what, v| seen2.lock().unwrap().push((what, v.clone()))),
    )
    .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], (WhatHappened::Initialized, Any::Int(9)));
}

#[test]
fn subscribe_immediate_does_not_fire_initialized_for_null_value() {
    let tree = ConfigTree::new();
    let topic = tree.lookup(&Path::from("a.b")).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let calls2 = calls.clone();
    tree.subscribe_immediate(&topic, Arc::new(move |_, _| { calls2.fetch_add(1, Ordering::SeqCst); }))
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn subscribe_immediate_receives_every_change_in_order() {
    let tree = ConfigTree::new();
    let topic = tree.lookup(&Path::from("a.b")).unwrap();

    let seen = Arc::new(StdMutex::new(Vec::new()));
    let seen2 = seen.clone();
    tree.subscribe_immediate(
        &topic,
        Arc::new(move |_, v| seen2.lock().unwrap().push(v.clone())),
    )
    .unwrap();

    for i in 1..=5 {
        tree.set_value(&topic, i, Any::Int(i)).unwrap();
    }
    tree.wait_for_clear();

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, (1..=5).map(Any::Int).collect::<Vec<_>>());
}

#[test]
fn subscribe_batched_coalesces_rapid_changes() {
    let tree = ConfigTree::new();
    let topic = tree.lookup(&Path::from("a.b")).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let last = Arc::new(StdMutex::new(Any::Null));
    let (calls2, last2) = (calls.clone(), last.clone());
    tree.subscribe_batched(
        &topic,
        Arc::new(move |_, v| {
            calls2.fetch_add(1, Ordering::SeqCst);
            *last2.lock().unwrap() = v.clone();
        }),
    )
    .unwrap();

    for i in 1..=10 {
        tree.set_value(&topic, i, Any::Int(i)).unwrap();
    }
    tree.wait_for_clear();

    assert!(calls.load(Ordering::SeqCst) <= 10);
    assert_eq!(*last.lock().unwrap(), Any::Int(10));
}

#[test]
fn find_returns_none_for_missing_path() {
    let tree = ConfigTree::new();
    assert!(tree.find(&Path::from("nope.nope")).is_none());
}

#[test]
fn lookup_topics_does_not_create_a_leaf() {
    let tree = ConfigTree::new();
    let node = tree.lookup_topics(&Path::from("services.docker")).unwrap();
    assert!(node.is_topics());
}

#[test]
fn child_names_reflects_insertion_order() {
    let tree = ConfigTree::new();
    tree.lookup(&Path::from("a.one")).unwrap();
    tree.lookup(&Path::from("a.two")).unwrap();
    tree.lookup(&Path::from("a.three")).unwrap();

    let a = tree.find(&Path::from("a")).unwrap();
    assert_eq!(a.child_names().unwrap(), vec!["one", "two", "three"]);
}

#[test]
fn full_path_reconstructs_dotted_path() {
    let tree = ConfigTree::new();
    let topic = tree.lookup(&Path::from("services.docker.port")).unwrap();
    assert_eq!(topic.full_path().to_string(), "services.docker.port");
}
