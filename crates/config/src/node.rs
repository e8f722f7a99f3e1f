// SPDX-License-Identifier: MIT

//! The tree itself: interior `Topics` nodes and leaf `Topic` nodes, backed
//! by a single `Arc<NodeInner>` graph so that a `Node` handle can be held
//! independently of the tree that produced it.

use crate::error::ConfigError;
use crate::path::Path;
use crate::queue::PublishQueue;
use crate::subscriber::{BatchedSubscriber, ImmediateSubscriber, Registration, WhatHappened};
use crate::tlog::{TlogEntry, TransactionLog};
use indexmap::IndexMap;
use kestrel_core::Any;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Weak};

/// A validator runs before a write is accepted; returning `Err` aborts the
/// write and leaves the topic untouched.
pub trait Validator: Send + Sync {
    fn validate(&self, value: &Any) -> Result<(), String>;
}

pub(crate) enum NodeKind {
    Topics(IndexMap<String, Node>),
    Topic(TopicState),
}

pub(crate) struct TopicState {
    pub value: Any,
    pub validator: Option<Arc<dyn Validator>>,
    pub subscribers: Vec<Registration>,
}

pub(crate) struct NodeInner {
    pub name: String,
    pub parent: RwLock<Weak<NodeInner>>,
    pub modtime: AtomicI64,
    pub kind: Mutex<NodeKind>,
}

/// A handle to a node in the tree. Cheap to clone (an `Arc` underneath).
#[derive(Clone)]
pub struct Node(pub(crate) Arc<NodeInner>);

impl Node {
    pub(crate) fn new_topics(name: impl Into<String>) -> Self {
        Node(Arc::new(NodeInner {
            name: name.into(),
            parent: RwLock::new(Weak::new()),
            modtime: AtomicI64::new(0),
            kind: Mutex::new(NodeKind::Topics(IndexMap::new())),
        }))
    }

    pub(crate) fn new_topic(name: impl Into<String>) -> Self {
        Node(Arc::new(NodeInner {
            name: name.into(),
            parent: RwLock::new(Weak::new()),
            modtime: AtomicI64::new(0),
            kind: Mutex::new(NodeKind::Topic(TopicState {
                value: Any::Null,
                validator: None,
                subscribers: Vec::new(),
            })),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn modtime(&self) -> i64 {
        self.0.modtime.load(Ordering::Acquire)
    }

    pub fn parent(&self) -> Option<Node> {
        self.0.parent.read().upgrade().map(Node)
    }

    /// Reconstruct the dotted path from the root down to this node, by
    /// walking the parent chain. Used only for error messages.
    pub fn full_path(&self) -> Path {
        let mut segs = Vec::new();
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            segs.push(current.name().to_owned());
            current = parent;
        }
        segs.reverse();
        Path::new(segs)
    }

    pub fn is_topics(&self) -> bool {
        matches!(*self.0.kind.lock(), NodeKind::Topics(_))
    }

    pub fn is_topic(&self) -> bool {
        matches!(*self.0.kind.lock(), NodeKind::Topic(_))
    }

    /// Current value, if this node is a leaf `Topic`.
    pub fn value(&self) -> Result<Any, ConfigError> {
        match &*self.0.kind.lock() {
            NodeKind::Topic(t) => Ok(t.value.clone()),
            NodeKind::Topics(_) => Err(ConfigError::NotTopic(self.full_path())),
        }
    }

    /// Names of direct children, in insertion order, if this node is `Topics`.
    pub fn child_names(&self) -> Result<Vec<String>, ConfigError> {
        match &*self.0.kind.lock() {
            NodeKind::Topics(children) => Ok(children.keys().cloned().collect()),
            NodeKind::Topic(_) => Err(ConfigError::NotTopics(self.full_path())),
        }
    }

    /// A direct child by name, if this node is `Topics` and it exists.
    pub fn child(&self, name: &str) -> Option<Node> {
        match &*self.0.kind.lock() {
            NodeKind::Topics(children) => children.get(name).cloned(),
            NodeKind::Topic(_) => None,
        }
    }

    /// Drops a direct child (and everything beneath it) from a `Topics`
    /// node. Used by REPLACE-policy merges to discard a subtree's stale
    /// children; `shift_remove` rather than `swap_remove` so the
    /// remaining children keep their relative insertion order.
    pub(crate) fn remove_child(&self, name: &str) -> Option<Node> {
        match &mut *self.0.kind.lock() {
            NodeKind::Topics(children) => children.shift_remove(name),
            NodeKind::Topic(_) => None,
        }
    }

    pub fn set_validator(&self, validator: Arc<dyn Validator>) -> Result<(), ConfigError> {
        match &mut *self.0.kind.lock() {
            NodeKind::Topic(t) => {
                t.validator = Some(validator);
                Ok(())
            }
            NodeKind::Topics(_) => Err(ConfigError::NotTopic(self.full_path())),
        }
    }

    fn set_parent(&self, parent: &Node) {
        *self.0.parent.write() = Arc::downgrade(&parent.0);
    }

    fn touch_modtime(&self, modtime: i64) {
        self.0.modtime.store(modtime, Ordering::Release);
        if let Some(parent) = self.parent() {
            // Interior nodes track the latest modtime among their descendants
            // so a watcher polling a subtree root can tell at a glance
            // whether anything beneath it changed.
            let parent_mt = parent.modtime();
            if modtime > parent_mt {
                parent.touch_modtime(modtime);
            }
        }
    }
}

/// The tree root plus the shared publish queue every write notification
/// runs through.
pub struct ConfigTree {
    root: Node,
    queue: PublishQueue,
    tlog: Mutex<Option<TransactionLog>>,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self {
            root: Node::new_topics(""),
            queue: PublishQueue::new(),
            tlog: Mutex::new(None),
        }
    }

    /// Start recording every future accepted write to `path` as an
    /// append-only JSON-lines transaction log.
    pub fn log_transactions_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        *self.tlog.lock() = Some(TransactionLog::open(path)?);
        Ok(())
    }

    pub fn root(&self) -> Node {
        self.root.clone()
    }

    /// Walk to a leaf `Topic`, creating any missing `Topics` along the way
    /// and a missing leaf itself (initialized to `Any::Null`).
    pub fn lookup(&self, path: &Path) -> Result<Node, ConfigError> {
        self.walk(path, true, true)
    }

    /// Walk to an interior `Topics` node, creating missing segments, but
    /// never creating the final segment as a leaf if absent — it is
    /// created as `Topics` too.
    pub fn lookup_topics(&self, path: &Path) -> Result<Node, ConfigError> {
        self.walk(path, true, false)
    }

    /// Walk to a node without creating anything; `None` if any segment is
    /// missing.
    pub fn find(&self, path: &Path) -> Option<Node> {
        self.walk(path, false, false).ok()
    }

    fn walk(&self, path: &Path, create: bool, leaf_is_topic: bool) -> Result<Node, ConfigError> {
        let mut current = self.root.clone();
        let segs = path.segments();
        for (i, seg) in segs.iter().enumerate() {
            let is_last = i == segs.len() - 1;
            let next = {
                let mut kind = current.0.kind.lock();
                match &mut *kind {
                    NodeKind::Topics(children) => {
                        if let Some(child) = children.get(seg) {
                            child.clone()
                        } else if create {
                            let child = if is_last && leaf_is_topic {
                                Node::new_topic(seg.clone())
                            } else {
                                Node::new_topics(seg.clone())
                            };
                            child.set_parent(&current);
                            children.insert(seg.clone(), child.clone());
                            child
                        } else {
                            return Err(ConfigError::NotFound(path.clone()));
                        }
                    }
                    NodeKind::Topic(_) => return Err(ConfigError::NotTopics(path.clone())),
                }
            };
            current = next;
        }
        Ok(current)
    }

    /// Set a leaf's value if `modtime` is newer than what's recorded (or
    /// the value actually differs at an equal modtime); runs the
    /// validator first and enqueues notification delivery on the publish
    /// queue. Returns `Ok(false)` for an accepted no-op, `Ok(true)` if the
    /// value changed.
    pub fn set_value(&self, topic: &Node, modtime: i64, value: Any) -> Result<bool, ConfigError> {
        let (validator, unchanged) = {
            let kind = topic.0.kind.lock();
            match &*kind {
                NodeKind::Topic(t) => {
                    let unchanged = modtime <= topic.modtime() && value == t.value;
                    (t.validator.clone(), unchanged)
                }
                NodeKind::Topics(_) => return Err(ConfigError::NotTopic(topic.full_path())),
            }
        };
        if unchanged {
            return Ok(false);
        }
        if let Some(validator) = &validator {
            validator
                .validate(&value)
                .map_err(|msg| ConfigError::Rejected(topic.full_path(), msg))?;
        }
        {
            let mut kind = topic.0.kind.lock();
            if let NodeKind::Topic(t) = &mut *kind {
                t.value = value.clone();
            }
        }
        topic.touch_modtime(modtime.max(topic.modtime() + 1));
        if let Some(log) = self.tlog.lock().as_mut() {
            let entry = TlogEntry::set(modtime, &topic.full_path(), value.clone());
            if let Err(e) = log.append(&entry) {
                tracing::warn!(error = %e, "failed to append transaction log entry");
            }
        }
        self.notify(topic, WhatHappened::Changed, value);
        Ok(true)
    }

    /// Register a subscriber on a leaf `Topic`. If the topic already
    /// holds a non-null value, the subscriber is fired synchronously
    /// with `Initialized` before this call returns.
    pub fn subscribe_immediate(
        &self,
        topic: &Node,
        callback: crate::subscriber::Subscriber,
    ) -> Result<(), ConfigError> {
        let sub = ImmediateSubscriber::new(callback);
        let current = {
            let mut kind = topic.0.kind.lock();
            match &mut *kind {
                NodeKind::Topic(t) => {
                    t.subscribers.push(Registration::Immediate(sub.clone()));
                    t.value.clone()
                }
                NodeKind::Topics(_) => return Err(ConfigError::NotTopic(topic.full_path())),
            }
        };
        if !current.is_null() {
            sub.deliver(WhatHappened::Initialized, &current);
        }
        Ok(())
    }

    /// Register a batched subscriber: bursts of changes before the queue
    /// drains coalesce into a single delivery carrying the latest value.
    pub fn subscribe_batched(
        &self,
        topic: &Node,
        callback: crate::subscriber::Subscriber,
    ) -> Result<(), ConfigError> {
        let sub = BatchedSubscriber::new(callback);
        let current = {
            let mut kind = topic.0.kind.lock();
            match &mut *kind {
                NodeKind::Topic(t) => {
                    t.subscribers.push(Registration::Batched(sub.clone()));
                    t.value.clone()
                }
                NodeKind::Topics(_) => return Err(ConfigError::NotTopic(topic.full_path())),
            }
        };
        if !current.is_null() {
            sub.deliver(WhatHappened::Initialized, &current);
        }
        Ok(())
    }

    fn notify(&self, topic: &Node, what: WhatHappened, value: Any) {
        let regs: Vec<_> = match &*topic.0.kind.lock() {
            NodeKind::Topic(t) => t.subscribers.iter().map(clone_registration).collect(),
            NodeKind::Topics(_) => return,
        };
        for reg in regs {
            match reg {
                Registration::Immediate(sub) => {
                    let value = value.clone();
                    self.queue.enqueue(Box::new(move || sub.deliver(what, &value)));
                }
                Registration::Batched(sub) => {
                    if sub.mark_pending() {
                        let topic = topic.clone();
                        self.queue.enqueue(Box::new(move || {
                            let current = match &*topic.0.kind.lock() {
                                NodeKind::Topic(t) => t.value.clone(),
                                NodeKind::Topics(_) => return,
                            };
                            sub.deliver(what, &current);
                        }));
                    }
                }
            }
        }
    }

    /// Block until every notification enqueued so far has been delivered.
    pub fn wait_for_clear(&self) {
        self.queue.wait_for_clear();
    }
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

fn clone_registration(reg: &Registration) -> Registration {
    match reg {
        Registration::Immediate(s) => Registration::Immediate(s.clone()),
        Registration::Batched(s) => Registration::Batched(s.clone()),
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
