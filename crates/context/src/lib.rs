// SPDX-License-Identifier: MIT

//! A small dependency-injection registry: components are registered by
//! type (optionally qualified with a name) and resolved lazily, with
//! reentrant construction detected and rejected rather than deadlocking
//! or recursing forever.

pub mod error;

pub use error::ContextError;

use parking_lot::{Mutex, RwLock};
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

type Key = (TypeId, Option<String>);
type Slot = Arc<dyn Any + Send + Sync>;

/// A component that needs to look up its peers once it — and they — are
/// registered implements this; [`Context::put_with_post_inject`] runs it
/// immediately after insertion.
pub trait PostInject: Any + Send + Sync {
    fn post_inject(&self, ctx: &Context);
}

/// The registry. Cheap to clone — an `Arc` around the shared map.
#[derive(Clone, Default)]
pub struct Context {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    values: RwLock<HashMap<Key, Slot>>,
    constructing: Mutex<HashSet<Key>>,
}

fn key_of<T: Any>(name: Option<&str>) -> Key {
    (TypeId::of::<T>(), name.map(str::to_owned))
}

fn type_name_of<T>() -> &'static str {
    std::any::type_name::<T>()
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value under its type, replacing any existing one.
    pub fn put<T: Any + Send + Sync>(&self, value: T) {
        self.put_named::<T>(None, value);
    }

    /// Register a value under its type and a name, so multiple
    /// instances of the same type can coexist (e.g. several `ShellRunner`
    /// configurations).
    pub fn put_named<T: Any + Send + Sync>(&self, name: impl Into<Option<&'static str>>, value: T) {
        let key = key_of::<T>(name.into());
        self.inner.values.write().insert(key, Arc::new(value));
    }

    /// Register a value that also wants its [`PostInject::post_inject`]
    /// hook run immediately, once it is visible to lookups.
    pub fn put_with_post_inject<T: PostInject>(&self, value: T) {
        self.put_named_with_post_inject::<T>(None, value);
    }

    pub fn put_named_with_post_inject<T: PostInject>(
        &self,
        name: impl Into<Option<&'static str>>,
        value: T,
    ) {
        let name = name.into();
        let key = key_of::<T>(name);
        let arc = Arc::new(value);
        self.inner.values.write().insert(key, arc.clone());
        arc.post_inject(self);
    }

    /// Fetch a registered value by type.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.get_named::<T>(None)
    }

    /// Fetch a registered value by type and name.
    pub fn get_named<T: Any + Send + Sync>(&self, name: impl Into<Option<&'static str>>) -> Option<Arc<T>> {
        let key = key_of::<T>(name.into());
        let slot = self.inner.values.read().get(&key)?.clone();
        slot.downcast::<T>().ok()
    }

    /// Fetch a value by type, constructing and registering it with
    /// `factory` if absent. Detects the case where constructing `T`
    /// requires resolving `T` again (a true cycle) and returns an error
    /// instead of deadlocking or infinitely recursing.
    pub fn compute_if_empty<T: Any + Send + Sync>(
        &self,
        factory: impl FnOnce(&Context) -> T,
    ) -> Result<Arc<T>, ContextError> {
        self.compute_if_empty_named(None, factory)
    }

    pub fn compute_if_empty_named<T: Any + Send + Sync>(
        &self,
        name: impl Into<Option<&'static str>>,
        factory: impl FnOnce(&Context) -> T,
    ) -> Result<Arc<T>, ContextError> {
        let name = name.into();
        let key = key_of::<T>(name);
        if let Some(existing) = self.get_named::<T>(name) {
            return Ok(existing);
        }
        {
            let mut constructing = self.inner.constructing.lock();
            if !constructing.insert(key.clone()) {
                return Err(ContextError::ConstructionCycle(type_name_of::<T>().to_string()));
            }
        }
        let value = factory(self);
        self.inner.constructing.lock().remove(&key);
        let arc = Arc::new(value);
        self.inner.values.write().insert(key, arc.clone());
        Ok(arc)
    }

    /// Call `f` for every registered value of type `T`, across all names.
    pub fn for_each<T: Any + Send + Sync>(&self, mut f: impl FnMut(&Arc<T>)) {
        let values = self.inner.values.read();
        for (k, v) in values.iter() {
            if k.0 == TypeId::of::<T>() {
                if let Ok(typed) = v.clone().downcast::<T>() {
                    f(&typed);
                }
            }
        }
    }

    /// Notify every registered `PostInject` component of type `T` by
    /// re-running its hook. Useful after a batch of late registrations
    /// that earlier components' hooks could not yet see.
    pub fn notify<T: PostInject>(&self) {
        self.for_each::<T>(|component| component.post_inject(self));
    }

    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.get::<T>().is_some()
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
