// SPDX-License-Identifier: MIT

//! Recursive merge of a parsed document into the tree.
//!
//! A `Map` upserts each key as a child, recursing into nested maps.
//! A `List` (or any scalar) replaces the target topic's value outright —
//! lists are never merged element-by-element. Two policies govern what
//! happens to a subtree's *existing* children that the new map doesn't
//! mention: `Merge` leaves them untouched, `Replace` drops them first.

use crate::error::ConfigError;
use crate::node::ConfigTree;
use crate::path::Path;
use kestrel_core::Any;

/// How a map value is applied onto an existing `Topics` subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Existing children not present in the new map are left as-is.
    Merge,
    /// Existing children not present in the new map are dropped.
    Replace,
}

impl ConfigTree {
    /// Merge a parsed `Any::Map` into the tree rooted at `base` with MERGE
    /// semantics, stamping every touched leaf with `modtime`. Non-map
    /// values at `base` replace whatever was there (including turning a
    /// `Topics` node's matching child into a scalar leaf).
    pub fn merge_map(&self, base: &Path, modtime: i64, value: &Any) -> Result<(), ConfigError> {
        self.apply_map(base, modtime, value, MergePolicy::Merge)
    }

    /// Like [`merge_map`](Self::merge_map), but any child that already
    /// existed under `base` and isn't present in `value` is removed, so
    /// the subtree ends up holding exactly what `value` describes.
    pub fn replace_map(&self, base: &Path, modtime: i64, value: &Any) -> Result<(), ConfigError> {
        self.apply_map(base, modtime, value, MergePolicy::Replace)
    }

    /// Recursive worker behind [`merge_map`](Self::merge_map) and
    /// [`replace_map`](Self::replace_map); `policy` applies uniformly to
    /// `base` and every nested map beneath it.
    pub fn apply_map(&self, base: &Path, modtime: i64, value: &Any, policy: MergePolicy) -> Result<(), ConfigError> {
        match value {
            Any::Map(map) => {
                if policy == MergePolicy::Replace {
                    if let Some(node) = self.find(base) {
                        if let Ok(existing) = node.child_names() {
                            for name in existing {
                                if !map.contains_key(&name) {
                                    node.remove_child(&name);
                                }
                            }
                        }
                    }
                }
                for (key, child_value) in map {
                    let child_path = base.child(key.clone());
                    self.apply_map(&child_path, modtime, child_value, policy)?;
                }
                Ok(())
            }
            scalar => {
                let topic = self.lookup(base)?;
                self.set_value(&topic, modtime, scalar.clone())?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
