// SPDX-License-Identifier: MIT

//! The configuration tree's leaf value type.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Sum type held by a leaf [`Topic`](crate) in the configuration tree.
///
/// Mirrors the shapes a YAML/JSON document can produce: scalars, lists and
/// nested maps. `Map` uses an `IndexMap` so a subtree read back out as an
/// `Any::Map` preserves the child order it was inserted in, matching the
/// tree's own `Topics(IndexMap<..>)` ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Any {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Any>),
    Map(IndexMap<String, Any>),
}

impl Any {
    pub fn is_null(&self) -> bool {
        matches!(self, Any::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Any::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Any::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Any::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Any>> {
        match self {
            Any::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Coerce to a display string, used by the template engine and by
    /// status-line rendering. Lists and maps render as their JSON form.
    pub fn coerce_to_string(&self) -> String {
        match self {
            Any::Null => String::new(),
            Any::Bool(b) => b.to_string(),
            Any::Int(i) => i.to_string(),
            Any::Float(f) => f.to_string(),
            Any::String(s) => s.clone(),
            Any::List(_) | Any::Map(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }
}

impl Default for Any {
    fn default() -> Self {
        Any::Null
    }
}

impl From<&str> for Any {
    fn from(s: &str) -> Self {
        Any::String(s.to_owned())
    }
}

impl From<String> for Any {
    fn from(s: String) -> Self {
        Any::String(s)
    }
}

impl From<bool> for Any {
    fn from(b: bool) -> Self {
        Any::Bool(b)
    }
}

impl From<i64> for Any {
    fn from(i: i64) -> Self {
        Any::Int(i)
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
