// SPDX-License-Identifier: MIT

//! Load and save a configuration tree as YAML or JSON, depending on file
//! extension. Child insertion order is preserved on load (topics become
//! map keys in the order the document lists them) and on save.

use crate::error::ConfigError;
use crate::node::{ConfigTree, Node};
use crate::path::Path;
use indexmap::IndexMap;
use kestrel_core::Any;
use std::path::Path as FsPath;

/// Parse a document's contents into an `Any::Map`, dispatching on the
/// file's extension.
pub fn parse_document(path: &FsPath, contents: &str) -> Result<Any, ConfigError> {
    match extension_of(path)? {
        Format::Yaml => serde_yaml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string())),
        Format::Json => serde_json::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string())),
    }
}

/// Load a document from disk and merge it into the tree rooted at `base`.
pub fn load_into(tree: &ConfigTree, base: &Path, modtime: i64, path: &FsPath) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = parse_document(path, &contents)?;
    tree.merge_map(base, modtime, &doc)
}

/// Serialize the subtree rooted at `node` back into an `Any::Map`,
/// recursing into child `Topics` nodes.
pub fn subtree_to_any(node: &Node) -> Result<Any, ConfigError> {
    if node.is_topic() {
        return node.value();
    }
    let mut out = IndexMap::new();
    for name in node.child_names()? {
        if let Some(child) = node.child(&name) {
            out.insert(name, subtree_to_any(&child)?);
        }
    }
    Ok(Any::Map(out))
}

/// Save the subtree rooted at `node` to disk, dispatching format on
/// extension.
pub fn save_from(node: &Node, path: &FsPath) -> Result<(), ConfigError> {
    let doc = subtree_to_any(node)?;
    let rendered = match extension_of(path)? {
        Format::Yaml => serde_yaml::to_string(&doc).map_err(|e| ConfigError::ParseError(e.to_string()))?,
        Format::Json => {
            serde_json::to_string_pretty(&doc).map_err(|e| ConfigError::ParseError(e.to_string()))?
        }
    };
    std::fs::write(path, rendered).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

enum Format {
    Yaml,
    Json,
}

fn extension_of(path: &FsPath) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => Ok(Format::Yaml),
        Some("json") => Ok(Format::Json),
        other => Err(ConfigError::UnknownExtension(
            other.unwrap_or("").to_string(),
        )),
    }
}

#[cfg(test)]
#[path = "yaml_tests.rs"]
mod tests;
