// SPDX-License-Identifier: MIT

//! Ranks platform tags (`linux`, `debian`, a hostname, ...) by how
//! specific they are, and picks the best-matching child of a `Topics`
//! node built from OS-variant keys in a configuration document.

use kestrel_config::Node;
use std::collections::HashMap;
use std::path::Path;

/// `all`/`any` match everything and rank lowest; a bare hostname is the
/// most specific tag a variant can name and always wins ties.
pub const RANK_ANY: i32 = 0;
pub const RANK_POSIX: i32 = 3;
pub const RANK_WINDOWS: i32 = 5;
pub const RANK_LINUX: i32 = 10;
pub const RANK_DISTRO_FAMILY: i32 = 11;
pub const RANK_DISTRO_ID: i32 = 20;
pub const RANK_DISTRO_CODENAME: i32 = 22;
pub const RANK_HOSTNAME: i32 = 99;

/// A populated rank map plus the lookup/selection operations over it.
pub struct PlatformSelector {
    ranks: HashMap<String, i32>,
}

impl PlatformSelector {
    /// Build an empty selector with no tags ranked.
    pub fn empty() -> Self {
        Self { ranks: HashMap::new() }
    }

    /// Probe the running system and populate the rank map: filesystem
    /// checks for a POSIX shell, `/proc`, and the Debian/Fedora package
    /// managers; kernel-name/os-release heuristics for the distro; and
    /// the current hostname at the top.
    pub fn detect() -> Self {
        let mut selector = Self::empty();
        selector.ranks.insert("all".to_string(), RANK_ANY);
        selector.ranks.insert("any".to_string(), RANK_ANY);

        if Path::new("/bin/bash").exists() || Path::new("/bin/sh").exists() {
            selector.ranks.insert("posix".to_string(), RANK_POSIX);
        }
        if cfg!(windows) {
            selector.ranks.insert("windows".to_string(), RANK_WINDOWS);
        }
        if Path::new("/proc").exists() {
            selector.ranks.insert("linux".to_string(), RANK_LINUX);
        }
        if Path::new("/usr/bin/apt-get").exists() {
            selector.ranks.insert("debian".to_string(), RANK_DISTRO_FAMILY);
        }
        if Path::new("/usr/bin/yum").exists() || Path::new("/usr/bin/dnf").exists() {
            selector.ranks.insert("fedora".to_string(), RANK_DISTRO_FAMILY);
        }

        match std::env::consts::OS {
            "macos" => {
                selector.ranks.insert("darwin".to_string(), RANK_DISTRO_ID);
            }
            "freebsd" => {
                selector.ranks.insert("freebsd".to_string(), RANK_DISTRO_ID);
            }
            _ => {}
        }

        if let Some((id, codename)) = read_os_release() {
            selector.ranks.insert(id, RANK_DISTRO_ID);
            if let Some(codename) = codename {
                selector.ranks.insert(codename, RANK_DISTRO_CODENAME);
            }
        }

        if let Some(hostname) = read_hostname() {
            selector.ranks.insert(hostname, RANK_HOSTNAME);
        }

        selector
    }

    /// Directly set or override a tag's rank. Used by tests and by
    /// callers that want to seed known tags (e.g. `qnx`, `cygwin`)
    /// without relying on live filesystem probes.
    pub fn set_rank(&mut self, tag: impl Into<String>, rank: i32) -> &mut Self {
        self.ranks.insert(tag.into(), rank);
        self
    }

    /// Rank of a tag; unknown tags rank -1, never matching anything.
    pub fn rank(&self, tag: &str) -> i32 {
        self.ranks.get(tag).copied().unwrap_or(-1)
    }

    /// Among `node`'s direct children, return the one whose name ranks
    /// highest, ties broken by insertion order. `None` if `node` has no
    /// children or none of them rank above -1.
    pub fn pick_by_os(&self, node: &Node) -> Option<Node> {
        let names = node.child_names().ok()?;
        let mut best: Option<(i32, Node)> = None;
        for name in names {
            let rank = self.rank(&name);
            if rank < 0 {
                continue;
            }
            let child = node.child(&name)?;
            match &best {
                Some((best_rank, _)) if *best_rank >= rank => {}
                _ => best = Some((rank, child)),
            }
        }
        best.map(|(_, node)| node)
    }
}

fn read_os_release() -> Option<(String, Option<String>)> {
    let contents = std::fs::read_to_string("/etc/os-release").ok()?;
    let mut id = None;
    let mut codename = None;
    for line in contents.lines() {
        if let Some(value) = line.strip_prefix("ID=") {
            id = Some(unquote(value));
        } else if let Some(value) = line.strip_prefix("VERSION_CODENAME=") {
            codename = Some(unquote(value));
        }
    }
    id.map(|id| (id, codename))
}

fn unquote(s: &str) -> String {
    s.trim_matches('"').to_string()
}

fn read_hostname() -> Option<String> {
    if let Ok(contents) = std::fs::read_to_string("/etc/hostname") {
        let trimmed = contents.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty())
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
