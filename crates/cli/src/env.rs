// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the binary.

use std::path::PathBuf;

/// Resolve the default root path when `-root`/`-r` is not given:
/// `KESTREL_ROOT` > `XDG_STATE_HOME/kestrel` > `~/.local/state/kestrel`.
pub fn default_root() -> PathBuf {
    if let Ok(dir) = std::env::var("KESTREL_ROOT") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("kestrel");
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".local/state/kestrel")
}
