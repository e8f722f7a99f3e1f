// SPDX-License-Identifier: MIT

//! Parses the `requires` (and synonym) config key into dependency edges.

use crate::state::State;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    pub name: String,
    pub required: State,
}

/// Config keys checked, in order, for a dependency declaration; the first
/// one present wins.
pub const DEPENDENCY_KEYS: [&str; 4] = ["requires", "dependencies", "dependency", "defaultimpl"];

/// Parses `"b, c:running"`-style strings. Entries are separated by `,`,
/// `;` or whitespace; each is `<name>[:<state-prefix>]`. The prefix is
/// matched case-insensitively against state names in declaration order,
/// first match wins; a bare name defaults to requiring `Running`.
///
/// Best-effort: a malformed entry is skipped and reported in the second
/// element of the returned tuple rather than discarding entries already
/// parsed — a single bad entry never loses the rest of the list.
pub fn parse_dependencies(spec: &str) -> (Vec<DependencyEntry>, Vec<String>) {
    let mut out = Vec::new();
    let mut problems = Vec::new();
    for entry in spec.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
        if entry.is_empty() {
            continue;
        }
        let (name, prefix) = match entry.split_once(':') {
            Some((name, prefix)) => (name, Some(prefix)),
            None => (entry, None),
        };
        if name.is_empty() {
            problems.push(format!("empty service name in {entry:?}"));
            continue;
        }
        let required = match prefix {
            None => State::Running,
            Some(prefix) if prefix.is_empty() => {
                problems.push(format!("empty state prefix in {entry:?}"));
                continue;
            }
            Some(prefix) => {
                let lower = prefix.to_lowercase();
                match State::ALL.iter().find(|state| state.as_str().starts_with(lower.as_str())) {
                    Some(state) => *state,
                    None => {
                        problems.push(format!("unknown state {prefix:?} in {entry:?}"));
                        continue;
                    }
                }
            }
        };
        out.push(DependencyEntry { name: name.to_string(), required });
    }
    (out, problems)
}

#[cfg(test)]
#[path = "dependency_tests.rs"]
mod tests;
