// SPDX-License-Identifier: MIT

//! Dotted paths identifying a node in the configuration tree.

/// A path into the tree, e.g. `services.docker.requires`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path(Vec<String>);

impl Path {
    pub fn new(segments: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn child(&self, name: impl Into<String>) -> Path {
        let mut segs = self.0.clone();
        segs.push(name.into());
        Path(segs)
    }

    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            None
        } else {
            Some(Path(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for Path {
    /// Splits a dotted string into segments; `""` yields the root path.
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Path(Vec::new())
        } else {
            Path(s.split('.').map(str::to_owned).collect())
        }
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(segs: [&str; N]) -> Self {
        Path(segs.iter().map(|s| s.to_string()).collect())
    }
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;
