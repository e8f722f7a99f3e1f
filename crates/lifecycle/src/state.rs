// SPDX-License-Identifier: MIT

//! Lifecycle states and the ordering used for dependency gating.

use kestrel_core::Any;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    New,
    Installing,
    AwaitingStartup,
    Starting,
    Running,
    /// Retained for compatibility; nothing currently transitions into it.
    Unstable,
    Errored,
    Finished,
    Shutdown,
}

impl State {
    /// Declaration order, used for first-prefix-match parsing of
    /// dependency state prefixes.
    pub const ALL: [State; 9] = [
        State::New,
        State::Installing,
        State::AwaitingStartup,
        State::Starting,
        State::Running,
        State::Unstable,
        State::Errored,
        State::Finished,
        State::Shutdown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            State::New => "new",
            State::Installing => "installing",
            State::AwaitingStartup => "awaitingstartup",
            State::Starting => "starting",
            State::Running => "running",
            State::Unstable => "unstable",
            State::Errored => "errored",
            State::Finished => "finished",
            State::Shutdown => "shutdown",
        }
    }

    pub fn to_any(self) -> Any {
        Any::String(self.as_str().to_string())
    }

    pub fn from_any(value: &Any) -> Option<State> {
        let s = value.as_str()?;
        State::ALL.iter().find(|state| state.as_str() == s).copied()
    }

    /// Position in the linear install/startup chain. `None` for states
    /// outside it (Unstable, Errored, Shutdown), which never satisfy a
    /// dependency requirement other than themselves.
    fn chain_rank(&self) -> Option<u8> {
        match self {
            State::New => Some(0),
            State::Installing => Some(1),
            State::AwaitingStartup => Some(2),
            State::Starting => Some(3),
            State::Running => Some(4),
            State::Finished => Some(5),
            State::Unstable | State::Errored | State::Shutdown => None,
        }
    }

    /// Whether `self` satisfies a dependency requiring at least
    /// `required`, per `New < Installing < AwaitingStartup < Starting <
    /// Running < Finished`.
    pub fn satisfies(&self, required: State) -> bool {
        match (self.chain_rank(), required.chain_rank()) {
            (Some(a), Some(b)) => a >= b,
            _ => *self == required,
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
