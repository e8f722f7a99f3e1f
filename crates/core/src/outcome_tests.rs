// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn ok_and_nothing_done_are_ok() {
    assert!(ScriptOutcome::Ok.is_ok());
    assert!(ScriptOutcome::NothingDone.is_ok());
    assert!(!ScriptOutcome::Errored("boom".into()).is_ok());
}

#[test]
fn errored_is_errored() {
    assert!(ScriptOutcome::Errored("boom".into()).is_errored());
    assert!(!ScriptOutcome::Ok.is_errored());
}

#[test]
fn cancelled_is_neither_ok_nor_errored() {
    assert!(!ScriptOutcome::Cancelled.is_ok());
    assert!(!ScriptOutcome::Cancelled.is_errored());
}
