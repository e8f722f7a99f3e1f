// SPDX-License-Identifier: MIT

use super::*;

#[test]
fn running_satisfies_a_lower_requirement() {
    assert!(State::Running.satisfies(State::AwaitingStartup));
    assert!(State::Running.satisfies(State::Running));
    assert!(!State::Starting.satisfies(State::Running));
}

#[test]
fn finished_satisfies_everything_in_chain() {
    assert!(State::Finished.satisfies(State::Running));
}

#[test]
fn errored_never_satisfies_a_chain_requirement() {
    assert!(!State::Errored.satisfies(State::New));
    assert!(!State::Shutdown.satisfies(State::New));
}

#[test]
fn out_of_chain_state_only_satisfies_itself() {
    assert!(State::Errored.satisfies(State::Errored));
    assert!(!State::Errored.satisfies(State::Shutdown));
}

#[test]
fn any_round_trips_through_to_and_from_any() {
    for state in State::ALL {
        assert_eq!(State::from_any(&state.to_any()), Some(state));
    }
}

#[test]
fn from_any_rejects_unknown_strings() {
    assert_eq!(State::from_any(&Any::String("bogus".to_string())), None);
    assert_eq!(State::from_any(&Any::Null), None);
}
