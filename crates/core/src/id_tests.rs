// SPDX-License-Identifier: MIT

use super::*;
use std::collections::HashMap;

crate::define_id! {
    /// Test id type for macro verification.
    pub struct TestId("tst-");
}

#[test]
fn define_id_new_has_prefix() {
    let id = TestId::new();
    assert!(id.as_str().starts_with("tst-"));
    assert_eq!(id.as_str().len(), ID_MAX_LEN);
}

#[test]
fn define_id_round_trips_through_string() {
    let id = TestId::new();
    let back = TestId::from_string(id.as_str());
    assert_eq!(id, back);
}

#[test]
fn define_id_hash_map_lookup() {
    let id = TestId::from_string("tst-fixed");
    let mut map = HashMap::new();
    map.insert(id, 42);
    assert_eq!(map.get(&TestId::from_string("tst-fixed")), Some(&42));
}

#[test]
fn define_id_two_news_differ() {
    assert_ne!(TestId::new(), TestId::new());
}

#[test]
fn svcuid_is_sixteen_chars() {
    let uid = new_svcuid();
    assert_eq!(uid.len(), 16);
}

#[test]
fn svcuid_values_differ() {
    assert_ne!(new_svcuid(), new_svcuid());
}

#[test]
fn idbuf_truncates_debug_and_display_match_as_str() {
    let buf = IdBuf::new("hello");
    assert_eq!(format!("{buf}"), "hello");
    assert_eq!(buf.as_str(), "hello");
}

#[test]
fn idbuf_empty_is_empty() {
    assert!(IdBuf::empty().is_empty());
    assert!(!IdBuf::new("x").is_empty());
}
