// SPDX-License-Identifier: MIT

use super::*;
use std::collections::HashMap;

fn map_evaluator(vars: HashMap<&'static str, &'static str>) -> impl Evaluator {
    move |expr: &str| vars.get(expr).map(|v| v.to_string())
}

#[test]
fn resolves_known_tokens_and_leaves_unknown_verbatim() {
    let mut engine = TemplateEngine::new();
    engine.register(map_evaluator(HashMap::from([("root", "/r"), ("service.name", "db")])));

    assert_eq!(
        engine.expand("run in $[root]/$[service.name]"),
        "run in /r/db"
    );
    assert_eq!(engine.expand("$[missing]"), "$[missing]");
}

#[test]
fn first_evaluator_to_resolve_wins() {
    let mut engine = TemplateEngine::new();
    engine.register(map_evaluator(HashMap::from([("x", "first")])));
    engine.register(map_evaluator(HashMap::from([("x", "second")])));

    assert_eq!(engine.expand("$[x]"), "first");
}

#[test]
fn later_evaluator_resolves_when_earlier_declines() {
    let mut engine = TemplateEngine::new();
    engine.register(map_evaluator(HashMap::from([("a", "1")])));
    engine.register(map_evaluator(HashMap::from([("b", "2")])));

    assert_eq!(engine.expand("$[b]"), "2");
}

#[test]
fn text_with_no_tokens_passes_through_unchanged() {
    let engine = TemplateEngine::new();
    assert_eq!(engine.expand("plain text, no tokens here"), "plain text, no tokens here");
}

#[test]
fn substituted_text_is_not_rescanned() {
    let mut engine = TemplateEngine::new();
    engine.register(map_evaluator(HashMap::from([("a", "$[b]")])));
    engine.register(map_evaluator(HashMap::from([("b", "should-not-appear")])));

    assert_eq!(engine.expand("$[a]"), "$[b]");
}

#[test]
fn brackets_and_dollar_signs_cannot_appear_inside_an_expr() {
    let engine = TemplateEngine::new();
    // No evaluators at all; the point is that the regex doesn't match
    // across a `]` or a nested `$[`.
    assert_eq!(engine.expand("$[a[b]"), "$[a[b]");
}

#[test]
fn expand_is_idempotent_on_text_without_tokens() {
    let engine = TemplateEngine::new();
    let once = engine.expand("no tokens");
    let twice = engine.expand(&once);
    assert_eq!(once, twice);
}
