// SPDX-License-Identifier: MIT

use super::*;
use kestrel_core::Any;
use kestrel_template::TemplateEngine;

#[test]
fn resolves_the_four_path_names() {
    let paths = Arc::new(RwLock::new(SupervisorPaths::under("/r")));
    let tree = Arc::new(ConfigTree::new());
    let evaluator = SystemEvaluator::new(paths, tree);

    assert_eq!(evaluator.evaluate("root"), Some("/r".to_string()));
    assert_eq!(evaluator.evaluate("work"), Some("/r/work".to_string()));
    assert_eq!(evaluator.evaluate("bin"), Some("/r/bin".to_string()));
    assert_eq!(evaluator.evaluate("config"), Some("/r/config".to_string()));
}

#[test]
fn falls_back_to_a_dotted_tree_lookup() {
    let paths = Arc::new(RwLock::new(SupervisorPaths::under("/r")));
    let tree = Arc::new(ConfigTree::new());
    let topic = tree.lookup(&CPath::from("service.name")).unwrap();
    tree.set_value(&topic, 1, Any::String("db".to_string())).unwrap();
    let evaluator = SystemEvaluator::new(paths, tree);

    assert_eq!(evaluator.evaluate("service.name"), Some("db".to_string()));
    assert_eq!(evaluator.evaluate("missing"), None);
}

#[test]
fn end_to_end_through_the_template_engine() {
    let paths = Arc::new(RwLock::new(SupervisorPaths::under("/r")));
    let tree = Arc::new(ConfigTree::new());
    let topic = tree.lookup(&CPath::from("service.name")).unwrap();
    tree.set_value(&topic, 1, Any::String("db".to_string())).unwrap();

    let mut engine = TemplateEngine::new();
    engine.register(SystemEvaluator::new(paths, tree));

    assert_eq!(engine.expand("run in $[root]/$[service.name]"), "run in /r/db");
    assert_eq!(engine.expand("$[missing]"), "$[missing]");
}
