// SPDX-License-Identifier: MIT

use super::*;
use crate::hooks::GenericService;
use kestrel_config::{ConfigTree, Path as CPath};
use kestrel_exec::{Executor, ServiceRunner, ShellRunner};
use kestrel_platform::PlatformSelector;
use std::path::PathBuf;

fn make_lifecycle(name: &str, tree: &Arc<ConfigTree>, registry: &Arc<LifecycleRegistry>) -> Arc<Lifecycle> {
    let config = tree.lookup_topics(&CPath::from(format!("services.{name}").as_str())).unwrap();
    let runner = Arc::new(ServiceRunner::Real(ShellRunner::new(Executor::new())));
    let platform = Arc::new(PlatformSelector::empty());
    let svc = GenericService::new(
        name,
        tree.clone(),
        config.clone(),
        runner,
        platform.clone(),
        PathBuf::from("/tmp"),
        PathBuf::from("/srv/kestrel"),
    )
    .unwrap();
    let lc = Lifecycle::new(name, tree.clone(), config, Arc::new(svc), &platform, registry).unwrap();
    registry.register(lc.clone());
    lc
}

#[tokio::test]
async fn register_and_get_round_trip_by_name() {
    let tree = Arc::new(ConfigTree::new());
    let registry = LifecycleRegistry::new();
    let lc = make_lifecycle("demo", &tree, &registry);
    assert!(Arc::ptr_eq(&registry.get("demo").unwrap(), &lc));
    assert!(registry.get("missing").is_none());
}

#[tokio::test]
async fn names_lists_every_registered_service() {
    let tree = Arc::new(ConfigTree::new());
    let registry = LifecycleRegistry::new();
    make_lifecycle("a", &tree, &registry);
    make_lifecycle("b", &tree, &registry);
    let mut names = registry.names();
    names.sort();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn recheck_all_promotes_every_ready_service_in_one_call() {
    let tree = Arc::new(ConfigTree::new());
    let registry = LifecycleRegistry::new();
    let a = make_lifecycle("a", &tree, &registry);
    let b = make_lifecycle("b", &tree, &registry);

    a.set_state(State::AwaitingStartup).unwrap();
    b.set_state(State::AwaitingStartup).unwrap();
    tree.wait_for_clear();

    registry.recheck_all();

    assert_eq!(a.current_state(), State::Starting);
    assert_eq!(b.current_state(), State::Starting);
}

#[tokio::test]
async fn recheck_all_leaves_unsatisfied_services_in_awaiting_startup() {
    let tree = Arc::new(ConfigTree::new());
    let registry = LifecycleRegistry::new();
    let dep = make_lifecycle("dep", &tree, &registry);
    let _ = dep; // stays New

    let main_config = tree.lookup_topics(&CPath::from("services.main")).unwrap();
    let requires = tree.lookup(&CPath::from("services.main.requires")).unwrap();
    tree.set_value(&requires, 1, kestrel_core::Any::String("dep:running".to_string())).unwrap();
    let runner = Arc::new(ServiceRunner::Real(ShellRunner::new(Executor::new())));
    let platform = Arc::new(PlatformSelector::empty());
    let svc = GenericService::new(
        "main",
        tree.clone(),
        main_config.clone(),
        runner,
        platform.clone(),
        PathBuf::from("/tmp"),
        PathBuf::from("/srv/kestrel"),
    )
    .unwrap();
    let main = Lifecycle::new("main", tree.clone(), main_config, Arc::new(svc), &platform, &registry).unwrap();
    registry.register(main.clone());

    main.set_state(State::AwaitingStartup).unwrap();
    tree.wait_for_clear();

    registry.recheck_all();
    assert_eq!(main.current_state(), State::AwaitingStartup);
}
